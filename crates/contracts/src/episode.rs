//! Episode - raw simulation log schema and its validated form.
//!
//! The raw structs mirror the deserialized log mapping key for key. They are
//! converted once into [`Episode`] at the boundary so that downstream stages
//! work on named, numeric fields and never re-check field presence.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::{ContractError, EpisodeId};

/// Raw episode log as produced by the log deserializer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEpisode {
    /// Per-snapshot vehicle lists; the first snapshot holds the static obstacles
    #[serde(default)]
    pub vehicle_object_lists: Vec<Vec<RawVehicleObject>>,

    /// Ego control log (time, gear, reverse, ...)
    pub ego_control_list: Vec<RawControlRecord>,

    /// Ego odometry log
    pub ego_odometry_list: Vec<RawOdometryRecord>,

    /// Collision events (possibly empty)
    #[serde(default)]
    pub ego_collision_list: Vec<RawCollisionRecord>,

    /// Intent signal timestamps (first entry = first button press)
    pub intention_time_list: Vec<f64>,

    /// Vehicle id -> name lookup, diagnostics only
    #[serde(default)]
    pub vehicle_dict: HashMap<String, String>,
}

/// Raw static vehicle record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawVehicleObject {
    pub position: Vec<f64>,
}

/// Raw control record
///
/// Only `time` and `reverse` drive the pipeline; the other fields are
/// carried through to the control series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawControlRecord {
    pub time: f64,
    #[serde(default, deserialize_with = "scalar_or_norm")]
    pub velocity: f64,
    #[serde(default, deserialize_with = "scalar_or_norm")]
    pub acceleration: f64,
    #[serde(default, deserialize_with = "scalar_or_first")]
    pub orientation: f64,
    #[serde(default)]
    pub throttle: f64,
    #[serde(default)]
    pub steer: f64,
    #[serde(default)]
    pub brake: f64,
    #[serde(default)]
    pub hand_brake: bool,
    pub reverse: bool,
    #[serde(default)]
    pub gear: i32,
    #[serde(default)]
    pub manual_gear_shift: bool,
}

/// Raw odometry record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawOdometryRecord {
    pub time: f64,
    pub position: Vec<f64>,
    /// Euler angles, heading (yaw) first, radians
    pub orientation: Vec<f64>,
    pub linear_velocity: Vec<f64>,
    pub angular_velocity: Vec<f64>,
}

/// Raw collision record; every field is kept for diagnostics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCollisionRecord {
    #[serde(default)]
    pub other_id: Option<Value>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScalarOrVector {
    Scalar(f64),
    Vector(Vec<f64>),
}

/// Accept a scalar or a vector; vectors collapse to their Euclidean norm.
fn scalar_or_norm<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match ScalarOrVector::deserialize(deserializer)? {
        ScalarOrVector::Scalar(v) => v,
        ScalarOrVector::Vector(v) => v.iter().map(|c| c * c).sum::<f64>().sqrt(),
    })
}

/// Accept a scalar or a vector; vectors collapse to their first component.
fn scalar_or_first<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match ScalarOrVector::deserialize(deserializer)? {
        ScalarOrVector::Scalar(v) => v,
        ScalarOrVector::Vector(v) => v.first().copied().unwrap_or_default(),
    })
}

// ===== Validated episode =====

/// Static obstacle position in map frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StaticObstacle {
    pub x: f64,
    pub y: f64,
}

/// One control-log entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlSample {
    pub time: f64,
    pub speed: f64,
    pub acceleration: f64,
    pub orientation: f64,
    pub throttle: f64,
    pub steer: f64,
    pub brake: f64,
    pub gear: i32,
    pub hand_brake: bool,
    pub reverse: bool,
    pub manual_gear_shift: bool,
}

/// One odometry entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OdometrySample {
    pub time: f64,
    pub x: f64,
    pub y: f64,
    /// Heading in map frame (rad)
    pub heading: f64,
    pub vx: f64,
    pub vy: f64,
    /// Angular velocity z-component (rad/s)
    pub yaw_rate: f64,
}

/// Collision event with the other vehicle resolved for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionRecord {
    pub other_id: Option<String>,
    pub other_name: Option<String>,
    pub fields: BTreeMap<String, Value>,
}

/// Validated episode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Episode {
    pub id: EpisodeId,
    pub obstacles: Vec<StaticObstacle>,
    pub controls: Vec<ControlSample>,
    pub odometry: Vec<OdometrySample>,
    pub collisions: Vec<CollisionRecord>,
    /// First instant the agent signalled its goal
    pub intention_time: f64,
}

impl Episode {
    /// Decode a JSON-serialized raw log and validate it
    pub fn from_json_str(id: impl Into<EpisodeId>, content: &str) -> Result<Self, ContractError> {
        let raw: RawEpisode =
            serde_json::from_str(content).map_err(|e| ContractError::EpisodeDecode {
                message: format!("JSON decode error: {e}"),
                source: Some(Box::new(e)),
            })?;
        Self::from_raw(id, raw)
    }

    /// Validate a raw log into an episode
    ///
    /// # Errors
    /// `ContractError::Schema` naming the first offending field.
    pub fn from_raw(id: impl Into<EpisodeId>, raw: RawEpisode) -> Result<Self, ContractError> {
        let intention_time = *raw.intention_time_list.first().ok_or_else(|| {
            ContractError::schema("intention_time_list", "at least one timestamp required")
        })?;
        require_finite("intention_time_list[0]", intention_time)?;

        if raw.ego_odometry_list.is_empty() {
            return Err(ContractError::schema("ego_odometry_list", "empty odometry log"));
        }
        if raw.ego_control_list.is_empty() {
            return Err(ContractError::schema("ego_control_list", "empty control log"));
        }

        let obstacles = match raw.vehicle_object_lists.first() {
            Some(objects) => objects
                .iter()
                .enumerate()
                .map(|(i, object)| {
                    let field = format!("vehicle_object_lists[0][{i}].position");
                    let [x, y] = leading::<2>(&field, &object.position)?;
                    Ok(StaticObstacle { x, y })
                })
                .collect::<Result<Vec<_>, ContractError>>()?,
            None => Vec::new(),
        };

        let controls = raw
            .ego_control_list
            .iter()
            .enumerate()
            .map(|(i, record)| {
                require_finite(&format!("ego_control_list[{i}].time"), record.time)?;
                Ok(ControlSample {
                    time: record.time,
                    speed: record.velocity,
                    acceleration: record.acceleration,
                    orientation: record.orientation,
                    throttle: record.throttle,
                    steer: record.steer,
                    brake: record.brake,
                    gear: record.gear,
                    hand_brake: record.hand_brake,
                    reverse: record.reverse,
                    manual_gear_shift: record.manual_gear_shift,
                })
            })
            .collect::<Result<Vec<_>, ContractError>>()?;

        let odometry = raw
            .ego_odometry_list
            .iter()
            .enumerate()
            .map(|(i, record)| {
                let prefix = format!("ego_odometry_list[{i}]");
                require_finite(&format!("{prefix}.time"), record.time)?;
                let [x, y] = leading::<2>(&format!("{prefix}.position"), &record.position)?;
                let [heading] = leading::<1>(&format!("{prefix}.orientation"), &record.orientation)?;
                let [vx, vy] =
                    leading::<2>(&format!("{prefix}.linear_velocity"), &record.linear_velocity)?;
                let [_, _, yaw_rate] =
                    leading::<3>(&format!("{prefix}.angular_velocity"), &record.angular_velocity)?;
                Ok(OdometrySample {
                    time: record.time,
                    x,
                    y,
                    heading,
                    vx,
                    vy,
                    yaw_rate,
                })
            })
            .collect::<Result<Vec<_>, ContractError>>()?;

        let collisions = raw
            .ego_collision_list
            .into_iter()
            .map(|record| {
                let other_id = record.other_id.map(|v| match v {
                    Value::String(s) => s,
                    other => other.to_string(),
                });
                let other_name = other_id
                    .as_ref()
                    .and_then(|id| raw.vehicle_dict.get(id).cloned());
                CollisionRecord {
                    other_id,
                    other_name,
                    fields: record.fields,
                }
            })
            .collect();

        Ok(Self {
            id: id.into(),
            obstacles,
            controls,
            odometry,
            collisions,
            intention_time,
        })
    }
}

fn require_finite(field: &str, value: f64) -> Result<(), ContractError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ContractError::schema(field, format!("expected finite value, got {value}")))
    }
}

/// Take the first `N` components of a vector field
fn leading<const N: usize>(field: &str, values: &[f64]) -> Result<[f64; N], ContractError> {
    if values.len() < N {
        return Err(ContractError::schema(
            field,
            format!("expected at least {N} components, got {}", values.len()),
        ));
    }
    let mut out = [0.0; N];
    out.copy_from_slice(&values[..N]);
    Ok(out)
}
