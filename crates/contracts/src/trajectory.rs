//! Goal candidates and reconstructed trajectories.

use serde::{Deserialize, Serialize};

/// Intent value of samples recorded before the goal was signalled
pub const INTENT_UNDETERMINED: i32 = -1;

/// Destination candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GoalCandidate {
    pub x: f64,
    pub y: f64,
    /// False when an obstacle sits on the spot
    pub free: bool,
}

impl GoalCandidate {
    /// `[x, y, free]` with `free` as 0/1
    #[inline]
    pub fn to_row(&self) -> [f64; 3] {
        [self.x, self.y, if self.free { 1.0 } else { 0.0 }]
    }
}

/// One reconstructed trajectory sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    pub time: f64,
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    /// Signed longitudinal velocity (m/s), negative when reversing
    pub velocity: f64,
    pub yaw_rate: f64,
    /// Goal index, or [`INTENT_UNDETERMINED`]
    pub intent: i32,
}

/// Reconstructed trajectory of one episode
///
/// Samples are in log order. `start_index <= end_index` always holds;
/// `switch_index` is the first sample carrying a resolved intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trajectory {
    pub samples: Vec<TrajectorySample>,
    pub start_index: usize,
    pub switch_index: usize,
    pub end_index: usize,
    /// Goal reached at `end_index`, the intent label of the whole episode
    pub goal_index: usize,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Time of the first usable (moving) sample
    pub fn start_time(&self) -> f64 {
        self.samples[self.start_index].time
    }

    /// Time of the last usable (moving) sample
    pub fn end_time(&self) -> f64 {
        self.samples[self.end_index].time
    }

    /// Time from which the intent is known
    pub fn switch_time(&self) -> f64 {
        self.samples[self.switch_index].time
    }

    /// Intent value carried by samples at or after the switch
    pub fn resolved_intent(&self) -> i32 {
        self.samples[self.switch_index].intent
    }
}

/// Interpolated kinematic state, one history row
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KinematicState {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
    pub velocity: f64,
    pub yaw_rate: f64,
}

impl KinematicState {
    #[inline]
    pub fn to_row(&self) -> [f64; 5] {
        [self.x, self.y, self.heading, self.velocity, self.yaw_rate]
    }
}

/// Kinematic state plus intent label, one future row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledState {
    pub state: KinematicState,
    pub intent: i32,
}

impl LabeledState {
    #[inline]
    pub fn to_row(&self) -> [f64; 6] {
        let [x, y, heading, velocity, yaw_rate] = self.state.to_row();
        [x, y, heading, velocity, yaw_rate, f64::from(self.intent)]
    }
}
