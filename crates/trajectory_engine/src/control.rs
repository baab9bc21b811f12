//! Columnar control series.
//!
//! Raw control entries are reshaped into index-aligned columns, one per
//! field. No resampling happens here.

use contracts::ControlSample;
use tracing::warn;

use crate::error::{Result, TrajectoryError};

/// Column view of one control field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlColumn<'a> {
    Float(&'a [f64]),
    Int(&'a [i32]),
    Flag(&'a [bool]),
}

impl ControlColumn<'_> {
    pub fn len(&self) -> usize {
        match self {
            Self::Float(c) => c.len(),
            Self::Int(c) => c.len(),
            Self::Flag(c) => c.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Control log as parallel arrays, in log order
#[derive(Debug, Clone, Default)]
pub struct ControlSeries {
    pub time: Vec<f64>,
    pub speed: Vec<f64>,
    pub acceleration: Vec<f64>,
    pub orientation: Vec<f64>,
    pub throttle: Vec<f64>,
    pub steer: Vec<f64>,
    pub brake: Vec<f64>,
    pub gear: Vec<i32>,
    pub hand_brake: Vec<bool>,
    pub reverse: Vec<bool>,
    pub manual_gear_shift: Vec<bool>,
    /// Timestamps are non-decreasing, which allows binary search
    sorted: bool,
}

impl ControlSeries {
    /// Column names accepted by [`ControlSeries::column`]
    pub const FIELDS: [&'static str; 11] = [
        "t",
        "speed",
        "acceleration",
        "orientation",
        "throttle",
        "steer",
        "brake",
        "gear",
        "hand_brakes",
        "reverse",
        "manual_gear_shift",
    ];

    /// Reshape control entries into columns
    ///
    /// # Errors
    /// `EmptyControlLog` when there are no entries.
    pub fn from_samples(samples: &[ControlSample]) -> Result<Self> {
        if samples.is_empty() {
            return Err(TrajectoryError::EmptyControlLog);
        }

        let n = samples.len();
        let mut series = Self {
            time: Vec::with_capacity(n),
            speed: Vec::with_capacity(n),
            acceleration: Vec::with_capacity(n),
            orientation: Vec::with_capacity(n),
            throttle: Vec::with_capacity(n),
            steer: Vec::with_capacity(n),
            brake: Vec::with_capacity(n),
            gear: Vec::with_capacity(n),
            hand_brake: Vec::with_capacity(n),
            reverse: Vec::with_capacity(n),
            manual_gear_shift: Vec::with_capacity(n),
            sorted: true,
        };

        for sample in samples {
            series.time.push(sample.time);
            series.speed.push(sample.speed);
            series.acceleration.push(sample.acceleration);
            series.orientation.push(sample.orientation);
            series.throttle.push(sample.throttle);
            series.steer.push(sample.steer);
            series.brake.push(sample.brake);
            series.gear.push(sample.gear);
            series.hand_brake.push(sample.hand_brake);
            series.reverse.push(sample.reverse);
            series.manual_gear_shift.push(sample.manual_gear_shift);
        }

        series.sorted = series.time.windows(2).all(|w| w[0] <= w[1]);
        if !series.sorted {
            warn!(
                entries = n,
                "control log timestamps are not monotonic, falling back to linear gear lookup"
            );
        }

        Ok(series)
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Look up a column by field name
    pub fn column(&self, name: &str) -> Option<ControlColumn<'_>> {
        Some(match name {
            "t" | "time" => ControlColumn::Float(&self.time),
            "speed" => ControlColumn::Float(&self.speed),
            "acceleration" => ControlColumn::Float(&self.acceleration),
            "orientation" => ControlColumn::Float(&self.orientation),
            "throttle" => ControlColumn::Float(&self.throttle),
            "steer" => ControlColumn::Float(&self.steer),
            "brake" => ControlColumn::Float(&self.brake),
            "gear" => ControlColumn::Int(&self.gear),
            "hand_brakes" | "hand_brake" => ControlColumn::Flag(&self.hand_brake),
            "reverse" => ControlColumn::Flag(&self.reverse),
            "manual_gear_shift" => ControlColumn::Flag(&self.manual_gear_shift),
            _ => return None,
        })
    }

    /// Index of the control entry governing time `t`.
    ///
    /// First index whose timestamp is `>= t` (earliest index on ties). When
    /// `t` is past the end of the log no entry matches and the first entry
    /// is used, as an argmax over an all-false mask would.
    pub fn index_at(&self, t: f64) -> usize {
        let found = if self.sorted {
            let idx = self.time.partition_point(|&ct| ct < t);
            (idx < self.time.len()).then_some(idx)
        } else {
            self.time.iter().position(|&ct| t <= ct)
        };
        found.unwrap_or(0)
    }

    /// Reverse gear engaged at time `t`
    pub fn is_reverse_at(&self, t: f64) -> bool {
        self.reverse[self.index_at(t)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(time: f64, reverse: bool) -> ControlSample {
        ControlSample {
            time,
            reverse,
            gear: if reverse { -1 } else { 1 },
            ..Default::default()
        }
    }

    #[test]
    fn test_columns_index_aligned() {
        let series =
            ControlSeries::from_samples(&[sample(0.0, false), sample(0.1, true)]).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.column("t"), Some(ControlColumn::Float(&[0.0, 0.1][..])));
        assert_eq!(series.column("gear"), Some(ControlColumn::Int(&[1, -1][..])));
        assert_eq!(
            series.column("reverse"),
            Some(ControlColumn::Flag(&[false, true][..]))
        );
        for name in ControlSeries::FIELDS {
            assert_eq!(series.column(name).map(|c| c.len()), Some(2), "{name}");
        }
        assert!(series.column("wiper").is_none());
    }

    #[test]
    fn test_empty_log_rejected() {
        assert!(matches!(
            ControlSeries::from_samples(&[]),
            Err(TrajectoryError::EmptyControlLog)
        ));
    }

    #[test]
    fn test_index_is_first_time_not_before_query() {
        let series = ControlSeries::from_samples(&[
            sample(0.0, false),
            sample(0.1, false),
            sample(0.2, true),
        ])
        .unwrap();
        assert_eq!(series.index_at(-1.0), 0);
        assert_eq!(series.index_at(0.0), 0);
        assert_eq!(series.index_at(0.05), 1);
        assert_eq!(series.index_at(0.1), 1);
        assert_eq!(series.index_at(0.15), 2);
        assert!(series.is_reverse_at(0.15));
    }

    #[test]
    fn test_query_past_end_falls_back_to_first_entry() {
        let series =
            ControlSeries::from_samples(&[sample(0.0, false), sample(1.0, true)]).unwrap();
        assert_eq!(series.index_at(1.0), 1);
        assert_eq!(series.index_at(2.0), 0);
        assert!(!series.is_reverse_at(2.0));
    }

    #[test]
    fn test_duplicate_timestamps_take_earliest() {
        let series = ControlSeries::from_samples(&[
            sample(0.0, false),
            sample(0.1, true),
            sample(0.1, false),
        ])
        .unwrap();
        assert_eq!(series.index_at(0.1), 1);
    }

    #[test]
    fn test_unsorted_log_uses_first_match() {
        let series = ControlSeries::from_samples(&[
            sample(0.3, true),
            sample(0.1, false),
            sample(0.2, false),
        ])
        .unwrap();
        assert!(!series.is_sorted());
        // 0.3 is the first entry satisfying 0.15 <= t
        assert_eq!(series.index_at(0.15), 0);
        assert!(series.is_reverse_at(0.15));
    }
}
