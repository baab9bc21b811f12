//! Piecewise-linear resampling of a reconstructed trajectory.
//!
//! Queries outside the recorded time range take the boundary value. Heading
//! is unwrapped before interpolation so a crossing of ±π does not sweep
//! through zero.

use std::f64::consts::{PI, TAU};

use contracts::{KinematicState, LabeledState, Trajectory, INTENT_UNDETERMINED};

/// Linear interpolation of `fp(xp)` at `x`.
///
/// `xp` must be non-decreasing and non-empty. Values left of `xp[0]` take
/// `fp[0]`, values right of the last sample take the last value.
pub fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    debug_assert_eq!(xp.len(), fp.len());
    let n = xp.len();
    let above = xp.partition_point(|&t| t <= x);
    if above == 0 {
        return fp[0];
    }
    if above == n {
        return fp[n - 1];
    }

    let (i, j) = (above - 1, above);
    let span = xp[j] - xp[i];
    let w = (x - xp[i]) / span;
    fp[i] + w * (fp[j] - fp[i])
}

/// Remove 2π jumps between consecutive angles.
///
/// A step whose magnitude reaches π is replaced by its equivalent in
/// `[-π, π)`, except that a positive step of exactly π is kept.
pub fn unwrap_angles(angles: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(angles.len());
    let Some(&first) = angles.first() else {
        return out;
    };
    out.push(first);

    let mut correction = 0.0;
    for w in angles.windows(2) {
        let step = w[1] - w[0];
        if step.abs() >= PI {
            let mut wrapped = (step + PI).rem_euclid(TAU) - PI;
            if wrapped == -PI && step > 0.0 {
                wrapped = PI;
            }
            correction += wrapped - step;
        }
        out.push(w[1] + correction);
    }
    out
}

/// Interpolation tables of one trajectory
#[derive(Debug, Clone)]
pub struct TrajectoryInterpolator {
    time: Vec<f64>,
    x: Vec<f64>,
    y: Vec<f64>,
    heading: Vec<f64>,
    velocity: Vec<f64>,
    yaw_rate: Vec<f64>,
    switch_time: f64,
    resolved_intent: i32,
}

impl TrajectoryInterpolator {
    /// Precompute columns. The trajectory must not be empty.
    pub fn new(trajectory: &Trajectory) -> Self {
        let samples = &trajectory.samples;
        let column = |f: fn(&contracts::TrajectorySample) -> f64| -> Vec<f64> {
            samples.iter().map(f).collect()
        };
        let raw_heading = column(|s| s.heading);

        Self {
            time: column(|s| s.time),
            x: column(|s| s.x),
            y: column(|s| s.y),
            heading: unwrap_angles(&raw_heading),
            velocity: column(|s| s.velocity),
            yaw_rate: column(|s| s.yaw_rate),
            switch_time: trajectory.switch_time(),
            resolved_intent: trajectory.resolved_intent(),
        }
    }

    /// Kinematic state at `t`
    pub fn state_at(&self, t: f64) -> KinematicState {
        KinematicState {
            x: interp(t, &self.time, &self.x),
            y: interp(t, &self.time, &self.y),
            heading: interp(t, &self.time, &self.heading),
            velocity: interp(t, &self.time, &self.velocity),
            yaw_rate: interp(t, &self.time, &self.yaw_rate),
        }
    }

    /// Kinematic states at every query time
    pub fn states(&self, times: &[f64]) -> Vec<KinematicState> {
        times.iter().map(|&t| self.state_at(t)).collect()
    }

    /// Labeled states at every query time.
    ///
    /// The intent is constant across the window: the resolved goal when any
    /// query reaches the switch time, undetermined otherwise. Windows that
    /// straddle the switch are therefore labeled as fully known.
    pub fn labels(&self, times: &[f64]) -> Vec<LabeledState> {
        let reaches_switch = times.iter().any(|&t| t >= self.switch_time);
        let intent = if reaches_switch {
            self.resolved_intent
        } else {
            INTENT_UNDETERMINED
        };

        times
            .iter()
            .map(|&t| LabeledState {
                state: self.state_at(t),
                intent,
            })
            .collect()
    }

    /// Number of queries outside the recorded time range
    pub fn count_clamped(&self, times: &[f64]) -> usize {
        let (Some(&first), Some(&last)) = (self.time.first(), self.time.last()) else {
            return times.len();
        };
        times.iter().filter(|&&t| t < first || t > last).count()
    }
}
