//! Fixed-length training snippets.
//!
//! Reference times step through the moving window at `n_skip * dt`. Each
//! snippet holds `n_hist` history states ending at the reference time and
//! `n_pred` labeled future states after it, plus a copy of the goal set.

use contracts::{
    EpisodeId, GoalCandidate, KinematicState, LabeledState, SnippetBatch, SnippetConfig,
    SnippetMeta, Trajectory,
};
use tracing::{debug, warn};

use crate::error::{Result, TrajectoryError};
use crate::frame::EgoFrame;
use crate::interpolate::TrajectoryInterpolator;

/// Relative slack on the step count, absorbs rounding in `(end - start) / step`
const STEP_TOLERANCE: f64 = 1e-9;

/// Evenly spaced values from `start` to `end` inclusive.
///
/// The count is `floor((end - start) / step) + 1` and values are computed as
/// `start + i * step`, so there is no accumulated drift. An `end` that falls
/// a rounding error short of a grid point still includes that point.
///
/// Unlike `arange(start, end + step / 2, step)` this never emits a point past
/// `end`: a span of 5.3 steps yields 6 points, not 7.
pub fn inclusive_range(start: f64, end: f64, step: f64) -> Vec<f64> {
    let span = (end - start) / step;
    if !span.is_finite() || span < -STEP_TOLERANCE {
        return Vec::new();
    }
    let count = (span + STEP_TOLERANCE).floor().max(0.0) as usize + 1;
    (0..count).map(|i| start + i as f64 * step).collect()
}

/// Cuts a trajectory into snippets
#[derive(Debug, Clone)]
pub struct SnippetGenerator {
    config: SnippetConfig,
}

impl SnippetGenerator {
    /// # Errors
    /// `InvalidParameter` for zero window lengths or a non-positive `dt`.
    pub fn new(config: SnippetConfig) -> Result<Self> {
        for (name, value) in [
            ("n_hist", config.n_hist),
            ("n_pred", config.n_pred),
            ("n_skip", config.n_skip),
        ] {
            if value == 0 {
                return Err(TrajectoryError::invalid_parameter(name, "must be >= 1"));
            }
        }
        if !config.dt.is_finite() || config.dt <= 0.0 {
            return Err(TrajectoryError::invalid_parameter(
                "dt",
                format!("must be a finite value > 0, got {}", config.dt),
            ));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &SnippetConfig {
        &self.config
    }

    /// Snippet reference times for a moving window `[start_time, end_time]`
    pub fn reference_times(&self, start_time: f64, end_time: f64) -> Vec<f64> {
        let SnippetConfig {
            n_hist,
            n_pred,
            n_skip,
            dt,
            ..
        } = self.config;
        let first = start_time + n_hist as f64 * dt;
        let last = end_time - n_pred as f64 * dt;
        let step = n_skip as f64 * dt;
        inclusive_range(first, last, step)
    }

    /// History query times ending at `t_ref`
    pub fn history_times(&self, t_ref: f64) -> Vec<f64> {
        let n = self.config.n_hist as i64;
        (-n + 1..=0)
            .map(|k| k as f64 * self.config.dt + t_ref)
            .collect()
    }

    /// Future query times after `t_ref`
    pub fn future_times(&self, t_ref: f64) -> Vec<f64> {
        (1..=self.config.n_pred)
            .map(|k| k as f64 * self.config.dt + t_ref)
            .collect()
    }

    /// Cut `trajectory` into snippets.
    ///
    /// A moving window shorter than `(n_hist + n_pred) * dt` yields an empty
    /// batch.
    pub fn generate(
        &self,
        episode_id: &EpisodeId,
        trajectory: &Trajectory,
        goals: &[GoalCandidate],
    ) -> SnippetBatch {
        let start_time = trajectory.start_time();
        let end_time = trajectory.end_time();
        let mut meta = SnippetMeta {
            n_hist: self.config.n_hist,
            n_pred: self.config.n_pred,
            n_skip: self.config.n_skip,
            dt: self.config.dt,
            ego_frame: self.config.ego_frame,
            goal_index: trajectory.goal_index,
            num_goals: goals.len(),
            clamped_queries: 0,
            trajectory_samples: trajectory.len(),
            usable_duration: end_time - start_time,
        };

        let reference_times = self.reference_times(start_time, end_time);
        if reference_times.is_empty() {
            warn!(
                episode_id = %episode_id,
                usable_duration = meta.usable_duration,
                required = (self.config.n_hist + self.config.n_pred) as f64 * self.config.dt,
                "moving window too short for any snippet"
            );
            return SnippetBatch::empty(episode_id.clone(), meta);
        }

        let interpolator = TrajectoryInterpolator::new(trajectory);
        let mut features_global: Vec<Vec<KinematicState>> =
            Vec::with_capacity(reference_times.len());
        let mut labels_global: Vec<Vec<LabeledState>> = Vec::with_capacity(reference_times.len());

        for &t_ref in &reference_times {
            let hist = self.history_times(t_ref);
            let pred = self.future_times(t_ref);
            meta.clamped_queries +=
                interpolator.count_clamped(&hist) + interpolator.count_clamped(&pred);
            features_global.push(interpolator.states(&hist));
            labels_global.push(interpolator.labels(&pred));
        }

        if meta.clamped_queries > 0 {
            debug!(
                episode_id = %episode_id,
                clamped = meta.clamped_queries,
                "queries outside the recorded range were filled with boundary samples"
            );
        }

        let (features, labels, goal_snapshots) = if self.config.ego_frame {
            self.to_ego_frame(&features_global, &labels_global, goals)
        } else {
            (
                features_global.clone(),
                labels_global.clone(),
                vec![goals.to_vec(); reference_times.len()],
            )
        };

        SnippetBatch {
            episode_id: episode_id.clone(),
            reference_times,
            features_global,
            labels_global,
            features,
            labels,
            goals: goal_snapshots,
            meta,
        }
    }

    #[allow(clippy::type_complexity)]
    fn to_ego_frame(
        &self,
        features: &[Vec<KinematicState>],
        labels: &[Vec<LabeledState>],
        goals: &[GoalCandidate],
    ) -> (
        Vec<Vec<KinematicState>>,
        Vec<Vec<LabeledState>>,
        Vec<Vec<GoalCandidate>>,
    ) {
        let mut ego_features = Vec::with_capacity(features.len());
        let mut ego_labels = Vec::with_capacity(labels.len());
        let mut ego_goals = Vec::with_capacity(features.len());

        for (history, future) in features.iter().zip(labels) {
            // history is never empty since n_hist >= 1
            let Some(current) = history.last() else {
                continue;
            };
            let frame = EgoFrame::at(current);
            ego_features.push(history.iter().map(|s| frame.state(s)).collect());
            ego_labels.push(future.iter().map(|l| frame.label(l)).collect());
            ego_goals.push(goals.iter().map(|g| frame.goal(g)).collect());
        }

        (ego_features, ego_labels, ego_goals)
    }
}
