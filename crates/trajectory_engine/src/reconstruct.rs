//! Full-trajectory reconstruction.
//!
//! Turns the odometry log into a time-indexed trajectory with a signed
//! velocity and a per-sample intent label, and marks the moving window and
//! the goal the agent finished at.

use contracts::{
    Episode, GoalCandidate, ReconstructionConfig, Trajectory, TrajectorySample,
    INTENT_UNDETERMINED,
};
use tracing::{debug, warn};

use crate::control::ControlSeries;
use crate::error::{Result, TrajectoryError};
use crate::velocity::LongitudinalVelocityEstimator;

/// Builds a [`Trajectory`] from one episode
#[derive(Debug, Clone)]
pub struct TrajectoryReconstructor {
    config: ReconstructionConfig,
}

impl TrajectoryReconstructor {
    /// # Errors
    /// `InvalidParameter` when the movement threshold is negative or not finite.
    pub fn new(config: ReconstructionConfig) -> Result<Self> {
        if !config.min_vel_thresh.is_finite() || config.min_vel_thresh < 0.0 {
            return Err(TrajectoryError::invalid_parameter(
                "min_vel_thresh",
                format!("must be a finite value >= 0, got {}", config.min_vel_thresh),
            ));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ReconstructionConfig {
        &self.config
    }

    /// Reconstruct the episode trajectory.
    ///
    /// # Errors
    /// - `CollisionExcluded` when collisions exist and exclusion is on
    /// - `EmptyOdometry` when there are no odometry entries
    /// - `DegenerateMovementWindow` when pruning is on and nothing moves
    /// - `EmptyIntentWindow` when every sample predates the intention time
    pub fn reconstruct(
        &self,
        episode: &Episode,
        controls: &ControlSeries,
        goals: &[GoalCandidate],
    ) -> Result<Trajectory> {
        self.report_collisions(episode)?;

        if episode.odometry.is_empty() {
            return Err(TrajectoryError::EmptyOdometry);
        }
        if goals.is_empty() {
            return Err(TrajectoryError::EmptyGoalSet {
                obstacles: episode.obstacles.len(),
            });
        }

        let estimator = LongitudinalVelocityEstimator::new(controls);
        let velocities = estimator.resolve(
            episode
                .odometry
                .iter()
                .map(|odom| (odom.time, odom.vx, odom.vy)),
        );

        let (start_index, end_index) = self.movement_window(&velocities)?;

        let end = &episode.odometry[end_index];
        let goal_index = nearest_goal(goals, end.x, end.y);
        let intent = i32::try_from(goal_index).map_err(|_| {
            TrajectoryError::invalid_parameter("goals", "too many goal candidates")
        })?;

        let intention_time = episode.intention_time;
        let samples: Vec<TrajectorySample> = episode
            .odometry
            .iter()
            .zip(&velocities)
            .map(|(odom, &velocity)| TrajectorySample {
                time: odom.time,
                x: odom.x,
                y: odom.y,
                heading: odom.heading,
                velocity,
                yaw_rate: odom.yaw_rate,
                intent: if odom.time < intention_time {
                    INTENT_UNDETERMINED
                } else {
                    intent
                },
            })
            .collect();

        let switch_index = samples
            .iter()
            .position(|s| s.intent > INTENT_UNDETERMINED)
            .ok_or(TrajectoryError::EmptyIntentWindow { intention_time })?;

        debug!(
            episode_id = %episode.id,
            samples = samples.len(),
            start_index,
            switch_index,
            end_index,
            goal_index,
            "trajectory reconstructed"
        );

        Ok(Trajectory {
            samples,
            start_index,
            switch_index,
            end_index,
            goal_index,
        })
    }

    fn report_collisions(&self, episode: &Episode) -> Result<()> {
        if episode.collisions.is_empty() {
            return Ok(());
        }

        for collision in &episode.collisions {
            warn!(
                episode_id = %episode.id,
                other_id = collision.other_id.as_deref().unwrap_or("unknown"),
                other_name = collision.other_name.as_deref().unwrap_or("unknown"),
                details = ?collision.fields,
                "collision recorded"
            );
        }

        if self.config.exclude_collisions {
            return Err(TrajectoryError::CollisionExcluded {
                collisions: episode.collisions.len(),
            });
        }
        Ok(())
    }

    /// `(start_index, end_index)` of the usable span
    fn movement_window(&self, velocities: &[f64]) -> Result<(usize, usize)> {
        let threshold = self.config.min_vel_thresh;
        let is_moving = |v: &f64| v.abs() > threshold;
        let last = velocities.len() - 1;

        let start = if self.config.prune_start {
            velocities
                .iter()
                .position(is_moving)
                .ok_or(TrajectoryError::DegenerateMovementWindow { threshold })?
        } else {
            0
        };
        let end = if self.config.prune_end {
            velocities
                .iter()
                .rposition(is_moving)
                .ok_or(TrajectoryError::DegenerateMovementWindow { threshold })?
        } else {
            last
        };

        Ok((start, end))
    }
}

/// Index of the candidate closest to `(x, y)`, first one on ties
pub fn nearest_goal(goals: &[GoalCandidate], x: f64, y: f64) -> usize {
    goals
        .iter()
        .map(|g| (g.x - x).powi(2) + (g.y - y).powi(2))
        .enumerate()
        .fold((0, f64::INFINITY), |best, (i, d)| {
            if d < best.1 {
                (i, d)
            } else {
                best
            }
        })
        .0
}
