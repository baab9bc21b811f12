//! Trajectory engine error types

use std::fmt;

use contracts::{ContractError, EpisodeId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of one pipeline stage
#[derive(Debug, Error)]
pub enum TrajectoryError {
    /// No static obstacles, or none left after the boundary-column exclusion
    #[error("no goal candidates can be formed from {obstacles} static obstacles")]
    EmptyGoalSet { obstacles: usize },

    /// Episode recorded collisions and exclusion was requested
    #[error("{collisions} collision(s) recorded, episode excluded")]
    CollisionExcluded { collisions: usize },

    /// No sample carries a resolved intent
    #[error("no sample at or after intention time {intention_time}")]
    EmptyIntentWindow { intention_time: f64 },

    /// No sample exceeds the movement threshold
    #[error("no sample moves faster than {threshold} m/s")]
    DegenerateMovementWindow { threshold: f64 },

    /// Control log is empty
    #[error("control log is empty")]
    EmptyControlLog,

    /// Odometry log is empty
    #[error("odometry log is empty")]
    EmptyOdometry,

    /// Parameter outside its valid range
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    /// Raw-log boundary failure
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl TrajectoryError {
    pub fn invalid_parameter(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Pipeline stage, used to report where an episode failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Schema,
    GoalExtraction,
    ControlExtraction,
    Reconstruction,
    SnippetGeneration,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::GoalExtraction => "goal_extraction",
            Self::ControlExtraction => "control_extraction",
            Self::Reconstruction => "reconstruction",
            Self::SnippetGeneration => "snippet_generation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-episode failure with enough context to skip and continue
#[derive(Debug, Error)]
#[error("episode '{episode_id}' failed at {stage}: {source}")]
pub struct EpisodeError {
    pub episode_id: EpisodeId,
    pub stage: Stage,
    #[source]
    pub source: TrajectoryError,
}

impl EpisodeError {
    pub fn new(episode_id: EpisodeId, stage: Stage, source: impl Into<TrajectoryError>) -> Self {
        Self {
            episode_id,
            stage,
            source: source.into(),
        }
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, TrajectoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_error_names_episode_and_stage() {
        let err = EpisodeError::new(
            "ep_12".into(),
            Stage::Reconstruction,
            TrajectoryError::EmptyIntentWindow {
                intention_time: 4.2,
            },
        );
        let message = err.to_string();
        assert!(message.contains("ep_12"));
        assert!(message.contains("reconstruction"));
        assert!(message.contains("4.2"));
    }
}
