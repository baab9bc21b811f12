//! PipelineBlueprint - Config Loader output
//!
//! Describes one dataset-generation run: trajectory reconstruction options,
//! snippet windowing, and output routing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete pipeline blueprint
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PipelineBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Trajectory reconstruction options
    #[serde(default)]
    #[validate(nested)]
    pub reconstruction: ReconstructionConfig,

    /// Snippet windowing options
    #[serde(default)]
    #[validate(nested)]
    pub snippets: SnippetConfig,

    /// Output routing
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// Trajectory reconstruction options
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReconstructionConfig {
    /// Drop the stationary head of the trajectory
    #[serde(default = "default_true")]
    pub prune_start: bool,

    /// Drop the stationary tail of the trajectory
    #[serde(default = "default_true")]
    pub prune_end: bool,

    /// Speed (m/s) above which the agent counts as moving
    #[serde(default = "default_min_vel_thresh")]
    #[validate(range(min = 0.0))]
    pub min_vel_thresh: f64,

    /// Reject episodes that recorded a collision
    #[serde(default)]
    pub exclude_collisions: bool,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            prune_start: true,
            prune_end: true,
            min_vel_thresh: default_min_vel_thresh(),
            exclude_collisions: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_min_vel_thresh() -> f64 {
    0.01
}

/// Snippet windowing options
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SnippetConfig {
    /// History length in samples
    #[serde(default = "default_n_hist")]
    #[validate(range(min = 1))]
    pub n_hist: usize,

    /// Future length in samples
    #[serde(default = "default_n_pred")]
    #[validate(range(min = 1))]
    pub n_pred: usize,

    /// Stride between reference times in samples
    #[serde(default = "default_n_skip")]
    #[validate(range(min = 1))]
    pub n_skip: usize,

    /// Sample period (seconds)
    #[serde(default = "default_dt")]
    #[validate(range(exclusive_min = 0.0))]
    pub dt: f64,

    /// Re-express every snippet in the agent frame at its reference time
    #[serde(default)]
    pub ego_frame: bool,
}

impl Default for SnippetConfig {
    fn default() -> Self {
        Self {
            n_hist: default_n_hist(),
            n_pred: default_n_pred(),
            n_skip: default_n_skip(),
            dt: default_dt(),
            ego_frame: false,
        }
    }
}

fn default_n_hist() -> usize {
    5
}

fn default_n_pred() -> usize {
    20
}

fn default_n_skip() -> usize {
    5
}

fn default_dt() -> f64 {
    0.1
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Queue capacity
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Type-specific parameters (`base_path`, `format`, `file_stem`)
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    100
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Batch summaries to the log
    Log,
    /// One file per episode
    File,
    /// One assembled training set per run
    TrainingSet,
}

/// On-disk encoding for file-based sinks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Json,
    Bincode,
}

impl OutputFormat {
    /// Parse the `format` sink parameter
    pub fn from_param(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "bincode" | "bin" => Some(Self::Bincode),
            _ => None,
        }
    }

    /// File extension for this format
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Bincode => "bin",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_defaults_match_reference_setup() {
        let config = SnippetConfig::default();
        assert_eq!(config.n_hist, 5);
        assert_eq!(config.n_pred, 20);
        assert_eq!(config.n_skip, 5);
        assert_eq!(config.dt, 0.1);
        assert!(!config.ego_frame);
    }

    #[test]
    fn derive_rules_reject_zero_history() {
        let mut blueprint = PipelineBlueprint::default();
        blueprint.snippets.n_hist = 0;
        let errors = blueprint.validate().unwrap_err();
        assert!(errors.to_string().contains("n_hist"));
    }

    #[test]
    fn derive_rules_reject_non_positive_dt() {
        let mut blueprint = PipelineBlueprint::default();
        blueprint.snippets.dt = 0.0;
        assert!(blueprint.validate().is_err());
    }

    #[test]
    fn output_format_params() {
        assert_eq!(OutputFormat::from_param("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_param("bin"), Some(OutputFormat::Bincode));
        assert_eq!(OutputFormat::from_param("npz"), None);
        assert_eq!(OutputFormat::Bincode.extension(), "bin");
    }
}
