//! SnippetBatch - trajectory engine output
//!
//! All per-snippet vectors are index-aligned: entry `i` of every field
//! belongs to the snippet whose reference time is `reference_times[i]`.

use serde::{Deserialize, Serialize};

use crate::{EpisodeId, GoalCandidate, KinematicState, LabeledState};

/// Snippets extracted from one episode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnippetBatch {
    pub episode_id: EpisodeId,

    /// Snippet reference times (last history instant)
    pub reference_times: Vec<f64>,

    /// History windows in map frame, `n_hist` rows each
    pub features_global: Vec<Vec<KinematicState>>,

    /// Future windows in map frame, `n_pred` rows each
    pub labels_global: Vec<Vec<LabeledState>>,

    /// History windows in ego frame (equal to the global ones without ego transform)
    pub features: Vec<Vec<KinematicState>>,

    /// Future windows in ego frame (equal to the global ones without ego transform)
    pub labels: Vec<Vec<LabeledState>>,

    /// Goal candidates per snippet, in the same frame as `features`
    pub goals: Vec<Vec<GoalCandidate>>,

    pub meta: SnippetMeta,
}

/// Batch metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnippetMeta {
    pub n_hist: usize,
    pub n_pred: usize,
    pub n_skip: usize,
    pub dt: f64,
    pub ego_frame: bool,

    /// Goal reached by the episode
    pub goal_index: usize,

    /// Number of goal candidates per snapshot
    pub num_goals: usize,

    /// Query samples that fell outside the recorded time range and were
    /// filled with the boundary sample. These rows carry no information.
    pub clamped_queries: usize,

    /// Samples in the reconstructed trajectory
    pub trajectory_samples: usize,

    /// Duration of the usable (moving) span in seconds
    pub usable_duration: f64,
}

impl SnippetBatch {
    /// Empty batch for an episode
    pub fn empty(episode_id: EpisodeId, meta: SnippetMeta) -> Self {
        Self {
            episode_id,
            reference_times: Vec::new(),
            features_global: Vec::new(),
            labels_global: Vec::new(),
            features: Vec::new(),
            labels: Vec::new(),
            goals: Vec::new(),
            meta,
        }
    }

    /// Number of snippets
    pub fn len(&self) -> usize {
        self.reference_times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reference_times.is_empty()
    }
}
