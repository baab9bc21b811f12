//! Error types for CLI operations.

use std::path::PathBuf;

use thiserror::Error;
use trajectory_engine::EpisodeError;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Episode path does not exist
    #[error("Episode path not found: {}", path.display())]
    EpisodeNotFound { path: PathBuf },

    /// No `*.json` episode under the given paths
    #[error("No episode files found under {paths:?}")]
    NoEpisodes { paths: Vec<PathBuf> },

    /// Episode file could not be read
    #[error("Failed to read episode {}: {source}", path.display())]
    EpisodeRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Episode rejected by a processing stage
    #[error(transparent)]
    Episode(#[from] EpisodeError),

    /// Processing task panicked or was cancelled
    #[error("Worker task for {} failed: {message}", path.display())]
    Worker { path: PathBuf, message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn episode_not_found(path: impl Into<PathBuf>) -> Self {
        Self::EpisodeNotFound { path: path.into() }
    }

    /// Stage label used when the episode is skipped
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Episode(e) => e.stage.as_str(),
            Self::EpisodeRead { .. } | Self::EpisodeNotFound { .. } | Self::Io(_) => "read",
            Self::NoEpisodes { .. } => "discovery",
            Self::Worker { .. } => "worker",
        }
    }
}
