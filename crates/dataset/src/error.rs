//! Dataset error types

use thiserror::Error;

/// Dataset assembly and dispatch errors
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Batch layout differs from the batches already assembled
    #[error("episode '{episode_id}': {field} has shape {found}, expected {expected}")]
    ShapeMismatch {
        episode_id: String,
        field: &'static str,
        expected: usize,
        found: usize,
    },

    /// Training set could not be encoded
    #[error("encode error: {0}")]
    Encode(String),

    /// Sink write error (from contract)
    #[error("sink error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DatasetError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    pub(crate) fn shape_mismatch(
        episode_id: impl ToString,
        field: &'static str,
        expected: usize,
        found: usize,
    ) -> Self {
        Self::ShapeMismatch {
            episode_id: episode_id.to_string(),
            field,
            expected,
            found,
        }
    }
}
