//! Sink implementations
//!
//! Contains LogSink, FileSink, and TrainingSetSink.

mod file;
mod log;
mod training_set;

use std::collections::HashMap;
use std::path::PathBuf;

use contracts::{ContractError, OutputFormat};

pub use self::file::{FileSink, FileSinkConfig};
pub use self::log::LogSink;
pub use self::training_set::{TrainingSetSink, TrainingSetSinkConfig};

/// `base_path` param, defaulting to `./output`
fn base_path_param(params: &HashMap<String, String>) -> PathBuf {
    params
        .get("base_path")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./output"))
}

/// `format` param, defaulting to JSON
fn format_param(params: &HashMap<String, String>) -> Result<OutputFormat, ContractError> {
    match params.get("format") {
        None => Ok(OutputFormat::default()),
        Some(value) => OutputFormat::from_param(value).ok_or_else(|| {
            ContractError::config_validation("params.format", format!("unknown format '{value}'"))
        }),
    }
}
