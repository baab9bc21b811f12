//! FileSink - writes one file per episode batch

use contracts::{ContractError, DatasetSink, OutputFormat, SnippetBatch};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, error, instrument};

use crate::encode::{file_name_for, write_encoded};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Base output directory
    pub base_path: PathBuf,
    pub format: OutputFormat,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ContractError> {
        Ok(Self {
            base_path: super::base_path_param(params),
            format: super::format_param(params)?,
        })
    }
}

/// Sink that writes `<base_path>/<episode_id>.<ext>` for every batch
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    files_written: u64,
}

impl FileSink {
    /// Create a new FileSink
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        fs::create_dir_all(&config.base_path)?;

        Ok(Self {
            name: name.into(),
            config,
            files_written: 0,
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let config = FileSinkConfig::from_params(params)?;
        Ok(Self::new(name, config)?)
    }

    /// Output path of an episode
    pub fn path_for(&self, episode_id: &str) -> PathBuf {
        self.config.base_path.join(format!(
            "{}.{}",
            file_name_for(episode_id),
            self.config.format.extension()
        ))
    }

    fn persist_batch(&mut self, batch: &SnippetBatch) -> Result<(), ContractError> {
        let path = self.path_for(batch.episode_id.as_str());
        write_encoded(&path, batch, self.config.format).map_err(|e| {
            error!(
                sink = %self.name,
                episode_id = %batch.episode_id,
                error = %e,
                "Write failed"
            );
            ContractError::sink_write(&self.name, e.to_string())
        })?;
        self.files_written += 1;
        debug!(sink = %self.name, path = %path.display(), "Batch written");
        Ok(())
    }
}

impl DatasetSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, batch),
        fields(sink = %self.name, episode_id = %batch.episode_id)
    )]
    async fn write(&mut self, batch: &SnippetBatch) -> Result<(), ContractError> {
        self.persist_batch(batch)
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, files = self.files_written, "FileSink closed");
        Ok(())
    }
}
