//! TrainingSetSink - assembles every batch into one training set file

use chrono::Local;
use contracts::{ContractError, DatasetSink, OutputFormat, SnippetBatch};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

use crate::encode::write_encoded;
use crate::training_set::TrainingSet;

/// Configuration for TrainingSetSink
#[derive(Debug, Clone)]
pub struct TrainingSetSinkConfig {
    pub base_path: PathBuf,
    pub format: OutputFormat,
    /// File name prefix, completed with a local timestamp
    pub file_stem: String,
}

impl TrainingSetSinkConfig {
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, ContractError> {
        Ok(Self {
            base_path: super::base_path_param(params),
            format: super::format_param(params)?,
            file_stem: params
                .get("file_stem")
                .cloned()
                .unwrap_or_else(|| "training_set".to_string()),
        })
    }
}

/// Sink that accumulates batches and writes the assembled set on close
pub struct TrainingSetSink {
    name: String,
    config: TrainingSetSinkConfig,
    set: TrainingSet,
    output_path: Option<PathBuf>,
}

impl TrainingSetSink {
    pub fn new(name: impl Into<String>, config: TrainingSetSinkConfig) -> std::io::Result<Self> {
        fs::create_dir_all(&config.base_path)?;
        Ok(Self {
            name: name.into(),
            config,
            set: TrainingSet::new(),
            output_path: None,
        })
    }

    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> Result<Self, ContractError> {
        let config = TrainingSetSinkConfig::from_params(params)?;
        Ok(Self::new(name, config)?)
    }

    /// Snippets accumulated so far
    pub fn training_set(&self) -> &TrainingSet {
        &self.set
    }

    /// Written file, once closed
    pub fn output_path(&self) -> Option<&PathBuf> {
        self.output_path.as_ref()
    }

    fn stamped_path(&self) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        self.config.base_path.join(format!(
            "{}_{}.{}",
            self.config.file_stem,
            stamp,
            self.config.format.extension()
        ))
    }
}

impl DatasetSink for TrainingSetSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "training_set_sink_write",
        skip(self, batch),
        fields(sink = %self.name, episode_id = %batch.episode_id)
    )]
    async fn write(&mut self, batch: &SnippetBatch) -> Result<(), ContractError> {
        self.set
            .push_batch(batch)
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        Ok(())
    }

    #[instrument(name = "training_set_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "training_set_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if self.output_path.is_some() {
            return Ok(());
        }
        if self.set.is_empty() {
            warn!(sink = %self.name, "No snippets collected, training set not written");
            return Ok(());
        }

        let path = self.stamped_path();
        write_encoded(&path, &self.set, self.config.format)
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;

        info!(
            sink = %self.name,
            path = %path.display(),
            snippets = self.set.len(),
            shape = ?self.set.shape(),
            "Training set written"
        );
        self.output_path = Some(path);
        Ok(())
    }
}
