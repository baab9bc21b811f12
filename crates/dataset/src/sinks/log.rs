//! LogSink - logs batch summaries via tracing

use contracts::{ContractError, DatasetSink, SnippetBatch};
use tracing::{info, instrument};

/// Sink that logs one summary line per episode batch
pub struct LogSink {
    name: String,
    batches: u64,
    snippets: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            batches: 0,
            snippets: 0,
        }
    }

    fn log_batch_summary(&self, batch: &SnippetBatch) {
        info!(
            sink = %self.name,
            episode_id = %batch.episode_id,
            snippets = batch.len(),
            goal_index = batch.meta.goal_index,
            num_goals = batch.meta.num_goals,
            ego_frame = batch.meta.ego_frame,
            clamped_queries = batch.meta.clamped_queries,
            usable_duration = batch.meta.usable_duration,
            "SnippetBatch received"
        );
    }
}

impl DatasetSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, batch),
        fields(sink = %self.name, episode_id = %batch.episode_id)
    )]
    async fn write(&mut self, batch: &SnippetBatch) -> Result<(), ContractError> {
        self.batches += 1;
        self.snippets += batch.len() as u64;
        self.log_batch_summary(batch);
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(
            sink = %self.name,
            batches = self.batches,
            snippets = self.snippets,
            "LogSink closed"
        );
        Ok(())
    }
}
