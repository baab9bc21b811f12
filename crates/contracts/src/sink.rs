//! DatasetSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for Sinks.

use crate::{ContractError, SnippetBatch};

/// Data output trait
///
/// All sink implementations must implement this trait.
#[trait_variant::make(DatasetSink: Send)]
pub trait LocalDatasetSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Write the snippets of one episode
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, batch: &SnippetBatch) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
