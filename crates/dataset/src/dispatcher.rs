//! Dispatcher - fans episode batches out to sinks

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

use contracts::{SinkConfig, SinkType, SnippetBatch};

use crate::error::DatasetError;
use crate::handle::SinkHandle;
use crate::metrics::MetricsSnapshot;
use crate::sinks::{FileSink, LogSink, TrainingSetSink};

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub sinks: Vec<SinkConfig>,
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    input_rx: mpsc::Receiver<SnippetBatch>,
}

impl DispatcherBuilder {
    pub fn new(config: DispatcherConfig, input_rx: mpsc::Receiver<SnippetBatch>) -> Self {
        Self { config, input_rx }
    }

    /// Create every sink and start its worker
    #[instrument(name = "dispatcher_builder_build", skip(self))]
    pub fn build(self) -> Result<Dispatcher, DatasetError> {
        let mut handles = Vec::with_capacity(self.config.sinks.len());
        for sink_config in &self.config.sinks {
            handles.push(create_sink_handle(sink_config)?);
        }

        Ok(Dispatcher {
            handles,
            input_rx: self.input_rx,
        })
    }
}

/// Create a SinkHandle from configuration
#[instrument(
    name = "dispatcher_create_sink_handle",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
fn create_sink_handle(config: &SinkConfig) -> Result<SinkHandle, DatasetError> {
    let creation_error = |e: contracts::ContractError| {
        DatasetError::sink_creation(&config.name, e.to_string())
    };

    match config.sink_type {
        SinkType::Log => {
            let sink = LogSink::new(&config.name);
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params).map_err(creation_error)?;
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
        SinkType::TrainingSet => {
            let sink =
                TrainingSetSink::from_params(&config.name, &config.params).map_err(creation_error)?;
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
    }
}

/// Per-sink delivery totals after shutdown
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub batches: u64,
    pub sinks: Vec<(String, MetricsSnapshot)>,
}

impl DispatchReport {
    /// Every sink wrote every batch
    pub fn is_complete(&self) -> bool {
        self.sinks.iter().all(|(_, m)| m.is_complete())
    }
}

/// Fans batches out to every sink
pub struct Dispatcher {
    handles: Vec<SinkHandle>,
    input_rx: mpsc::Receiver<SnippetBatch>,
}

impl Dispatcher {
    /// Create a dispatcher with custom sink handles (for testing)
    pub fn with_handles(handles: Vec<SinkHandle>, input_rx: mpsc::Receiver<SnippetBatch>) -> Self {
        Self { handles, input_rx }
    }

    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        snapshot(&self.handles)
    }

    /// Run until the input channel closes, then drain and close every sink
    #[instrument(name = "dispatcher_run", skip(self))]
    pub async fn run(mut self) -> DispatchReport {
        info!(sinks = self.handles.len(), "Dispatcher started");

        let mut batch_count: u64 = 0;

        while let Some(batch) = self.input_rx.recv().await {
            batch_count += 1;
            let batch = Arc::new(batch);
            for handle in &self.handles {
                handle.send(Arc::clone(&batch)).await;
            }

            if batch_count % 100 == 0 {
                debug!(batches = batch_count, "Dispatcher progress");
            }
        }

        info!(
            batches = batch_count,
            "Dispatcher input closed, shutting down"
        );

        let metrics: Vec<_> = self
            .handles
            .iter()
            .map(|h| (h.name().to_string(), Arc::clone(h.metrics())))
            .collect();
        for handle in self.handles {
            handle.shutdown().await;
        }

        info!("Dispatcher shutdown complete");

        DispatchReport {
            batches: batch_count,
            sinks: metrics
                .into_iter()
                .map(|(name, m)| (name, m.snapshot()))
                .collect(),
        }
    }

    /// Spawn the dispatcher as a background task
    pub fn spawn(self) -> JoinHandle<DispatchReport> {
        tokio::spawn(self.run())
    }
}

fn snapshot(handles: &[SinkHandle]) -> Vec<(String, MetricsSnapshot)> {
    handles
        .iter()
        .map(|h| (h.name().to_string(), h.metrics().snapshot()))
        .collect()
}

/// Create a dispatcher from sink configs
#[instrument(name = "dispatcher_create", skip(sink_configs, input_rx))]
pub fn create_dispatcher(
    sink_configs: Vec<SinkConfig>,
    input_rx: mpsc::Receiver<SnippetBatch>,
) -> Result<Dispatcher, DatasetError> {
    let config = DispatcherConfig {
        sinks: sink_configs,
    };
    DispatcherBuilder::new(config, input_rx).build()
}
