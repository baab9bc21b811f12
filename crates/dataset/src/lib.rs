//! # Dataset
//!
//! Training-set assembly and batch distribution.
//!
//! Responsible for:
//! - Concatenating per-episode `SnippetBatch`es into the trainer's arrays
//! - Fan-out of batches to multiple sinks
//! - Isolating slow or failing sinks from each other

pub mod dispatcher;
pub mod encode;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod sinks;
pub mod training_set;

pub use contracts::{DatasetSink, SnippetBatch};
pub use dispatcher::{
    create_dispatcher, DispatchReport, Dispatcher, DispatcherBuilder, DispatcherConfig,
};
pub use error::DatasetError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use sinks::{FileSink, FileSinkConfig, LogSink, TrainingSetSink, TrainingSetSinkConfig};
pub use training_set::{TrainingSet, TrainingSetShape};
