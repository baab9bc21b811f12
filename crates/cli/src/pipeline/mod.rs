//! Pipeline orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{discover_episodes, Pipeline, PipelineConfig};
pub use stats::RunStats;
