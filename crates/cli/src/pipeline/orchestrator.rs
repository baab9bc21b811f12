//! Pipeline orchestrator - runs every episode through the processor and
//! streams the resulting batches to the dispatcher.
//!
//! Episodes are processed on the blocking pool, `jobs` at a time. Results
//! are consumed in input order so the assembled training set is
//! reproducible regardless of scheduling.

use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{EpisodeId, PipelineBlueprint, SnippetBatch};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use trajectory_engine::EpisodeProcessor;

use super::RunStats;
use crate::error::CliError;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Effective blueprint (file plus CLI overrides)
    pub blueprint: PipelineBlueprint,

    /// Episode files, in processing order
    pub episodes: Vec<PathBuf>,

    /// Episodes processed concurrently
    pub jobs: usize,

    /// Channel buffer size between processing and the dispatcher
    pub buffer_size: usize,

    /// Abort on the first failing episode
    pub fail_fast: bool,
}

type EpisodeTask = (PathBuf, JoinHandle<Result<SnippetBatch, CliError>>);

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until every episode is processed or `shutdown` resolves
    ///
    /// Sinks are always drained and closed before returning, so a stopped
    /// run still writes what it has collected.
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<RunStats> {
        let start_time = Instant::now();
        let PipelineConfig {
            blueprint,
            episodes,
            jobs,
            buffer_size,
            fail_fast,
        } = self.config;

        let processor = Arc::new(
            EpisodeProcessor::from_blueprint(&blueprint)
                .context("Failed to build episode processor")?,
        );

        info!("Setting up dispatcher...");
        if blueprint.sinks.is_empty() {
            warn!("No sinks configured - snippet batches will be dropped");
        }
        let (batch_tx, batch_rx) = mpsc::channel::<SnippetBatch>(buffer_size.max(1));
        let dispatcher = dataset::create_dispatcher(blueprint.sinks.clone(), batch_rx)
            .context("Failed to create dispatcher")?;
        let dispatcher_handle = dispatcher.spawn();

        let mut stats = RunStats {
            episodes_found: episodes.len(),
            active_sinks: blueprint.sinks.len(),
            ..Default::default()
        };
        let jobs = jobs.max(1);
        info!(
            episodes = episodes.len(),
            jobs,
            sinks = stats.active_sinks,
            "Processing episodes"
        );

        let mut queued = episodes.into_iter();
        let mut in_flight: VecDeque<EpisodeTask> = VecDeque::with_capacity(jobs);
        let mut aborted: Option<CliError> = None;
        tokio::pin!(shutdown);

        loop {
            while in_flight.len() < jobs {
                let Some(path) = queued.next() else { break };
                in_flight.push_back(spawn_episode(Arc::clone(&processor), path));
            }
            let Some((path, task)) = in_flight.pop_front() else {
                break;
            };

            let outcome = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    warn!("Received shutdown signal, stopping");
                    stats.interrupted = true;
                    break;
                }
                joined = task => joined.unwrap_or_else(|e| Err(CliError::Worker {
                    path: path.clone(),
                    message: e.to_string(),
                })),
            };

            match outcome {
                Ok(batch) => {
                    debug!(episode = %path.display(), snippets = batch.len(), "Episode done");
                    stats.dataset.update(&batch.meta, batch.len());
                    observability::record_episode_processed(&batch.meta, batch.len());

                    if batch_tx.send(batch).await.is_err() {
                        warn!("Dispatcher channel closed");
                        break;
                    }
                }
                Err(e) if fail_fast => {
                    aborted = Some(e);
                    break;
                }
                Err(e) => {
                    let stage = e.stage();
                    warn!(
                        episode = %path.display(),
                        stage,
                        error = %e,
                        "Episode skipped"
                    );
                    stats.dataset.record_skip(stage);
                    observability::record_episode_skipped(stage);
                }
            }
        }

        // Blocking tasks cannot be cancelled; their results are discarded.
        drop(in_flight);

        info!("Shutting down dispatcher...");
        drop(batch_tx);
        stats.dispatch = dispatcher_handle
            .await
            .context("Dispatcher task failed")?;
        stats.duration = start_time.elapsed();

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            processed = stats.dataset.processed_episodes,
            skipped = stats.dataset.skipped_episodes,
            snippets = stats.dataset.total_snippets,
            "Pipeline shutdown complete"
        );

        if let Some(e) = aborted {
            return Err(anyhow::Error::new(e).context("Aborted on first failing episode"));
        }
        Ok(stats)
    }
}

fn spawn_episode(processor: Arc<EpisodeProcessor>, path: PathBuf) -> EpisodeTask {
    let task_path = path.clone();
    let task = tokio::task::spawn_blocking(move || process_file(&processor, &task_path));
    (path, task)
}

/// Read one episode file and turn it into its snippet batch
pub fn process_file(processor: &EpisodeProcessor, path: &Path) -> Result<SnippetBatch, CliError> {
    let content = std::fs::read_to_string(path).map_err(|source| CliError::EpisodeRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(processor.process_json(episode_id_for(path), &content)?)
}

/// Episode id: the file name without extension
pub fn episode_id_for(path: &Path) -> EpisodeId {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_else(|| path.to_string_lossy());
    EpisodeId::new(&stem)
}

/// Expand files and directories into the list of episode files
///
/// Directories contribute their `*.json` files (not recursive) in name
/// order; explicit files are kept as given. Duplicates are removed.
pub fn discover_episodes(paths: &[PathBuf]) -> Result<Vec<PathBuf>, CliError> {
    let mut seen = HashSet::new();
    let mut episodes = Vec::new();

    for path in paths {
        if !path.exists() {
            return Err(CliError::episode_not_found(path));
        }

        if path.is_dir() {
            let mut entries = Vec::new();
            for entry in std::fs::read_dir(path)? {
                let entry_path = entry?.path();
                if entry_path.is_file() && is_json(&entry_path) {
                    entries.push(entry_path);
                }
            }
            entries.sort();
            debug!(dir = %path.display(), files = entries.len(), "Scanned episode directory");
            for entry in entries {
                if seen.insert(entry.clone()) {
                    episodes.push(entry);
                }
            }
        } else if seen.insert(path.clone()) {
            episodes.push(path.clone());
        }
    }

    if episodes.is_empty() {
        return Err(CliError::NoEpisodes {
            paths: paths.to_vec(),
        });
    }
    Ok(episodes)
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
