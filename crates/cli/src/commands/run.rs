//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{PipelineBlueprint, SinkConfig, SinkType};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::pipeline::{discover_episodes, Pipeline, PipelineConfig, RunStats};

/// Name of the sink added by `--output` when the config has none
const DEFAULT_SINK_NAME: &str = "training_set";

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut blueprint, args);
    config_loader::ConfigLoader::validate(&blueprint)
        .context("Configuration invalid after command-line overrides")?;

    info!(
        n_hist = blueprint.snippets.n_hist,
        n_pred = blueprint.snippets.n_pred,
        n_skip = blueprint.snippets.n_skip,
        dt = blueprint.snippets.dt,
        ego_frame = blueprint.snippets.ego_frame,
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    let episodes = discover_episodes(&args.episodes).context("Failed to collect episodes")?;
    info!(episodes = episodes.len(), "Episodes discovered");

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_run_plan(&blueprint, &episodes);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
        info!("Metrics endpoint available on port {}", args.metrics_port);
    }

    let jobs = if args.jobs == 0 {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    } else {
        args.jobs
    };

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        episodes,
        jobs,
        buffer_size: args.buffer_size,
        fail_fast: args.fail_fast,
    });

    info!("Starting pipeline...");
    let stats = pipeline
        .run(shutdown_signal())
        .await
        .context("Pipeline execution failed")?;

    info!(
        processed = stats.dataset.processed_episodes,
        skipped = stats.dataset.skipped_episodes,
        snippets = stats.dataset.total_snippets,
        duration_secs = stats.duration.as_secs_f64(),
        "Pipeline completed"
    );
    stats.print_summary();

    if stats.interrupted {
        warn!("Run was interrupted; outputs hold the episodes processed before the signal");
    }
    ensure_delivered(&stats)?;

    info!("Intent Snippets finished");
    Ok(())
}

/// Fail the run when any sink lost or failed to write a batch
fn ensure_delivered(stats: &RunStats) -> Result<()> {
    let incomplete: Vec<&str> = stats
        .dispatch
        .sinks
        .iter()
        .filter(|(_, m)| !m.is_complete())
        .map(|(name, _)| name.as_str())
        .collect();
    if !incomplete.is_empty() {
        anyhow::bail!("Sinks did not write every batch: {}", incomplete.join(", "));
    }
    Ok(())
}

/// Fold command-line overrides into the loaded blueprint
fn apply_overrides(blueprint: &mut PipelineBlueprint, args: &RunArgs) {
    let snippets = &mut blueprint.snippets;
    if let Some(n_hist) = args.n_hist {
        info!(n_hist, "Overriding n_hist from CLI");
        snippets.n_hist = n_hist;
    }
    if let Some(n_pred) = args.n_pred {
        info!(n_pred, "Overriding n_pred from CLI");
        snippets.n_pred = n_pred;
    }
    if let Some(n_skip) = args.n_skip {
        info!(n_skip, "Overriding n_skip from CLI");
        snippets.n_skip = n_skip;
    }
    if let Some(dt) = args.dt {
        info!(dt, "Overriding dt from CLI");
        snippets.dt = dt;
    }
    if let Some(ego_frame) = args.ego_frame {
        info!(ego_frame, "Overriding ego_frame from CLI");
        snippets.ego_frame = ego_frame;
    }

    if let Some(ref output) = args.output {
        redirect_output(blueprint, output);
    }
}

/// Point every file-based sink at `output`, adding a training-set sink when
/// none writes to disk
fn redirect_output(blueprint: &mut PipelineBlueprint, output: &Path) {
    let base_path = output.to_string_lossy().to_string();
    let mut redirected = 0usize;

    for sink in &mut blueprint.sinks {
        if matches!(sink.sink_type, SinkType::File | SinkType::TrainingSet) {
            sink.params
                .insert("base_path".to_string(), base_path.clone());
            redirected += 1;
        }
    }

    if redirected == 0 {
        info!(output = %base_path, "No file-based sink configured, adding training-set sink");
        blueprint.sinks.push(SinkConfig {
            name: DEFAULT_SINK_NAME.to_string(),
            sink_type: SinkType::TrainingSet,
            queue_capacity: 100,
            params: HashMap::from([("base_path".to_string(), base_path)]),
        });
    } else {
        info!(output = %base_path, sinks = redirected, "Overriding sink output directory from CLI");
    }
}

/// Resolve on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed never resolves.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print the plan for dry-run mode
fn print_run_plan(blueprint: &PipelineBlueprint, episodes: &[std::path::PathBuf]) {
    println!("\n=== Run Plan ===\n");
    println!("Snippets:");
    println!(
        "  n_hist={} n_pred={} n_skip={} dt={}s ego_frame={}",
        blueprint.snippets.n_hist,
        blueprint.snippets.n_pred,
        blueprint.snippets.n_skip,
        blueprint.snippets.dt,
        blueprint.snippets.ego_frame
    );

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            match sink.params.get("base_path") {
                Some(base) => println!("  - {} ({:?}) -> {}", sink.name, sink.sink_type, base),
                None => println!("  - {} ({:?})", sink.name, sink.sink_type),
            }
        }
    }

    println!("\nEpisodes ({}):", episodes.len());
    for episode in episodes {
        println!("  - {}", episode.display());
    }

    println!();
}
