//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::PipelineBlueprint;
use tracing::info;

use crate::cli::InfoArgs;

/// Execute the `info` command
///
/// Prints the effective configuration, defaults filled in.
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let json = config_loader::ConfigLoader::to_json(&blueprint)
            .context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint);
    }

    Ok(())
}

fn print_config_info(blueprint: &PipelineBlueprint) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║              Intent Snippets Configuration                   ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let reconstruction = &blueprint.reconstruction;
    println!("Reconstruction");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Prune start: {}", reconstruction.prune_start);
    println!("   ├─ Prune end: {}", reconstruction.prune_end);
    println!("   ├─ Min velocity: {} m/s", reconstruction.min_vel_thresh);
    println!(
        "   └─ Exclude collisions: {}",
        reconstruction.exclude_collisions
    );

    let snippets = &blueprint.snippets;
    println!("\nSnippets");
    println!(
        "   ├─ History: {} samples ({:.2}s)",
        snippets.n_hist,
        snippets.n_hist as f64 * snippets.dt
    );
    println!(
        "   ├─ Future: {} samples ({:.2}s)",
        snippets.n_pred,
        snippets.n_pred as f64 * snippets.dt
    );
    println!(
        "   ├─ Stride: {} samples ({:.2}s)",
        snippets.n_skip,
        snippets.n_skip as f64 * snippets.dt
    );
    println!("   ├─ dt: {}s", snippets.dt);
    println!("   └─ Ego frame: {}", snippets.ego_frame);

    if blueprint.sinks.is_empty() {
        println!("\nSinks: none");
    } else {
        println!("\nSinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let is_last = i == blueprint.sinks.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            let child_prefix = if is_last { "   " } else { "│  " };

            println!(
                "   {} {} ({:?}, queue {})",
                prefix, sink.name, sink.sink_type, sink.queue_capacity
            );

            let mut params: Vec<_> = sink.params.iter().collect();
            params.sort();
            for (j, (key, value)) in params.iter().enumerate() {
                let param_prefix = if j == params.len() - 1 { "└─" } else { "├─" };
                println!("   {}  {} {} = {}", child_prefix, param_prefix, key, value);
            }
        }
    }

    println!();
}
