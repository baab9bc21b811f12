//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{PipelineBlueprint, SinkType};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    n_hist: usize,
    n_pred: usize,
    n_skip: usize,
    dt: f64,
    ego_frame: bool,
    sink_count: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            let snippets = &blueprint.snippets;

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    n_hist: snippets.n_hist,
                    n_pred: snippets.n_pred,
                    n_skip: snippets.n_skip,
                    dt: snippets.dt,
                    ego_frame: snippets.ego_frame,
                    sink_count: blueprint.sinks.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &PipelineBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.sinks.is_empty() {
        warnings.push(
            "No sinks configured - batches will be dropped unless --output is given".to_string(),
        );
    } else if !blueprint
        .sinks
        .iter()
        .any(|s| s.sink_type == SinkType::TrainingSet)
    {
        warnings.push("No training_set sink configured - no assembled training set will be written".to_string());
    }

    let reconstruction = &blueprint.reconstruction;
    if !reconstruction.prune_start && !reconstruction.prune_end {
        warnings.push(
            "reconstruction.prune_start and prune_end are both off - stationary samples are kept"
                .to_string(),
        );
    }
    if reconstruction.min_vel_thresh == 0.0 {
        warnings.push("reconstruction.min_vel_thresh is 0 - any motion counts as moving".to_string());
    }

    if !blueprint.snippets.ego_frame {
        warnings.push("snippets.ego_frame is off - ego arrays hold global coordinates".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!(
                "  Window: {} history / {} future samples at {}s",
                summary.n_hist, summary.n_pred, summary.dt
            );
            println!("  Stride: {} samples", summary.n_skip);
            println!("  Ego frame: {}", summary.ego_frame);
            println!("  Sinks: {}", summary.sink_count);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
