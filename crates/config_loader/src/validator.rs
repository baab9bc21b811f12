//! Configuration validation
//!
//! Rules:
//! - derive rules on each section (`n_hist`/`n_pred`/`n_skip` >= 1, `dt` > 0, threshold >= 0)
//! - numeric options are finite
//! - sink names non-empty and unique
//! - sink `format` parameter names a known format

use std::collections::HashSet;

use contracts::{ContractError, OutputFormat, PipelineBlueprint};
use validator::{Validate, ValidationErrors};

/// Validate a PipelineBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    validate_reconstruction(blueprint)?;
    validate_snippets(blueprint)?;
    validate_sinks(blueprint)?;
    Ok(())
}

/// Map derive-rule failures onto the first offending field
fn section_error(section: &str, errors: ValidationErrors) -> ContractError {
    let mut fields: Vec<String> = errors
        .field_errors()
        .keys()
        .map(|k| k.to_string())
        .collect();
    fields.sort();
    let field = match fields.first() {
        Some(name) => format!("{section}.{name}"),
        None => section.to_string(),
    };
    ContractError::config_validation(field, errors.to_string())
}

fn validate_reconstruction(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    let reconstruction = &blueprint.reconstruction;
    if !reconstruction.min_vel_thresh.is_finite() {
        return Err(ContractError::config_validation(
            "reconstruction.min_vel_thresh",
            format!("must be finite, got {}", reconstruction.min_vel_thresh),
        ));
    }
    reconstruction
        .validate()
        .map_err(|e| section_error("reconstruction", e))
}

fn validate_snippets(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    let snippets = &blueprint.snippets;
    if !snippets.dt.is_finite() {
        return Err(ContractError::config_validation(
            "snippets.dt",
            format!("must be finite, got {}", snippets.dt),
        ));
    }
    snippets.validate().map_err(|e| section_error("snippets", e))
}

fn validate_sinks(blueprint: &PipelineBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{}].name", idx),
                "sink name cannot be empty",
            ));
        }
        if !seen.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }
        if let Some(format) = sink.params.get("format") {
            if OutputFormat::from_param(format).is_none() {
                return Err(ContractError::config_validation(
                    format!("sinks[{}].params.format", sink.name),
                    format!("unknown output format '{format}'"),
                ));
            }
        }
        if sink.queue_capacity == 0 {
            return Err(ContractError::config_validation(
                format!("sinks[{}].queue_capacity", sink.name),
                "queue_capacity must be > 0",
            ));
        }
    }
    Ok(())
}
