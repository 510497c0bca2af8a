//! Validate command implementation
//!
//! Checks a weights file structurally and reports consistency warnings.

use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;
use skinweight_data::{load_value, validate_data, SkinWeightData, ValidationResult};

use super::json_output::{CommandOutput, JsonError, JsonWarning, ValidateResult};

/// Run the validate command
///
/// # Arguments
/// * `weights_path` - Path to the weights file
/// * `json_output` - Whether to output machine-readable JSON diagnostics
///
/// # Returns
/// Exit code: 0 if valid, 1 if invalid
pub fn run(weights_path: &str, json_output: bool) -> Result<ExitCode> {
    if json_output {
        run_json(weights_path)
    } else {
        run_human(weights_path)
    }
}

/// Validates a parsed document: structure first, then consistency of the
/// decoded data when the structure is sound.
pub fn validate_document(value: serde_json::Value) -> (ValidationResult, Option<SkinWeightData>) {
    let mut result = skinweight_data::validate_value(&value);
    if !result.is_ok() {
        return (result, None);
    }
    match serde_json::from_value::<SkinWeightData>(value) {
        Ok(data) => {
            let consistency = validate_data(&data);
            // The consistency pass repeats every structural warning.
            result.warnings.clear();
            result.merge(consistency);
            (result, Some(data))
        }
        Err(err) => {
            result.add_error(skinweight_data::ValidationError::new(
                skinweight_data::ErrorCode::MalformedWeightEntry,
                err.to_string(),
            ));
            (result, None)
        }
    }
}

fn run_human(weights_path: &str) -> Result<ExitCode> {
    println!("{} {}", "Validating:".cyan().bold(), weights_path);

    let value = load_value(weights_path)
        .with_context(|| format!("Failed to load weights file: {}", weights_path))?;
    let (result, data) = validate_document(value);

    print_validation_results(&result);

    let (valid, reason) = result.summary();
    if valid {
        if let Some(data) = &data {
            println!(
                "{} {} vertex(es), {} bone(s)",
                "Contents:".dimmed(),
                data.vertex_count(),
                data.order.len()
            );
        }
        println!("\n{} {}", "SUCCESS".green().bold(), reason);
        Ok(ExitCode::SUCCESS)
    } else {
        println!(
            "\n{} Data has {} error(s)",
            "FAILED".red().bold(),
            result.errors.len()
        );
        Ok(ExitCode::from(1))
    }
}

fn run_json(weights_path: &str) -> Result<ExitCode> {
    let value = match load_value(weights_path) {
        Ok(value) => value,
        Err(err) => {
            CommandOutput::<ValidateResult>::failure(vec![JsonError::from_reportable(&err)], vec![])
                .print()?;
            return Ok(ExitCode::from(1));
        }
    };

    let (result, data) = validate_document(value);
    let errors: Vec<JsonError> = result.errors.iter().map(JsonError::from).collect();
    let warnings: Vec<JsonWarning> = result.warnings.iter().map(JsonWarning::from).collect();

    let (valid, reason) = result.summary();
    let output = if valid {
        CommandOutput::success(
            ValidateResult {
                reason,
                vertex_count: data.as_ref().map(SkinWeightData::vertex_count),
                bone_count: data.as_ref().map(|d| d.order.len()),
            },
            warnings,
        )
    } else {
        CommandOutput::failure(errors, warnings)
    };
    output.print()?;

    Ok(if valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn print_validation_results(result: &ValidationResult) {
    if !result.errors.is_empty() {
        println!("\n{}", "Errors:".red().bold());
        for error in &result.errors {
            let path_info = error
                .path
                .as_ref()
                .map(|p| format!(" at {}", p))
                .unwrap_or_default();
            println!(
                "  {} [{}]{}: {}",
                "x".red(),
                error.code.to_string().red(),
                path_info.dimmed(),
                error.message
            );
        }
    }

    if !result.warnings.is_empty() {
        println!("\n{}", "Warnings:".yellow().bold());
        for warning in &result.warnings {
            let path_info = warning
                .path
                .as_ref()
                .map(|p| format!(" at {}", p))
                .unwrap_or_default();
            println!(
                "  {} [{}]{}: {}",
                "!".yellow(),
                warning.code.to_string().yellow(),
                path_info.dimmed(),
                warning.message
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use skinweight_data::{ErrorCode, WarningCode};

    #[test]
    fn test_order_of_integers_is_invalid() {
        let (result, data) = validate_document(json!({"order": [1, 2]}));
        assert!(data.is_none());
        assert!(result.has_error(ErrorCode::BoneNameNotString));
        let (valid, reason) = result.summary();
        assert!(!valid);
        assert!(reason.contains("bone names must be strings"));
    }

    #[test]
    fn test_valid_document_reports_consistency_warnings() {
        let (result, data) = validate_document(json!({
            "weight": {"0": [["spine", 0.5], ["head", 0.5]]},
            "order": ["spine"]
        }));
        assert!(result.is_ok());
        assert!(result.has_warning(WarningCode::BoneMissingFromOrder));
        assert_eq!(data.unwrap().vertex_count(), 1);
    }

    #[test]
    fn test_run_exit_codes() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        std::fs::write(&good, r#"{"weight": {}, "order": []}"#).unwrap();
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"order": [1, 2]}"#).unwrap();

        assert_eq!(run(good.to_str().unwrap(), true).unwrap(), ExitCode::SUCCESS);
        assert_eq!(run(bad.to_str().unwrap(), true).unwrap(), ExitCode::from(1));
        assert_eq!(run(bad.to_str().unwrap(), false).unwrap(), ExitCode::from(1));
    }
}
