//! Apply command implementation
//!
//! Applies weight data (a weights file, inline JSON, or both) to a mesh's
//! skin and writes the updated scene.

use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;
use skinweight_data::ReportableError;
use skinweight_solver::{apply, ApplyReport, DataSource, MemoryScene, SolverConfig};

use super::json_output::{
    error_codes, warning_codes, ApplyResult, CommandOutput, JsonError, JsonWarning,
};
use super::settings::ConfigOverrides;

/// Options for the apply command.
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    pub scene: String,
    pub mesh: String,
    /// Path to a weights file.
    pub weights: Option<String>,
    /// Inline weight data as a JSON string.
    pub data: Option<String>,
    /// Where to write the updated scene. Defaults to `scene`.
    pub output: Option<String>,
    pub config: Option<String>,
    pub overrides: ConfigOverrides,
    pub json: bool,
}

impl ApplyOptions {
    fn scene_output(&self) -> &str {
        self.output.as_deref().unwrap_or(&self.scene)
    }

    fn data_source(&self) -> Result<DataSource> {
        let inline = self
            .data
            .as_deref()
            .map(serde_json::from_str::<serde_json::Value>)
            .transpose()
            .context("Failed to parse --data as JSON")?;
        Ok(DataSource {
            inline,
            path: self.weights.as_ref().map(Into::into),
        })
    }
}

/// Run the apply command
///
/// # Returns
/// Exit code: 0 if the run completed (even with vertex failures), 1 otherwise
pub fn run(options: &ApplyOptions) -> Result<ExitCode> {
    if options.json {
        run_json(options)
    } else {
        run_human(options)
    }
}

fn run_human(options: &ApplyOptions) -> Result<ExitCode> {
    let config = options.overrides.resolve(options.config.as_deref())?;
    let source = options.data_source()?;

    println!("{} {}", "Applying to:".cyan().bold(), options.mesh);

    let mut scene = MemoryScene::from_file(&options.scene)
        .with_context(|| format!("Failed to load scene file: {}", options.scene))?;

    let report = match apply(&mut scene, &options.mesh, &source, &config) {
        Ok(report) => report,
        Err(err) => {
            println!(
                "\n{} [{}] {}",
                "FAILED".red().bold(),
                err.code().red(),
                err.message()
            );
            return Ok(ExitCode::from(1));
        }
    };

    scene
        .write_file(options.scene_output())
        .with_context(|| format!("Failed to write scene file: {}", options.scene_output()))?;

    println!("{} {}", "Vertices applied:".dimmed(), report.vertices_applied);
    for bone in &report.unordered_bones {
        println!(
            "  {} bone {} is weighted but missing from order; its prior influence was kept",
            "!".yellow(),
            bone
        );
    }
    if report.threshold_exceeded {
        println!(
            "\n{} {} vertex(es) failed:",
            "WARNING".yellow().bold(),
            report.failed_vertices.len()
        );
        for failure in &report.failures {
            println!("  {} {}", "x".red(), failure);
        }
    }
    println!("{} {}", "Scene written to:".dimmed(), options.scene_output());

    println!("\n{} {}", "SUCCESS".green().bold(), report.message);
    Ok(ExitCode::SUCCESS)
}

fn run_json(options: &ApplyOptions) -> Result<ExitCode> {
    let prepared = options
        .overrides
        .resolve(options.config.as_deref())
        .and_then(|config| Ok((config, options.data_source()?)));
    let (config, source) = match prepared {
        Ok(prepared) => prepared,
        Err(err) => {
            let error = JsonError::new(error_codes::INVALID_ARGUMENT, format!("{:#}", err));
            CommandOutput::<ApplyResult>::failure(vec![error], vec![]).print()?;
            return Ok(ExitCode::from(1));
        }
    };

    match run_apply(options, &config, &source) {
        Ok((report, scene)) => {
            if let Err(err) = write_scene_output(options, &scene) {
                let error = JsonError::new(error_codes::FILE_WRITE, format!("{:#}", err));
                CommandOutput::<ApplyResult>::failure(vec![error], vec![]).print()?;
                return Ok(ExitCode::from(1));
            }
            let warnings = report_warnings(&report);
            let result = ApplyResult::from_report(&report, options.scene_output());
            CommandOutput::success(result, warnings).print()?;
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            CommandOutput::<ApplyResult>::failure(vec![error], vec![]).print()?;
            Ok(ExitCode::from(1))
        }
    }
}

fn run_apply(
    options: &ApplyOptions,
    config: &SolverConfig,
    source: &DataSource,
) -> std::result::Result<(ApplyReport, MemoryScene), JsonError> {
    let mut scene =
        MemoryScene::from_file(&options.scene).map_err(|err| JsonError::from_reportable(&err))?;
    let report = apply(&mut scene, &options.mesh, source, config)
        .map_err(|err| JsonError::from_reportable(&err))?;
    Ok((report, scene))
}

fn write_scene_output(options: &ApplyOptions, scene: &MemoryScene) -> Result<()> {
    scene
        .write_file(options.scene_output())
        .with_context(|| format!("Failed to write scene file: {}", options.scene_output()))
}

fn report_warnings(report: &ApplyReport) -> Vec<JsonWarning> {
    let mut warnings: Vec<JsonWarning> = report
        .unordered_bones
        .iter()
        .map(|bone| {
            JsonWarning::new(
                skinweight_data::WarningCode::BoneMissingFromOrder.code(),
                format!(
                    "bone \"{}\" is weighted but missing from order; its prior influence was kept",
                    bone
                ),
            )
        })
        .collect();
    if report.threshold_exceeded {
        warnings.push(JsonWarning::new(
            warning_codes::FAILURE_THRESHOLD,
            format!(
                "{} vertex(es) failed with {} distinct failure(s)",
                report.failed_vertices.len(),
                report.failures.len()
            ),
        ));
    }
    warnings
}
