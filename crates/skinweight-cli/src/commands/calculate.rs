//! Calculate command implementation
//!
//! Loads a scene, infers weights for a mesh from a root bone, and writes or
//! prints them.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;
use skinweight_data::{JsonLayout, ReportableError};
use skinweight_solver::{calculate_to_file, CalculationReport, MemoryScene, SolverConfig};

use super::json_output::{
    error_codes, warning_codes, CalculateResult, CommandOutput, JsonError, JsonWarning,
};
use super::settings::ConfigOverrides;

/// Options for the calculate command.
#[derive(Debug, Clone, Default)]
pub struct CalculateOptions {
    pub scene: String,
    pub mesh: String,
    pub root: String,
    pub output: Option<String>,
    /// Indent the weights file written to `output`.
    pub pretty: bool,
    pub config: Option<String>,
    pub overrides: ConfigOverrides,
    pub json: bool,
}

impl CalculateOptions {
    fn layout(&self) -> JsonLayout {
        if self.pretty {
            JsonLayout::Pretty
        } else {
            JsonLayout::Compact
        }
    }
}

/// Run the calculate command
///
/// # Returns
/// Exit code: 0 if weights were calculated, 1 otherwise
pub fn run(options: &CalculateOptions) -> Result<ExitCode> {
    if options.json {
        run_json(options)
    } else {
        run_human(options)
    }
}

fn run_human(options: &CalculateOptions) -> Result<ExitCode> {
    let config = options.overrides.resolve(options.config.as_deref())?;

    println!(
        "{} {} (root {})",
        "Calculating:".cyan().bold(),
        options.mesh,
        options.root
    );

    let mut scene = MemoryScene::from_file(&options.scene)
        .with_context(|| format!("Failed to load scene file: {}", options.scene))?;

    let report = match run_calculation(&mut scene, options, &config) {
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

    println!("{} {}", "Bones:".dimmed(), report.bones.join(", "));
    println!(
        "{} {}/{}",
        "Weighted vertices:".dimmed(),
        report.data.vertex_count(),
        report.vertex_count
    );
    if !report.unweighted_vertices.is_empty() {
        println!(
            "  {} {} vertex(es) received no weight",
            "!".yellow(),
            report.unweighted_vertices.len()
        );
    }
    if !report.normalization_failures.is_empty() {
        println!(
            "  {} {} vertex(es) did not normalize exactly to 1.0",
            "!".yellow(),
            report.normalization_failures.len()
        );
    }

    match &options.output {
        Some(path) => println!("{} {}", "Weights written to:".dimmed(), path),
        None => println!("\n{}", report.data.to_json_pretty()?),
    }

    println!("\n{} {}", "SUCCESS".green().bold(), report.message);
    Ok(ExitCode::SUCCESS)
}

fn run_json(options: &CalculateOptions) -> Result<ExitCode> {
    let config = match options.overrides.resolve(options.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            let error = JsonError::new(error_codes::INVALID_ARGUMENT, format!("{:#}", err));
            CommandOutput::<CalculateResult>::failure(vec![error], vec![]).print()?;
            return Ok(ExitCode::from(1));
        }
    };

    let mut scene = match MemoryScene::from_file(&options.scene) {
        Ok(scene) => scene,
        Err(err) => {
            CommandOutput::<CalculateResult>::failure(vec![JsonError::from_reportable(&err)], vec![])
                .print()?;
            return Ok(ExitCode::from(1));
        }
    };

    match run_calculation(&mut scene, options, &config) {
        Ok(report) => {
            let warnings = report_warnings(&report);
            let result = CalculateResult::from_report(&report, options.output.as_deref())?;
            CommandOutput::success(result, warnings).print()?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            CommandOutput::<CalculateResult>::failure(vec![JsonError::from_reportable(&err)], vec![])
                .print()?;
            Ok(ExitCode::from(1))
        }
    }
}

fn run_calculation(
    scene: &mut MemoryScene,
    options: &CalculateOptions,
    config: &SolverConfig,
) -> skinweight_solver::SolverResult<CalculationReport> {
    calculate_to_file(
        scene,
        &options.mesh,
        &options.root,
        config,
        options.output.as_deref().map(Path::new),
        options.layout(),
    )
}

fn report_warnings(report: &CalculationReport) -> Vec<JsonWarning> {
    let mut warnings = Vec::new();
    if !report.unweighted_vertices.is_empty() {
        warnings.push(JsonWarning::new(
            warning_codes::UNWEIGHTED_VERTICES,
            format!(
                "{} vertex(es) received no weight",
                report.unweighted_vertices.len()
            ),
        ));
    }
    if !report.normalization_failures.is_empty() {
        warnings.push(JsonWarning::new(
            warning_codes::NORMALIZATION_DRIFT,
            format!(
                "{} vertex(es) did not normalize exactly to 1.0",
                report.normalization_failures.len()
            ),
        ));
    }
    warnings
}
