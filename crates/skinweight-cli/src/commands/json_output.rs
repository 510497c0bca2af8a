//! JSON output types for machine-readable CLI output.
//!
//! Every command accepts `--json` and prints exactly one of these documents
//! to stdout. Logging still goes to stderr.

use serde::{Deserialize, Serialize};
use skinweight_data::{ReportableError, ValidationError, ValidationWarning};
use skinweight_solver::{ApplyReport, CalculationReport};

/// Error codes for CLI-level failures.
///
/// Library failures pass through their own codes (`DATA_###`, `SOLVER_###`,
/// `E###`).
pub mod error_codes {
    /// Command-line value could not be interpreted
    pub const INVALID_ARGUMENT: &str = "CLI_001";
    /// File could not be written
    pub const FILE_WRITE: &str = "CLI_002";
}

/// Warning codes for CLI-level conditions.
pub mod warning_codes {
    /// Some vertices received no weight
    pub const UNWEIGHTED_VERTICES: &str = "CLI_W001";
    /// Distinct assignment failures exceeded the threshold
    pub const FAILURE_THRESHOLD: &str = "CLI_W002";
    /// Some vertices did not normalize exactly to 1.0
    pub const NORMALIZATION_DRIFT: &str = "CLI_W003";
}

/// A structured error in JSON output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonError {
    /// Stable error code (e.g., "SOLVER_003", "E005")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// JSON path to the problematic field (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl JsonError {
    /// Creates a new error with code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            path: None,
        }
    }

    /// Builds an error from any library error with a stable code.
    pub fn from_reportable(error: &dyn ReportableError) -> Self {
        Self::new(error.code(), error.message())
    }
}

impl From<&ValidationError> for JsonError {
    fn from(error: &ValidationError) -> Self {
        Self {
            code: error.code.code().to_string(),
            message: error.message.clone(),
            path: error.path.clone(),
        }
    }
}

/// A structured warning in JSON output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JsonWarning {
    /// Stable warning code (e.g., "W001", "CLI_W002")
    pub code: String,
    /// Human-readable warning message
    pub message: String,
    /// JSON path to the problematic field (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl JsonWarning {
    /// Creates a new warning with code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            path: None,
        }
    }
}

impl From<&ValidationWarning> for JsonWarning {
    fn from(warning: &ValidationWarning) -> Self {
        Self {
            code: warning.code.code().to_string(),
            message: warning.message.clone(),
            path: warning.path.clone(),
        }
    }
}

/// Command output envelope shared by every command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutput<T> {
    /// Whether the command succeeded
    pub success: bool,
    /// Errors that made the command fail
    pub errors: Vec<JsonError>,
    /// Non-fatal conditions worth reporting
    pub warnings: Vec<JsonWarning>,
    /// Command-specific result (on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
}

impl<T> CommandOutput<T> {
    /// Creates a successful output.
    pub fn success(result: T, warnings: Vec<JsonWarning>) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            warnings,
            result: Some(result),
        }
    }

    /// Creates a failed output.
    pub fn failure(errors: Vec<JsonError>, warnings: Vec<JsonWarning>) -> Self {
        Self {
            success: false,
            errors,
            warnings,
            result: None,
        }
    }
}

impl<T: Serialize> CommandOutput<T> {
    /// Prints the output as pretty JSON.
    pub fn print(&self) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }
}

/// Result of the `calculate` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateResult {
    /// Summary message
    pub message: String,
    /// Bones processed, in hierarchy order
    pub bones: Vec<String>,
    /// Vertices in the mesh
    pub vertex_count: usize,
    /// Vertices that received weights
    pub weighted_vertices: usize,
    /// Vertices that received no weight
    pub unweighted_vertices: Vec<usize>,
    /// Vertices whose normalized total drifted from 1.0
    pub normalization_failures: Vec<usize>,
    /// File the weights were written to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// The weights, when no output file was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl CalculateResult {
    /// Summarizes a calculation report.
    pub fn from_report(report: &CalculationReport, output: Option<&str>) -> anyhow::Result<Self> {
        let data = match output {
            Some(_) => None,
            None => Some(report.data.to_value()?),
        };
        Ok(Self {
            message: report.message.clone(),
            bones: report.bones.clone(),
            vertex_count: report.vertex_count,
            weighted_vertices: report.data.vertex_count(),
            unweighted_vertices: report.unweighted_vertices.clone(),
            normalization_failures: report.normalization_failures.clone(),
            output: output.map(str::to_string),
            data,
        })
    }
}

/// Result of the `apply` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyResult {
    /// "Success" whenever the run completed
    pub message: String,
    /// Where the data came from ("inline" or "file")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Vertices whose assignment succeeded
    pub vertices_applied: usize,
    /// Vertices whose assignment failed
    pub failed_vertices: Vec<usize>,
    /// Distinct failure messages
    pub failures: Vec<String>,
    /// Whether the distinct failures exceed the threshold
    pub threshold_exceeded: bool,
    /// Bones weighted by the data but missing from its order
    pub unordered_bones: Vec<String>,
    /// Scene file the result was written to
    pub scene_output: String,
}

impl ApplyResult {
    /// Summarizes an apply report.
    pub fn from_report(report: &ApplyReport, scene_output: &str) -> Self {
        Self {
            message: report.message.clone(),
            source: report.source.map(|origin| {
                match origin {
                    skinweight_solver::SourceOrigin::Inline => "inline",
                    skinweight_solver::SourceOrigin::File => "file",
                }
                .to_string()
            }),
            vertices_applied: report.vertices_applied,
            failed_vertices: report.failed_vertices.clone(),
            failures: report.failures.clone(),
            threshold_exceeded: report.threshold_exceeded,
            unordered_bones: report.unordered_bones.clone(),
            scene_output: scene_output.to_string(),
        }
    }
}

/// Result of the `validate` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateResult {
    /// "Data is valid" or the joined error messages
    pub reason: String,
    /// Weighted vertices
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertex_count: Option<usize>,
    /// Bones in `order`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bone_count: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use skinweight_data::{ErrorCode, WarningCode};

    #[test]
    fn test_validation_error_conversion() {
        let error = ValidationError::with_path(
            ErrorCode::BoneNameNotString,
            "bone names must be strings, got 1",
            "order[0]",
        );
        let json = JsonError::from(&error);
        assert_eq!(json.code, "E005");
        assert_eq!(json.path.as_deref(), Some("order[0]"));

        let warning = ValidationWarning::new(WarningCode::EmptyWeightList, "empty");
        assert_eq!(JsonWarning::from(&warning).code, "W004");
    }

    #[test]
    fn test_failure_omits_result() {
        let output: CommandOutput<ValidateResult> =
            CommandOutput::failure(vec![JsonError::new(error_codes::INVALID_ARGUMENT, "nope")], vec![]);
        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["success"], false);
        assert!(value.get("result").is_none());
        assert_eq!(value["errors"][0]["code"], "CLI_001");
    }
}
