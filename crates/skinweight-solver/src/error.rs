//! Error types for weight calculation and application.

use std::path::PathBuf;

use skinweight_data::{DataError, NormalizationError, ReportableError};
use thiserror::Error;

/// Result type for solver operations.
pub type SolverResult<T> = Result<T, SolverError>;

/// Result type for calls into a host port.
pub type HostResult<T> = Result<T, HostError>;

/// A host port call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HostError {
    pub message: String,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The deformer rejected one vertex's weight assignment.
///
/// Recovered locally by the applier: collected into the failure report and
/// never propagated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct AssignmentError {
    /// Vertex whose assignment was rejected.
    pub vertex_id: usize,
    /// Deformer's reason, without the vertex id so equal reasons deduplicate.
    pub message: String,
}

impl AssignmentError {
    pub fn new(vertex_id: usize, message: impl Into<String>) -> Self {
        Self {
            vertex_id,
            message: message.into(),
        }
    }
}

/// Errors that can occur while calculating or applying skin weights.
#[derive(Debug, Error)]
pub enum SolverError {
    /// Configuration value out of range.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Configuration file could not be read or parsed.
    #[error("Failed to load configuration from {path}: {message}")]
    ConfigLoad { path: PathBuf, message: String },

    /// A mesh or bone identifier does not resolve to a live scene node.
    #[error("{role} '{identifier}' was not found in the scene")]
    InputResolution {
        role: &'static str,
        identifier: String,
    },

    /// The target mesh has no skin deformer.
    #[error("No skin cluster found on '{mesh}', apply one to the mesh passed in")]
    DeformerResolution { mesh: String },

    /// Vertex count changed between the rest snapshot and a perturbed snapshot.
    #[error("Mesh topology changed during calculation: expected {expected} vertices, got {actual}")]
    TopologyChanged { expected: usize, actual: usize },

    /// A vertex's weights could not be normalized.
    #[error("Cannot normalize vertex {vertex_id}: {source}")]
    Normalization {
        vertex_id: String,
        #[source]
        source: NormalizationError,
    },

    /// Weight data failed validation before application.
    #[error("Invalid weight data: {reason}")]
    InvalidData { reason: String },

    /// Neither inline data nor a data file was usable.
    #[error("No valid data or file passed in")]
    NoDataSource,

    /// The scene description could not be turned into a scene.
    #[error("Invalid scene: {message}")]
    Scene { message: String },

    /// Calculation was cancelled between bones; the pose was restored.
    #[error("Calculation cancelled after {completed} of {total} bone(s)")]
    Cancelled { completed: usize, total: usize },

    /// A host port call failed.
    #[error("Host call failed: {0}")]
    Host(#[from] HostError),

    /// Weight data error (I/O, JSON, integrity).
    #[error(transparent)]
    Data(#[from] DataError),
}

impl SolverError {
    /// Creates a new invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates a new scene error.
    pub fn scene(message: impl Into<String>) -> Self {
        Self::Scene {
            message: message.into(),
        }
    }
}

impl ReportableError for SolverError {
    fn code(&self) -> &'static str {
        match self {
            SolverError::InvalidConfig { .. } => "SOLVER_001",
            SolverError::ConfigLoad { .. } => "SOLVER_002",
            SolverError::InputResolution { .. } => "SOLVER_003",
            SolverError::DeformerResolution { .. } => "SOLVER_004",
            SolverError::TopologyChanged { .. } => "SOLVER_005",
            SolverError::Normalization { .. } => "SOLVER_006",
            SolverError::InvalidData { .. } => "SOLVER_007",
            SolverError::NoDataSource => "SOLVER_008",
            SolverError::Scene { .. } => "SOLVER_009",
            SolverError::Cancelled { .. } => "SOLVER_010",
            SolverError::Host(_) => "SOLVER_011",
            SolverError::Data(err) => err.code(),
        }
    }

    fn category(&self) -> &'static str {
        match self {
            SolverError::Data(err) => err.category(),
            _ => "solver",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SolverError::InputResolution {
            role: "root bone",
            identifier: "hips".to_string(),
        };
        assert_eq!(err.to_string(), "root bone 'hips' was not found in the scene");

        let err = SolverError::DeformerResolution {
            mesh: "body".to_string(),
        };
        assert!(err.to_string().contains("No skin cluster found"));

        let err = SolverError::NoDataSource;
        assert_eq!(err.to_string(), "No valid data or file passed in");
    }

    #[test]
    fn test_codes_delegate_for_data_errors() {
        let err = SolverError::from(DataError::NotFound {
            path: PathBuf::from("weights.json"),
        });
        assert_eq!(err.code(), "DATA_001");
        assert_eq!(err.category(), "data");

        let err = SolverError::invalid_config("bone_delta must be positive");
        assert_eq!(err.code(), "SOLVER_001");
        assert_eq!(err.category(), "solver");
    }

    #[test]
    fn test_normalization_error_source() {
        use std::error::Error as _;

        let err = SolverError::Normalization {
            vertex_id: "4".to_string(),
            source: NormalizationError::ZeroTotal,
        };
        assert!(err.to_string().contains("vertex 4"));
        assert!(err.source().is_some());
    }
}
