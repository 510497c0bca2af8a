//! Error types for weight data validation and persistence.

use std::path::PathBuf;

use thiserror::Error;

/// Error codes for structural validation of persisted weight data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// E001: Top-level value is not a mapping
    NotAnObject,
    /// E002: Required top-level key is missing
    MissingKey,
    /// E003: Top-level key other than `weight` or `order`
    UnexpectedKey,
    /// E004: `order` is not a sequence
    OrderNotArray,
    /// E005: A bone name in `order` is not a string
    BoneNameNotString,
    /// E006: `weight` is not a mapping
    WeightNotObject,
    /// E007: A vertex id key is not a canonical non-negative integer
    InvalidVertexId,
    /// E008: A vertex weight list is not a sequence
    WeightListNotArray,
    /// E009: A weight entry is not a `[bone_name, weight]` pair
    MalformedWeightEntry,
    /// E010: A weight is NaN or infinite
    NonFiniteWeight,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::NotAnObject => "E001",
            ErrorCode::MissingKey => "E002",
            ErrorCode::UnexpectedKey => "E003",
            ErrorCode::OrderNotArray => "E004",
            ErrorCode::BoneNameNotString => "E005",
            ErrorCode::WeightNotObject => "E006",
            ErrorCode::InvalidVertexId => "E007",
            ErrorCode::WeightListNotArray => "E008",
            ErrorCode::MalformedWeightEntry => "E009",
            ErrorCode::NonFiniteWeight => "E010",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Warning codes for weight data that is structurally valid but risky to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    /// W001: A vertex references a bone missing from `order`; its prior influence is never reset
    BoneMissingFromOrder,
    /// W002: A bone name appears more than once in `order`
    DuplicateBoneInOrder,
    /// W003: A vertex's weights do not sum to 1.0
    UnnormalizedVertex,
    /// W004: A vertex has an empty weight list
    EmptyWeightList,
}

impl WarningCode {
    /// Returns the warning code string (e.g., "W001").
    pub fn code(&self) -> &'static str {
        match self {
            WarningCode::BoneMissingFromOrder => "W001",
            WarningCode::DuplicateBoneInOrder => "W002",
            WarningCode::UnnormalizedVertex => "W003",
            WarningCode::EmptyWeightList => "W004",
        }
    }
}

impl std::fmt::Display for WarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A validation error with code, message, and optional JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// JSON path to the problematic field (e.g., "order\[2\]").
    pub path: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Creates a new validation error with a JSON path.
    pub fn with_path(code: ErrorCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

/// A validation warning with code, message, and optional JSON path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The warning code.
    pub code: WarningCode,
    /// Human-readable warning message.
    pub message: String,
    /// JSON path to the problematic field.
    pub path: Option<String>,
}

impl ValidationWarning {
    /// Creates a new validation warning.
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Creates a new validation warning with a JSON path.
    pub fn with_path(
        code: WarningCode,
        message: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

/// Result of weight data validation.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether validation passed (no errors).
    pub ok: bool,
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
    /// List of validation warnings.
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Creates a successful validation result.
    pub fn success() -> Self {
        Self {
            ok: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Adds an error to the result.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
        self.ok = false;
    }

    /// Adds a warning to the result.
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Appends the errors and warnings of another result.
    pub fn merge(&mut self, other: ValidationResult) {
        for error in other.errors {
            self.add_error(error);
        }
        self.warnings.extend(other.warnings);
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.ok
    }

    /// Returns true if any error carries the given code.
    pub fn has_error(&self, code: ErrorCode) -> bool {
        self.errors.iter().any(|e| e.code == code)
    }

    /// Returns true if any warning carries the given code.
    pub fn has_warning(&self, code: WarningCode) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }

    /// Collapses the result into a `(valid, reason)` pair.
    ///
    /// The reason is "Data is valid" on success, otherwise every error
    /// message joined with "; ".
    pub fn summary(&self) -> (bool, String) {
        if self.ok {
            return (true, "Data is valid".to_string());
        }
        let reason = self
            .errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        (false, reason)
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::success()
    }
}

/// Normalization of a single vertex weight list is undefined.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizationError {
    /// Every weight is zero (or the list is empty), so there is nothing to divide by.
    #[error("total weight is zero; normalization is undefined")]
    ZeroTotal,

    /// The total is NaN or infinite.
    #[error("total weight {total} is not finite")]
    NonFiniteTotal { total: f64 },
}

/// Top-level error type for weight data operations.
#[derive(Debug, Error)]
pub enum DataError {
    /// The weight data file does not exist.
    #[error("weight data file not found: {path}")]
    NotFound { path: PathBuf },

    /// Reading or writing the weight data file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Data failed structural validation.
    #[error("weight data failed validation with {} error(s): {}", errors.len(), join_errors(errors))]
    Integrity { errors: Vec<ValidationError> },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for weight data operations.
pub type DataResult<T> = Result<T, DataError>;

/// Common trait for errors surfaced to users with a stable code.
///
/// Implemented by the data and solver error types so a front end can report
/// `[CODE] message` uniformly.
pub trait ReportableError: std::error::Error {
    /// Stable error code, e.g. "DATA_003".
    fn code(&self) -> &'static str;

    /// Human-readable message; defaults to `Display`.
    fn message(&self) -> String {
        self.to_string()
    }

    /// Error category for grouping, e.g. "data" or "solver".
    fn category(&self) -> &'static str;
}

impl ReportableError for DataError {
    fn code(&self) -> &'static str {
        match self {
            DataError::NotFound { .. } => "DATA_001",
            DataError::Io { .. } => "DATA_002",
            DataError::Json(_) => "DATA_003",
            DataError::Integrity { .. } => "DATA_004",
        }
    }

    fn category(&self) -> &'static str {
        "data"
    }
}
