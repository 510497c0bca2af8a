//! Solver configuration.
//!
//! Every tunable that affects a calculation or application run lives in
//! [`SolverConfig`] and is passed explicitly, so runs with different settings
//! never interfere.

use std::path::Path;

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::error::{SolverError, SolverResult};

/// Default perturbation magnitude applied to every bone.
pub const DEFAULT_BONE_DELTA: f64 = 2.0;

/// Default tolerance; below every non-negative weight so all are kept.
pub const DEFAULT_TOLERANCE: f64 = -1.0;

/// Default number of decimal digits weights are rounded to.
pub const DEFAULT_PRECISION: u32 = 3;

/// Default number of distinct assignment failures tolerated before warning.
pub const DEFAULT_FAILURE_THRESHOLD: usize = 0;

/// Largest supported rounding precision.
pub const MAX_PRECISION: u32 = 15;

/// World axis along which bones are perturbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerturbAxis {
    X,
    #[default]
    Y,
    Z,
}

impl PerturbAxis {
    /// Unit vector along this axis.
    pub fn unit(&self) -> DVec3 {
        match self {
            PerturbAxis::X => DVec3::X,
            PerturbAxis::Y => DVec3::Y,
            PerturbAxis::Z => DVec3::Z,
        }
    }

    /// Parses "x", "y", or "z" (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "x" => Some(PerturbAxis::X),
            "y" => Some(PerturbAxis::Y),
            "z" => Some(PerturbAxis::Z),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PerturbAxis::X => "x",
            PerturbAxis::Y => "y",
            PerturbAxis::Z => "z",
        }
    }
}

/// Which source wins when both inline data and a data file are usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourcePreference {
    /// Load the file.
    #[default]
    File,
    /// Use the inline data.
    Inline,
}

impl SourcePreference {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Some(SourcePreference::File),
            "inline" => Some(SourcePreference::Inline),
            _ => None,
        }
    }
}

/// Configuration for calculation and application runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverConfig {
    /// Perturbation magnitude. Displacement is divided by this to get a weight.
    pub bone_delta: f64,
    /// Perturbation axis, fixed for the whole run.
    pub axis: PerturbAxis,
    /// Contributions at or below this weight are discarded.
    pub tolerance: f64,
    /// Decimal digits weights are rounded to.
    pub precision: u32,
    /// Normalize weights after calculation and before assignment.
    pub normalize: bool,
    /// Distinct assignment failures allowed before the caller is warned.
    pub failure_threshold: usize,
    /// Source used when both inline data and a file are supplied.
    pub source_preference: SourcePreference,
    /// Perturb and weight the root bone itself, not only its joint descendants.
    pub include_root: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            bone_delta: DEFAULT_BONE_DELTA,
            axis: PerturbAxis::default(),
            tolerance: DEFAULT_TOLERANCE,
            precision: DEFAULT_PRECISION,
            normalize: true,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            source_preference: SourcePreference::default(),
            include_root: false,
        }
    }
}

impl SolverConfig {
    /// Loads a configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> SolverResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| SolverError::ConfigLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|e| SolverError::ConfigLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the perturbation magnitude.
    pub fn bone_delta(mut self, bone_delta: f64) -> Self {
        self.bone_delta = bone_delta;
        self
    }

    /// Sets the perturbation axis.
    pub fn axis(mut self, axis: PerturbAxis) -> Self {
        self.axis = axis;
        self
    }

    /// Sets the tolerance.
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the rounding precision.
    pub fn precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    /// Enables or disables normalization.
    pub fn normalize(mut self, normalize: bool) -> Self {
        self.normalize = normalize;
        self
    }

    /// Sets the failure threshold.
    pub fn failure_threshold(mut self, threshold: usize) -> Self {
        self.failure_threshold = threshold;
        self
    }

    /// Sets the source preference.
    pub fn source_preference(mut self, preference: SourcePreference) -> Self {
        self.source_preference = preference;
        self
    }

    /// Includes or excludes the root bone.
    pub fn include_root(mut self, include_root: bool) -> Self {
        self.include_root = include_root;
        self
    }

    /// Displacement applied to a perturbed bone. Its children receive the negation.
    pub fn displacement(&self) -> DVec3 {
        self.axis.unit() * self.bone_delta
    }

    /// Checks value ranges.
    pub fn validate(&self) -> SolverResult<()> {
        if !self.bone_delta.is_finite() || self.bone_delta <= 0.0 {
            return Err(SolverError::invalid_config(format!(
                "bone_delta must be a finite value greater than 0, got {}",
                self.bone_delta
            )));
        }
        if self.tolerance.is_nan() {
            return Err(SolverError::invalid_config("tolerance must not be NaN"));
        }
        if self.precision > MAX_PRECISION {
            return Err(SolverError::invalid_config(format!(
                "precision must be at most {}, got {}",
                MAX_PRECISION, self.precision
            )));
        }
        Ok(())
    }
}
