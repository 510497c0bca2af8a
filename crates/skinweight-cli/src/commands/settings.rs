//! Solver configuration from `--config` plus command-line overrides.

use anyhow::{Context, Result};
use skinweight_solver::{PerturbAxis, SolverConfig, SourcePreference};

/// Values given on the command line. Each one, when set, wins over the
/// configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub tolerance: Option<f64>,
    pub bone_delta: Option<f64>,
    pub axis: Option<String>,
    pub no_normalize: bool,
    pub include_root: bool,
    pub failure_threshold: Option<usize>,
    pub prefer: Option<String>,
}

impl ConfigOverrides {
    /// Loads `config_path` (or defaults), applies the overrides, and validates.
    pub fn resolve(&self, config_path: Option<&str>) -> Result<SolverConfig> {
        let mut config = match config_path {
            Some(path) => SolverConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config file: {}", path))?,
            None => SolverConfig::default(),
        };

        if let Some(tolerance) = self.tolerance {
            config = config.tolerance(tolerance);
        }
        if let Some(bone_delta) = self.bone_delta {
            config = config.bone_delta(bone_delta);
        }
        if let Some(axis) = &self.axis {
            let axis = PerturbAxis::parse(axis)
                .ok_or_else(|| anyhow::anyhow!("unknown axis: {} (expected x, y, or z)", axis))?;
            config = config.axis(axis);
        }
        if self.no_normalize {
            config = config.normalize(false);
        }
        if self.include_root {
            config = config.include_root(true);
        }
        if let Some(threshold) = self.failure_threshold {
            config = config.failure_threshold(threshold);
        }
        if let Some(prefer) = &self.prefer {
            let preference = SourcePreference::parse(prefer).ok_or_else(|| {
                anyhow::anyhow!("unknown source preference: {} (expected file or inline)", prefer)
            })?;
            config = config.source_preference(preference);
        }

        config.validate()?;
        log::debug!("Resolved solver configuration: {:?}", config);
        Ok(config)
    }
}
