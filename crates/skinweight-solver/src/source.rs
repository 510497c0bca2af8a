//! Choosing between inline weight data and a weight data file.

use std::path::{Path, PathBuf};

use serde_json::Value;
use skinweight_data::{load, validate_value, SkinWeightData};

use crate::config::SourcePreference;
use crate::error::{SolverError, SolverResult};

/// Weight data handed to the applier: inline, on disk, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataSource {
    pub inline: Option<Value>,
    pub path: Option<PathBuf>,
}

impl DataSource {
    /// Inline data only.
    pub fn inline(value: Value) -> Self {
        Self {
            inline: Some(value),
            path: None,
        }
    }

    /// A data file only.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            inline: None,
            path: Some(path.into()),
        }
    }

    /// Inline data and a data file; the preference decides between them.
    pub fn both(value: Value, path: impl Into<PathBuf>) -> Self {
        Self {
            inline: Some(value),
            path: Some(path.into()),
        }
    }

    /// Inline data from an already decoded value.
    pub fn from_data(data: &SkinWeightData) -> SolverResult<Self> {
        Ok(Self::inline(data.to_value()?))
    }
}

/// Where resolved data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrigin {
    Inline,
    File,
}

/// Data picked by [`resolve_data_source`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedData {
    pub data: SkinWeightData,
    pub origin: SourceOrigin,
}

/// Picks the data to apply.
///
/// A file is usable when it exists; inline data is usable when it passes
/// structural validation. With neither usable the result is
/// [`SolverError::NoDataSource`]. With exactly one usable it is taken. With
/// both, `preference` decides. A file that exists but fails validation
/// surfaces its validation errors.
pub fn resolve_data_source(
    source: &DataSource,
    preference: SourcePreference,
) -> SolverResult<ResolvedData> {
    let file = source.path.as_deref().filter(|path| path.exists());
    let inline = source.inline.as_ref().filter(|value| {
        let result = validate_value(value);
        if !result.is_ok() {
            log::warn!("Ignoring inline weight data: {}", result.summary().1);
        }
        result.is_ok()
    });

    match (inline, file) {
        (None, None) => Err(SolverError::NoDataSource),
        (Some(value), None) => from_inline(value),
        (None, Some(path)) => from_file(path),
        (Some(value), Some(path)) => match preference {
            SourcePreference::File => from_file(path),
            SourcePreference::Inline => from_inline(value),
        },
    }
}

fn from_inline(value: &Value) -> SolverResult<ResolvedData> {
    log::info!("Using inline weight data");
    Ok(ResolvedData {
        data: SkinWeightData::from_value(value.clone())?,
        origin: SourceOrigin::Inline,
    })
}

fn from_file(path: &Path) -> SolverResult<ResolvedData> {
    log::info!("Loading weight data from {}", path.display());
    Ok(ResolvedData {
        data: load(path)?,
        origin: SourceOrigin::File,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use skinweight_data::{save, DataError, WeightEntry};

    fn file_data() -> SkinWeightData {
        let mut data = SkinWeightData::with_order(vec!["from_file".into()]);
        data.insert(0, vec![WeightEntry::new("from_file", 1.0)]);
        data
    }

    fn inline_value() -> Value {
        json!({"weight": {"0": [["inline", 1.0]]}, "order": ["inline"]})
    }

    #[test]
    fn test_neither_source() {
        let err = resolve_data_source(&DataSource::default(), SourcePreference::File).unwrap_err();
        assert_eq!(err.to_string(), "No valid data or file passed in");

        let source = DataSource::both(json!({"order": [1, 2]}), "/no/such/weights.json");
        assert!(matches!(
            resolve_data_source(&source, SourcePreference::File),
            Err(SolverError::NoDataSource)
        ));
    }

    #[test]
    fn test_single_source_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.json");
        save(&path, &file_data()).unwrap();

        let resolved =
            resolve_data_source(&DataSource::file(&path), SourcePreference::Inline).unwrap();
        assert_eq!(resolved.origin, SourceOrigin::File);
        assert_eq!(resolved.data, file_data());

        let resolved =
            resolve_data_source(&DataSource::inline(inline_value()), SourcePreference::File)
                .unwrap();
        assert_eq!(resolved.origin, SourceOrigin::Inline);
        assert_eq!(resolved.data.order, vec!["inline"]);
    }

    #[test]
    fn test_preference_breaks_ties() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.json");
        save(&path, &file_data()).unwrap();
        let source = DataSource::both(inline_value(), &path);

        let resolved = resolve_data_source(&source, SourcePreference::File).unwrap();
        assert_eq!(resolved.origin, SourceOrigin::File);

        let resolved = resolve_data_source(&source, SourcePreference::Inline).unwrap();
        assert_eq!(resolved.origin, SourceOrigin::Inline);
    }

    #[test]
    fn test_invalid_file_surfaces_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.json");
        std::fs::write(&path, r#"{"order": [1, 2]}"#).unwrap();

        let err = resolve_data_source(&DataSource::file(&path), SourcePreference::File).unwrap_err();
        assert!(matches!(err, SolverError::Data(DataError::Integrity { .. })));
        assert!(err.to_string().contains("bone names must be strings"));
    }
}
