//! Reading and writing weight data files.
//!
//! Files hold a single JSON document. [`load`] validates the document before
//! decoding it and never auto-corrects invalid data.

use std::fs;
use std::path::Path;

use crate::error::{DataError, DataResult};
use crate::weights::SkinWeightData;

/// Output layout for [`save_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonLayout {
    /// Single line, no whitespace.
    #[default]
    Compact,
    /// Indented, one entry per line.
    Pretty,
}

/// Writes weight data to `path` as compact JSON.
pub fn save(path: impl AsRef<Path>, data: &SkinWeightData) -> DataResult<()> {
    save_with(path, data, JsonLayout::Compact)
}

/// Writes weight data to `path` with the given layout.
pub fn save_with(
    path: impl AsRef<Path>,
    data: &SkinWeightData,
    layout: JsonLayout,
) -> DataResult<()> {
    let path = path.as_ref();
    let json = match layout {
        JsonLayout::Compact => data.to_json()?,
        JsonLayout::Pretty => data.to_json_pretty()?,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| DataError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(path, json).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!(
        "wrote {} vertex weight lists to {}",
        data.vertex_count(),
        path.display()
    );
    Ok(())
}

/// Reads weight data from `path`.
///
/// # Errors
/// * [`DataError::NotFound`] if the file does not exist
/// * [`DataError::Json`] if the file is not JSON
/// * [`DataError::Integrity`] if the document fails structural validation
pub fn load(path: impl AsRef<Path>) -> DataResult<SkinWeightData> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DataError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let contents = fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    SkinWeightData::from_json(&contents)
}

/// Reads a file as untyped JSON without validating it.
///
/// Used by front ends that want to report every validation problem in a file
/// rather than fail on the first.
pub fn load_value(path: impl AsRef<Path>) -> DataResult<serde_json::Value> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DataError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&contents)?)
}
