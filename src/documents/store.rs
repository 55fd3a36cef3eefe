//! Flat JSON persistence for the embedding index.
//!
//! The index is a pretty-printed JSON array of [`IndexRecord`]s. It is written
//! in full on every ingestion run.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::types::IndexRecord;

/// Errors from index persistence.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid index JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Record '{id}' has {actual} dimensions, expected {expected}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        actual: usize,
    },
}

pub type IndexResult<T> = Result<T, IndexError>;

/// Check that every record shares the first record's dimension.
///
/// Returns the common dimension, or `None` for an empty slice.
pub fn check_dimensions(records: &[IndexRecord]) -> IndexResult<Option<usize>> {
    let Some(first) = records.first() else {
        return Ok(None);
    };
    let expected = first.dimensions();

    match records.iter().find(|r| r.dimensions() != expected) {
        Some(bad) => Err(IndexError::DimensionMismatch {
            id: bad.id.clone(),
            expected,
            actual: bad.dimensions(),
        }),
        None => Ok(Some(expected)),
    }
}

/// Write the index to `path`, creating parent directories.
#[must_use = "Write errors should be handled to ensure the index is persisted"]
pub fn write_index(path: &Path, records: &[IndexRecord]) -> IndexResult<()> {
    check_dimensions(records)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| IndexError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let json = serde_json::to_string_pretty(records).map_err(|source| IndexError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    std::fs::write(path, json).map_err(|source| IndexError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read an index previously written by [`write_index`].
pub fn load_index(path: &Path) -> IndexResult<Vec<IndexRecord>> {
    let content = std::fs::read_to_string(path).map_err(|source| IndexError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| IndexError::Json {
        path: path.to_path_buf(),
        source,
    })
}
