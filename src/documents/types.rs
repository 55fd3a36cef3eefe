//! Core types for ingested documents and index records.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// One embedded chunk as persisted in the JSON index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRecord {
    /// `{file_name}:{chunk_index}`, zero-based per file.
    pub id: String,

    /// The chunk text that was embedded.
    pub text: String,

    /// Path of the source file, relative to the working directory when possible.
    pub source: String,

    /// The embedding vector.
    pub embedding: Vec<f32>,
}

impl IndexRecord {
    /// Build the record for chunk `index` of `document`.
    pub fn new(document: &SourceDocument, index: usize, text: String, embedding: Vec<f32>) -> Self {
        Self {
            id: record_id(&document.path, index),
            text,
            source: document.source.clone(),
            embedding,
        }
    }

    /// Dimension of the embedding.
    pub fn dimensions(&self) -> usize {
        self.embedding.len()
    }
}

/// A text file read from the content directory.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    /// Path as walked.
    pub path: PathBuf,

    /// Display path stored in index records.
    pub source: String,

    /// Full UTF-8 content.
    pub text: String,
}

impl SourceDocument {
    /// Create a document; `source` is derived from `path` and `base`.
    pub fn new(path: PathBuf, text: String, base: Option<&Path>) -> Self {
        let source = source_label(&path, base);
        Self { path, source, text }
    }
}

/// Record id for chunk `index` of the file at `path`.
pub fn record_id(path: &Path, index: usize) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    format!("{name}:{index}")
}

/// Path relative to `base` when it lies under it, otherwise the path as given.
/// `.` components are dropped so `./content/a.md` labels as `content/a.md`.
pub fn source_label(path: &Path, base: Option<&Path>) -> String {
    let relative = base
        .filter(|_| path.is_absolute())
        .and_then(|base| path.strip_prefix(base).ok())
        .unwrap_or(path);
    let cleaned: PathBuf = relative
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    cleaned.to_string_lossy().into_owned()
}
