//! File system walker for discovering documents to ingest
//!
//! Traversal is recursive and deterministic (entries sorted by file name) so
//! repeated runs emit records in the same order.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::documents::SourceDocument;

/// Walks a content directory for files with allowed extensions
pub struct FileWalker {
    /// Lowercase extensions without the leading dot; empty accepts every file
    extensions: Vec<String>,
}

impl FileWalker {
    /// Create a walker accepting `extensions` (`"md"` or `".md"`, any case).
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Self {
        let extensions = extensions
            .iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self { extensions }
    }

    /// Whether `path` passes the extension filter.
    pub fn accepts(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .is_some_and(|ext| self.extensions.contains(&ext))
    }

    /// Walk `root` and return matching regular files in traversal order.
    pub fn walk(&self, root: &Path) -> Vec<PathBuf> {
        WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(target: "ingest", "Skipping unreadable entry: {e}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| self.accepts(path))
            .collect()
    }
}

/// Read every matching file under `dir` as UTF-8.
///
/// Files that cannot be read or are not valid UTF-8 are skipped with a
/// warning. `base` is used to derive each document's `source` label.
pub fn collect_documents<S: AsRef<str>>(
    dir: &Path,
    extensions: &[S],
    base: Option<&Path>,
) -> Vec<SourceDocument> {
    let walker = FileWalker::new(extensions);
    let mut documents = Vec::new();

    for path in walker.walk(dir) {
        match std::fs::read_to_string(&path) {
            Ok(text) => documents.push(SourceDocument::new(path, text, base)),
            Err(e) => {
                tracing::warn!(target: "ingest", "Skipping {}: {e}", path.display());
            }
        }
    }

    documents
}
