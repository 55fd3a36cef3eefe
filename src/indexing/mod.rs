//! Ingestion of a content directory into the embedding index.

pub mod ingest;
pub mod walker;

pub use ingest::{IngestError, IngestOptions, IngestProgress, IngestReport, Ingestor};
pub use walker::{FileWalker, collect_documents};
