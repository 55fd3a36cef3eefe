//! Document chunking and the persisted embedding index.
//!
//! This module provides:
//! - Chunking strategies (sliding window, markdown sections)
//! - The `{id, text, source, embedding}` record type
//! - Reading and writing the flat JSON index

pub mod chunker;
pub mod config;
pub mod store;
pub mod types;

pub use chunker::{Chunker, SectionChunker, WindowChunker, chunker_for, sliding_window};
pub use config::{ChunkingConfig, ChunkingStrategy};
pub use store::{IndexError, IndexResult, check_dimensions, load_index, write_index};
pub use types::{IndexRecord, SourceDocument, record_id, source_label};
