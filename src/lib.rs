//! Local text-embedding server and content ingestion.
//!
//! - [`server`] answers `POST /embed` with the embedding of a text
//! - [`indexing`] walks a content directory, chunks every file, embeds the
//!   chunks and writes a flat JSON index of `{id, text, source, embedding}`
//!
//! Embeddings come from any [`semantic::EmbeddingGenerator`]: a local
//! fastembed model, a running embed server or an OpenAI-compatible API.

pub mod cli;
pub mod config;
pub mod documents;
pub mod indexing;
pub mod logging;
pub mod semantic;
pub mod server;

pub use config::Settings;
pub use documents::{ChunkingConfig, ChunkingStrategy, IndexRecord};
pub use indexing::{IngestReport, Ingestor};
pub use semantic::{EmbeddingError, EmbeddingGenerator};
