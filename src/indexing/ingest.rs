//! Directory ingestion: walk, chunk, embed, write the JSON index.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::Settings;
use crate::documents::{
    Chunker, ChunkingConfig, IndexError, IndexRecord, SourceDocument, chunker_for, write_index,
};
use crate::semantic::{EmbeddingError, EmbeddingGenerator, check_batch};

use super::walker::collect_documents;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Invalid ingest options: {0}")]
    InvalidOptions(String),

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to embed chunks of {source_path}: {error}")]
    Embedding {
        source_path: String,
        #[source]
        error: EmbeddingError,
    },

    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Progress events emitted during [`Ingestor::run_with_progress`].
#[derive(Debug, Clone, Copy)]
pub enum IngestProgress<'a> {
    /// Files were read and chunked; embedding is about to start
    Started { files: usize, chunks: usize },
    /// One chunk of `source` was embedded (`current` is one-based)
    ChunkEmbedded {
        source: &'a str,
        current: usize,
        total: usize,
    },
}

/// Outcome of an ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub files: usize,
    pub chunks: usize,
    /// Embedding dimension, `None` when nothing was embedded
    pub dimensions: Option<usize>,
    pub out_path: PathBuf,
}

/// Everything an ingestion run needs besides the generator.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub content_dir: PathBuf,
    pub out_path: PathBuf,
    pub extensions: Vec<String>,
    pub chunking: ChunkingConfig,
    pub batch_size: usize,
}

impl IngestOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            content_dir: settings.ingest.content_dir.clone(),
            out_path: settings.ingest.index_path(),
            extensions: settings.ingest.extensions.clone(),
            chunking: settings.chunking.clone(),
            batch_size: settings.embedding.batch_size,
        }
    }

    pub fn validate(&self) -> Result<(), IngestError> {
        self.chunking.validate().map_err(IngestError::InvalidOptions)?;
        if self.batch_size == 0 {
            return Err(IngestError::InvalidOptions(
                "batch_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Embeds every document of a content directory into a fresh index.
pub struct Ingestor {
    generator: Arc<dyn EmbeddingGenerator>,
    options: IngestOptions,
    chunker: Box<dyn Chunker>,
    base: Option<PathBuf>,
}

impl Ingestor {
    /// Source labels are made relative to the current working directory.
    pub fn new(
        generator: Arc<dyn EmbeddingGenerator>,
        options: IngestOptions,
    ) -> Result<Self, IngestError> {
        options.validate()?;
        Ok(Self {
            chunker: chunker_for(options.chunking.strategy),
            generator,
            options,
            base: std::env::current_dir().ok(),
        })
    }

    /// Make source labels relative to `base` instead of the working directory.
    pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    pub async fn run(&self) -> Result<IngestReport, IngestError> {
        self.run_with_progress(|_| {}).await
    }

    /// Run ingestion, reporting progress through `on_progress`.
    ///
    /// The index is rewritten from scratch; any embedding failure aborts the
    /// run before anything is written.
    pub async fn run_with_progress<F>(&self, mut on_progress: F) -> Result<IngestReport, IngestError>
    where
        F: FnMut(IngestProgress<'_>),
    {
        let opts = &self.options;
        create_dir(&opts.content_dir)?;
        if let Some(parent) = opts.out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            create_dir(parent)?;
        }

        let documents =
            collect_documents(&opts.content_dir, &opts.extensions, self.base.as_deref());
        if documents.is_empty() {
            tracing::warn!(
                target: "ingest",
                "No files found in '{}'. Add {} files and re-run.",
                opts.content_dir.display(),
                describe_extensions(&opts.extensions)
            );
        }

        let chunked: Vec<(&SourceDocument, Vec<String>)> = documents
            .iter()
            .map(|doc| (doc, self.chunker.chunk(&doc.text, &opts.chunking)))
            .collect();
        let total_chunks: usize = chunked.iter().map(|(_, chunks)| chunks.len()).sum();

        tracing::debug!(
            target: "ingest",
            "Chunked {} files into {total_chunks} chunks",
            documents.len()
        );
        on_progress(IngestProgress::Started {
            files: documents.len(),
            chunks: total_chunks,
        });

        let mut records = Vec::with_capacity(total_chunks);
        for (doc, chunks) in &chunked {
            self.embed_document(doc, chunks, &mut records, &mut on_progress)
                .await?;
        }

        write_index(&opts.out_path, &records)?;
        let dimensions = records.first().map(IndexRecord::dimensions);

        tracing::info!(
            target: "ingest",
            "Wrote {} with {} chunks",
            opts.out_path.display(),
            records.len()
        );

        Ok(IngestReport {
            files: documents.len(),
            chunks: records.len(),
            dimensions,
            out_path: opts.out_path.clone(),
        })
    }

    async fn embed_document<F>(
        &self,
        doc: &SourceDocument,
        chunks: &[String],
        records: &mut Vec<IndexRecord>,
        on_progress: &mut F,
    ) -> Result<(), IngestError>
    where
        F: FnMut(IngestProgress<'_>),
    {
        let total = chunks.len();
        let mut index = 0;

        for batch in chunks.chunks(self.options.batch_size) {
            let vectors = self
                .generator
                .embed_batch(batch)
                .await
                .and_then(|vectors| check_batch(batch.len(), &vectors).map(|()| vectors))
                .map_err(|error| IngestError::Embedding {
                    source_path: doc.source.clone(),
                    error,
                })?;

            for (text, embedding) in batch.iter().zip(vectors) {
                records.push(IndexRecord::new(doc, index, text.clone(), embedding));
                index += 1;

                tracing::info!(
                    target: "ingest",
                    "Embedded {} chunk {index}/{total}",
                    doc.source
                );
                on_progress(IngestProgress::ChunkEmbedded {
                    source: &doc.source,
                    current: index,
                    total,
                });
            }
        }

        Ok(())
    }
}

fn create_dir(path: &Path) -> Result<(), IngestError> {
    std::fs::create_dir_all(path).map_err(|source| IngestError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

fn describe_extensions(extensions: &[String]) -> String {
    if extensions.is_empty() {
        return "text".to_string();
    }
    extensions
        .iter()
        .map(|e| format!(".{}", e.trim_start_matches('.')))
        .collect::<Vec<_>>()
        .join("/")
}
