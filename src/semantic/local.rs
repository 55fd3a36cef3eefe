//! Local embedding generation with fastembed.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use parking_lot::Mutex;

use super::{EmbeddingError, EmbeddingGenerator, check_batch, ensure_non_empty};
use crate::config::EmbeddingConfig;

/// Resolve a configured model name to a fastembed model.
///
/// Accepts fastembed variant names (`AllMiniLML6V2`) as well as the upstream
/// model ids (`sentence-transformers/all-MiniLM-L6-v2`), case-insensitively.
pub fn model_from_name(name: &str) -> Result<EmbeddingModel, EmbeddingError> {
    let model = match name.trim().to_ascii_lowercase().as_str() {
        "allminilml6v2" | "all-minilm-l6-v2" | "sentence-transformers/all-minilm-l6-v2" => {
            EmbeddingModel::AllMiniLML6V2
        }
        "allminilml12v2" | "all-minilm-l12-v2" | "sentence-transformers/all-minilm-l12-v2" => {
            EmbeddingModel::AllMiniLML12V2
        }
        "bgesmallenv15" | "bge-small-en-v1.5" | "baai/bge-small-en-v1.5" => {
            EmbeddingModel::BGESmallENV15
        }
        "bgebaseenv15" | "bge-base-en-v1.5" | "baai/bge-base-en-v1.5" => {
            EmbeddingModel::BGEBaseENV15
        }
        "bgelargeenv15" | "bge-large-en-v1.5" | "baai/bge-large-en-v1.5" => {
            EmbeddingModel::BGELargeENV15
        }
        "nomicembedtextv15" | "nomic-embed-text-v1.5" | "nomic-ai/nomic-embed-text-v1.5" => {
            EmbeddingModel::NomicEmbedTextV15
        }
        "multilinguale5small" | "multilingual-e5-small" | "intfloat/multilingual-e5-small" => {
            EmbeddingModel::MultilingualE5Small
        }
        "multilinguale5large" | "multilingual-e5-large" | "intfloat/multilingual-e5-large" => {
            EmbeddingModel::MultilingualE5Large
        }
        "paraphrasemlminilml12v2"
        | "paraphrase-multilingual-minilm-l12-v2"
        | "sentence-transformers/paraphrase-multilingual-minilm-l12-v2" => {
            EmbeddingModel::ParaphraseMLMiniLML12V2
        }
        _ => return Err(EmbeddingError::UnknownModel(name.to_string())),
    };
    Ok(model)
}

/// Embedding generator backed by an in-process fastembed model.
///
/// The model runs on tokio's blocking pool; concurrent callers serialize on
/// the model mutex.
pub struct FastEmbedGenerator {
    /// The embedding model (wrapped in Mutex for interior mutability)
    model: Arc<Mutex<TextEmbedding>>,

    /// Configured model name
    model_name: String,

    /// Model dimensions for validation
    dimensions: usize,
}

impl FastEmbedGenerator {
    /// Load `model`, caching model files under `cache_dir`.
    ///
    /// Blocks while the model is downloaded and initialized.
    pub fn new(
        model: EmbeddingModel,
        model_name: impl Into<String>,
        cache_dir: PathBuf,
        show_download_progress: bool,
    ) -> Result<Self, EmbeddingError> {
        let model_name = model_name.into();

        tracing::info!(
            target: "semantic",
            "Loading embedding model {model_name} (cache: {})",
            cache_dir.display()
        );

        let mut text_model = TextEmbedding::try_new(
            InitOptions::new(model)
                .with_cache_dir(cache_dir)
                .with_show_download_progress(show_download_progress),
        )
        .map_err(|e| EmbeddingError::ModelInitError(e.to_string()))?;

        // Get dimensions by generating a test embedding
        let sample = text_model
            .embed(vec!["test"], None)
            .map_err(|e| EmbeddingError::EmbeddingError(e.to_string()))?;
        let dimensions = sample.first().map(Vec::len).ok_or_else(|| {
            EmbeddingError::ModelInitError("model returned no sample embedding".to_string())
        })?;

        tracing::info!(
            target: "semantic",
            "Embedding model ready: {model_name}, {dimensions} dimensions"
        );

        Ok(Self {
            model: Arc::new(Mutex::new(text_model)),
            model_name,
            dimensions,
        })
    }

    /// Create from the `[embedding]` settings section.
    pub fn from_settings(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let model = model_from_name(&config.model)?;
        Self::new(
            model,
            config.model.clone(),
            config.cache_dir.clone(),
            config.show_download_progress,
        )
    }

    /// Get the embedding dimensions
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[async_trait]
impl EmbeddingGenerator for FastEmbedGenerator {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        ensure_non_empty(texts)?;
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let batch = texts.to_vec();
        let vectors = tokio::task::spawn_blocking(move || model.lock().embed(batch, None))
            .await
            .map_err(|e| EmbeddingError::EmbeddingError(e.to_string()))?
            .map_err(|e| EmbeddingError::EmbeddingError(e.to_string()))?;

        check_batch(texts.len(), &vectors)?;
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimensions) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimensions,
                actual: bad.len(),
            });
        }

        Ok(vectors)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
