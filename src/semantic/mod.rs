//! Embedding generation.
//!
//! All backends implement [`EmbeddingGenerator`]:
//! - [`FastEmbedGenerator`] runs a local ONNX model through fastembed
//! - [`HttpEmbedGenerator`] calls a running embed server
//! - [`OpenAiEmbedGenerator`] calls an OpenAI-compatible `/embeddings` endpoint

mod local;
mod remote;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{EmbeddingBackend, EmbeddingConfig};

pub use local::{FastEmbedGenerator, model_from_name};
pub use remote::{HttpEmbedGenerator, OpenAiEmbedGenerator, normalize_openai_model};

// Re-export key types
pub use fastembed::EmbeddingModel;

/// Maximum number of characters of a remote error body kept in errors.
const ERROR_BODY_EXCERPT: usize = 300;

/// Error type for embedding operations
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("Failed to initialize embedding model: {0}")]
    ModelInitError(String),

    #[error("Unknown embedding model: {0}")]
    UnknownModel(String),

    #[error("Failed to generate embedding: {0}")]
    EmbeddingError(String),

    #[error("text must be a non-empty string")]
    EmptyText,

    #[error("Embedding request failed: {0}")]
    Request(String),

    #[error("Embedding backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding backend misconfigured: {0}")]
    Config(String),
}

/// A source of text embeddings.
#[async_trait]
pub trait EmbeddingGenerator: Send + Sync {
    /// Embed a batch of texts, one vector per input in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::InvalidResponse("no embedding returned".to_string()))
    }

    /// Name of the model producing the vectors.
    fn model_name(&self) -> &str;
}

/// Build the generator selected by `config.backend`.
///
/// Local model loading happens on the blocking pool since it may download
/// and initialize an ONNX session.
pub async fn from_settings(
    config: &EmbeddingConfig,
) -> Result<Arc<dyn EmbeddingGenerator>, EmbeddingError> {
    match config.backend {
        EmbeddingBackend::Local => {
            let config = config.clone();
            let generator =
                tokio::task::spawn_blocking(move || FastEmbedGenerator::from_settings(&config))
                    .await
                    .map_err(|e| EmbeddingError::ModelInitError(e.to_string()))??;
            Ok(Arc::new(generator))
        }
        EmbeddingBackend::Http => Ok(Arc::new(HttpEmbedGenerator::new(&config.http.url)?)),
        EmbeddingBackend::OpenAi => Ok(Arc::new(OpenAiEmbedGenerator::from_config(
            &config.openai,
        )?)),
    }
}

/// Reject batches containing empty texts.
pub(crate) fn ensure_non_empty(texts: &[String]) -> Result<(), EmbeddingError> {
    if texts.iter().any(|t| t.is_empty()) {
        return Err(EmbeddingError::EmptyText);
    }
    Ok(())
}

/// Check a backend answer: one vector per input, all of the same dimension.
pub(crate) fn check_batch(
    expected_count: usize,
    vectors: &[Vec<f32>],
) -> Result<(), EmbeddingError> {
    if vectors.len() != expected_count {
        return Err(EmbeddingError::InvalidResponse(format!(
            "expected {expected_count} embeddings, got {}",
            vectors.len()
        )));
    }

    if let Some(first) = vectors.first() {
        let expected = first.len();
        if expected == 0 {
            return Err(EmbeddingError::InvalidResponse(
                "empty embedding vector".to_string(),
            ));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: bad.len(),
            });
        }
    }

    Ok(())
}

/// Truncate a remote error body for inclusion in an error.
pub(crate) fn body_excerpt(body: &str) -> String {
    body.chars().take(ERROR_BODY_EXCERPT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_non_empty() {
        assert!(ensure_non_empty(&["a".to_string(), "  \n".to_string()]).is_ok());
        assert!(matches!(
            ensure_non_empty(&["a".to_string(), String::new()]),
            Err(EmbeddingError::EmptyText)
        ));
    }

    #[test]
    fn test_check_batch_count_and_dimensions() {
        assert!(check_batch(2, &[vec![1.0, 2.0], vec![3.0, 4.0]]).is_ok());
        assert!(check_batch(0, &[]).is_ok());

        assert!(matches!(
            check_batch(3, &[vec![1.0], vec![2.0]]),
            Err(EmbeddingError::InvalidResponse(_))
        ));
        assert!(matches!(
            check_batch(2, &[vec![1.0, 2.0], vec![3.0]]),
            Err(EmbeddingError::DimensionMismatch { expected: 2, actual: 1 })
        ));
        assert!(matches!(
            check_batch(1, &[vec![]]),
            Err(EmbeddingError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_body_excerpt_truncates_on_chars() {
        let body = "é".repeat(400);
        assert_eq!(body_excerpt(&body).chars().count(), 300);
        assert_eq!(body_excerpt("short"), "short");
    }

    struct Fixed;

    #[async_trait]
    impl EmbeddingGenerator for Fixed {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|t| vec![t.len() as f32]).collect())
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    #[tokio::test]
    async fn test_default_embed_uses_batch() {
        let vector = Fixed.embed("four").await.unwrap();
        assert_eq!(vector, vec![4.0]);
    }
}
