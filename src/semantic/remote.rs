//! Embedding generators that call out over HTTP.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{EmbeddingError, EmbeddingGenerator, body_excerpt, check_batch, ensure_non_empty};
use crate::config::OpenAiConfig;

/// Environment variable consulted when no API key is configured.
const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Client for a running `POST /embed` server (this crate's own `serve`).
///
/// The server embeds one text per request, so batches are sent sequentially.
pub struct HttpEmbedGenerator {
    client: Client,
    url: String,
}

impl HttpEmbedGenerator {
    pub fn new(url: &str) -> Result<Self, EmbeddingError> {
        if url.trim().is_empty() {
            return Err(EmbeddingError::Config("embed server url is empty".to_string()));
        }
        Ok(Self {
            client: Client::new(),
            url: url.trim().to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let response = self
            .client
            .post(&self.url)
            .json(&EmbedRequest { text })
            .send()
            .await
            .map_err(|e| EmbeddingError::Request(format!("{}: {e}", self.url)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Status {
                status: status.as_u16(),
                body: body_excerpt(&body),
            });
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;
        Ok(parsed.embedding)
    }
}

#[async_trait]
impl EmbeddingGenerator for HttpEmbedGenerator {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        ensure_non_empty(texts)?;

        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed_one(text).await?);
        }

        check_batch(texts.len(), &vectors)?;
        Ok(vectors)
    }

    fn model_name(&self) -> &str {
        &self.url
    }
}

#[derive(Debug, Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    data: Vec<OpenAiEmbedding>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbedding {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

/// Strip an `openai/` router prefix when talking to OpenAI directly.
///
/// Routers such as OpenRouter expect `openai/text-embedding-3-small`, while
/// `api.openai.com` (or any base under an `/openai` path) wants the bare name.
pub fn normalize_openai_model(base_url: &str, model: &str) -> String {
    let base = base_url.to_ascii_lowercase();
    let direct = base.contains("api.openai.com") || base.contains("/openai");
    match model.strip_prefix("openai/") {
        Some(bare) if direct => bare.to_string(),
        _ => model.to_string(),
    }
}

/// Client for OpenAI-compatible `POST {base_url}/embeddings` endpoints.
pub struct OpenAiEmbedGenerator {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    site_url: Option<String>,
    site_name: Option<String>,
}

impl OpenAiEmbedGenerator {
    /// Create from the `[embedding.openai]` settings section.
    ///
    /// Falls back to `OPENAI_API_KEY` when `api_key` is unset.
    pub fn from_config(config: &OpenAiConfig) -> Result<Self, EmbeddingError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(OPENAI_API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                EmbeddingError::Config(format!(
                    "no API key: set embedding.openai.api_key or {OPENAI_API_KEY_ENV}"
                ))
            })?;

        let base_url = config.base_url.trim_end_matches('/');
        if base_url.is_empty() {
            return Err(EmbeddingError::Config("embedding.openai.base_url is empty".to_string()));
        }

        Ok(Self {
            client: Client::new(),
            endpoint: format!("{base_url}/embeddings"),
            api_key,
            model: normalize_openai_model(base_url, &config.model),
            site_url: config.site_url.clone(),
            site_name: config.site_name.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EmbeddingGenerator for OpenAiEmbedGenerator {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        ensure_non_empty(texts)?;
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&OpenAiRequest {
                model: &self.model,
                input: texts,
            });
        if let Some(site_url) = &self.site_url {
            request = request.header("HTTP-Referer", site_url);
        }
        if let Some(site_name) = &self.site_name {
            request = request.header("X-Title", site_name);
        }

        let response = request
            .send()
            .await
            .map_err(|e| EmbeddingError::Request(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EmbeddingError::Request(e.to_string()))?;
        if !status.is_success() {
            return Err(EmbeddingError::Status {
                status: status.as_u16(),
                body: body_excerpt(&body),
            });
        }

        let mut parsed: OpenAiResponse = serde_json::from_str(&body).map_err(|e| {
            EmbeddingError::InvalidResponse(format!("{e}; body: {}", body_excerpt(&body)))
        })?;
        if parsed.data.iter().all(|d| d.index.is_some()) {
            parsed.data.sort_by_key(|d| d.index);
        }

        let vectors: Vec<Vec<f32>> = parsed.data.into_iter().map(|d| d.embedding).collect();
        check_batch(texts.len(), &vectors)?;

        tracing::debug!(
            target: "semantic",
            "Embedded {} texts via {} ({})",
            texts.len(),
            self.endpoint,
            self.model
        );
        Ok(vectors)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_openai_model() {
        assert_eq!(
            normalize_openai_model("https://api.openai.com/v1", "openai/text-embedding-3-small"),
            "text-embedding-3-small"
        );
        assert_eq!(
            normalize_openai_model("https://gateway.example.com/openai/v1", "openai/x"),
            "x"
        );
        assert_eq!(
            normalize_openai_model("https://openrouter.ai/api/v1", "openai/text-embedding-3-small"),
            "openai/text-embedding-3-small"
        );
        assert_eq!(
            normalize_openai_model("https://api.openai.com/v1", "text-embedding-3-small"),
            "text-embedding-3-small"
        );
    }

    #[test]
    fn test_openai_endpoint_and_key() {
        let config = OpenAiConfig {
            base_url: "https://openrouter.ai/api/v1/".to_string(),
            api_key: Some("sk-test".to_string()),
            ..OpenAiConfig::default()
        };
        let generator = OpenAiEmbedGenerator::from_config(&config).unwrap();
        assert_eq!(generator.endpoint(), "https://openrouter.ai/api/v1/embeddings");
        assert_eq!(generator.api_key, "sk-test");
    }

    #[test]
    fn test_http_generator_rejects_empty_url() {
        assert!(matches!(
            HttpEmbedGenerator::new("  "),
            Err(EmbeddingError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_http_generator_rejects_empty_text_before_request() {
        // Unroutable URL: the call must fail on validation, not on the network
        let generator = HttpEmbedGenerator::new("http://127.0.0.1:9/embed").unwrap();
        assert!(matches!(
            generator.embed("").await,
            Err(EmbeddingError::EmptyText)
        ));
    }
}
