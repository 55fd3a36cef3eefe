//! HTTP embed server
//!
//! Exposes `POST /embed` (`{"text"}` -> `{"embedding"}`) and `GET /health`.
//! Every error is answered as `{"error": "..."}` JSON.

#[cfg(feature = "http-server")]
pub use imp::{router, serve};

#[cfg(feature = "http-server")]
mod imp {
    use std::sync::Arc;

    use axum::Router;
    use axum::body::Bytes;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::routing::{get, post};
    use serde_json::{Value, json};

    use crate::semantic::EmbeddingGenerator;

    const EMPTY_TEXT: &str = "text must be a non-empty string";

    type SharedGenerator = Arc<dyn EmbeddingGenerator>;

    /// JSON error response
    #[derive(Debug)]
    struct ApiError {
        status: StatusCode,
        message: String,
    }

    impl ApiError {
        fn bad_request(message: impl Into<String>) -> Self {
            Self {
                status: StatusCode::BAD_REQUEST,
                message: message.into(),
            }
        }

        /// Catch-all for every failure past input validation.
        fn internal(message: impl Into<String>) -> Self {
            Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: message.into(),
            }
        }
    }

    impl IntoResponse for ApiError {
        fn into_response(self) -> Response {
            (self.status, axum::Json(json!({ "error": self.message }))).into_response()
        }
    }

    /// Build the router around `generator`.
    pub fn router(generator: SharedGenerator) -> Router {
        Router::new()
            .route("/embed", post(embed).fallback(not_found))
            .route("/health", get(health_check))
            .fallback(not_found)
            .layer(tower_http::trace::TraceLayer::new_for_http())
            .with_state(generator)
    }

    /// Serve on `bind` until Ctrl+C.
    pub async fn serve(bind: &str, generator: SharedGenerator) -> anyhow::Result<()> {
        let model = generator.model_name().to_string();
        let listener = tokio::net::TcpListener::bind(bind).await?;
        let local = listener.local_addr()?;

        crate::log_event!("server", "listening", "http://{local} (model {model})");
        eprintln!("Embed server listening on http://{local} (POST /embed)");
        eprintln!("Health check: http://{local}/health");
        eprintln!("Press Ctrl+C to stop the server");

        let server = axum::serve(listener, router(generator));

        tokio::select! {
            result = server => {
                result?;
            }
            _ = tokio::signal::ctrl_c() => {
                eprintln!("Shutting down embed server...");
            }
        }

        crate::log_event!("server", "stopped");
        Ok(())
    }

    async fn health_check() -> &'static str {
        "OK"
    }

    async fn not_found() -> ApiError {
        ApiError {
            status: StatusCode::NOT_FOUND,
            message: "not found".to_string(),
        }
    }

    /// The body is parsed by hand so clients need not send a JSON content type.
    async fn embed(
        State(generator): State<SharedGenerator>,
        body: Bytes,
    ) -> Result<axum::Json<Value>, ApiError> {
        let payload: Value =
            serde_json::from_slice(&body).map_err(|e| ApiError::internal(e.to_string()))?;
        let Some(fields) = payload.as_object() else {
            return Err(ApiError::internal("request body must be a JSON object"));
        };

        // Whitespace-only text is embedded as given
        let text = fields
            .get("text")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::bad_request(EMPTY_TEXT))?;

        crate::debug_event!("server", "embed", "{} chars", text.chars().count());

        let embedding = generator.embed(text).await.map_err(|e| {
            tracing::warn!(target: "server", "embedding failed: {e}");
            ApiError::internal(e.to_string())
        })?;

        Ok(axum::Json(json!({ "embedding": embedding })))
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use async_trait::async_trait;
        use axum::body::Body;
        use axum::http::{Request, header};
        use tower::ServiceExt;

        use crate::semantic::EmbeddingError;

        struct LengthGenerator;

        #[async_trait]
        impl EmbeddingGenerator for LengthGenerator {
            async fn embed_batch(
                &self,
                texts: &[String],
            ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
                crate::semantic::ensure_non_empty(texts)?;
                if texts.iter().any(|t| t == "explode") {
                    return Err(EmbeddingError::EmbeddingError("model crashed".to_string()));
                }
                Ok(texts.iter().map(|t| vec![t.len() as f32, 0.5]).collect())
            }

            fn model_name(&self) -> &str {
                "length"
            }
        }

        fn app() -> Router {
            router(Arc::new(LengthGenerator))
        }

        async fn send(method: &str, uri: &str, body: &str) -> (StatusCode, String, Option<String>) {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::from(body.to_string()))
                .unwrap();
            let response = app().oneshot(request).await.unwrap();
            let status = response.status();
            let content_type = response
                .headers()
                .get(header::CONTENT_TYPE)
                .map(|v| v.to_str().unwrap().to_string());
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            (status, String::from_utf8(bytes.to_vec()).unwrap(), content_type)
        }

        fn json(body: &str) -> Value {
            serde_json::from_str(body).unwrap()
        }

        #[tokio::test]
        async fn test_embed_success() {
            let (status, body, content_type) = send("POST", "/embed", r#"{"text":"hello"}"#).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(content_type.as_deref(), Some("application/json"));
            assert_eq!(json(&body), json!({ "embedding": [5.0, 0.5] }));
        }

        #[tokio::test]
        async fn test_embed_rejects_missing_empty_and_non_string_text() {
            for payload in [r#"{}"#, r#"{"text":""}"#, r#"{"text":42}"#, r#"{"text":null}"#] {
                let (status, body, _) = send("POST", "/embed", payload).await;
                assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload}");
                assert_eq!(json(&body), json!({ "error": EMPTY_TEXT }));
            }
        }

        #[tokio::test]
        async fn test_embed_whitespace_text_is_embedded() {
            let (status, body, _) = send("POST", "/embed", r#"{"text":"   "}"#).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(json(&body), json!({ "embedding": [3.0, 0.5] }));
        }

        #[tokio::test]
        async fn test_embed_malformed_json_is_500() {
            let (status, body, _) = send("POST", "/embed", "{not json").await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            let error = json(&body)["error"].as_str().unwrap().to_string();
            assert!(!error.is_empty());
        }

        #[tokio::test]
        async fn test_embed_non_object_body_is_500() {
            for payload in ["[1]", r#""text""#, "42"] {
                let (status, body, _) = send("POST", "/embed", payload).await;
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "payload {payload}");
                assert_eq!(
                    json(&body),
                    json!({ "error": "request body must be a JSON object" })
                );
            }
        }

        #[tokio::test]
        async fn test_embed_generator_failure_is_500() {
            let (status, body, _) = send("POST", "/embed", r#"{"text":"explode"}"#).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(
                json(&body),
                json!({ "error": "Failed to generate embedding: model crashed" })
            );
        }

        #[tokio::test]
        async fn test_health() {
            let (status, body, _) = send("GET", "/health", "").await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, "OK");
        }

        #[tokio::test]
        async fn test_unknown_paths_and_methods_are_404() {
            for (method, uri) in [("POST", "/other"), ("GET", "/"), ("GET", "/embed"), ("POST", "/embed/x")] {
                let (status, body, _) = send(method, uri, "{}").await;
                assert_eq!(status, StatusCode::NOT_FOUND, "{method} {uri}");
                assert_eq!(json(&body), json!({ "error": "not found" }));
            }
        }
    }
}

/// Fallback when the server is compiled out.
#[cfg(not(feature = "http-server"))]
pub async fn serve(
    _bind: &str,
    _generator: std::sync::Arc<dyn crate::semantic::EmbeddingGenerator>,
) -> anyhow::Result<()> {
    eprintln!("HTTP server support is not compiled in.");
    eprintln!("Please rebuild with: cargo build --features http-server");
    anyhow::bail!("http-server feature is disabled")
}
