//! Embedding providers.
//!
//! A provider is an opaque text-to-vector capability with a load/init phase
//! and a per-call latency cost. The only concrete implementation here talks
//! to an OpenAI-compatible `/embeddings` endpoint (hosted, or a local
//! inference server fronting a MiniLM-class model).

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{EmbeddingError, Result};
use crate::{DEFAULT_DIMENSION, Embedding};

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Get the embedding dimension this provider produces.
    fn dimension(&self) -> usize;

    /// Check whether [`EmbeddingProvider::init`] has completed.
    fn is_ready(&self) -> bool;

    /// Initialize the provider.
    ///
    /// Idempotent: safe to call once at process start, a no-op when already
    /// ready. Calling [`EmbeddingProvider::embed`] before this completes is
    /// a programming error surfaced as [`EmbeddingError::NotInitialized`].
    async fn init(&self) -> Result<()>;

    /// Generate an embedding for the given text.
    async fn embed(&self, text: &str) -> Result<Embedding>;
}

/// Embedding provider backed by an OpenAI-compatible HTTP API.
pub struct HttpProvider {
    /// API base URL, e.g. `https://api.openai.com/v1` or a local server.
    base_url: String,

    /// Bearer token. Optional; local inference servers accept none.
    api_key: Option<String>,

    /// HTTP client.
    client: reqwest::Client,

    /// Model requested from the endpoint.
    model: String,

    /// Override for models with an unknown dimension.
    dimension: Option<usize>,

    /// Set by `init`.
    ready: AtomicBool,
}

impl HttpProvider {
    /// Create a new provider for the given API base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: std::env::var("EMBEDDINGS_API_KEY").ok(),
            client: reqwest::Client::new(),
            model: "all-MiniLM-L6-v2".to_string(),
            dimension: None,
            ready: AtomicBool::new(false),
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the model to request.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the embedding dimension for models not known to this crate.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }
}

#[async_trait]
impl EmbeddingProvider for HttpProvider {
    fn name(&self) -> &str {
        "http"
    }

    fn dimension(&self) -> usize {
        if let Some(dimension) = self.dimension {
            return dimension;
        }
        match self.model.as_str() {
            "all-MiniLM-L6-v2" => 384,
            "text-embedding-3-small" => 1536,
            "text-embedding-3-large" => 3072,
            _ => DEFAULT_DIMENSION,
        }
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    async fn init(&self) -> Result<()> {
        if self.is_ready() {
            return Ok(());
        }

        if self.base_url.trim().is_empty() {
            return Err(EmbeddingError::ProviderUnavailable(
                "no API base URL configured".to_string(),
            ));
        }

        self.ready.store(true, Ordering::Release);
        info!(model = %self.model, "embedding provider ready");
        Ok(())
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        if !self.is_ready() {
            return Err(EmbeddingError::NotInitialized);
        }

        debug!(model = %self.model, chars = text.len(), "requesting embedding");

        let body = serde_json::json!({
            "input": text,
            "model": self.model,
        });

        let mut request = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Content-Type", "application/json")
            .json(&body);

        if let Some(api_key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| EmbeddingError::ProviderUnavailable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(EmbeddingError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ComputationFailed(format!(
                "API error ({status}): {error_text}"
            )));
        }

        let result: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        let embedding = result
            .data
            .into_iter()
            .next()
            .ok_or_else(|| {
                EmbeddingError::InvalidResponse("no embedding in response".to_string())
            })?
            .embedding;

        debug!(dimension = embedding.len(), "embedding received");
        Ok(embedding)
    }
}

/// OpenAI-compatible API response format.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_dimension_from_known_model() {
        let provider = HttpProvider::new("http://localhost").with_model("text-embedding-3-large");
        assert_eq!(provider.dimension(), 3072);
    }

    #[test]
    fn test_dimension_override() {
        let provider = HttpProvider::new("http://localhost")
            .with_model("some-custom-model")
            .with_dimension(768);
        assert_eq!(provider.dimension(), 768);
    }

    #[tokio::test]
    async fn test_embed_before_init_fails() {
        let provider = HttpProvider::new("http://localhost");
        let err = provider.embed("hello").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::NotInitialized));
    }

    #[tokio::test]
    async fn test_init_without_base_url_fails() {
        let provider = HttpProvider::new("  ");
        let err = provider.init().await.unwrap_err();
        assert!(matches!(err, EmbeddingError::ProviderUnavailable(_)));
        assert!(!provider.is_ready());
    }

    #[tokio::test]
    async fn test_embed_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(header("Authorization", "Bearer secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"embedding": [0.6, 0.8], "index": 0}],
                "model": "all-MiniLM-L6-v2"
            })))
            .mount(&server)
            .await;

        let provider = HttpProvider::new(server.uri()).with_api_key("secret");
        provider.init().await.unwrap();
        provider.init().await.unwrap(); // idempotent

        let embedding = provider.embed("printer not working").await.unwrap();
        assert_eq!(embedding, vec![0.6, 0.8]);
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_typed_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let provider = HttpProvider::new(server.uri());
        provider.init().await.unwrap();

        let err = provider.embed("hello").await.unwrap_err();
        assert_eq!(err, EmbeddingError::RateLimited { retry_after_secs: 7 });
    }

    #[tokio::test]
    async fn test_server_error_maps_to_computation_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
            .mount(&server)
            .await;

        let provider = HttpProvider::new(server.uri());
        provider.init().await.unwrap();

        let err = provider.embed("hello").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::ComputationFailed(_)));
    }

    #[tokio::test]
    async fn test_empty_data_maps_to_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"data": [], "model": "m"})),
            )
            .mount(&server)
            .await;

        let provider = HttpProvider::new(server.uri());
        provider.init().await.unwrap();

        let err = provider.embed("hello").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidResponse(_)));
    }
}
