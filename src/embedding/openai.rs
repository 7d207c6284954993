//! OpenAI API-based embedding provider.
//!
//! Works with any server exposing an OpenAI-compatible `/embeddings` route.
//! Requires the `openai` feature (enabled by default).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::embedding::{EmbeddingProvider, ensure_batch_len};
use crate::error::{IntentError, Result};
use crate::openai::{DEFAULT_BASE_URL, OpenAIClient};

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Request structure for the Embeddings API.
#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    /// Model identifier to use for embeddings.
    model: &'a str,
    /// Input texts to embed (batch).
    input: &'a [&'a str],
    /// Optional custom dimension (only for newer models).
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

/// Response structure from the Embeddings API.
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    /// List of embedding data objects.
    data: Vec<EmbeddingData>,
}

/// Individual embedding data from API response.
#[derive(Debug, Deserialize)]
struct EmbeddingData {
    /// Position of the input this vector belongs to.
    #[serde(default)]
    index: usize,
    /// The embedding vector.
    embedding: Vec<f32>,
}

/// Settings of [`OpenAIEmbeddingProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAIEmbeddingConfig {
    /// Model name (e.g. "text-embedding-3-small").
    pub model: String,
    /// API root.
    pub base_url: String,
    /// Requested output dimension; `None` uses the model default.
    pub dimensions: Option<usize>,
}

impl Default for OpenAIEmbeddingConfig {
    fn default() -> Self {
        OpenAIEmbeddingConfig {
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            dimensions: None,
        }
    }
}

/// Embedding provider backed by an OpenAI-compatible HTTP API.
///
/// # Examples
///
/// ```no_run
/// use hybrid_intent::embedding::EmbeddingProvider;
/// use hybrid_intent::embedding::openai::{OpenAIEmbeddingConfig, OpenAIEmbeddingProvider};
///
/// # async fn example() -> hybrid_intent::error::Result<()> {
/// let provider = OpenAIEmbeddingProvider::new(
///     std::env::var("OPENAI_API_KEY").unwrap_or_default(),
///     OpenAIEmbeddingConfig::default(),
/// )?;
/// let vector = provider.embed("How do I book a flight?").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OpenAIEmbeddingProvider {
    client: OpenAIClient,
    config: OpenAIEmbeddingConfig,
}

impl OpenAIEmbeddingProvider {
    /// Create a provider authenticating with `api_key`.
    pub fn new(api_key: String, config: OpenAIEmbeddingConfig) -> Result<Self> {
        if config.model.trim().is_empty() {
            return Err(IntentError::invalid_config("embedding model name is empty"));
        }
        if config.dimensions == Some(0) {
            return Err(IntentError::invalid_config("embedding dimensions must be positive"));
        }
        let client = OpenAIClient::new(api_key, &config.base_url)?;
        Ok(Self { client, config })
    }

    /// Create a provider for `model`, reading credentials from the environment.
    pub fn from_env(model: &str) -> Result<Self> {
        let client = OpenAIClient::from_env()?;
        let config = OpenAIEmbeddingConfig {
            model: model.to_string(),
            base_url: client.base_url().to_string(),
            dimensions: None,
        };
        Ok(Self { client, config })
    }

    /// Provider settings.
    pub fn config(&self) -> &OpenAIEmbeddingConfig {
        &self.config
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbeddingRequest {
            model: &self.config.model,
            input: texts,
            dimensions: self.config.dimensions,
        };

        let response: EmbeddingResponse = self
            .client
            .post_json("embeddings", &request, IntentError::Provider)
            .await?;

        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        let vectors: Vec<Vec<f32>> = data.into_iter().map(|d| d.embedding).collect();
        ensure_batch_len(texts.len(), &vectors)?;

        Ok(vectors)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let input = ["hello", "world"];
        let request = EmbeddingRequest {
            model: "text-embedding-3-small",
            input: &input,
            dimensions: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(
            json,
            r#"{"model":"text-embedding-3-small","input":["hello","world"]}"#
        );
    }

    #[test]
    fn test_response_parsing_keeps_input_order() {
        let raw = r#"{"data":[{"index":1,"embedding":[0.5]},{"index":0,"embedding":[0.25]}]}"#;
        let response: EmbeddingResponse = serde_json::from_str(raw).unwrap();
        let mut data = response.data;
        data.sort_by_key(|d| d.index);
        assert_eq!(data[0].embedding, vec![0.25]);
        assert_eq!(data[1].embedding, vec![0.5]);
    }

    #[test]
    fn test_config_validation() {
        let config = OpenAIEmbeddingConfig {
            model: String::new(),
            ..Default::default()
        };
        assert!(OpenAIEmbeddingProvider::new("sk-test".to_string(), config).is_err());

        let config = OpenAIEmbeddingConfig {
            dimensions: Some(0),
            ..Default::default()
        };
        assert!(OpenAIEmbeddingProvider::new("sk-test".to_string(), config).is_err());

        let provider =
            OpenAIEmbeddingProvider::new("sk-test".to_string(), OpenAIEmbeddingConfig::default())
                .unwrap();
        assert_eq!(provider.name(), DEFAULT_EMBEDDING_MODEL);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        let config = OpenAIEmbeddingConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        };
        let provider = OpenAIEmbeddingProvider::new("sk-test".to_string(), config).unwrap();
        assert!(provider.embed_batch(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_server_is_provider_error() {
        let config = OpenAIEmbeddingConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..Default::default()
        };
        let provider = OpenAIEmbeddingProvider::new("sk-test".to_string(), config).unwrap();
        assert!(matches!(
            provider.embed("hello").await,
            Err(IntentError::Provider(_))
        ));
    }
}
