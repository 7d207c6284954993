//! Minimal client for OpenAI-compatible HTTP APIs.
//!
//! Shared by [`OpenAIEmbeddingProvider`](crate::embedding::openai::OpenAIEmbeddingProvider)
//! and [`OpenAIQueryValidator`](crate::validation::openai::OpenAIQueryValidator).
//! Requires the `openai` feature.

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{IntentError, Result};

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Environment variable overriding the API root.
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

/// Authenticated JSON client for one API root.
#[derive(Clone)]
pub struct OpenAIClient {
    /// HTTP client for making API requests.
    client: Client,
    /// API key sent as a bearer token.
    api_key: String,
    /// API root without trailing slash.
    base_url: String,
}

impl std::fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OpenAIClient {
    /// Create a client for `base_url` authenticating with `api_key`.
    pub fn new(api_key: String, base_url: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(IntentError::invalid_config("OpenAI API key is empty"));
        }
        let base_url = base_url.trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(IntentError::invalid_config(format!(
                "OpenAI base URL must be http(s): {base_url}"
            )));
        }

        Ok(Self {
            client: Client::new(),
            api_key,
            base_url: base_url.to_string(),
        })
    }

    /// Read the API key (and optional base URL) from the environment.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| IntentError::invalid_config(format!("{API_KEY_ENV} is not set")))?;
        let base_url = std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(api_key, &base_url)
    }

    /// API root this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `body` as JSON to `{base_url}/{path}` and decode the JSON reply.
    ///
    /// Every failure is reported through `error`, so callers choose the error
    /// kind their contract promises.
    pub async fn post_json<Req, Resp>(
        &self,
        path: &str,
        body: &Req,
        error: fn(String) -> IntentError,
    ) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let http_response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| error(format!("request to {url} failed: {e}")))?;

        let status = http_response.status();
        let response_text = http_response
            .text()
            .await
            .map_err(|e| error(format!("failed to read response text: {e}")))?;

        if !status.is_success() {
            return Err(error(format!("API error (status {status}): {response_text}")));
        }

        serde_json::from_str(&response_text).map_err(|e| {
            error(format!(
                "failed to parse response: {e}. Response text: {response_text}"
            ))
        })
    }
}
