//! Query validator asking an OpenAI-compatible chat model.
//!
//! The model is instructed to answer with exactly `valid` or `invalid`.
//! Any other answer, and any transport failure, is reported as
//! [`IntentError::ValidatorUnavailable`]. Requires the `openai` feature.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{IntentError, Result};
use crate::openai::{DEFAULT_BASE_URL, OpenAIClient};
use crate::validation::QueryValidator;

/// Default chat model.
pub const DEFAULT_VALIDATOR_MODEL: &str = "gpt-4o-mini";

const SYSTEM_PROMPT: &str = "You are a query validator. Determine if the user query is a \
coherent, meaningful request or random gibberish. Respond with exactly one word: \
'valid' or 'invalid'.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Settings of [`OpenAIQueryValidator`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenAIValidatorConfig {
    /// Chat model name.
    pub model: String,
    /// API root.
    pub base_url: String,
}

impl Default for OpenAIValidatorConfig {
    fn default() -> Self {
        OpenAIValidatorConfig {
            model: DEFAULT_VALIDATOR_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Query validator backed by an OpenAI-compatible chat completions API.
#[derive(Debug, Clone)]
pub struct OpenAIQueryValidator {
    client: OpenAIClient,
    config: OpenAIValidatorConfig,
}

impl OpenAIQueryValidator {
    /// Create a validator authenticating with `api_key`.
    pub fn new(api_key: String, config: OpenAIValidatorConfig) -> Result<Self> {
        if config.model.trim().is_empty() {
            return Err(IntentError::invalid_config("validator model name is empty"));
        }
        let client = OpenAIClient::new(api_key, &config.base_url)?;
        Ok(Self { client, config })
    }

    /// Create a validator for `model`, reading credentials from the environment.
    pub fn from_env(model: &str) -> Result<Self> {
        let client = OpenAIClient::from_env()?;
        let config = OpenAIValidatorConfig {
            model: model.to_string(),
            base_url: client.base_url().to_string(),
        };
        Ok(Self { client, config })
    }

    /// Validator settings.
    pub fn config(&self) -> &OpenAIValidatorConfig {
        &self.config
    }
}

/// Map the model's answer to a verdict.
fn parse_verdict(answer: &str) -> Result<bool> {
    let word = answer
        .trim()
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    match word.as_str() {
        "valid" => Ok(true),
        "invalid" => Ok(false),
        _ => Err(IntentError::validator_unavailable(format!(
            "unexpected validator answer: {answer:?}"
        ))),
    }
}

#[async_trait]
impl QueryValidator for OpenAIQueryValidator {
    async fn validate(&self, query: &str) -> Result<bool> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: query,
                },
            ],
            temperature: 0.0,
            max_tokens: 4,
        };

        let response: ChatResponse = self
            .client
            .post_json(
                "chat/completions",
                &request,
                IntentError::ValidatorUnavailable,
            )
            .await?;

        let answer = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| IntentError::validator_unavailable("empty validator response"))?;

        parse_verdict(&answer)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}
