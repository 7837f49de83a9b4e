//! Model client abstraction and the OpenAI-compatible HTTP implementation.

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde_json::json;
use tracing::debug;

/// Errors from a model invocation.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The call exceeded its deadline
    #[error("model call timed out")]
    Timeout,

    /// The API returned a non-success status
    #[error("API error (status {status}): {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// The API returned no content
    #[error("model returned an empty response")]
    EmptyResponse,
}

/// One language-model invocation.
///
/// Implementations must be safe to call concurrently; the evaluator issues
/// many invocations at once under a semaphore bound.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send one chat request and return the raw response text.
    async fn invoke(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f64,
    ) -> Result<String, ModelError>;

    /// Name of the underlying model, for reporting.
    fn model_name(&self) -> &str;
}

/// Configuration for [`OpenAiClient`].
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Base URL of an OpenAI-compatible API
    pub base_url: String,
    /// Bearer token, if the endpoint requires one
    pub api_key: Option<String>,
    /// Model name sent with each request
    pub model: String,
    /// Per-request deadline
    pub timeout: std::time::Duration,
    /// Completion token cap per call
    pub max_tokens: u32,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            timeout: std::time::Duration::from_secs(60),
            max_tokens: 300,
        }
    }
}

/// Client for any OpenAI-compatible chat completions endpoint.
///
/// Works with OpenAI itself, local servers (ollama, vllm), and proxy
/// gateways; only the base URL and key change.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    /// Build a client with its own connection pool and deadline.
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            client: ClientBuilder::new()
                .timeout(config.timeout)
                .build()
                .unwrap_or_default(),
            config,
        }
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn invoke(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        temperature: f64,
    ) -> Result<String, ModelError> {
        let payload = json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt},
            ],
            "temperature": temperature,
            "max_tokens": self.config.max_tokens,
        });

        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let mut request = self.client.post(&url).json(&payload);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() { ModelError::Timeout } else { ModelError::Http(e) }
        })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api { status, body });
        }

        #[derive(serde::Deserialize)]
        struct ChatResponse {
            choices: Vec<Choice>,
        }
        #[derive(serde::Deserialize)]
        struct Choice {
            message: Message,
        }
        #[derive(serde::Deserialize)]
        struct Message {
            content: Option<String>,
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(ModelError::EmptyResponse);
        }

        debug!(model = %self.config.model, chars = content.len(), "model response received");
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
