//! Chat-completions gateway provider
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint. The default
//! target is the hosted AI gateway the browser extension ships with.
//!
//! Calls are made once per request batch and never retried: rate-limit and
//! quota answers are surfaced as their own error variants so the caller can
//! back off.
//!
//! # Examples
//!
//! ```no_run
//! use fieldsage_llm::GatewayProvider;
//!
//! let provider = GatewayProvider::new(
//!     "https://ai.gateway.lovable.dev/v1/chat/completions",
//!     "google/gemini-2.5-flash",
//!     "api-key",
//! )
//! .unwrap();
//! ```

use crate::{ChatModel, ChatRequest, LlmError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

/// Default gateway endpoint
pub const DEFAULT_ENDPOINT: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";

/// Default model served by the gateway
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";

/// Default timeout for completion requests (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// OpenAI-compatible chat-completions provider
pub struct GatewayProvider {
    endpoint: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct CompletionRequestBody<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponseBody {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl GatewayProvider {
    /// Create a provider for the given endpoint, model and bearer key
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Communication` when the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, LlmError> {
        Self::with_timeout(endpoint, model, api_key, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Same as [`GatewayProvider::new`] with an explicit request timeout
    pub fn with_timeout(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Communication(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Endpoint this provider posts to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatModel for GatewayProvider {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let body = CompletionRequestBody {
            model: &self.model,
            messages: [
                Message {
                    role: "system",
                    content: &request.system,
                },
                Message {
                    role: "user",
                    content: &request.user,
                },
            ],
        };

        debug!(
            "Calling model gateway {} (system {} chars, user {} chars)",
            self.endpoint,
            request.system.len(),
            request.user.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("AI gateway error: {} {}", status, error_text);

            return Err(match status.as_u16() {
                429 => LlmError::RateLimitExceeded,
                402 => LlmError::QuotaExhausted,
                code => LlmError::Upstream {
                    status: code,
                    body: error_text,
                },
            });
        }

        let parsed: CompletionResponseBody = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(LlmError::EmptyContent)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
