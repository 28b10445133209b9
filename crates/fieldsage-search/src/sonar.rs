//! Sonar-style search provider
//!
//! The search API speaks the chat-completions dialect: a system message with
//! answering rules, a user message with the question, an optional
//! `search_domain_filter`, and a top-level `citations` array in the reply.

use crate::{SearchError, SearchProvider, SearchQuery, SearchResponse};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

/// Default search endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.perplexity.ai/chat/completions";

/// Default search model
pub const DEFAULT_MODEL: &str = "sonar";

/// Default timeout for search requests (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Search provider for Sonar-compatible APIs
pub struct SonarSearch {
    endpoint: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct SearchRequestBody<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    search_domain_filter: Option<[&'a str; 1]>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct SearchResponseBody {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    citations: Vec<String>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

impl SonarSearch {
    /// Create a search provider
    ///
    /// # Errors
    ///
    /// Returns `SearchError::Communication` when the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Communication(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: api_key.into(),
            client,
        })
    }
}

#[async_trait]
impl SearchProvider for SonarSearch {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
        let body = SearchRequestBody {
            model: &self.model,
            messages: [
                Message {
                    role: "system",
                    content: &query.instructions,
                },
                Message {
                    role: "user",
                    content: &query.query,
                },
            ],
            search_domain_filter: query.domain_filter.as_deref().map(|d| [d]),
        };

        debug!(
            "Search '{}' (domain filter: {:?})",
            query.query, query.domain_filter
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SearchError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Search API error: {} {}", status, error_text);

            return Err(if status.as_u16() == 429 {
                SearchError::RateLimitExceeded
            } else {
                SearchError::Upstream {
                    status: status.as_u16(),
                    body: error_text,
                }
            });
        }

        let parsed: SearchResponseBody = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .map(|message| message.content)
            .unwrap_or_default();

        Ok(SearchResponse {
            content,
            citations: parsed.citations,
        })
    }
}
