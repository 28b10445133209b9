//! Fieldsage LLM Provider Layer
//!
//! Generative-model access for the recommendation orchestrator.
//!
//! # Providers
//!
//! - `MockChatModel`: Deterministic mock for testing
//! - `GatewayProvider`: OpenAI-compatible chat-completions gateway
//!
//! # Examples
//!
//! ```
//! use fieldsage_llm::{ChatModel, ChatRequest, MockChatModel};
//!
//! # async fn example() {
//! let model = MockChatModel::new("[]");
//! let reply = model.complete(&ChatRequest::new("system", "user")).await.unwrap();
//! assert_eq!(reply, "[]");
//! assert_eq!(model.call_count(), 1);
//! # }
//! ```

#![warn(missing_docs)]

pub mod gateway;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use gateway::GatewayProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Completion came back without any message content
    #[error("No content in AI response")]
    EmptyContent,

    /// Upstream answered 429
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Upstream answered 402: credits or billing exhausted
    #[error("Quota exhausted")]
    QuotaExhausted,

    /// Any other non-2xx answer
    #[error("Upstream HTTP {status}: {body}")]
    Upstream {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },
}

/// A system + user message pair sent as one completion call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    /// System message
    pub system: String,
    /// User message
    pub user: String,
}

impl ChatRequest {
    /// Build a request from both prompts
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// A generative model that answers one chat-completion call
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one completion and return the assistant message text
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError>;

    /// Model identifier, for logging
    fn model_name(&self) -> &str;
}

/// Mock chat model for deterministic testing
///
/// Replies are served from a queue first, then the default response. Clones
/// share call counts and recorded requests.
///
/// # Examples
///
/// ```
/// use fieldsage_llm::{ChatModel, ChatRequest, LlmError, MockChatModel};
///
/// # async fn example() {
/// let model = MockChatModel::new("fallback");
/// model.push_error(LlmError::RateLimitExceeded);
///
/// let req = ChatRequest::new("s", "u");
/// assert_eq!(model.complete(&req).await, Err(LlmError::RateLimitExceeded));
/// assert_eq!(model.complete(&req).await.unwrap(), "fallback");
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MockChatModel {
    default_response: String,
    queued: Arc<Mutex<VecDeque<Result<String, LlmError>>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl MockChatModel {
    /// Create a mock with a fixed response for every call
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            queued: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a one-shot successful reply
    pub fn push_response(&self, response: impl Into<String>) {
        self.lock_queue().push_back(Ok(response.into()));
    }

    /// Queue a one-shot failure
    pub fn push_error(&self, error: LlmError) {
        self.lock_queue().push_back(Err(error));
    }

    /// Number of completion calls made so far
    pub fn call_count(&self) -> usize {
        self.lock_requests().len()
    }

    /// Every request seen so far, oldest first
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.lock_requests().clone()
    }

    fn lock_queue(&self) -> std::sync::MutexGuard<'_, VecDeque<Result<String, LlmError>>> {
        self.queued.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_requests(&self) -> std::sync::MutexGuard<'_, Vec<ChatRequest>> {
        self.requests.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockChatModel {
    fn default() -> Self {
        Self::new("[]")
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        self.lock_requests().push(request.clone());

        if let Some(queued) = self.lock_queue().pop_front() {
            return queued;
        }

        Ok(self.default_response.clone())
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_default_response() {
        let model = MockChatModel::new("Test response");
        let result = model.complete(&ChatRequest::new("s", "any prompt")).await;
        assert_eq!(result.unwrap(), "Test response");
    }

    #[tokio::test]
    async fn test_mock_queue_before_default() {
        let model = MockChatModel::default();
        model.push_response("first");
        model.push_response("second");

        let req = ChatRequest::new("s", "u");
        assert_eq!(model.complete(&req).await.unwrap(), "first");
        assert_eq!(model.complete(&req).await.unwrap(), "second");
        assert_eq!(model.complete(&req).await.unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_mock_records_requests() {
        let model = MockChatModel::default();
        model.complete(&ChatRequest::new("sys", "user one")).await.unwrap();
        model.complete(&ChatRequest::new("sys", "user two")).await.unwrap();

        assert_eq!(model.call_count(), 2);
        assert_eq!(model.requests()[1].user, "user two");
    }

    #[tokio::test]
    async fn test_mock_clone_shares_state() {
        let model1 = MockChatModel::new("test");
        let model2 = model1.clone();

        model1.complete(&ChatRequest::new("s", "u")).await.unwrap();

        assert_eq!(model1.call_count(), 1);
        assert_eq!(model2.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_error() {
        let model = MockChatModel::default();
        model.push_error(LlmError::QuotaExhausted);

        let result = model.complete(&ChatRequest::new("s", "u")).await;
        assert!(matches!(result, Err(LlmError::QuotaExhausted)));
    }
}
