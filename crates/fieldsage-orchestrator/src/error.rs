//! Error types for the Orchestrator

use fieldsage_llm::LlmError;
use thiserror::Error;

/// Errors that can occur while producing recommendations
///
/// None of these are retried; the caller reports them and lets the operator
/// re-trigger.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrchestratorError {
    /// Service credentials are not configured
    #[error("{0}")]
    MissingCredentials(String),

    /// Request payload is unusable
    #[error("{0}")]
    InvalidInput(String),

    /// Generative model answered 429
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    /// Generative model answered 402
    #[error("AI credits exhausted. Please add credits to the AI gateway workspace.")]
    QuotaExhausted,

    /// Any other non-2xx answer from the model
    #[error("Failed to get AI recommendations")]
    Upstream {
        /// HTTP status from upstream
        status: u16,
        /// Raw upstream body
        body: String,
    },

    /// Model reply had no content
    #[error("No content in AI response")]
    EmptyResponse,

    /// Model reply could not be parsed as a recommendation array
    #[error("Failed to parse AI recommendations")]
    MalformedOutput {
        /// Raw model text
        raw: String,
    },

    /// Transport failure talking to the model
    #[error("LLM communication error: {0}")]
    Communication(String),
}

impl From<LlmError> for OrchestratorError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::RateLimitExceeded => OrchestratorError::RateLimited,
            LlmError::QuotaExhausted => OrchestratorError::QuotaExhausted,
            LlmError::Upstream { status, body } => OrchestratorError::Upstream { status, body },
            LlmError::EmptyContent => OrchestratorError::EmptyResponse,
            LlmError::InvalidResponse(msg) => OrchestratorError::Upstream {
                status: 200,
                body: msg,
            },
            LlmError::Communication(msg) => OrchestratorError::Communication(msg),
        }
    }
}
