//! Error types for the page layer

use thiserror::Error;

/// Errors that can occur while reading or writing page fields
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PageError {
    /// No element could be located for the field id
    #[error("Field not found: {0}")]
    NotFound(String),

    /// A CSS selector could not be parsed
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// A bounded wait ran out
    #[error("Timed out waiting for {0}")]
    Timeout(String),

    /// The driver failed to carry out a step
    #[error("Driver error: {0}")]
    Driver(String),

    /// Markup rewriting failed
    #[error("Rewrite error: {0}")]
    Rewrite(String),
}
