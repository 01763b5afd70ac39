//! Error types for TaxGPT.
//!
//! This module defines a unified error enum covering configuration, I/O,
//! language-model, prompt, retrieval and web-search failures.

use thiserror::Error;

/// Unified error type for TaxGPT.
///
/// Collaborators return `Result<T, AppError>`. Pipeline stages never let one
/// escape: they turn it into a fallback state update instead.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors, including unparseable structured output
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Document retriever service errors
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Web search service errors
    #[error("Web search error: {0}")]
    WebSearch(String),

    /// An external call exceeded its time budget
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::Timeout("classifier after 30s".to_string());
        assert_eq!(err.to_string(), "Timed out: classifier after 30s");

        let err = AppError::Retrieval("connection refused".to_string());
        assert!(err.to_string().starts_with("Retrieval error"));
    }

    #[test]
    fn test_from_serde_json() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, AppError::Serialization(_)));
    }
}
