//! Error types for the Bayan pipeline
//!
//! Provides a single error enum with distinct variants per failure mode:
//! - Upstream service failures (embedding, vector store, LLM) that the
//!   orchestrator must surface as a degraded response, never as fabricated
//!   content
//! - Malformed upstream responses that are recovered locally
//! - Configuration and internal defects

use std::fmt;
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Coarse error classification for logging and degrade decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Embedding service unreachable or returned a non-success status
    Embedding,
    /// Vector store unreachable or returned a non-success status
    VectorStore,
    /// LLM service unreachable or returned a non-success status
    Llm,
    /// Upstream returned a response we could not interpret
    MalformedResponse,
    /// Configuration problem at startup
    Configuration,
    /// Programming defect or unexpected condition
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Embedding => "embedding",
            ErrorKind::VectorStore => "vector_store",
            ErrorKind::Llm => "llm",
            ErrorKind::MalformedResponse => "malformed_response",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // External service errors
    #[error("Embedding service error: {message}")]
    Embedding { message: String },

    #[error("Embedding timeout after {timeout_ms}ms")]
    EmbeddingTimeout { timeout_ms: u64 },

    #[error("Vector store error: {message}")]
    VectorStore { message: String },

    #[error("LLM service returned status {status}: {message}")]
    LlmStatus { status: u16, message: String },

    #[error("LLM response malformed: {message}")]
    LlmMalformed { message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    // Internal errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Embedding { .. } | AppError::EmbeddingTimeout { .. } => ErrorKind::Embedding,
            AppError::VectorStore { .. } => ErrorKind::VectorStore,
            AppError::LlmStatus { .. } => ErrorKind::Llm,
            AppError::LlmMalformed { .. } | AppError::Serialization(_) => {
                ErrorKind::MalformedResponse
            }
            AppError::HttpClient(_) => ErrorKind::Llm,
            AppError::Configuration { .. } => ErrorKind::Configuration,
            AppError::Internal { .. } | AppError::Other(_) => ErrorKind::Internal,
        }
    }

    /// True when the failure came from an external service rather than
    /// this process. The engine answers these with a labeled
    /// "temporarily unavailable" response instead of propagating.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Embedding | ErrorKind::VectorStore | ErrorKind::Llm
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let err = AppError::VectorStore {
            message: "timeout".into(),
        };
        assert_eq!(err.kind(), ErrorKind::VectorStore);
        assert!(err.is_upstream());
    }

    #[test]
    fn test_internal_not_upstream() {
        let err = AppError::Internal {
            message: "bug".into(),
        };
        assert!(!err.is_upstream());
    }

    #[test]
    fn test_llm_status() {
        let err = AppError::LlmStatus {
            status: 502,
            message: "bad gateway".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Llm);
        assert!(err.to_string().contains("502"));
    }
}
