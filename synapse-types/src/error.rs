//! The canonical error taxonomy for provider failures.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a provider failure, normalized across vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or invalid request (vendor 400).
    InvalidRequest,
    /// Authentication or authorization failure (vendor 401/403).
    AuthenticationError,
    /// Requested model does not exist (vendor 404).
    ModelError,
    /// Rate limited by the provider (vendor 429).
    RateLimitExceeded,
    /// Provider-side failure (vendor 5xx or unclassifiable).
    ServerError,
    /// Request exceeded the model's context window.
    ContextLengthExceeded,
    /// Content was blocked by the vendor's safety layer.
    ContentFiltered,
    /// The request timed out.
    TimeoutError,
    /// Network-level failure (connection reset, DNS, etc.).
    NetworkError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::AuthenticationError => "authentication_error",
            ErrorKind::ModelError => "model_error",
            ErrorKind::RateLimitExceeded => "rate_limit_exceeded",
            ErrorKind::ServerError => "server_error",
            ErrorKind::ContextLengthExceeded => "context_length_exceeded",
            ErrorKind::ContentFiltered => "content_filtered",
            ErrorKind::TimeoutError => "timeout_error",
            ErrorKind::NetworkError => "network_error",
        };
        write!(f, "{name}")
    }
}

impl ErrorKind {
    /// Whether retrying the request might succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::RateLimitExceeded
                | ErrorKind::ServerError
                | ErrorKind::TimeoutError
                | ErrorKind::NetworkError
        )
    }
}

/// A structured provider failure.
///
/// This is a value, not a panic: transport and vendor failures are mapped
/// into it and returned across the runtime boundary, never thrown.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
#[error("{kind}: {message}")]
pub struct LlmError {
    /// Normalized classification.
    pub kind: ErrorKind,
    /// Human-readable message from the vendor or transport.
    pub message: String,
    /// Vendor diagnostic detail (status code, error type, param).
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub metadata: serde_json::Value,
}

impl LlmError {
    /// Create an error with no metadata.
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            metadata: serde_json::Value::Null,
        }
    }

    /// Attach vendor diagnostic metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_display_is_snake_case() {
        assert_eq!(ErrorKind::ContextLengthExceeded.to_string(), "context_length_exceeded");
        assert_eq!(ErrorKind::RateLimitExceeded.to_string(), "rate_limit_exceeded");
        assert_eq!(ErrorKind::ServerError.to_string(), "server_error");
    }

    #[test]
    fn error_display_includes_kind_and_message() {
        let err = LlmError::new(ErrorKind::TimeoutError, "deadline exceeded");
        assert_eq!(err.to_string(), "timeout_error: deadline exceeded");
    }

    #[test]
    fn retryable_classification() {
        assert!(ErrorKind::RateLimitExceeded.is_retryable());
        assert!(ErrorKind::NetworkError.is_retryable());
        assert!(!ErrorKind::AuthenticationError.is_retryable());
        assert!(!ErrorKind::ContextLengthExceeded.is_retryable());
    }

    #[test]
    fn metadata_defaults_to_null() {
        let err = LlmError::new(ErrorKind::ServerError, "boom");
        assert!(err.metadata.is_null());
        let err = err.with_metadata(serde_json::json!({ "status": 500 }));
        assert_eq!(err.metadata["status"], 500);
    }
}
