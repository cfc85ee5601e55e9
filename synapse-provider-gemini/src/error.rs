//! Classification of Gemini API failures into the canonical error
//! taxonomy.
//!
//! Classification combines the HTTP status class with message-substring
//! overrides: vendors report context overflows and content filtering
//! under generic statuses, so the message text refines the status-based
//! kind. Overrides apply in a fixed priority order regardless of status.

use synapse_types::{ErrorKind, LlmError};

/// Map a non-success HTTP response to a canonical [`LlmError`].
///
/// The vendor's message, code, and type are preserved in the error
/// metadata alongside the HTTP status. A body without an `error` object
/// classifies as [`ErrorKind::ServerError`] with an "Unknown error"
/// message.
#[must_use]
pub fn map_error_response(status: u16, body: &serde_json::Value) -> LlmError {
    let error = match body.get("error").filter(|error| !error.is_null()) {
        Some(error) => error,
        None => {
            return LlmError::new(ErrorKind::ServerError, "Unknown error")
                .with_metadata(serde_json::json!({ "status": status }));
        }
    };

    let message = error["message"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| format!("Gemini API error: {status}"));
    let kind = classify(status, &message);

    let mut metadata = serde_json::Map::new();
    metadata.insert("status".into(), serde_json::json!(status));
    if let Some(code) = error.get("code").filter(|code| !code.is_null()) {
        metadata.insert("code".into(), code.clone());
    }
    if let Some(status_name) = error["status"].as_str() {
        metadata.insert("type".into(), serde_json::json!(status_name));
    }

    LlmError::new(kind, message).with_metadata(serde_json::Value::Object(metadata))
}

/// Map a transport-layer failure (connect, TLS, timeout) to a canonical
/// error. These never carry a vendor body.
#[must_use]
pub fn map_transport_error(error: reqwest::Error) -> LlmError {
    let kind = if error.is_timeout() {
        ErrorKind::TimeoutError
    } else {
        ErrorKind::NetworkError
    };
    LlmError::new(kind, error.to_string())
}

fn classify(status: u16, message: &str) -> ErrorKind {
    let base = match status {
        400 => ErrorKind::InvalidRequest,
        401 | 403 => ErrorKind::AuthenticationError,
        404 => ErrorKind::ModelError,
        429 => ErrorKind::RateLimitExceeded,
        _ => ErrorKind::ServerError,
    };

    let lower = message.to_lowercase();
    if lower.contains("context length")
        || (lower.contains("maximum") && lower.contains("tokens"))
        || lower.contains("string too long")
    {
        ErrorKind::ContextLengthExceeded
    } else if lower.contains("content policy") || lower.contains("content filter") {
        ErrorKind::ContentFiltered
    } else if lower.contains("timeout") || lower.contains("timed out") {
        ErrorKind::TimeoutError
    } else if lower.contains("network") || lower.contains("connection") {
        ErrorKind::NetworkError
    } else {
        base
    }
}
