//! Gemini API client struct and builder.

use std::future::Future;

use synapse_types::{ChatMessage, ChatModel, ErrorKind, GenerateOptions, GenerateResult, LlmError};

use crate::error::{map_error_response, map_transport_error};
use crate::mapping::{from_api_response, to_api_request};

/// Default model used when the options carry an empty model name.
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default Gemini API base URL.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Client for the Gemini `generateContent` API.
///
/// Implements [`ChatModel`] for use anywhere a model is accepted.
///
/// # Example
///
/// ```no_run
/// use synapse_provider_gemini::Gemini;
///
/// let client = Gemini::new("AIza...")
///     .model("gemini-2.5-pro")
///     .base_url("https://generativelanguage.googleapis.com");
/// ```
pub struct Gemini {
    /// Gemini API key (`GEMINI_API_KEY`).
    pub(crate) api_key: String,
    /// Default model identifier used when the options do not specify one.
    pub(crate) model: String,
    /// API base URL (override for testing or proxies).
    pub(crate) base_url: String,
    /// Shared HTTP client.
    pub(crate) client: reqwest::Client,
}

impl Gemini {
    /// Create a new client with the given API key and sensible defaults.
    ///
    /// Default model: `gemini-2.0-flash`.
    /// Default base URL: `https://generativelanguage.googleapis.com`.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.into(),
            base_url: DEFAULT_BASE_URL.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Override the default model.
    ///
    /// This is used when [`GenerateOptions::model`] is empty.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API base URL.
    ///
    /// Useful for testing with a local mock server or an API proxy.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Build the generate endpoint URL for a model.
    pub(crate) fn generate_url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

impl ChatModel for Gemini {
    /// Send a generation request to the Gemini `generateContent` API.
    ///
    /// Maps the messages and options to Gemini's JSON format, sends them
    /// with the API key header, and maps the response back to
    /// [`GenerateResult`]. An invalid `tool_choice` fails before any
    /// network I/O.
    fn generate(
        &self,
        messages: Vec<ChatMessage>,
        options: GenerateOptions,
    ) -> impl Future<Output = Result<GenerateResult, LlmError>> + Send {
        let model = if options.model.is_empty() {
            self.model.clone()
        } else {
            options.model.clone()
        };
        let url = self.generate_url(&model);
        let api_key = self.api_key.clone();
        let http_client = self.client.clone();

        async move {
            let body = to_api_request(&messages, &options)?;

            tracing::debug!(url = %url, model = %model, "sending generate request");

            let mut request = http_client
                .post(&url)
                .header("x-goog-api-key", &api_key)
                .header("content-type", "application/json")
                .json(&body);
            if let Some(timeout) = options.timeout {
                request = request.timeout(timeout);
            }

            let response = request.send().await.map_err(map_transport_error)?;

            let status = response.status();
            let response_text = response.text().await.map_err(map_transport_error)?;

            if !status.is_success() {
                let parsed: serde_json::Value =
                    serde_json::from_str(&response_text).unwrap_or(serde_json::Value::Null);
                return Err(map_error_response(status.as_u16(), &parsed));
            }

            let json: serde_json::Value = serde_json::from_str(&response_text).map_err(|e| {
                LlmError::new(ErrorKind::ServerError, format!("invalid JSON response: {e}"))
            })?;

            from_api_response(&json)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_is_set() {
        let client = Gemini::new("test-key");
        assert_eq!(client.model, DEFAULT_MODEL);
    }

    #[test]
    fn default_base_url_is_set() {
        let client = Gemini::new("test-key");
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn builder_overrides_model() {
        let client = Gemini::new("test-key").model("gemini-2.5-pro");
        assert_eq!(client.model, "gemini-2.5-pro");
    }

    #[test]
    fn builder_overrides_base_url() {
        let client = Gemini::new("test-key").base_url("http://localhost:9999");
        assert_eq!(client.base_url, "http://localhost:9999");
    }

    #[test]
    fn generate_url_includes_model() {
        let client = Gemini::new("test-key").base_url("http://localhost:9999");
        assert_eq!(
            client.generate_url("gemini-2.0-flash"),
            "http://localhost:9999/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn api_key_is_stored() {
        let client = Gemini::new("AIza-test");
        assert_eq!(client.api_key, "AIza-test");
    }
}
