//! Generation options, results, token usage, and the [`ChatModel`] trait.

use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::message::ChatMessage;
use crate::tool::{ToolCall, ToolSchema};

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of the response.
    Stop,
    /// Hit the max-tokens limit.
    Length,
    /// Content was filtered by safety.
    Filtered,
    /// The model wants to call a tool.
    ToolCall,
    /// The vendor reported an abnormal finish.
    Error,
}

/// Token usage from a single provider call.
///
/// `thinking` is `None` when the vendor reports nothing — distinct from a
/// reported 0. `cache_read`/`cache_write` split the prompt tokens served
/// from and newly written to a vendor-side prompt cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens consumed (cache-read portion already subtracted).
    pub prompt: u64,
    /// Completion tokens generated.
    pub completion: u64,
    /// Total tokens as reported by the vendor.
    pub total: u64,
    /// Reasoning/thinking tokens, when the vendor reports them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<u64>,
    /// Prompt tokens served from the vendor-side cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read: Option<u64>,
    /// Prompt tokens newly written to the vendor-side cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_write: Option<u64>,
}

/// Canonical options for one generation call.
///
/// `tool_choice` is kept as a raw string rather than an enum on purpose:
/// the vendor mapping tables distinguish `""`, `"auto"`, `"any"`, `"none"`
/// and a specific tool name, and quirks like `"any"` collapsing to the
/// vendor's AUTO mode must survive translation unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Model identifier (empty = provider default).
    pub model: String,
    /// Maximum output tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Thinking/reasoning budget. Only meaningful when > 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking_effort: Option<u32>,
    /// Vendor-side tool ids (shorthand for tools the transport resolves
    /// itself, distinct from inline `tool_schemas`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_ids: Vec<String>,
    /// Tool selection: `None`/`"auto"`/`"any"`/`""` = model decides,
    /// `"none"` = no tools, anything else = that specific tool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
    /// Inline tool schemas by name, in deterministic order.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tool_schemas: BTreeMap<String, ToolSchema>,
    /// Sequences that stop generation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop_sequences: Vec<String>,
    /// Nucleus sampling parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Deterministic sampling seed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    /// Presence penalty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    /// Frequency penalty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    /// Call timeout, forwarded to the transport untouched. No retry or
    /// backoff happens below this boundary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    /// Opaque streaming target hint, forwarded untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_to: Option<String>,
}

/// Result of one generation call, normalized across vendors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateResult {
    /// The response text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Legacy response field; consumers prefer `content` when both are set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Token usage, when the vendor reported any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenUsage>,
    /// Normalized finish reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    /// Tool calls requested by the model, in response order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Vendor metadata (model version, response id).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl GenerateResult {
    /// The response text, preferring `content` over the legacy `result`.
    #[must_use]
    pub fn text(&self) -> &str {
        self.content
            .as_deref()
            .or(self.result.as_deref())
            .unwrap_or("")
    }
}

/// One-shot chat model interface.
///
/// Each provider adapter implements this by translating the canonical
/// messages and options into its vendor's wire format and normalizing the
/// response back. Exactly one network call per invocation; errors come
/// back as structured [`LlmError`] values.
///
/// This trait uses RPITIT and is NOT object-safe. That's intentional —
/// the runtime is generic over `M: ChatModel`, and anything needing a
/// trait object should wrap at a higher boundary.
pub trait ChatModel: Send + Sync {
    /// Run one generation call.
    fn generate(
        &self,
        messages: Vec<ChatMessage>,
        options: GenerateOptions,
    ) -> impl Future<Output = Result<GenerateResult, LlmError>> + Send;
}
