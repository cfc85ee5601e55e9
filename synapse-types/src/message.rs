//! Conversation messages and their content parts.

use serde::{Deserialize, Serialize};

/// Role of a message participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// System instructions.
    System,
    /// Developer instructions (treated like system by most vendors).
    Developer,
    /// A human user.
    User,
    /// The model's reply.
    Assistant,
    /// A tool invocation emitted by the model on a previous turn.
    FunctionCall,
    /// The result of a tool invocation, fed back to the model.
    FunctionResult,
}

/// Source for image content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageSource {
    /// URL pointing to an image.
    Url {
        /// The image URL.
        url: String,
        /// MIME type, when known.
        #[serde(skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
    /// Base64-encoded image data.
    Base64 {
        /// The base64-encoded data.
        data: String,
        /// MIME type (e.g. "image/png").
        mime_type: String,
    },
}

/// A single content part within a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Plain text.
    Text {
        /// The text content.
        text: String,
    },
    /// Image content.
    Image {
        /// The image source.
        source: ImageSource,
    },
}

/// Message content: either plain text or an ordered sequence of parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Plain text content.
    Text(String),
    /// Structured content parts.
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Flatten the content down to a single string: plain text passes
    /// through, structured parts contribute their text in order, images
    /// contribute nothing.
    #[must_use]
    pub fn flattened_text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|part| match part {
                    ContentPart::Text { text } => Some(text.as_str()),
                    ContentPart::Image { .. } => None,
                })
                .collect::<Vec<_>>()
                .join(""),
        }
    }

    /// Whether the content flattens to an empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flattened_text().is_empty()
    }
}

impl From<String> for MessageContent {
    fn from(s: String) -> Self {
        MessageContent::Text(s)
    }
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        MessageContent::Text(s.to_string())
    }
}

/// A message in a conversation.
///
/// `name` and `arguments` carry the payload of `FunctionCall` and
/// `FunctionResult` messages. `meta` is per-message transient metadata
/// (cache hints, routing tags); provider adapters strip it before mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message author.
    pub role: Role,
    /// The message content.
    pub content: MessageContent,
    /// Function name, for function-call and function-result messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Function-call arguments. May be a JSON object or a string-encoded
    /// JSON document; adapters decode the latter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<serde_json::Value>,
    /// Transient metadata, stripped by provider adapters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

impl ChatMessage {
    fn plain(role: Role, content: impl Into<MessageContent>) -> Self {
        Self {
            role,
            content: content.into(),
            name: None,
            arguments: None,
            meta: None,
        }
    }

    /// Create a system message.
    #[must_use]
    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self::plain(Role::System, content)
    }

    /// Create a user message.
    #[must_use]
    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self::plain(Role::User, content)
    }

    /// Create an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// Create a function-call message recording a tool invocation.
    #[must_use]
    pub fn function_call(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            role: Role::FunctionCall,
            content: MessageContent::Text(String::new()),
            name: Some(name.into()),
            arguments: Some(arguments),
            meta: None,
        }
    }

    /// Create a function-result message carrying a tool's output.
    #[must_use]
    pub fn function_result(name: impl Into<String>, content: impl Into<MessageContent>) -> Self {
        Self {
            role: Role::FunctionResult,
            content: content.into(),
            name: Some(name.into()),
            arguments: None,
            meta: None,
        }
    }

    /// Create a cache-hint marker keyed by agent id.
    ///
    /// The marker is opaque to providers: adapters strip the metadata and
    /// skip the (empty) message. Callers sitting between the runtime and
    /// the transport use it to cache the system portion of the request.
    #[must_use]
    pub fn cache_marker(agent_id: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(String::new()),
            name: None,
            arguments: None,
            meta: Some(serde_json::json!({ "cache": agent_id.into() })),
        }
    }
}
