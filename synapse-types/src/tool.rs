//! Tool schemas and tool calls.

use serde::{Deserialize, Serialize};

/// JSON Schema description of a tool exposed to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Tool name (unique within one request).
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the tool's input.
    pub schema: serde_json::Value,
}

impl ToolSchema {
    /// Create a tool schema.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier for this call. Vendors that do not assign one get a
    /// synthesized id from the adapter.
    pub id: String,
    /// Name of the tool to invoke.
    pub name: String,
    /// Arguments as a JSON object.
    pub arguments: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_schema_roundtrip() {
        let schema = ToolSchema::new(
            "search",
            "Search the web",
            json!({ "type": "object", "properties": { "q": { "type": "string" } } }),
        );
        let val = serde_json::to_value(&schema).unwrap();
        let back: ToolSchema = serde_json::from_value(val).unwrap();
        assert_eq!(schema, back);
    }

    #[test]
    fn tool_call_roundtrip() {
        let call = ToolCall {
            id: "search_1700000000_0042".into(),
            name: "search".into(),
            arguments: json!({ "q": "rust" }),
        };
        let val = serde_json::to_value(&call).unwrap();
        let back: ToolCall = serde_json::from_value(val).unwrap();
        assert_eq!(call, back);
    }
}
