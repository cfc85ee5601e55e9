//! Request/response mapping between synapse types and the Gemini
//! `generateContent` API format.
//!
//! Reference: <https://ai.google.dev/api/generate-content>

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use synapse_types::{
    ChatMessage, ContentPart, ErrorKind, FinishReason, GenerateOptions, GenerateResult,
    ImageSource, LlmError, MessageContent, Role, TokenUsage, ToolCall, ToolSchema,
};

// ─── Request mapping ─────────────────────────────────────────────────────────

/// Build the full `generateContent` JSON body from canonical messages and
/// options.
///
/// # Errors
///
/// Returns [`ErrorKind::InvalidRequest`] when `tool_choice` names a tool
/// absent from the tool set — detected here, before any network call.
pub fn to_api_request(
    messages: &[ChatMessage],
    options: &GenerateOptions,
) -> Result<serde_json::Value, LlmError> {
    let (contents, system_instructions) = map_messages(messages);

    let mut body = serde_json::json!({ "contents": contents });

    if !system_instructions.is_empty() {
        let parts: Vec<serde_json::Value> = system_instructions
            .iter()
            .map(|text| serde_json::json!({ "text": text }))
            .collect();
        body["systemInstruction"] = serde_json::json!({ "parts": parts });
    }

    // Validate tool_choice even when no tools end up in the payload.
    let tool_config = map_tool_config(options.tool_choice.as_deref(), &options.tool_schemas)?;
    if let Some(tools) = map_tools(&options.tool_schemas) {
        body["tools"] = tools;
        body["toolConfig"] = serde_json::json!({ "functionCallingConfig": tool_config });
    }

    if let Some(config) = map_generation_config(options) {
        body["generationConfig"] = config;
    }

    Ok(body)
}

/// Map canonical messages to Gemini `contents` plus the collapsed, ordered
/// system-instruction list.
///
/// System and developer turns collapse into instructions; assistant turns
/// that flatten to an empty string are omitted entirely; function calls and
/// results become structured `functionCall`/`functionResponse` parts.
/// Per-message transient metadata (cache markers) never reaches the wire.
#[must_use]
pub fn map_messages(messages: &[ChatMessage]) -> (Vec<serde_json::Value>, Vec<String>) {
    let mut contents = Vec::new();
    let mut system_instructions = Vec::new();

    for message in messages {
        match message.role {
            Role::System | Role::Developer => {
                let text = message.content.flattened_text();
                // Empty instructions carry nothing; this also drops
                // stripped cache markers.
                if !text.is_empty() {
                    system_instructions.push(text);
                }
            }
            Role::User => {
                contents.push(serde_json::json!({
                    "role": "user",
                    "parts": map_user_parts(&message.content),
                }));
            }
            Role::Assistant => {
                let text = message.content.flattened_text();
                if text.is_empty() {
                    continue;
                }
                contents.push(serde_json::json!({
                    "role": "model",
                    "parts": [{ "text": text }],
                }));
            }
            Role::FunctionCall => {
                contents.push(serde_json::json!({
                    "role": "model",
                    "parts": [{
                        "functionCall": {
                            "name": message.name.clone().unwrap_or_default(),
                            "args": decode_arguments(message.arguments.as_ref()),
                        }
                    }],
                }));
            }
            Role::FunctionResult => {
                contents.push(serde_json::json!({
                    "role": "user",
                    "parts": [{
                        "functionResponse": {
                            "name": message.name.clone().unwrap_or_default(),
                            "response": function_response_value(&message.content),
                        }
                    }],
                }));
            }
        }
    }

    (contents, system_instructions)
}

fn map_user_parts(content: &MessageContent) -> Vec<serde_json::Value> {
    match content {
        MessageContent::Text(text) => vec![serde_json::json!({ "text": text })],
        MessageContent::Parts(parts) => parts.iter().map(map_content_part).collect(),
    }
}

fn map_content_part(part: &ContentPart) -> serde_json::Value {
    match part {
        ContentPart::Text { text } => serde_json::json!({ "text": text }),
        ContentPart::Image { source } => match source {
            ImageSource::Url { url, mime_type } => serde_json::json!({
                "fileData": {
                    "fileUri": url,
                    "mimeType": mime_type.clone().unwrap_or_else(|| "image/*".to_string()),
                }
            }),
            ImageSource::Base64 { data, mime_type } => serde_json::json!({
                "inlineData": {
                    "mimeType": mime_type,
                    "data": data,
                }
            }),
        },
    }
}

/// Function-call arguments: string-encoded JSON is decoded first; missing
/// or undecodable arguments become an empty object.
fn decode_arguments(arguments: Option<&serde_json::Value>) -> serde_json::Value {
    match arguments {
        Some(serde_json::Value::String(raw)) => serde_json::from_str(raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "function-call arguments are not valid JSON, sending an empty object");
            serde_json::json!({})
        }),
        Some(value) => value.clone(),
        None => serde_json::json!({}),
    }
}

/// Derive the `functionResponse.response` value from a function-result
/// message's content: a one-element text part list yields that text; a
/// plain string is JSON-decoded when possible; structured parts pass
/// through. Gemini requires an object, so scalar results are wrapped
/// under `"result"`.
fn function_response_value(content: &MessageContent) -> serde_json::Value {
    let derived = match content {
        MessageContent::Parts(parts) => match parts.as_slice() {
            [ContentPart::Text { text }] => serde_json::Value::String(text.clone()),
            _ => serde_json::to_value(parts).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "function-result parts are not serializable, sending an empty string");
                serde_json::Value::String(String::new())
            }),
        },
        MessageContent::Text(text) => serde_json::from_str(text)
            .unwrap_or_else(|_| serde_json::Value::String(text.clone())),
    };
    match derived {
        serde_json::Value::Object(_) => derived,
        other => serde_json::json!({ "result": other }),
    }
}

/// JSON-Schema keywords Gemini's function declarations reject.
const UNSUPPORTED_SCHEMA_KEYWORDS: &[&str] = &["multipleOf", "examples", "additionalProperties"];

/// Recursively remove vendor-unsupported JSON-Schema keywords at every
/// nesting level; everything else passes through verbatim.
#[must_use]
pub fn filter_schema(schema: &serde_json::Value) -> serde_json::Value {
    match schema {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .filter(|(key, _)| !UNSUPPORTED_SCHEMA_KEYWORDS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), filter_schema(value)))
                .collect(),
        ),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(filter_schema).collect())
        }
        other => other.clone(),
    }
}

/// Map the tool set to Gemini's `tools` array, or `None` when no complete
/// tool remains. Tools missing a name, description, or schema are dropped.
#[must_use]
pub fn map_tools(tools: &BTreeMap<String, ToolSchema>) -> Option<serde_json::Value> {
    let declarations: Vec<serde_json::Value> = tools
        .values()
        .filter(|tool| {
            !tool.name.is_empty() && !tool.description.is_empty() && !tool.schema.is_null()
        })
        .map(|tool| {
            serde_json::json!({
                "name": tool.name,
                "description": tool.description,
                "parameters": filter_schema(&tool.schema),
            })
        })
        .collect();
    if declarations.is_empty() {
        None
    } else {
        Some(serde_json::json!([{ "functionDeclarations": declarations }]))
    }
}

/// Map a canonical tool choice to Gemini's function-calling config.
///
/// `None`/`"auto"`/`"any"`/`""` mean AUTO (the `"any"` equivalence is a
/// source-system quirk, preserved); `"none"` means NONE; anything else
/// must name an existing tool (case-sensitive) and yields ANY restricted
/// to that tool.
///
/// # Errors
///
/// [`ErrorKind::InvalidRequest`] when a specific tool name is not present
/// in `tools`.
pub fn map_tool_config(
    choice: Option<&str>,
    tools: &BTreeMap<String, ToolSchema>,
) -> Result<serde_json::Value, LlmError> {
    match choice {
        None | Some("auto" | "any" | "") => Ok(serde_json::json!({ "mode": "AUTO" })),
        Some("none") => Ok(serde_json::json!({ "mode": "NONE" })),
        Some(name) => {
            if tools.contains_key(name) {
                Ok(serde_json::json!({
                    "mode": "ANY",
                    "allowedFunctionNames": [name],
                }))
            } else {
                Err(LlmError::new(
                    ErrorKind::InvalidRequest,
                    format!("{name} not found in available tools"),
                ))
            }
        }
    }
}

/// Map canonical options to Gemini's `generationConfig`, renaming keys
/// one-to-one. Returns `None` when nothing is set, so empty configs stay
/// out of the payload entirely.
#[must_use]
pub fn map_generation_config(options: &GenerateOptions) -> Option<serde_json::Value> {
    let mut config = serde_json::Map::new();
    if let Some(max_tokens) = options.max_tokens {
        config.insert("maxOutputTokens".into(), serde_json::json!(max_tokens));
    }
    if let Some(temperature) = options.temperature {
        config.insert("temperature".into(), serde_json::json!(temperature));
    }
    if !options.stop_sequences.is_empty() {
        config.insert("stopSequences".into(), serde_json::json!(options.stop_sequences));
    }
    if let Some(top_p) = options.top_p {
        config.insert("topP".into(), serde_json::json!(top_p));
    }
    if let Some(seed) = options.seed {
        config.insert("seed".into(), serde_json::json!(seed));
    }
    if let Some(presence_penalty) = options.presence_penalty {
        config.insert("presencePenalty".into(), serde_json::json!(presence_penalty));
    }
    if let Some(frequency_penalty) = options.frequency_penalty {
        config.insert("frequencyPenalty".into(), serde_json::json!(frequency_penalty));
    }
    if let Some(effort) = options.thinking_effort.filter(|effort| *effort > 0) {
        config.insert(
            "thinkingConfig".into(),
            serde_json::json!({ "thinkingBudget": effort }),
        );
    }
    if config.is_empty() {
        None
    } else {
        Some(serde_json::Value::Object(config))
    }
}

// ─── Response mapping ─────────────────────────────────────────────────────────

/// Parse a Gemini `generateContent` response into a [`GenerateResult`].
///
/// Concatenates all text parts of the first candidate, collects function
/// calls (with synthesized ids), and normalizes the finish reason. Any
/// present tool call forces [`FinishReason::ToolCall`], overriding the
/// vendor's own finish code.
///
/// # Errors
///
/// A missing or empty candidate list is a hard failure
/// ([`ErrorKind::ServerError`]), not a soft error value.
pub fn from_api_response(body: &serde_json::Value) -> Result<GenerateResult, LlmError> {
    let candidates = body["candidates"]
        .as_array()
        .filter(|candidates| !candidates.is_empty())
        .ok_or_else(|| {
            LlmError::new(ErrorKind::ServerError, "malformed response: no candidates")
        })?;
    let candidate = &candidates[0];

    let mut content = String::new();
    let mut tool_calls = Vec::new();
    if let Some(parts) = candidate["content"]["parts"].as_array() {
        for part in parts {
            if let Some(text) = part["text"].as_str() {
                content.push_str(text);
            }
            if let Some(call) = part.get("functionCall") {
                let name = call["name"].as_str().unwrap_or_default().to_string();
                tool_calls.push(ToolCall {
                    id: synthesize_call_id(&name),
                    arguments: call.get("args").cloned().unwrap_or_else(|| serde_json::json!({})),
                    name,
                });
            }
        }
    }

    let finish_reason = if tool_calls.is_empty() {
        map_finish_reason(candidate["finishReason"].as_str())
    } else {
        FinishReason::ToolCall
    };

    let mut meta = serde_json::Map::new();
    if let Some(model_version) = body["modelVersion"].as_str() {
        meta.insert("model".into(), serde_json::json!(model_version));
    }
    if let Some(response_id) = body["responseId"].as_str() {
        meta.insert("response_id".into(), serde_json::json!(response_id));
    }

    Ok(GenerateResult {
        content: Some(content),
        result: None,
        tokens: map_usage(&body["usageMetadata"]),
        finish_reason: Some(finish_reason),
        tool_calls,
        meta: if meta.is_empty() {
            None
        } else {
            Some(serde_json::Value::Object(meta))
        },
    })
}

/// Synthesized id for a vendor tool call: `<name or "func">_<unix
/// seconds>_<random 4 digits>`.
fn synthesize_call_id(name: &str) -> String {
    let name = if name.is_empty() { "func" } else { name };
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0);
    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("{name}_{timestamp}_{suffix:04}")
}

/// Fixed lookup from Gemini finish codes to canonical finish reasons.
/// Unrecognized or missing codes map to [`FinishReason::Error`].
fn map_finish_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("STOP") => FinishReason::Stop,
        Some("MAX_TOKENS") => FinishReason::Length,
        Some(
            "SAFETY" | "RECITATION" | "LANGUAGE" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII"
            | "IMAGE_SAFETY",
        ) => FinishReason::Filtered,
        _ => FinishReason::Error,
    }
}

/// Map Gemini `usageMetadata` to canonical token usage, or `None` when the
/// vendor reported nothing (distinct from all-zero usage).
///
/// When `cachedContentTokenCount` is present, the prompt count splits into
/// `cache_read` (the cached portion) and `cache_write`
/// (`max(0, prompt − cache_read)`), and `prompt` is reduced by the read
/// portion.
#[must_use]
pub fn map_usage(usage: &serde_json::Value) -> Option<TokenUsage> {
    if !usage.is_object() {
        return None;
    }
    let mut prompt = usage["promptTokenCount"].as_u64().unwrap_or(0);
    let completion = usage["candidatesTokenCount"].as_u64().unwrap_or(0);
    let total = usage["totalTokenCount"].as_u64().unwrap_or(0);
    let thinking = usage["thoughtsTokenCount"].as_u64();

    let (cache_read, cache_write) = match usage["cachedContentTokenCount"].as_u64() {
        Some(cached) => {
            let write = prompt.saturating_sub(cached);
            prompt = prompt.saturating_sub(cached);
            (Some(cached), Some(write))
        }
        None => (None, None),
    };

    Some(TokenUsage {
        prompt,
        completion,
        total,
        thinking,
        cache_read,
        cache_write,
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool_map(tools: Vec<ToolSchema>) -> BTreeMap<String, ToolSchema> {
        tools
            .into_iter()
            .map(|tool| (tool.name.clone(), tool))
            .collect()
    }

    fn search_tool() -> ToolSchema {
        ToolSchema::new(
            "search",
            "Search the web",
            json!({ "type": "object", "properties": { "q": { "type": "string" } } }),
        )
    }

    #[test]
    fn system_and_developer_collapse_into_instructions() {
        let messages = vec![
            ChatMessage::system("Be helpful."),
            ChatMessage {
                role: Role::Developer,
                content: "Use metric units.".into(),
                name: None,
                arguments: None,
                meta: None,
            },
            ChatMessage::user("hi"),
        ];
        let (contents, instructions) = map_messages(&messages);
        assert_eq!(instructions, vec!["Be helpful.".to_string(), "Use metric units.".to_string()]);
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0]["role"], "user");
    }

    #[test]
    fn cache_marker_is_stripped() {
        let messages = vec![
            ChatMessage::system("Base."),
            ChatMessage::cache_marker("ns:helper"),
            ChatMessage::user("hi"),
        ];
        let (contents, instructions) = map_messages(&messages);
        assert_eq!(instructions, vec!["Base.".to_string()]);
        assert_eq!(contents.len(), 1);
    }

    #[test]
    fn empty_assistant_turn_is_omitted() {
        let messages = vec![
            ChatMessage::user("hi"),
            ChatMessage::assistant(""),
            ChatMessage::assistant("hello"),
        ];
        let (contents, _) = map_messages(&messages);
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][0]["text"], "hello");
    }

    #[test]
    fn user_image_parts_map_by_source_type() {
        let messages = vec![ChatMessage::user(MessageContent::Parts(vec![
            ContentPart::Text { text: "look".into() },
            ContentPart::Image {
                source: ImageSource::Url {
                    url: "https://example.com/x.png".into(),
                    mime_type: Some("image/png".into()),
                },
            },
            ContentPart::Image {
                source: ImageSource::Base64 {
                    data: "aGk=".into(),
                    mime_type: "image/jpeg".into(),
                },
            },
        ]))];
        let (contents, _) = map_messages(&messages);
        let parts = contents[0]["parts"].as_array().unwrap();
        assert_eq!(parts[0]["text"], "look");
        assert_eq!(parts[1]["fileData"]["fileUri"], "https://example.com/x.png");
        assert_eq!(parts[2]["inlineData"]["mimeType"], "image/jpeg");
    }

    #[test]
    fn function_call_decodes_string_arguments() {
        let message = ChatMessage::function_call("search", json!("{\"q\": \"rust\"}"));
        let (contents, _) = map_messages(&[message]);
        assert_eq!(contents[0]["role"], "model");
        let call = &contents[0]["parts"][0]["functionCall"];
        assert_eq!(call["name"], "search");
        assert_eq!(call["args"]["q"], "rust");
    }

    #[test]
    fn undecodable_string_arguments_become_empty_object() {
        let message = ChatMessage::function_call("search", json!("{not json"));
        let (contents, _) = map_messages(&[message]);
        let call = &contents[0]["parts"][0]["functionCall"];
        assert_eq!(call["args"], json!({}));
    }

    #[test]
    fn function_result_single_text_part_extracts_text() {
        let message = ChatMessage::function_result(
            "search",
            MessageContent::Parts(vec![ContentPart::Text { text: "3 hits".into() }]),
        );
        let (contents, _) = map_messages(&[message]);
        let response = &contents[0]["parts"][0]["functionResponse"]["response"];
        assert_eq!(response["result"], "3 hits");
        assert_eq!(contents[0]["role"], "user");
    }

    #[test]
    fn function_result_json_string_is_decoded() {
        let message = ChatMessage::function_result("search", "{\"hits\": 3}");
        let (contents, _) = map_messages(&[message]);
        let response = &contents[0]["parts"][0]["functionResponse"]["response"];
        assert_eq!(response["hits"], 3);
    }

    #[test]
    fn function_result_plain_string_is_wrapped() {
        let message = ChatMessage::function_result("search", "just text");
        let (contents, _) = map_messages(&[message]);
        let response = &contents[0]["parts"][0]["functionResponse"]["response"];
        assert_eq!(response["result"], "just text");
    }

    #[test]
    fn schema_filter_removes_unsupported_keywords_recursively() {
        let schema = json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "n": {
                    "type": "number",
                    "multipleOf": 5,
                    "minimum": 0,
                },
                "tags": {
                    "type": "array",
                    "items": { "type": "string", "examples": ["a"] },
                    "maxItems": 10,
                },
            },
        });
        let filtered = filter_schema(&schema);
        assert!(filtered.get("additionalProperties").is_none());
        assert!(filtered["properties"]["n"].get("multipleOf").is_none());
        assert_eq!(filtered["properties"]["n"]["minimum"], 0);
        assert!(filtered["properties"]["tags"]["items"].get("examples").is_none());
        assert_eq!(filtered["properties"]["tags"]["maxItems"], 10);
    }

    #[test]
    fn incomplete_tools_are_dropped() {
        let tools = tool_map(vec![
            search_tool(),
            ToolSchema::new("broken", "", json!({ "type": "object" })),
            ToolSchema::new("null_schema", "desc", serde_json::Value::Null),
        ]);
        let mapped = map_tools(&tools).unwrap();
        let declarations = mapped[0]["functionDeclarations"].as_array().unwrap();
        assert_eq!(declarations.len(), 1);
        assert_eq!(declarations[0]["name"], "search");
    }

    #[test]
    fn empty_tool_set_maps_to_none() {
        assert!(map_tools(&BTreeMap::new()).is_none());
    }

    #[test]
    fn tool_config_auto_variants() {
        let tools = tool_map(vec![search_tool()]);
        for choice in [None, Some("auto"), Some("any"), Some("")] {
            let config = map_tool_config(choice, &tools).unwrap();
            assert_eq!(config["mode"], "AUTO", "choice {choice:?}");
        }
    }

    #[test]
    fn tool_config_none_and_specific() {
        let tools = tool_map(vec![search_tool()]);
        assert_eq!(map_tool_config(Some("none"), &tools).unwrap()["mode"], "NONE");
        let config = map_tool_config(Some("search"), &tools).unwrap();
        assert_eq!(config["mode"], "ANY");
        assert_eq!(config["allowedFunctionNames"][0], "search");
    }

    #[test]
    fn tool_config_unknown_name_errors() {
        let tools = tool_map(vec![search_tool()]);
        let err = map_tool_config(Some("missing_tool"), &tools).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidRequest);
        assert!(err.message.contains("missing_tool"));
        assert!(err.message.contains("not found"));
    }

    #[test]
    fn tool_config_name_match_is_case_sensitive() {
        let tools = tool_map(vec![search_tool()]);
        assert!(map_tool_config(Some("Search"), &tools).is_err());
    }

    #[test]
    fn generation_config_renames_keys() {
        let options = GenerateOptions {
            max_tokens: Some(512),
            temperature: Some(0.3),
            stop_sequences: vec!["END".into()],
            top_p: Some(0.9),
            seed: Some(7),
            presence_penalty: Some(0.1),
            frequency_penalty: Some(0.2),
            ..Default::default()
        };
        let config = map_generation_config(&options).unwrap();
        assert_eq!(config["maxOutputTokens"], 512);
        assert_eq!(config["temperature"], 0.3);
        assert_eq!(config["stopSequences"][0], "END");
        assert_eq!(config["topP"], 0.9);
        assert_eq!(config["seed"], 7);
        assert_eq!(config["presencePenalty"], 0.1);
        assert_eq!(config["frequencyPenalty"], 0.2);
    }

    #[test]
    fn empty_generation_config_maps_to_none() {
        assert!(map_generation_config(&GenerateOptions::default()).is_none());
    }

    #[test]
    fn thinking_effort_emits_budget_only_when_positive() {
        let mut options = GenerateOptions {
            thinking_effort: Some(0),
            ..Default::default()
        };
        assert!(map_generation_config(&options).is_none());
        options.thinking_effort = Some(8);
        let config = map_generation_config(&options).unwrap();
        assert_eq!(config["thinkingConfig"]["thinkingBudget"], 8);
    }

    #[test]
    fn response_concatenates_text_parts_of_first_candidate() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Hello" }, { "text": ", world" }] },
                "finishReason": "STOP",
            }, {
                "content": { "parts": [{ "text": "ignored" }] },
                "finishReason": "STOP",
            }],
        });
        let result = from_api_response(&body).unwrap();
        assert_eq!(result.content.as_deref(), Some("Hello, world"));
        assert_eq!(result.finish_reason, Some(FinishReason::Stop));
        assert!(result.tokens.is_none());
    }

    #[test]
    fn tool_call_presence_overrides_vendor_finish_reason() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [
                    { "functionCall": { "name": "search", "args": { "q": "rust" } } },
                ] },
                "finishReason": "STOP",
            }],
        });
        let result = from_api_response(&body).unwrap();
        assert_eq!(result.finish_reason, Some(FinishReason::ToolCall));
        assert_eq!(result.tool_calls.len(), 1);
        assert_eq!(result.tool_calls[0].name, "search");
        assert_eq!(result.tool_calls[0].arguments["q"], "rust");
        assert!(result.tool_calls[0].id.starts_with("search_"));
    }

    #[test]
    fn unnamed_function_call_gets_func_id_prefix() {
        let body = json!({
            "candidates": [{
                "content": { "parts": [{ "functionCall": { "args": {} } }] },
            }],
        });
        let result = from_api_response(&body).unwrap();
        assert!(result.tool_calls[0].id.starts_with("func_"));
    }

    #[test]
    fn finish_reason_lookup_table() {
        let cases = [
            ("STOP", FinishReason::Stop),
            ("MAX_TOKENS", FinishReason::Length),
            ("SAFETY", FinishReason::Filtered),
            ("RECITATION", FinishReason::Filtered),
            ("PROHIBITED_CONTENT", FinishReason::Filtered),
            ("MALFORMED_FUNCTION_CALL", FinishReason::Error),
            ("OTHER", FinishReason::Error),
            ("SOMETHING_NEW", FinishReason::Error),
        ];
        for (code, expected) in cases {
            let body = json!({
                "candidates": [{
                    "content": { "parts": [{ "text": "x" }] },
                    "finishReason": code,
                }],
            });
            let result = from_api_response(&body).unwrap();
            assert_eq!(result.finish_reason, Some(expected), "code {code}");
        }
    }

    #[test]
    fn missing_candidates_is_a_hard_failure() {
        let err = from_api_response(&json!({})).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ServerError);
        let err = from_api_response(&json!({ "candidates": [] })).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ServerError);
    }

    #[test]
    fn usage_cache_split() {
        let usage = map_usage(&json!({
            "promptTokenCount": 200,
            "candidatesTokenCount": 30,
            "totalTokenCount": 230,
            "cachedContentTokenCount": 150,
        }))
        .unwrap();
        assert_eq!(usage.cache_read, Some(150));
        assert_eq!(usage.cache_write, Some(50));
        assert_eq!(usage.prompt, 50);
        assert_eq!(usage.completion, 30);
        assert_eq!(usage.total, 230);
    }

    #[test]
    fn usage_thinking_stays_unset_when_absent() {
        let usage = map_usage(&json!({
            "promptTokenCount": 10,
            "candidatesTokenCount": 5,
            "totalTokenCount": 15,
        }))
        .unwrap();
        assert!(usage.thinking.is_none());
        assert!(usage.cache_read.is_none());

        let usage = map_usage(&json!({
            "promptTokenCount": 10,
            "candidatesTokenCount": 5,
            "totalTokenCount": 18,
            "thoughtsTokenCount": 3,
        }))
        .unwrap();
        assert_eq!(usage.thinking, Some(3));
    }

    #[test]
    fn absent_usage_maps_to_none() {
        assert!(map_usage(&serde_json::Value::Null).is_none());
    }

    #[test]
    fn request_assembles_all_sections() {
        let mut options = GenerateOptions {
            max_tokens: Some(256),
            ..Default::default()
        };
        options.tool_schemas = tool_map(vec![search_tool()]);
        let messages = vec![ChatMessage::system("Sys."), ChatMessage::user("hi")];
        let body = to_api_request(&messages, &options).unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Sys.");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(
            body["tools"][0]["functionDeclarations"][0]["name"],
            "search"
        );
        assert_eq!(body["toolConfig"]["functionCallingConfig"]["mode"], "AUTO");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 256);
    }

    #[test]
    fn request_without_tools_omits_tool_sections() {
        let options = GenerateOptions::default();
        let body = to_api_request(&[ChatMessage::user("hi")], &options).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("toolConfig").is_none());
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn request_validates_tool_choice_before_any_network_call() {
        let options = GenerateOptions {
            tool_choice: Some("ghost".into()),
            ..Default::default()
        };
        let err = to_api_request(&[ChatMessage::user("hi")], &options).unwrap_err();
        assert!(err.message.contains("ghost"));
        assert!(err.message.contains("not found"));
    }
}
