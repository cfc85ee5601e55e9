//! The agent runtime: system-message assembly, steps, delegate
//! interception, token accounting.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use synapse_registry::{AgentSpec, DelegateConfig};
use synapse_types::{
    ChatMessage, ChatModel, ContractHost, FinishReason, GenerateOptions, LlmError, MemoryContract,
    TokenUsage, ToolCall, ToolSchema,
};

use crate::error::RuntimeError;

/// Running token totals across all steps of one runtime.
///
/// Monotonically increasing; `total = prompt + completion + thinking` is
/// recomputed after every step (a single provider call need not satisfy
/// that equation — vendor totals may include cached or filtered tokens).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTotals {
    /// Prompt tokens across all steps.
    pub prompt: u64,
    /// Completion tokens across all steps.
    pub completion: u64,
    /// Thinking tokens across all steps.
    pub thinking: u64,
    /// `prompt + completion + thinking`.
    pub total: u64,
}

impl TokenTotals {
    fn accumulate(&mut self, usage: &TokenUsage) {
        self.prompt += usage.prompt;
        self.completion += usage.completion;
        self.thinking += usage.thinking.unwrap_or(0);
        self.total = self.prompt + self.completion + self.thinking;
    }
}

/// Per-step caller options.
#[derive(Debug, Clone, Default)]
pub struct StepOptions {
    /// Override the tool-choice mode for this step only.
    pub tool_choice: Option<String>,
    /// Call timeout, forwarded to the transport untouched.
    pub timeout: Option<Duration>,
    /// Opaque streaming target hint, forwarded untouched.
    pub stream_to: Option<String>,
}

/// Outcome of one conversational step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepResult {
    /// The response text.
    pub result: String,
    /// Token usage of this step, when the provider reported any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenUsage>,
    /// Normalized finish reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    /// Provider metadata passthrough.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
    /// Tool calls requested by the model. Cleared entirely when a
    /// delegate call was intercepted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Name of the intercepted delegate tool, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    /// Target agent id of the intercepted delegate call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegate_target: Option<String>,
    /// The `message` argument of the intercepted delegate call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegate_message: Option<String>,
}

/// Snapshot of a runtime's counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeStats {
    /// Agent id.
    pub id: String,
    /// Agent name.
    pub name: String,
    /// Number of steps executed.
    pub messages_handled: u64,
    /// Running token totals.
    pub total_tokens: TokenTotals,
}

/// Display name for a delegate in the system message: the substring after
/// the final `:` of the target id, `_`/`-` replaced with spaces, first
/// character uppercased. Targets without a `:` use the configured name
/// verbatim.
#[must_use]
pub fn delegate_display_name(delegate: &DelegateConfig) -> String {
    match delegate.target_agent_id.rsplit_once(':') {
        Some((_, suffix)) => {
            let spaced: String = suffix
                .chars()
                .map(|c| if c == '_' || c == '-' { ' ' } else { c })
                .collect();
            let mut chars = spaced.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => spaced,
            }
        }
        None => delegate.name.clone(),
    }
}

fn delegate_tool_schema(delegate: &DelegateConfig) -> ToolSchema {
    let rule = if delegate.rule.is_empty() {
        "when appropriate"
    } else {
        &delegate.rule
    };
    ToolSchema::new(
        &delegate.tool_name,
        format!(
            "Forward the request to {rule}, this is exit tool, you can not call anything else with it."
        ),
        serde_json::json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "The message to forward to the agent.",
                }
            },
            "required": ["message"],
        }),
    )
}

fn build_system_message(spec: &AgentSpec) -> String {
    let mut text = spec.prompt.clone();
    text.push_str("\n\nYou are ");
    text.push_str(&spec.name);
    if !spec.description.is_empty() {
        text.push_str(", ");
        text.push_str(&spec.description);
    }
    if !spec.memory.is_empty() {
        text.push_str("\n\n## Your memory contains:");
        for item in &spec.memory {
            text.push_str("\n- ");
            text.push_str(item);
        }
    }
    if !spec.delegates.is_empty() {
        text.push_str("\n\n## You can delegate tasks to these specialized agents:");
        for delegate in &spec.delegates {
            text.push_str("\n- ");
            text.push_str(&delegate_display_name(delegate));
            text.push_str(": ");
            text.push_str(&delegate.rule);
            text.push_str(" (use tool ");
            text.push_str(&delegate.tool_name);
            text.push(')');
        }
    }
    text
}

/// One agent bound to one conversation.
///
/// Construction derives everything that never changes during the session:
/// the system message, the delegate tool schemas, and the delegate routing
/// map. Callers that mutate spec fields must construct a new runtime — the
/// system message is never rebuilt automatically.
pub struct AgentRuntime<M: ChatModel> {
    spec: AgentSpec,
    model: M,
    system_message: ChatMessage,
    tool_ids: Vec<String>,
    delegate_tools: BTreeMap<String, ToolSchema>,
    delegate_map: BTreeMap<String, String>,
    tool_schemas: BTreeMap<String, ToolSchema>,
    total_tokens: TokenTotals,
    messages_handled: u64,
    contract_host: Option<Arc<dyn ContractHost>>,
}

impl<M: ChatModel> AgentRuntime<M> {
    /// Create a runtime for the given spec and model.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::DelegateNameRequired`] when any delegate lacks a
    /// tool name.
    pub fn new(spec: AgentSpec, model: M) -> Result<Self, RuntimeError> {
        let mut delegate_tools = BTreeMap::new();
        let mut delegate_map = BTreeMap::new();
        for delegate in &spec.delegates {
            if delegate.tool_name.is_empty() {
                return Err(RuntimeError::DelegateNameRequired {
                    target: delegate.target_agent_id.clone(),
                });
            }
            delegate_tools.insert(delegate.tool_name.clone(), delegate_tool_schema(delegate));
            delegate_map.insert(
                delegate.tool_name.clone(),
                delegate.target_agent_id.clone(),
            );
        }
        let system_message = ChatMessage::system(build_system_message(&spec));
        let tool_ids = spec.tools.clone();
        Ok(Self {
            spec,
            model,
            system_message,
            tool_ids,
            delegate_tools,
            delegate_map,
            tool_schemas: BTreeMap::new(),
            total_tokens: TokenTotals::default(),
            messages_handled: 0,
            contract_host: None,
        })
    }

    /// Attach the external contract host used to open memory contracts.
    #[must_use]
    pub fn with_contract_host(mut self, host: Arc<dyn ContractHost>) -> Self {
        self.contract_host = Some(host);
        self
    }

    /// The system message built at construction.
    #[must_use]
    pub fn system_message(&self) -> &ChatMessage {
        &self.system_message
    }

    /// The spec this runtime was built from.
    #[must_use]
    pub fn spec(&self) -> &AgentSpec {
        &self.spec
    }

    /// Register (or overwrite) a custom tool schema.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::ToolNameRequired`] on an empty name,
    /// [`RuntimeError::ToolSchemaRequired`] on a null schema.
    pub fn register_tool(&mut self, name: &str, schema: ToolSchema) -> Result<(), RuntimeError> {
        if name.is_empty() {
            return Err(RuntimeError::ToolNameRequired);
        }
        if schema.schema.is_null() {
            return Err(RuntimeError::ToolSchemaRequired);
        }
        self.tool_schemas.insert(name.to_string(), schema);
        Ok(())
    }

    /// Execute one conversational step.
    ///
    /// Builds the call options from the spec, prepends the system message
    /// (plus a cache marker when no custom tools are registered), invokes
    /// the model exactly once, accumulates token usage, and intercepts the
    /// first delegate tool call. Provider errors are returned unmodified —
    /// no retry, no backoff.
    pub async fn step(
        &mut self,
        conversation: &[ChatMessage],
        options: StepOptions,
    ) -> Result<StepResult, LlmError> {
        let call_options = self.build_call_options(options);
        let messages = self.build_messages(conversation);

        let response = self.model.generate(messages, call_options).await?;

        if let Some(usage) = &response.tokens {
            self.total_tokens.accumulate(usage);
        }
        self.messages_handled += 1;

        let mut step = StepResult {
            result: response.text().to_string(),
            tokens: response.tokens,
            finish_reason: response.finish_reason,
            meta: response.meta,
            tool_calls: response.tool_calls,
            function_name: None,
            delegate_target: None,
            delegate_message: None,
        };
        self.intercept_delegate(&mut step);
        Ok(step)
    }

    fn build_call_options(&self, options: StepOptions) -> GenerateOptions {
        let mut call = GenerateOptions {
            model: self.spec.model.clone(),
            max_tokens: Some(self.spec.max_tokens),
            temperature: Some(self.spec.temperature),
            timeout: options.timeout,
            stream_to: options.stream_to,
            ..Default::default()
        };
        if !self.tool_ids.is_empty() {
            call.tool_ids = self.tool_ids.clone();
        }
        if self.spec.thinking_effort > 0 {
            call.thinking_effort = Some(self.spec.thinking_effort);
        }
        if let Some(choice) = options.tool_choice {
            call.tool_choice = Some(choice);
        }
        let mut schemas = self.tool_schemas.clone();
        schemas.extend(self.delegate_tools.clone());
        call.tool_schemas = schemas;
        call
    }

    fn build_messages(&self, conversation: &[ChatMessage]) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(conversation.len() + 2);
        messages.push(self.system_message.clone());
        // With no custom tools the system portion is stable across steps,
        // so callers between here and the transport may cache it.
        if self.tool_schemas.is_empty() {
            messages.push(ChatMessage::cache_marker(&self.spec.id));
        }
        messages.extend_from_slice(conversation);
        messages
    }

    /// Scan tool calls in order and honor the first one that routes to a
    /// delegate: record its name, target, and `message` argument, then
    /// clear the tool call list entirely. At most one delegate call per
    /// step, even if several are present.
    fn intercept_delegate(&self, step: &mut StepResult) {
        let hit = step.tool_calls.iter().find_map(|call| {
            self.delegate_map.get(&call.name).map(|target| {
                (
                    call.name.clone(),
                    target.clone(),
                    call.arguments
                        .get("message")
                        .and_then(|v| v.as_str())
                        .map(str::to_string),
                )
            })
        });
        if let Some((name, target, message)) = hit {
            tracing::debug!(tool = %name, target = %target, "delegate call intercepted");
            step.function_name = Some(name);
            step.delegate_target = Some(target);
            step.delegate_message = message;
            step.tool_calls.clear();
        }
    }

    /// Whether the agent declares a memory contract with an
    /// implementation id.
    #[must_use]
    pub fn has_memory_contract(&self) -> bool {
        self.spec
            .memory_contract
            .as_ref()
            .is_some_and(|mc| !mc.implementation_id.is_empty())
    }

    /// Open the agent's memory contract through the attached host.
    ///
    /// Merge order: configured context values first, then
    /// `runtime_context` (overriding), then `agent_id` forced to this
    /// runtime's id.
    pub async fn open_memory_contract(
        &self,
        runtime_context: Option<&BTreeMap<String, serde_json::Value>>,
    ) -> Result<Arc<dyn MemoryContract>, RuntimeError> {
        let contract = self
            .spec
            .memory_contract
            .as_ref()
            .filter(|mc| !mc.implementation_id.is_empty())
            .ok_or_else(|| RuntimeError::NoMemoryContract(self.spec.id.clone()))?;
        let host = self.contract_host.as_ref().ok_or(RuntimeError::NoContractHost)?;

        let mut context = contract.context_values.clone();
        if let Some(runtime_context) = runtime_context {
            for (key, value) in runtime_context {
                context.insert(key.clone(), value.clone());
            }
        }
        context.insert(
            "agent_id".to_string(),
            serde_json::Value::String(self.spec.id.clone()),
        );

        Ok(host
            .open_contract(&contract.implementation_id, &context)
            .await?)
    }

    /// Snapshot the runtime's counters.
    #[must_use]
    pub fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            id: self.spec.id.clone(),
            name: self.spec.name.clone(),
            messages_handled: self.messages_handled,
            total_tokens: self.total_tokens,
        }
    }
}
