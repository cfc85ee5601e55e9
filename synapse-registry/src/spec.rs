//! Resolved definition types: traits, delegates, and the agent spec.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use synapse_types::{StoreEntry, store::kind};

use crate::error::RegistryError;

/// A named, reusable fragment of prompt text and/or tool list, merged
/// into an agent at build time. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraitDefinition {
    /// Stored entry id.
    pub id: String,
    /// Display name (trait identifiers resolve by name first).
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Prompt fragment appended to the agent's base prompt.
    pub prompt: String,
    /// Tool ids union-merged into the agent's tool set.
    pub tools: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTraitData {
    description: String,
    prompt: String,
    tools: Vec<String>,
}

impl TraitDefinition {
    /// Build a trait definition from a stored entry of kind `trait`.
    pub fn from_entry(entry: &StoreEntry) -> Result<Self, RegistryError> {
        let raw: RawTraitData = serde_json::from_value(entry.data.clone()).map_err(|e| {
            RegistryError::InvalidDefinition {
                kind: kind::TRAIT,
                id: entry.id.clone(),
                message: e.to_string(),
            }
        })?;
        Ok(Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            description: raw.description,
            prompt: raw.prompt,
            tools: raw.tools,
        })
    }
}

/// A sub-agent reachable via a synthesized "exit" tool.
///
/// `tool_name` is always non-empty and unique per agent — both enforced
/// at build time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegateConfig {
    /// Id of the agent the conversation is handed off to.
    pub target_agent_id: String,
    /// Display name, used verbatim when the target id is not namespaced.
    pub name: String,
    /// Name of the synthesized exit tool.
    pub tool_name: String,
    /// When to delegate, shown to the model. May be empty.
    pub rule: String,
}

/// Memory contract declared on an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryContractSpec {
    /// Id of the contract implementation to open.
    pub implementation_id: String,
    /// Configured context values, merged under any runtime context.
    #[serde(default)]
    pub context_values: BTreeMap<String, serde_json::Value>,
}

/// A fully-resolved agent definition: scalars copied, traits merged,
/// wildcards expanded, delegates normalized. Built fresh on every lookup
/// and immutable thereafter.
///
/// Invariants: `tools` holds no duplicates and no unresolved `ns:*`
/// wildcard entries; `delegates` is an ordered sequence so downstream
/// system-message generation is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Stored entry id.
    pub id: String,
    /// Agent name (persona).
    pub name: String,
    /// Short title.
    pub title: String,
    /// Human-readable description, appended to the persona line.
    pub description: String,
    /// Base prompt, with trait prompts already appended.
    pub prompt: String,
    /// Model identifier (empty = provider default).
    pub model: String,
    /// Max output tokens per step.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
    /// Thinking budget; only forwarded when > 0.
    pub thinking_effort: u32,
    /// Trait identifiers, ordered and duplicate-free.
    pub traits: Vec<String>,
    /// Tool ids, ordered and duplicate-free.
    pub tools: Vec<String>,
    /// Memory items listed in the system message.
    pub memory: Vec<String>,
    /// Delegates, in definition order.
    pub delegates: Vec<DelegateConfig>,
    /// Optional long-term memory contract.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_contract: Option<MemoryContractSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trait_from_entry_parses_payload() {
        let entry = StoreEntry {
            id: "trait:concise".into(),
            kind: kind::TRAIT.into(),
            name: "concise".into(),
            namespace: None,
            tags: vec![],
            data: json!({
                "description": "Short answers",
                "prompt": "Be concise.",
                "tools": ["fmt:trim"],
            }),
        };
        let def = TraitDefinition::from_entry(&entry).unwrap();
        assert_eq!(def.name, "concise");
        assert_eq!(def.prompt, "Be concise.");
        assert_eq!(def.tools, vec!["fmt:trim".to_string()]);
    }

    #[test]
    fn trait_from_entry_defaults_missing_fields() {
        let entry = StoreEntry {
            id: "trait:bare".into(),
            kind: kind::TRAIT.into(),
            name: "bare".into(),
            namespace: None,
            tags: vec![],
            data: json!({}),
        };
        let def = TraitDefinition::from_entry(&entry).unwrap();
        assert_eq!(def.prompt, "");
        assert!(def.tools.is_empty());
    }

    #[test]
    fn trait_from_entry_rejects_malformed_payload() {
        let entry = StoreEntry {
            id: "trait:bad".into(),
            kind: kind::TRAIT.into(),
            name: "bad".into(),
            namespace: None,
            tags: vec![],
            data: json!({ "tools": "not-a-list" }),
        };
        let err = TraitDefinition::from_entry(&entry).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidDefinition { .. }));
    }
}
