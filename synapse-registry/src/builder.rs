//! Building a fully-resolved [`AgentSpec`] from a stored definition.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use synapse_types::{ConfigStore, StoreQuery, store::kind};

use crate::error::RegistryError;
use crate::resolver::TraitResolver;
use crate::spec::{AgentSpec, DelegateConfig, MemoryContractSpec};

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f64 {
    0.7
}

/// The stored agent payload, before resolution. Delegates are an ordered
/// sequence — never a hash map — so the resolved spec (and with it the
/// generated system message) is deterministic.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawAgentConfig {
    name: Option<String>,
    title: String,
    description: String,
    prompt: String,
    model: String,
    #[serde(default = "default_max_tokens")]
    max_tokens: u32,
    #[serde(default = "default_temperature")]
    temperature: f64,
    thinking_effort: u32,
    traits: Vec<String>,
    tools: Vec<String>,
    memory: Vec<String>,
    delegates: Vec<RawDelegate>,
    memory_contract: Option<RawMemoryContract>,
}

#[derive(Debug, Deserialize)]
struct RawDelegate {
    agent_id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    tool_name: Option<String>,
    #[serde(default)]
    rule: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawMemoryContract {
    implementation_id: String,
    #[serde(default)]
    context_values: BTreeMap<String, serde_json::Value>,
}

/// Append items not already present, keeping first-occurrence order.
fn union_merge(into: &mut Vec<String>, items: impl IntoIterator<Item = String>) {
    for item in items {
        if !into.contains(&item) {
            into.push(item);
        }
    }
}

/// Builds [`AgentSpec`]s from stored definitions.
///
/// Each build is a fresh resolution against the store — no caching. The
/// builder itself is stateless and safe to share across tasks.
#[derive(Clone)]
pub struct AgentSpecBuilder {
    store: Arc<dyn ConfigStore>,
    traits: TraitResolver,
}

impl AgentSpecBuilder {
    /// Create a builder backed by the given store.
    #[must_use]
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        let traits = TraitResolver::new(store.clone());
        Self { store, traits }
    }

    /// Resolve the stored definition under `agent_id` into an [`AgentSpec`].
    ///
    /// # Errors
    ///
    /// [`RegistryError::AgentNotFound`] when no entry exists,
    /// [`RegistryError::NotAnAgent`] when the entry has the wrong kind,
    /// [`RegistryError::DelegateNameRequired`] /
    /// [`RegistryError::DuplicateDelegateTool`] on delegate misconfiguration.
    /// Unresolved trait identifiers are skipped, not errors.
    pub async fn build(&self, agent_id: &str) -> Result<AgentSpec, RegistryError> {
        let entry = self
            .store
            .get(agent_id)
            .await?
            .ok_or_else(|| RegistryError::AgentNotFound(agent_id.to_string()))?;
        if entry.kind != kind::AGENT {
            return Err(RegistryError::NotAnAgent(agent_id.to_string()));
        }
        let raw: RawAgentConfig = serde_json::from_value(entry.data.clone()).map_err(|e| {
            RegistryError::InvalidDefinition {
                kind: kind::AGENT,
                id: entry.id.clone(),
                message: e.to_string(),
            }
        })?;

        let mut spec = AgentSpec {
            id: entry.id.clone(),
            name: raw.name.unwrap_or(entry.name),
            title: raw.title,
            description: raw.description,
            prompt: raw.prompt,
            model: raw.model,
            max_tokens: raw.max_tokens,
            temperature: raw.temperature,
            thinking_effort: raw.thinking_effort,
            traits: Vec::new(),
            tools: Vec::new(),
            memory: Vec::new(),
            delegates: Vec::new(),
            memory_contract: raw.memory_contract.map(|mc| MemoryContractSpec {
                implementation_id: mc.implementation_id,
                context_values: mc.context_values,
            }),
        };

        union_merge(&mut spec.traits, raw.traits);
        union_merge(&mut spec.tools, raw.tools);
        union_merge(&mut spec.memory, raw.memory);

        for delegate in raw.delegates {
            let tool_name = match delegate.tool_name {
                Some(name) if !name.is_empty() => name,
                _ => {
                    return Err(RegistryError::DelegateNameRequired {
                        target: delegate.agent_id,
                    });
                }
            };
            if spec.delegates.iter().any(|d| d.tool_name == tool_name) {
                return Err(RegistryError::DuplicateDelegateTool(tool_name));
            }
            spec.delegates.push(DelegateConfig {
                name: delegate.name.unwrap_or_else(|| delegate.agent_id.clone()),
                target_agent_id: delegate.agent_id,
                tool_name,
                rule: delegate.rule.unwrap_or_default(),
            });
        }

        self.merge_traits(&mut spec).await;
        self.expand_tool_wildcards(&mut spec).await?;

        Ok(spec)
    }

    /// Resolve each trait identifier (by name, then id) and fold the hits
    /// into the spec: prompts appended to the base prompt separated by
    /// blank lines, tools union-merged. Misses are skipped silently.
    async fn merge_traits(&self, spec: &mut AgentSpec) {
        let identifiers = spec.traits.clone();
        for identifier in &identifiers {
            let Some(def) = self.traits.resolve(identifier).await else {
                continue;
            };
            if !def.prompt.is_empty() {
                spec.prompt.push_str("\n\n");
                spec.prompt.push_str(&def.prompt);
            }
            union_merge(&mut spec.tools, def.tools);
        }
    }

    /// Expand `ns:*` entries against the tool catalog. Non-wildcard tools
    /// keep their insertion order and come first; each wildcard's matches
    /// follow in catalog-query order, duplicates dropped.
    async fn expand_tool_wildcards(&self, spec: &mut AgentSpec) -> Result<(), RegistryError> {
        let mut resolved: Vec<String> = Vec::with_capacity(spec.tools.len());
        let mut wildcards: Vec<String> = Vec::new();
        for tool in spec.tools.drain(..) {
            match tool.strip_suffix(":*") {
                Some(namespace) => wildcards.push(namespace.to_string()),
                None => resolved.push(tool),
            }
        }
        for namespace in wildcards {
            let query = StoreQuery::of_kind(kind::TOOL).with_namespace(&namespace);
            let matches = self.store.find(&query).await?;
            union_merge(&mut resolved, matches.into_iter().map(|e| e.id));
        }
        spec.tools = resolved;
        Ok(())
    }
}
