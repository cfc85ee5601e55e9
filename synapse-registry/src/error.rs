//! Errors from definition lookup and spec construction.

use synapse_types::StoreError;
use thiserror::Error;

/// Registry errors.
///
/// Delegate misconfiguration is fatal here on purpose: a missing tool name
/// indicates a config authoring error, not a runtime condition. Unresolved
/// trait identifiers are NOT errors — they are skipped so traits can be
/// defined lazily.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No entry stored under the requested agent id.
    #[error("agent not found: {0}")]
    AgentNotFound(String),

    /// The entry exists but is not an agent definition.
    #[error("entry is not an agent: {0}")]
    NotAnAgent(String),

    /// No trait stored under the requested name or id.
    #[error("trait not found: {0}")]
    TraitNotFound(String),

    /// A delegate configuration has no tool name.
    #[error("delegate for {target} is missing a tool name")]
    DelegateNameRequired {
        /// The delegate's target agent id.
        target: String,
    },

    /// Two delegates on one agent claim the same tool name.
    #[error("duplicate delegate tool name: {0}")]
    DuplicateDelegateTool(String),

    /// The stored payload does not parse as the expected definition.
    #[error("invalid {kind} definition {id}: {message}")]
    InvalidDefinition {
        /// The entry kind that was expected.
        kind: &'static str,
        /// The entry id.
        id: String,
        /// Parse failure detail.
        message: String,
    },

    /// The configuration store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
