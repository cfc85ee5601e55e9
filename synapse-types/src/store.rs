//! The persisted-configuration store boundary.
//!
//! Agents, traits, and tool catalog entries live in an external key-value
//! registry. This crate only defines the narrow read-only interface the
//! registry components consume; storage, file formats, and process wiring
//! belong to the surrounding system.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Well-known entry kinds.
pub mod kind {
    /// A stored agent definition.
    pub const AGENT: &str = "agent";
    /// A stored trait definition.
    pub const TRAIT: &str = "trait";
    /// A tool catalog entry.
    pub const TOOL: &str = "tool";
}

/// One stored configuration entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreEntry {
    /// Entry id (often namespaced, e.g. `ns:coder`).
    pub id: String,
    /// Entry kind (see [`kind`]).
    pub kind: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Namespace, when the id is namespaced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Free-form tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// The entry payload.
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Filter for [`ConfigStore::find`]. All fields are optional; a default
/// query matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreQuery {
    /// Match entries of this kind.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Match entries with this display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Match entries in this namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Match entries carrying this tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl StoreQuery {
    /// Query for entries of one kind.
    #[must_use]
    pub fn of_kind(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Default::default()
        }
    }

    /// Restrict the query to one display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Restrict the query to one namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Restrict the query to entries carrying one tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// Errors from the configuration store backend.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend failed (I/O, connection, corruption).
    #[error("store backend error: {0}")]
    Backend(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Read-only configuration store.
///
/// Implementations are external collaborators; the registry crates only
/// ever call these two methods. `find` results are ordered — wildcard
/// tool expansion depends on catalog-query order being stable.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Fetch one entry by id. `Ok(None)` means not found.
    async fn get(&self, id: &str) -> Result<Option<StoreEntry>, StoreError>;

    /// Find entries matching the query, in stable store order.
    async fn find(&self, query: &StoreQuery) -> Result<Vec<StoreEntry>, StoreError>;
}
