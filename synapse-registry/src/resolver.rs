//! Trait lookup by name or id.

use std::sync::Arc;

use synapse_types::{ConfigStore, StoreQuery, store::kind};

use crate::error::RegistryError;
use crate::spec::TraitDefinition;

/// Read-only lookup of stored trait definitions. No side effects.
#[derive(Clone)]
pub struct TraitResolver {
    store: Arc<dyn ConfigStore>,
}

impl TraitResolver {
    /// Create a resolver backed by the given store.
    #[must_use]
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    /// Look up a trait by display name. The first store hit wins.
    pub async fn get_by_name(&self, name: &str) -> Result<TraitDefinition, RegistryError> {
        let query = StoreQuery::of_kind(kind::TRAIT).with_name(name);
        let hits = self.store.find(&query).await?;
        match hits.first() {
            Some(entry) => TraitDefinition::from_entry(entry),
            None => Err(RegistryError::TraitNotFound(name.to_string())),
        }
    }

    /// Look up a trait by entry id.
    pub async fn get_by_id(&self, id: &str) -> Result<TraitDefinition, RegistryError> {
        match self.store.get(id).await? {
            Some(entry) if entry.kind == kind::TRAIT => TraitDefinition::from_entry(&entry),
            _ => Err(RegistryError::TraitNotFound(id.to_string())),
        }
    }

    /// Resolve a trait identifier: first by name, then by id, else `None`.
    ///
    /// Misses are intentional non-errors so configuration authors can
    /// reference traits before defining them.
    pub async fn resolve(&self, identifier: &str) -> Option<TraitDefinition> {
        if let Ok(def) = self.get_by_name(identifier).await {
            return Some(def);
        }
        match self.get_by_id(identifier).await {
            Ok(def) => Some(def),
            Err(_) => {
                tracing::debug!(identifier, "trait identifier did not resolve, skipping");
                None
            }
        }
    }
}
