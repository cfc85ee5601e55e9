//! # synapse-registry — stored-definition resolution
//!
//! Turns raw stored agent definitions into fully-resolved [`AgentSpec`]s:
//! traits merged, tool wildcards expanded, delegates normalized. Lookup
//! goes through the read-only [`synapse_types::ConfigStore`] boundary, so
//! everything here is deterministic and testable with an in-memory store.

#![deny(missing_docs)]

pub mod builder;
pub mod error;
pub mod resolver;
pub mod spec;

pub use builder::AgentSpecBuilder;
pub use error::RegistryError;
pub use resolver::TraitResolver;
pub use spec::{AgentSpec, DelegateConfig, MemoryContractSpec, TraitDefinition};
