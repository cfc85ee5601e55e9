//! Long-term memory contract boundary.
//!
//! An agent may declare a memory contract (`implementation_id` plus
//! configured context values). Opening the contract is delegated to an
//! external [`ContractHost`]; the runtime only merges context and forces
//! the agent id before handing off.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from contract opening and memory operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ContractError {
    /// No contract implementation registered under the given id.
    #[error("contract not found: {0}")]
    NotFound(String),

    /// Opening the contract failed.
    #[error("contract open failed: {0}")]
    OpenFailed(String),

    /// A memory operation failed after opening.
    #[error("memory operation failed: {0}")]
    OperationFailed(String),

    /// Catch-all.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// An opened long-term memory session.
#[async_trait]
pub trait MemoryContract: Send + Sync {
    /// Retrieve up to `limit` memory items relevant to `query`.
    async fn recall(&self, query: &str, limit: usize) -> Result<Vec<String>, ContractError>;

    /// Persist one memory item.
    async fn store(&self, item: &str) -> Result<(), ContractError>;
}

/// External collaborator that opens memory contracts.
#[async_trait]
pub trait ContractHost: Send + Sync {
    /// Open the contract registered under `implementation_id` with the
    /// merged context values.
    async fn open_contract(
        &self,
        implementation_id: &str,
        context: &BTreeMap<String, serde_json::Value>,
    ) -> Result<Arc<dyn MemoryContract>, ContractError>;
}
