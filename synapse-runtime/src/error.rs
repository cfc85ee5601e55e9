//! Runtime construction and collaboration errors.
//!
//! Provider failures are NOT represented here: [`crate::AgentRuntime::step`]
//! returns them as [`synapse_types::LlmError`] values, unmodified.

use synapse_types::ContractError;
use thiserror::Error;

/// Errors from runtime construction, tool registration, and memory
/// contract opening.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A delegate configuration has no tool name. Fatal at construction:
    /// this is a programming/config error, not a runtime condition.
    #[error("delegate for {target} is missing a tool name")]
    DelegateNameRequired {
        /// The delegate's target agent id.
        target: String,
    },

    /// `register_tool` was called with an empty tool name.
    #[error("tool name required")]
    ToolNameRequired,

    /// `register_tool` was called with a null schema.
    #[error("tool schema required")]
    ToolSchemaRequired,

    /// The agent declares no memory contract.
    #[error("agent {0} has no memory contract")]
    NoMemoryContract(String),

    /// No contract host was attached to the runtime.
    #[error("no contract host configured")]
    NoContractHost,

    /// Opening the memory contract failed.
    #[error("contract error: {0}")]
    Contract(#[from] ContractError),
}
