#![deny(missing_docs)]
//! # synapse — umbrella crate
//!
//! Provides a single import surface for the synapse agent stack.
//! Re-exports the canonical model and key implementations behind feature
//! flags, plus a `prelude` for the happy path.

#[cfg(feature = "provider-gemini")]
pub use synapse_provider_gemini;
#[cfg(feature = "registry")]
pub use synapse_registry;
#[cfg(feature = "runtime")]
pub use synapse_runtime;
#[cfg(feature = "core")]
pub use synapse_types;

/// Happy-path imports for composing synapse agents.
pub mod prelude {
    #[cfg(feature = "core")]
    pub use synapse_types::{
        ChatMessage, ChatModel, ConfigStore, ContentPart, ContractHost, ErrorKind, FinishReason,
        GenerateOptions, GenerateResult, LlmError, MemoryContract, MessageContent, Role,
        StoreEntry, StoreQuery, TokenUsage, ToolCall, ToolSchema,
    };

    #[cfg(feature = "registry")]
    pub use synapse_registry::{
        AgentSpec, AgentSpecBuilder, DelegateConfig, RegistryError, TraitDefinition, TraitResolver,
    };

    #[cfg(feature = "runtime")]
    pub use synapse_runtime::{AgentRuntime, RuntimeError, StepOptions, StepResult, TokenTotals};

    #[cfg(feature = "provider-gemini")]
    pub use synapse_provider_gemini::Gemini;
}
