//! # synapse-types — canonical model for synapse agents
//!
//! This crate defines the vendor-neutral shapes that every other synapse
//! crate speaks: conversation messages, tool schemas and calls, generation
//! options and results, token usage, the error taxonomy, and the narrow
//! collaborator interfaces (config store, chat model, memory contracts).
//!
//! Provider crates translate these types to and from one vendor's wire
//! format; the runtime and registry never see a vendor payload.
//!
//! ## Dependency Notes
//!
//! Tool schemas, tool arguments, and per-message transient metadata are
//! carried as `serde_json::Value`. JSON is the interchange format of every
//! LLM vendor API, and a generic `T: Serialize` would complicate trait
//! object safety without practical benefit.

#![deny(missing_docs)]

pub mod error;
pub mod generate;
pub mod memory;
pub mod message;
pub mod store;
pub mod tool;

// Re-exports for convenience
pub use error::{ErrorKind, LlmError};
pub use generate::{ChatModel, FinishReason, GenerateOptions, GenerateResult, TokenUsage};
pub use memory::{ContractError, ContractHost, MemoryContract};
pub use message::{ChatMessage, ContentPart, ImageSource, MessageContent, Role};
pub use store::{ConfigStore, StoreEntry, StoreError, StoreQuery};
pub use tool::{ToolCall, ToolSchema};
