//! # synapse-runtime — one agent, one conversation
//!
//! [`AgentRuntime`] wraps a resolved [`synapse_registry::AgentSpec`]: it
//! builds the system message and delegate tool schemas once at
//! construction, then executes conversational [`AgentRuntime::step`]s
//! against any [`synapse_types::ChatModel`], accounting tokens and
//! intercepting delegate tool calls along the way.
//!
//! A runtime instance belongs to one conversation. `step` and
//! `register_tool` take `&mut self`, so concurrent mutation is ruled out
//! at compile time — use one runtime per conversation, or serialize access
//! yourself.

#![deny(missing_docs)]

pub mod error;
pub mod runtime;

pub use error::RuntimeError;
pub use runtime::{AgentRuntime, RuntimeStats, StepOptions, StepResult, TokenTotals};
