//! # synapse-provider-gemini — Gemini adapter for the canonical model
//!
//! Stateless translation between [`synapse_types`] shapes and the Google
//! Gemini `generateContent` wire format, plus an HTTP client implementing
//! [`synapse_types::ChatModel`].
//!
//! The mapping functions are pure and exposed for direct use; the same
//! contract generalizes to other vendors. Translation is lossless where
//! the vendor allows and documented where it cannot be (unsupported
//! JSON-Schema keywords are filtered, empty assistant turns are omitted).

#![deny(missing_docs)]

pub mod client;
pub mod error;
pub mod mapping;

pub use client::Gemini;
pub use error::{map_error_response, map_transport_error};
pub use mapping::{
    filter_schema, from_api_response, map_generation_config, map_messages, map_tool_config,
    map_tools, map_usage, to_api_request,
};
