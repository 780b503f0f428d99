//! Core types and configuration for Mindbridge.
//!
//! This crate is deliberately free of HTTP and runtime dependencies:
//! it holds the unified request/outcome model shared by every provider
//! adapter, the tool-facing envelope, and the environment-driven
//! configuration that decides which vendors get registered.

pub mod config;
pub mod types;

pub use config::{load_config, ServerConfig};
pub use types::{
    ContentBlock, OpinionRequest, Outcome, ProviderId, ReasoningEffort, RequestError,
    ToolResponse, PROVIDER_IDS,
};
