//! Provider layer for Mindbridge.
//!
//! One adapter per vendor, all behind a single capability trait.
//!
//! # Architecture
//!
//! - [`traits::OpinionProvider`] — trait every vendor adapter implements
//! - [`registry::ProviderRegistry`] — configured adapters, built once at startup
//! - [`catalog`] — static list of reasoning-capable models
//! - one module per vendor with its request/response translation

pub mod anthropic;
pub mod catalog;
pub mod deepseek;
pub mod error;
pub mod google;
mod http;
pub mod ollama;
pub mod openai;
pub mod openai_compatible;
pub mod openrouter;
pub mod registry;
pub mod traits;

// Re-export main types for convenience
pub use catalog::{REASONING_MODELS, REASONING_MODELS_DESCRIPTION};
pub use error::ProviderError;
pub use registry::ProviderRegistry;
pub use traits::OpinionProvider;
