//! The capability contract every provider adapter satisfies.
//!
//! Adapters are stateless per request: one fixed configuration, one
//! shared HTTP client, no mutable state. They are constructed once per
//! configured vendor at startup and live for the process lifetime.

use async_trait::async_trait;
use mindbridge_core::{OpinionRequest, Outcome};

use crate::error::ProviderError;

/// Trait that all provider adapters implement.
///
/// `get_response` never propagates an error: transport failures, bad
/// statuses, and empty bodies are all converted to `Outcome::Failure`
/// inside the adapter.
#[async_trait]
pub trait OpinionProvider: Send + Sync {
    /// Send the unified request to the vendor and translate the reply.
    async fn get_response(&self, request: &OpinionRequest) -> Outcome;

    /// Model identifiers this adapter accepts, in declaration order.
    fn available_models(&self) -> Vec<String>;

    /// Membership test against `available_models`. The OpenAI-compatible
    /// adapter overrides this to accept any model when no allowlist is
    /// declared.
    fn is_valid_model(&self, model: &str) -> bool {
        self.available_models().iter().any(|m| m == model)
    }

    /// Whether the vendor has any reasoning-effort mechanism at all.
    fn supports_reasoning_effort(&self) -> bool;

    /// Whether a specific model engages that mechanism.
    fn supports_reasoning_effort_for_model(&self, model: &str) -> bool;

    /// Human-readable vendor name, used in error prefixes and logs.
    fn display_name(&self) -> &'static str;
}

/// Fold an adapter-level error into the unified failure outcome,
/// prefixed with the originating vendor name.
pub(crate) fn failure(provider: &str, err: ProviderError) -> Outcome {
    Outcome::failure(format!("Error from {provider}: {err}"))
}
