//! Tool dispatch: validation in front, one adapter call behind.
//!
//! Validation failures never reach the network — an unknown provider or
//! model is answered locally with the valid set enumerated, so a typo
//! costs nothing.

use tracing::{info, warn};

use mindbridge_core::{OpinionRequest, Outcome, ToolResponse};
use mindbridge_providers::{
    ProviderRegistry, REASONING_MODELS, REASONING_MODELS_DESCRIPTION,
};

/// Route one opinion request: validate provider and model against the
/// registry, then hand it to the adapter. All failure shapes come back
/// as error envelopes with an `Error: ` prefix.
pub async fn get_second_opinion(
    registry: &ProviderRegistry,
    request: &OpinionRequest,
) -> ToolResponse {
    let provider_id = request.provider.as_str();

    let Some(provider) = registry.get(provider_id) else {
        return ToolResponse::error(format!(
            "Error: Provider \"{}\" not configured. Available providers: {}",
            provider_id,
            registry.provider_ids().join(", ")
        ));
    };

    if !provider.is_valid_model(&request.model) {
        return ToolResponse::error(format!(
            "Error: Model \"{}\" not found for provider \"{}\". Available models: {}",
            request.model,
            provider_id,
            provider.available_models().join(", ")
        ));
    }

    // Soft warning only: the request still goes out, the adapter just
    // has nothing to map the effort onto.
    if request.reasoning_effort.is_some() && !provider.supports_reasoning_effort() {
        warn!(
            provider = provider_id,
            "Provider does not support reasoning_effort; it will be ignored"
        );
    }

    info!(provider = provider_id, model = %request.model, "Dispatching opinion request");

    match provider.get_response(request).await {
        Outcome::Success { text } => ToolResponse::text(text),
        Outcome::Failure { message } => ToolResponse::error(format!("Error: {message}")),
    }
}

/// Configured providers with their models and reasoning support, as a
/// pretty-printed JSON map.
pub fn list_providers(registry: &ProviderRegistry) -> ToolResponse {
    let mut map = serde_json::Map::new();
    for id in registry.provider_ids() {
        map.insert(
            id.to_string(),
            serde_json::json!({
                "models": registry.models_for(id),
                "supportsReasoning": registry.supports_reasoning_effort(id),
            }),
        );
    }

    match serde_json::to_string_pretty(&serde_json::Value::Object(map)) {
        Ok(text) => ToolResponse::text(text),
        Err(e) => ToolResponse::error(format!("Error: {e}")),
    }
}

/// Static reasoning-model catalog; independent of configuration.
pub fn list_reasoning_models() -> ToolResponse {
    let body = serde_json::json!({
        "models": REASONING_MODELS,
        "description": REASONING_MODELS_DESCRIPTION,
    });

    match serde_json::to_string_pretty(&body) {
        Ok(text) => ToolResponse::text(text),
        Err(e) => ToolResponse::error(format!("Error: {e}")),
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
