//! Server configuration — one optional section per vendor, built once
//! from environment variables at process start and immutable after.
//!
//! A vendor with no section is simply never registered; there is no
//! "configured but disabled" state. Ollama is the exception: it only
//! needs a base URL, which falls back to the local default, so its
//! section is always present.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default Ollama endpoint when `OLLAMA_BASE_URL` is unset.
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

// ─────────────────────────────────────────────
// Per-vendor sections
// ─────────────────────────────────────────────

/// Connection data for a key-based vendor (OpenAI, Anthropic, DeepSeek,
/// Google). The base URL is fixed or env-overridable per vendor.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct KeyedProviderConfig {
    pub api_key: String,
    pub base_url: String,
}

/// OpenRouter only needs a key; its endpoint is fixed.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OpenRouterConfig {
    pub api_key: String,
}

/// Ollama only needs a base URL.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OllamaConfig {
    pub base_url: String,
}

/// A generic OpenAI-compatible endpoint: base URL required, key and
/// model allowlist optional. An empty allowlist means "accept any
/// model".
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OpenAiCompatibleConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    #[serde(default)]
    pub models: Vec<String>,
}

// ─────────────────────────────────────────────
// Root config
// ─────────────────────────────────────────────

/// All vendor sections. `None` means the vendor is not configured and
/// will not appear in the registry.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub openai: Option<KeyedProviderConfig>,
    pub anthropic: Option<KeyedProviderConfig>,
    pub deepseek: Option<KeyedProviderConfig>,
    pub google: Option<KeyedProviderConfig>,
    pub openrouter: Option<OpenRouterConfig>,
    pub ollama: Option<OllamaConfig>,
    pub openai_compatible: Option<OpenAiCompatibleConfig>,
}

/// Load configuration from process environment variables.
pub fn load_config() -> ServerConfig {
    load_config_from(|name| std::env::var(name).ok())
}

/// Load configuration from an arbitrary variable source. Separating
/// the source from the assembly keeps the "which vendors are active"
/// decision testable without touching the process environment.
pub fn load_config_from<F>(get: F) -> ServerConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ServerConfig::default();

    if let Some(api_key) = get("OPENAI_API_KEY") {
        config.openai = Some(KeyedProviderConfig {
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
        });
    }

    if let Some(api_key) = get("ANTHROPIC_API_KEY") {
        config.anthropic = Some(KeyedProviderConfig {
            api_key,
            base_url: "https://api.anthropic.com".to_string(),
        });
    }

    if let Some(api_key) = get("DEEPSEEK_API_KEY") {
        config.deepseek = Some(KeyedProviderConfig {
            api_key,
            base_url: get("DEEPSEEK_API_BASE_URL")
                .unwrap_or_else(|| "https://api.deepseek.com".to_string()),
        });
    }

    if let Some(api_key) = get("GOOGLE_API_KEY") {
        config.google = Some(KeyedProviderConfig {
            api_key,
            base_url: get("GOOGLE_API_BASE_URL").unwrap_or_else(|| {
                "https://generativelanguage.googleapis.com/v1beta".to_string()
            }),
        });
    }

    if let Some(api_key) = get("OPENROUTER_API_KEY") {
        config.openrouter = Some(OpenRouterConfig { api_key });
    }

    if let Some(base_url) = get("OPENAI_COMPATIBLE_API_BASE_URL") {
        let models = get("OPENAI_COMPATIBLE_API_MODELS")
            .map(|s| {
                s.split(',')
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        config.openai_compatible = Some(OpenAiCompatibleConfig {
            api_key: get("OPENAI_COMPATIBLE_API_KEY"),
            base_url,
            models,
        });
    }

    // Ollama is always registered; only the endpoint varies.
    config.ollama = Some(OllamaConfig {
        base_url: get("OLLAMA_BASE_URL").unwrap_or_else(|| DEFAULT_OLLAMA_BASE_URL.to_string()),
    });

    let active: Vec<&str> = [
        config.openai.as_ref().map(|_| "openai"),
        config.anthropic.as_ref().map(|_| "anthropic"),
        config.deepseek.as_ref().map(|_| "deepseek"),
        config.google.as_ref().map(|_| "google"),
        config.openrouter.as_ref().map(|_| "openrouter"),
        config.ollama.as_ref().map(|_| "ollama"),
        config.openai_compatible.as_ref().map(|_| "openaiCompatible"),
    ]
    .into_iter()
    .flatten()
    .collect();
    debug!(providers = ?active, "Configuration loaded");

    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
