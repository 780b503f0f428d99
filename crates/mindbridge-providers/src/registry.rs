//! Provider registry.
//!
//! Built once from configuration at startup; which vendors exist is a
//! pure function of the config, so the registry itself never touches
//! the network. Iteration order is the fixed registration order, not
//! insertion-hash order.

use tracing::info;

use mindbridge_core::config::ServerConfig;
use mindbridge_core::ProviderId;

use crate::anthropic::AnthropicProvider;
use crate::deepseek::DeepSeekProvider;
use crate::google::GoogleProvider;
use crate::ollama::OllamaProvider;
use crate::openai::OpenAiProvider;
use crate::openai_compatible::OpenAiCompatibleProvider;
use crate::openrouter::OpenRouterProvider;
use crate::traits::OpinionProvider;

pub struct ProviderRegistry {
    providers: Vec<(ProviderId, Box<dyn OpinionProvider>)>,
}

impl ProviderRegistry {
    /// One adapter per configured vendor, in fixed registration order.
    pub fn from_config(config: &ServerConfig) -> Self {
        let mut providers: Vec<(ProviderId, Box<dyn OpinionProvider>)> = Vec::new();

        if let Some(c) = &config.openai {
            providers.push((ProviderId::OpenAi, Box::new(OpenAiProvider::new(c))));
        }
        if let Some(c) = &config.anthropic {
            providers.push((ProviderId::Anthropic, Box::new(AnthropicProvider::new(c))));
        }
        if let Some(c) = &config.deepseek {
            providers.push((ProviderId::DeepSeek, Box::new(DeepSeekProvider::new(c))));
        }
        if let Some(c) = &config.google {
            providers.push((ProviderId::Google, Box::new(GoogleProvider::new(c))));
        }
        if let Some(c) = &config.openrouter {
            providers.push((ProviderId::OpenRouter, Box::new(OpenRouterProvider::new(c))));
        }
        if let Some(c) = &config.ollama {
            providers.push((ProviderId::Ollama, Box::new(OllamaProvider::new(c))));
        }
        if let Some(c) = &config.openai_compatible {
            providers.push((
                ProviderId::OpenAiCompatible,
                Box::new(OpenAiCompatibleProvider::new(c)),
            ));
        }

        info!(
            providers = ?providers.iter().map(|(id, _)| id.as_str()).collect::<Vec<_>>(),
            "Provider registry initialized"
        );

        ProviderRegistry { providers }
    }

    /// Look up an adapter by wire id. Lookup is case-insensitive.
    pub fn get(&self, id: &str) -> Option<&dyn OpinionProvider> {
        let id = ProviderId::parse(id)?;
        self.providers
            .iter()
            .find(|(pid, _)| *pid == id)
            .map(|(_, p)| p.as_ref())
    }

    pub fn has(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Registered wire ids in registration order.
    pub fn provider_ids(&self) -> Vec<&'static str> {
        self.providers.iter().map(|(id, _)| id.as_str()).collect()
    }

    /// Models advertised by one vendor; empty when the vendor is not
    /// registered.
    pub fn models_for(&self, id: &str) -> Vec<String> {
        self.get(id)
            .map(|p| p.available_models())
            .unwrap_or_default()
    }

    pub fn supports_reasoning_effort(&self, id: &str) -> bool {
        self.get(id)
            .map(|p| p.supports_reasoning_effort())
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mindbridge_core::config::{
        KeyedProviderConfig, OllamaConfig, OpenAiCompatibleConfig, OpenRouterConfig,
    };

    fn keyed(key: &str, base: &str) -> Option<KeyedProviderConfig> {
        Some(KeyedProviderConfig {
            api_key: key.to_string(),
            base_url: base.to_string(),
        })
    }

    fn full_config() -> ServerConfig {
        ServerConfig {
            openai: keyed("k", "https://api.openai.com/v1"),
            anthropic: keyed("k", "https://api.anthropic.com"),
            deepseek: keyed("k", "https://api.deepseek.com"),
            google: keyed("k", "https://generativelanguage.googleapis.com/v1beta"),
            openrouter: Some(OpenRouterConfig {
                api_key: "k".to_string(),
            }),
            ollama: Some(OllamaConfig {
                base_url: "http://localhost:11434".to_string(),
            }),
            openai_compatible: Some(OpenAiCompatibleConfig {
                api_key: None,
                base_url: "http://localhost:8000/v1".to_string(),
                models: vec![],
            }),
        }
    }

    #[test]
    fn test_registration_order_is_fixed() {
        let registry = ProviderRegistry::from_config(&full_config());
        assert_eq!(
            registry.provider_ids(),
            vec![
                "openai",
                "anthropic",
                "deepseek",
                "google",
                "openrouter",
                "ollama",
                "openaiCompatible"
            ]
        );
    }

    #[test]
    fn test_only_configured_vendors_register() {
        let config = ServerConfig {
            anthropic: keyed("k", "https://api.anthropic.com"),
            ollama: Some(OllamaConfig {
                base_url: "http://localhost:11434".to_string(),
            }),
            ..ServerConfig::default()
        };
        let registry = ProviderRegistry::from_config(&config);

        assert_eq!(registry.len(), 2);
        assert!(registry.has("anthropic"));
        assert!(registry.has("ollama"));
        assert!(!registry.has("openai"));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = ProviderRegistry::from_config(&full_config());
        assert!(registry.has("OpenAI"));
        assert!(registry.has("OPENAICOMPATIBLE"));
        assert!(registry.has("openaicompatible"));
        assert!(!registry.has("grok"));
    }

    #[test]
    fn test_models_for_unknown_is_empty() {
        let registry = ProviderRegistry::from_config(&ServerConfig::default());
        assert!(registry.models_for("openai").is_empty());
        assert!(registry.models_for("not-a-provider").is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_reasoning_support_per_vendor() {
        let registry = ProviderRegistry::from_config(&full_config());
        assert!(registry.supports_reasoning_effort("openai"));
        assert!(registry.supports_reasoning_effort("anthropic"));
        assert!(registry.supports_reasoning_effort("deepseek"));
        assert!(registry.supports_reasoning_effort("google"));
        assert!(!registry.supports_reasoning_effort("openrouter"));
        assert!(!registry.supports_reasoning_effort("ollama"));
        assert!(!registry.supports_reasoning_effort("openaiCompatible"));
        assert!(!registry.supports_reasoning_effort("unknown"));
    }
}
