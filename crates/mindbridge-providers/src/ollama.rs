//! Ollama adapter.
//!
//! Talks to a local Ollama daemon over its native chat API. No auth,
//! no reasoning support. The advertised model list is static; a
//! best-effort tag query against the live daemon backs the CLI view.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use mindbridge_core::config::OllamaConfig;
use mindbridge_core::{OpinionRequest, Outcome};

use crate::error::ProviderError;
use crate::http::build_client;
use crate::traits::{failure, OpinionProvider};

const MODELS: &[&str] = &[
    "llama2",
    "mistral",
    "mixtral",
    "nous-hermes",
    "neural-chat",
    "vicuna",
    "codellama",
    "phi",
];

pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: Options,
}

#[derive(Serialize)]
struct OllamaMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct Options {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    num_predict: u32,
}

/// Chat replies carry the text under `message.content`; older daemon
/// builds used a top-level `response` field instead.
#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    message: Option<ReplyMessage>,
    #[serde(default)]
    response: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatReply {
    fn into_text(self) -> Option<String> {
        self.message
            .and_then(|m| m.content)
            .filter(|s| !s.is_empty())
            .or(self.response.filter(|s| !s.is_empty()))
    }
}

#[derive(Debug, Deserialize)]
struct TagsReply {
    #[serde(default)]
    models: Vec<Tag>,
}

#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
}

fn extract_ollama_error(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("error")?.as_str().map(String::from)
}

impl OllamaProvider {
    pub fn new(config: &OllamaConfig) -> Self {
        OllamaProvider {
            client: build_client(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn build_request(&self, req: &OpinionRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = req.system_prompt.as_deref() {
            messages.push(OllamaMessage {
                role: "system",
                content: system.to_string(),
            });
        }
        messages.push(OllamaMessage {
            role: "user",
            content: req.prompt.clone(),
        });

        ChatRequest {
            model: req.model.clone(),
            messages,
            stream: false,
            options: Options {
                temperature: req.temperature,
                num_predict: req.max_tokens,
            },
        }
    }

    async fn call(&self, req: &OpinionRequest) -> Result<String, ProviderError> {
        let body = self.build_request(req);
        let url = format!("{}/api/chat", self.base_url);

        debug!(model = %req.model, "Calling Ollama");

        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(
                status.as_u16(),
                &text,
                extract_ollama_error(&text),
            ));
        }

        let reply: ChatReply =
            response
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponse {
                    vendor: "Ollama",
                    detail: e.to_string(),
                })?;

        reply
            .into_text()
            .ok_or_else(|| ProviderError::NoContent("No response received from Ollama".into()))
    }

    /// Tags currently pulled on the daemon. Falls back to the static
    /// list when the daemon is unreachable or answers garbage.
    pub async fn live_models(&self) -> Vec<String> {
        let url = format!("{}/api/tags", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => {
                match response.json::<TagsReply>().await {
                    Ok(tags) if !tags.models.is_empty() => {
                        tags.models.into_iter().map(|t| t.name).collect()
                    }
                    _ => self.available_models(),
                }
            }
            Ok(response) => {
                warn!(status = %response.status(), "Ollama tag listing failed");
                self.available_models()
            }
            Err(e) => {
                warn!(error = %e, "Ollama daemon unreachable");
                self.available_models()
            }
        }
    }
}

#[async_trait]
impl OpinionProvider for OllamaProvider {
    async fn get_response(&self, request: &OpinionRequest) -> Outcome {
        match self.call(request).await {
            Ok(text) => Outcome::success(text),
            Err(e) => {
                error!(error = %e, "Ollama request failed");
                failure(self.display_name(), e)
            }
        }
    }

    fn available_models(&self) -> Vec<String> {
        MODELS.iter().map(|m| m.to_string()).collect()
    }

    fn supports_reasoning_effort(&self) -> bool {
        false
    }

    fn supports_reasoning_effort_for_model(&self, _model: &str) -> bool {
        false
    }

    fn display_name(&self) -> &'static str {
        "Ollama"
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
