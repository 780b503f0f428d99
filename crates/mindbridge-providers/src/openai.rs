//! OpenAI adapter.
//!
//! The o-series models take `reasoning_effort` as a named parameter and
//! budget output with `max_completion_tokens` instead of `max_tokens`;
//! they also pin temperature server-side, so it is never sent for them.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error};

use mindbridge_core::config::KeyedProviderConfig;
use mindbridge_core::{OpinionRequest, Outcome};

use crate::error::ProviderError;
use crate::http::{build_client, chat_messages, extract_openai_error, ChatCompletionReply, ChatMessage};
use crate::traits::{failure, OpinionProvider};

const MODELS: &[&str] = &[
    "gpt-4o",
    "gpt-4o-mini",
    "o1",
    "o1-mini",
    "o3",
    "o3-mini",
    "gpt-4.5",
];

/// Models that take reasoning parameters at all.
const O_SERIES: &[&str] = &["o1", "o1-mini", "o3", "o3-mini"];

pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<&'static str>,
}

impl OpenAiProvider {
    pub fn new(config: &KeyedProviderConfig) -> Self {
        OpenAiProvider {
            client: build_client(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn build_request(&self, req: &OpinionRequest) -> ChatRequest {
        let messages = chat_messages(req.system_prompt.as_deref(), &req.prompt);

        if O_SERIES.contains(&req.model.as_str()) {
            // Unspecified effort defaults to medium for the o-series.
            let effort = req
                .reasoning_effort
                .map(|e| e.as_str())
                .unwrap_or("medium");
            ChatRequest {
                model: req.model.clone(),
                messages,
                stream: false,
                temperature: None,
                max_tokens: None,
                max_completion_tokens: Some(req.max_tokens),
                reasoning_effort: Some(effort),
            }
        } else {
            ChatRequest {
                model: req.model.clone(),
                messages,
                stream: false,
                temperature: req.temperature,
                max_tokens: Some(req.max_tokens),
                max_completion_tokens: None,
                reasoning_effort: None,
            }
        }
    }

    async fn call(&self, req: &OpinionRequest) -> Result<String, ProviderError> {
        let body = self.build_request(req);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %req.model, "Calling OpenAI");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(
                status.as_u16(),
                &text,
                extract_openai_error(&text),
            ));
        }

        let reply: ChatCompletionReply =
            response
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponse {
                    vendor: "OpenAI",
                    detail: e.to_string(),
                })?;

        reply
            .first_content()
            .ok_or_else(|| ProviderError::NoContent("No response received from OpenAI".into()))
    }
}

#[async_trait]
impl OpinionProvider for OpenAiProvider {
    async fn get_response(&self, request: &OpinionRequest) -> Outcome {
        match self.call(request).await {
            Ok(text) => Outcome::success(text),
            Err(e) => {
                error!(error = %e, "OpenAI request failed");
                failure(self.display_name(), e)
            }
        }
    }

    fn available_models(&self) -> Vec<String> {
        MODELS.iter().map(|m| m.to_string()).collect()
    }

    fn supports_reasoning_effort(&self) -> bool {
        true
    }

    fn supports_reasoning_effort_for_model(&self, model: &str) -> bool {
        // o1-mini and o3 accept reasoning params but not the effort knob.
        model == "o1" || model == "o3-mini"
    }

    fn display_name(&self) -> &'static str {
        "OpenAI"
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
