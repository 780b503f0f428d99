//! Anthropic adapter.
//!
//! Reasoning effort maps to the Messages API `thinking` block with a
//! numeric token budget. Extended thinking is incompatible with
//! temperature/top_p/top_k, so those are dropped when it is engaged.
//! The system prompt is folded into the user turn rather than sent as
//! a separate field.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use mindbridge_core::config::KeyedProviderConfig;
use mindbridge_core::{OpinionRequest, Outcome, ReasoningEffort};

use crate::error::ProviderError;
use crate::http::{build_client, extract_openai_error};
use crate::traits::{failure, OpinionProvider};

const MODELS: &[&str] = &[
    "claude-3-7-sonnet-20250219",
    "claude-3-5-sonnet-20241022",
    "claude-3-5-haiku-20241022",
    "claude-3-opus-20240229",
    "claude-3-sonnet-20240229",
    "claude-3-haiku-20240307",
];

/// The one model with extended thinking support.
const THINKING_MODEL: &str = "claude-3-7-sonnet-20250219";

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Token budgets per effort level.
fn budget_tokens(effort: ReasoningEffort) -> u32 {
    match effort {
        ReasoningEffort::Low => 4_000,
        ReasoningEffort::Medium => 16_000,
        ReasoningEffort::High => 32_000,
    }
}

pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    messages: Vec<UserTurn>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking: Option<Thinking>,
}

#[derive(Serialize)]
struct UserTurn {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct Thinking {
    #[serde(rename = "type")]
    kind: &'static str,
    budget_tokens: u32,
}

/// One block of the Messages API response content. Decoded loosely so
/// unknown block kinds pass through without a parse failure.
#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thinking: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesReply {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

impl AnthropicProvider {
    pub fn new(config: &KeyedProviderConfig) -> Self {
        AnthropicProvider {
            client: build_client(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn build_request(&self, req: &OpinionRequest) -> MessagesRequest {
        // System prompt and user prompt share the single user turn.
        let full_prompt = match req.system_prompt.as_deref() {
            Some(system) => format!("{system}\n\n{}", req.prompt),
            None => req.prompt.clone(),
        };

        let thinking = req
            .reasoning_effort
            .filter(|_| self.supports_reasoning_effort_for_model(&req.model))
            .map(|effort| Thinking {
                kind: "enabled",
                budget_tokens: budget_tokens(effort),
            });

        let (temperature, top_p, top_k) = if thinking.is_some() {
            // Extended thinking rejects sampling overrides.
            (None, None, None)
        } else {
            (req.temperature, req.top_p, req.top_k)
        };

        MessagesRequest {
            model: req.model.clone(),
            messages: vec![UserTurn {
                role: "user",
                content: full_prompt,
            }],
            max_tokens: req.max_tokens,
            temperature,
            top_p,
            top_k,
            thinking,
        }
    }

    /// Render the block list: thinking blocks first, then text blocks,
    /// joined by blank lines.
    fn render_content(blocks: Vec<ContentBlock>) -> String {
        let mut parts: Vec<String> = Vec::new();

        for block in &blocks {
            match block.kind.as_str() {
                "thinking" => {
                    if let Some(thinking) = &block.thinking {
                        parts.push(format!("Thinking: {thinking}"));
                    }
                }
                "redacted_thinking" => {
                    parts.push("Redacted thinking: [Content redacted for safety]".to_string());
                }
                _ => {}
            }
        }
        for block in &blocks {
            if block.kind == "text" {
                if let Some(text) = &block.text {
                    parts.push(text.clone());
                }
            }
        }

        parts.join("\n\n")
    }

    async fn call(&self, req: &OpinionRequest) -> Result<String, ProviderError> {
        let body = self.build_request(req);
        let url = format!("{}/v1/messages", self.base_url);

        debug!(model = %req.model, thinking = body.thinking.is_some(), "Calling Anthropic");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
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

        let reply: MessagesReply =
            response
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponse {
                    vendor: "Anthropic",
                    detail: e.to_string(),
                })?;

        let text = Self::render_content(reply.content);
        if text.is_empty() {
            return Err(ProviderError::NoContent(
                "No text response received from Anthropic".into(),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl OpinionProvider for AnthropicProvider {
    async fn get_response(&self, request: &OpinionRequest) -> Outcome {
        match self.call(request).await {
            Ok(text) => Outcome::success(text),
            Err(e) => {
                error!(error = %e, "Anthropic request failed");
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
        model == THINKING_MODEL
    }

    fn display_name(&self) -> &'static str {
        "Anthropic"
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
