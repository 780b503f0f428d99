//! Core types for Mindbridge — the unified request, the unified outcome,
//! and the tool-facing envelope.
//!
//! Wire field names follow the published tool schema: `systemPrompt` and
//! `maxTokens` are camelCase, the sampling knobs (`reasoning_effort`,
//! `top_p`, …) are snake_case. Serde renames handle the mismatch so the
//! Rust side stays uniform.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─────────────────────────────────────────────
// Provider identifiers
// ─────────────────────────────────────────────

/// The closed set of provider identifiers a request may name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderId {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "google")]
    Google,
    #[serde(rename = "openrouter")]
    OpenRouter,
    #[serde(rename = "ollama")]
    Ollama,
    #[serde(rename = "openaiCompatible")]
    OpenAiCompatible,
}

/// All provider identifiers, in registration order.
pub const PROVIDER_IDS: &[ProviderId] = &[
    ProviderId::OpenAi,
    ProviderId::Anthropic,
    ProviderId::DeepSeek,
    ProviderId::Google,
    ProviderId::OpenRouter,
    ProviderId::Ollama,
    ProviderId::OpenAiCompatible,
];

impl ProviderId {
    /// The wire name of this identifier (e.g. `"openaiCompatible"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Anthropic => "anthropic",
            ProviderId::DeepSeek => "deepseek",
            ProviderId::Google => "google",
            ProviderId::OpenRouter => "openrouter",
            ProviderId::Ollama => "ollama",
            ProviderId::OpenAiCompatible => "openaiCompatible",
        }
    }

    /// Parse an identifier, ignoring ASCII case (`"OpenAI"` → `OpenAi`).
    pub fn parse(s: &str) -> Option<ProviderId> {
        PROVIDER_IDS
            .iter()
            .copied()
            .find(|id| id.as_str().eq_ignore_ascii_case(s))
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────
// Reasoning effort
// ─────────────────────────────────────────────

/// Caller-supplied hint requesting deeper chain-of-thought computation.
///
/// Its concrete effect is vendor-defined: a thinking token budget for
/// Anthropic, a named parameter for OpenAI o-series, a synthetic prompt
/// for DeepSeek and Google, ignored everywhere else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
}

impl ReasoningEffort {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasoningEffort::Low => "low",
            ReasoningEffort::Medium => "medium",
            ReasoningEffort::High => "high",
        }
    }
}

// ─────────────────────────────────────────────
// Unified request
// ─────────────────────────────────────────────

/// The normalized "get an LLM response" request.
///
/// One of these arrives per `getSecondOpinion` tool call; the selected
/// adapter translates it into the vendor's native shape.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OpinionRequest {
    pub prompt: String,
    pub provider: ProviderId,
    pub model: String,
    #[serde(rename = "systemPrompt", skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(rename = "maxTokens", default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<ReasoningEffort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    /// Accepted for schema compatibility; streaming is never performed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

fn default_max_tokens() -> u32 {
    1024
}

impl OpinionRequest {
    /// Minimal constructor for the common case; optional knobs default off.
    pub fn new(provider: ProviderId, model: impl Into<String>, prompt: impl Into<String>) -> Self {
        OpinionRequest {
            prompt: prompt.into(),
            provider,
            model: model.into(),
            system_prompt: None,
            temperature: None,
            max_tokens: default_max_tokens(),
            reasoning_effort: None,
            top_p: None,
            top_k: None,
            stop_sequences: None,
            frequency_penalty: None,
            presence_penalty: None,
            stream: None,
        }
    }

    /// Validate the request shape. Runs before any provider is resolved;
    /// a failure here means the request is never dispatched.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.prompt.is_empty() {
            return Err(RequestError::EmptyPrompt);
        }
        if self.model.is_empty() {
            return Err(RequestError::EmptyModel);
        }
        if self.max_tokens == 0 {
            return Err(RequestError::NonPositiveMaxTokens);
        }
        if let Some(t) = self.temperature {
            if !(0.0..=1.0).contains(&t) {
                return Err(RequestError::OutOfRange {
                    field: "temperature",
                    value: t,
                    min: 0.0,
                    max: 1.0,
                });
            }
        }
        if let Some(p) = self.top_p {
            if !(0.0..=1.0).contains(&p) {
                return Err(RequestError::OutOfRange {
                    field: "top_p",
                    value: p,
                    min: 0.0,
                    max: 1.0,
                });
            }
        }
        if let Some(k) = self.top_k {
            if k == 0 {
                return Err(RequestError::NonPositiveTopK);
            }
        }
        for (field, value) in [
            ("frequency_penalty", self.frequency_penalty),
            ("presence_penalty", self.presence_penalty),
        ] {
            if let Some(v) = value {
                if !(-2.0..=2.0).contains(&v) {
                    return Err(RequestError::OutOfRange {
                        field,
                        value: v,
                        min: -2.0,
                        max: 2.0,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Request shape violations, surfaced before dispatch.
#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("model must not be empty")]
    EmptyModel,
    #[error("maxTokens must be a positive integer")]
    NonPositiveMaxTokens,
    #[error("top_k must be a positive integer")]
    NonPositiveTopK,
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

// ─────────────────────────────────────────────
// Unified outcome
// ─────────────────────────────────────────────

/// The tagged outcome of one adapter call: text on success, a
/// vendor-prefixed message on failure. Adapters never return anything
/// else — transport errors, bad statuses, and empty bodies all fold
/// into `Failure`.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Success { text: String },
    Failure { message: String },
}

impl Outcome {
    pub fn success(text: impl Into<String>) -> Self {
        Outcome::Success { text: text.into() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Outcome::Failure {
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Outcome::Failure { .. })
    }
}

// ─────────────────────────────────────────────
// Tool envelope
// ─────────────────────────────────────────────

/// One text block in a tool response.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
}

/// The uniform envelope returned to the calling host for every tool,
/// success or error. `isError` is omitted from the wire when false.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolResponse {
    pub content: Vec<ContentBlock>,
    #[serde(rename = "isError", default, skip_serializing_if = "is_false")]
    pub is_error: bool,
}

fn is_false(v: &bool) -> bool {
    !*v
}

impl ToolResponse {
    /// Successful envelope with a single text block.
    pub fn text(text: impl Into<String>) -> Self {
        ToolResponse {
            content: vec![ContentBlock::Text { text: text.into() }],
            is_error: false,
        }
    }

    /// Error envelope with a single text block.
    pub fn error(text: impl Into<String>) -> Self {
        ToolResponse {
            content: vec![ContentBlock::Text { text: text.into() }],
            is_error: true,
        }
    }

    /// The text of the first content block (every envelope has one).
    pub fn first_text(&self) -> &str {
        match &self.content[0] {
            ContentBlock::Text { text } => text,
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
