//! Google Gemini adapter.
//!
//! Every Gemini model reports reasoning support: the models reason
//! internally when prompted for it, so the adapter injects a synthetic
//! instruction turn, but it never restructures the output — the API
//! does not return the thinking process. Thinking-capable models may
//! answer with usage metadata and no candidate text at all; that is a
//! placeholder, not an error, when reasoning was requested.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use mindbridge_core::config::KeyedProviderConfig;
use mindbridge_core::{OpinionRequest, Outcome, ReasoningEffort};

use crate::error::ProviderError;
use crate::http::{build_client, extract_openai_error};
use crate::traits::{failure, OpinionProvider};

const MODELS: &[&str] = &[
    "gemini-1.5-pro",
    "gemini-1.5-flash",
    "gemini-1.0-pro",
    "gemini-1.0-pro-vision",
    "gemini-2.0-flash",
    "gemini-2.0-flash-thinking-exp",
];

pub struct GoogleProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(rename = "topK")]
    top_k: u32,
    #[serde(rename = "topP")]
    top_p: f64,
}

#[derive(Debug, Deserialize)]
struct GenerateReply {
    #[serde(default)]
    candidates: Option<Vec<Candidate>>,
    #[serde(rename = "usageMetadata", default)]
    usage_metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Option<Vec<ReplyPart>>,
}

#[derive(Debug, Deserialize)]
struct ReplyPart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateReply {
    /// `candidates[0].content.parts[0].text`, when present and non-empty.
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .as_deref()?
            .first()?
            .content
            .as_ref()?
            .parts
            .as_deref()?
            .first()?
            .text
            .as_deref()
            .filter(|t| !t.is_empty())
    }
}

fn reasoning_depth(effort: ReasoningEffort) -> &'static str {
    match effort {
        ReasoningEffort::Low => "brief",
        ReasoningEffort::Medium => "detailed",
        ReasoningEffort::High => "extremely detailed",
    }
}

impl GoogleProvider {
    pub fn new(config: &KeyedProviderConfig) -> Self {
        GoogleProvider {
            client: build_client(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn build_request(&self, req: &OpinionRequest) -> GenerateRequest {
        let generation_config = GenerationConfig {
            temperature: req.temperature,
            max_output_tokens: req.max_tokens,
            top_k: 40,
            top_p: 0.95,
        };

        if let Some(effort) = req.reasoning_effort {
            // Reasoning mode: the system prompt and the synthetic
            // instruction become leading user turns.
            let mut contents = Vec::new();
            if let Some(system) = req.system_prompt.as_deref() {
                contents.push(Content {
                    role: "user",
                    parts: vec![Part {
                        text: system.to_string(),
                    }],
                });
            }
            contents.push(Content {
                role: "user",
                parts: vec![Part {
                    text: format!(
                        "Please provide {} step-by-step reasoning before giving your final \
                         answer. Start with \"Reasoning:\" and end with \"Answer:\" to clearly \
                         separate your thought process from your final response.",
                        reasoning_depth(effort)
                    ),
                }],
            });
            contents.push(Content {
                role: "user",
                parts: vec![Part {
                    text: req.prompt.clone(),
                }],
            });

            GenerateRequest {
                contents,
                generation_config,
                system_instruction: None,
            }
        } else {
            GenerateRequest {
                contents: vec![Content {
                    role: "user",
                    parts: vec![Part {
                        text: req.prompt.clone(),
                    }],
                }],
                generation_config,
                system_instruction: req.system_prompt.as_deref().map(|system| {
                    SystemInstruction {
                        parts: vec![Part {
                            text: system.to_string(),
                        }],
                    }
                }),
            }
        }
    }

    async fn call(&self, req: &OpinionRequest) -> Result<String, ProviderError> {
        let body = self.build_request(req);
        let url = format!("{}/models/{}:generateContent", self.base_url, req.model);

        debug!(model = %req.model, reasoning = req.reasoning_effort.is_some(), "Calling Google AI");

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
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

        let reply: GenerateReply =
            response
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponse {
                    vendor: "Google AI",
                    detail: e.to_string(),
                })?;

        // Thinking models can return usage metadata with no candidate
        // text. With reasoning requested this is an explainable gap;
        // without it, it is a content error.
        if reply.usage_metadata.is_some() && reply.first_text().is_none() {
            if req.reasoning_effort.is_some() {
                return Ok(format!(
                    "The model {} supports thinking capabilities, but the thinking process \
                     is not provided in the API output. The API call was successful, but no \
                     content was returned.",
                    req.model
                ));
            }
            return Err(ProviderError::NoContent(
                "No response content received from Google AI".into(),
            ));
        }

        reply
            .first_text()
            .map(String::from)
            .ok_or_else(|| ProviderError::NoContent("No response received from Google AI".into()))
    }
}

#[async_trait]
impl OpinionProvider for GoogleProvider {
    async fn get_response(&self, request: &OpinionRequest) -> Outcome {
        match self.call(request).await {
            Ok(text) => Outcome::success(text),
            Err(e) => {
                error!(error = %e, "Google AI request failed");
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

    fn supports_reasoning_effort_for_model(&self, _model: &str) -> bool {
        // All Gemini models reason internally when prompted for it.
        true
    }

    fn display_name(&self) -> &'static str {
        "Google AI"
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
