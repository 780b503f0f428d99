//! DeepSeek adapter.
//!
//! DeepSeek has no native reasoning parameter. For `deepseek-reasoner`
//! the adapter injects a synthetic system instruction asking for an
//! explicit `Reasoning: … Answer: …` structure, then splits the reply
//! on that marker pair and relabels the halves. Replies without both
//! markers pass through verbatim.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error};

use mindbridge_core::config::KeyedProviderConfig;
use mindbridge_core::{OpinionRequest, Outcome, ReasoningEffort};

use crate::error::ProviderError;
use crate::http::{build_client, chat_messages, ChatCompletionReply, ChatMessage};
use crate::traits::{failure, OpinionProvider};

const MODELS: &[&str] = &["deepseek-chat", "deepseek-coder", "deepseek-reasoner"];

const REASONER_MODEL: &str = "deepseek-reasoner";

pub struct DeepSeekProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    max_tokens: u32,
}

/// Depth wording for the synthetic reasoning instruction.
fn reasoning_depth(effort: ReasoningEffort) -> &'static str {
    match effort {
        ReasoningEffort::Low => "brief",
        ReasoningEffort::Medium => "detailed",
        ReasoningEffort::High => "extremely detailed",
    }
}

fn reasoning_instruction(effort: ReasoningEffort) -> String {
    format!(
        "Please provide {} step-by-step reasoning before giving your final answer. \
         Start with \"Reasoning:\" and end with \"Answer:\" to clearly separate your \
         thought process from your final response.",
        reasoning_depth(effort)
    )
}

/// Split a reply on the `Reasoning: … Answer: …` marker pair. Returns
/// `None` when either marker is missing, in which case the caller keeps
/// the raw text.
fn restructure_reasoning(content: &str) -> Option<String> {
    let reasoning_start = content.find("Reasoning:")?;
    let after_marker = &content[reasoning_start + "Reasoning:".len()..];
    let answer_start = after_marker.find("Answer:")?;

    let reasoning = after_marker[..answer_start].trim();
    let answer = after_marker[answer_start + "Answer:".len()..].trim();

    Some(format!(
        "Chain of Thought Reasoning:\n{reasoning}\n\nFinal Answer:\n{answer}"
    ))
}

/// DeepSeek error bodies are a flat `{ "message": … }`.
fn extract_deepseek_error(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("message")?.as_str().map(String::from)
}

impl DeepSeekProvider {
    pub fn new(config: &KeyedProviderConfig) -> Self {
        DeepSeekProvider {
            client: build_client(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn build_request(&self, req: &OpinionRequest) -> ChatRequest {
        let mut messages = chat_messages(req.system_prompt.as_deref(), &req.prompt);

        // The synthetic instruction goes first, ahead of any caller
        // system prompt.
        if req.model == REASONER_MODEL {
            if let Some(effort) = req.reasoning_effort {
                messages.insert(0, ChatMessage::system(reasoning_instruction(effort)));
            }
        }

        ChatRequest {
            model: req.model.clone(),
            messages,
            temperature: req.temperature,
            max_tokens: req.max_tokens,
        }
    }

    async fn call(&self, req: &OpinionRequest) -> Result<String, ProviderError> {
        let body = self.build_request(req);
        let url = format!("{}/v1/chat/completions", self.base_url);

        debug!(model = %req.model, "Calling DeepSeek");

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
                extract_deepseek_error(&text),
            ));
        }

        let reply: ChatCompletionReply =
            response
                .json()
                .await
                .map_err(|e| ProviderError::InvalidResponse {
                    vendor: "DeepSeek",
                    detail: e.to_string(),
                })?;

        let content = reply.first_content().ok_or_else(|| {
            ProviderError::NoContent("No response content received from DeepSeek".into())
        })?;

        // Relabel the marker pair for the reasoner model only.
        if req.model == REASONER_MODEL {
            if let Some(structured) = restructure_reasoning(&content) {
                return Ok(structured);
            }
        }
        Ok(content)
    }
}

#[async_trait]
impl OpinionProvider for DeepSeekProvider {
    async fn get_response(&self, request: &OpinionRequest) -> Outcome {
        match self.call(request).await {
            Ok(text) => Outcome::success(text),
            Err(e) => {
                error!(error = %e, "DeepSeek request failed");
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
        model == REASONER_MODEL
    }

    fn display_name(&self) -> &'static str {
        "DeepSeek"
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mindbridge_core::ProviderId;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str) -> DeepSeekProvider {
        DeepSeekProvider::new(&KeyedProviderConfig {
            api_key: "ds-test".to_string(),
            base_url: base_url.to_string(),
        })
    }

    fn request(model: &str) -> OpinionRequest {
        OpinionRequest::new(ProviderId::DeepSeek, model, "why is the sky blue?")
    }

    // ── Marker splitting ──

    #[test]
    fn test_restructure_with_both_markers() {
        let reply = "Reasoning: light scatters. Answer: Rayleigh scattering.";
        let structured = restructure_reasoning(reply).unwrap();

        assert!(structured.contains("Chain of Thought Reasoning:\nlight scatters."));
        assert!(structured.contains("Final Answer:\nRayleigh scattering."));
    }

    #[test]
    fn test_restructure_multiline() {
        let reply = "Reasoning:\nstep one\nstep two\nAnswer:\nfour";
        let structured = restructure_reasoning(reply).unwrap();

        assert_eq!(
            structured,
            "Chain of Thought Reasoning:\nstep one\nstep two\n\nFinal Answer:\nfour"
        );
    }

    #[test]
    fn test_restructure_missing_markers() {
        assert!(restructure_reasoning("plain reply").is_none());
        assert!(restructure_reasoning("Reasoning: but no answer marker").is_none());
        assert!(restructure_reasoning("Answer: before Reasoning:").is_none());
    }

    // ── Request shape ──

    #[test]
    fn test_reasoner_prepends_instruction() {
        let p = provider("https://api.deepseek.com");
        let mut req = request("deepseek-reasoner");
        req.system_prompt = Some("Be formal.".to_string());
        req.reasoning_effort = Some(ReasoningEffort::High);

        let body = serde_json::to_value(p.build_request(&req)).unwrap();
        let messages = body["messages"].as_array().unwrap();

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "system");
        assert!(messages[0]["content"]
            .as_str()
            .unwrap()
            .contains("extremely detailed"));
        assert_eq!(messages[1]["content"], "Be formal.");
        assert_eq!(messages[2]["role"], "user");
    }

    #[test]
    fn test_no_instruction_without_effort() {
        let p = provider("https://api.deepseek.com");
        let body = serde_json::to_value(p.build_request(&request("deepseek-reasoner"))).unwrap();
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_no_instruction_for_chat_model() {
        let p = provider("https://api.deepseek.com");
        let mut req = request("deepseek-chat");
        req.reasoning_effort = Some(ReasoningEffort::Low);

        let body = serde_json::to_value(p.build_request(&req)).unwrap();
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_depth_wording() {
        assert_eq!(reasoning_depth(ReasoningEffort::Low), "brief");
        assert_eq!(reasoning_depth(ReasoningEffort::Medium), "detailed");
        assert_eq!(reasoning_depth(ReasoningEffort::High), "extremely detailed");
    }

    // ── HTTP paths ──

    #[tokio::test]
    async fn test_reasoner_round_trip_restructures() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {
                    "content": "Reasoning: X Answer: Y"
                }}]
            })))
            .mount(&server)
            .await;

        let mut req = request("deepseek-reasoner");
        req.reasoning_effort = Some(ReasoningEffort::Medium);

        let outcome = provider(&server.uri()).get_response(&req).await;
        match outcome {
            Outcome::Success { text } => {
                assert!(text.contains("Chain of Thought Reasoning"));
                assert!(text.contains("Final Answer"));
                assert!(text.contains('X'));
                assert!(text.contains('Y'));
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_reasoner_without_markers_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "just an answer"}}]
            })))
            .mount(&server)
            .await;

        let outcome = provider(&server.uri())
            .get_response(&request("deepseek-reasoner"))
            .await;
        assert_eq!(outcome, Outcome::success("just an answer"));
    }

    #[tokio::test]
    async fn test_flat_error_body_extraction() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(402).set_body_json(serde_json::json!({
                "message": "Insufficient Balance"
            })))
            .mount(&server)
            .await;

        let outcome = provider(&server.uri())
            .get_response(&request("deepseek-chat"))
            .await;
        match outcome {
            Outcome::Failure { message } => {
                assert_eq!(message, "Error from DeepSeek: Insufficient Balance");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sends_standard_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "deepseek-chat",
                "max_tokens": 1024
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "ok"}}]
            })))
            .mount(&server)
            .await;

        let outcome = provider(&server.uri())
            .get_response(&request("deepseek-chat"))
            .await;
        assert_eq!(outcome, Outcome::success("ok"));
    }
}
