//! Generic adapter for any OpenAI-compatible endpoint (vLLM, LM Studio,
//! llama.cpp server, self-hosted gateways).
//!
//! The endpoint base is configured, not known ahead of time, and the
//! model list comes from configuration too. An empty list means the
//! operator declined to enumerate models, so any name is accepted.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error};

use mindbridge_core::config::OpenAiCompatibleConfig;
use mindbridge_core::{OpinionRequest, Outcome};

use crate::error::ProviderError;
use crate::http::{build_client, chat_messages, extract_openai_error, ChatCompletionReply, ChatMessage};
use crate::traits::{failure, OpinionProvider};

/// Servers that ignore auth still reject a missing header; a
/// placeholder token keeps them happy when no key is configured.
const PLACEHOLDER_KEY: &str = "dummy-key";

pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    models: Vec<String>,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: &OpenAiCompatibleConfig) -> Self {
        OpenAiCompatibleProvider {
            client: build_client(),
            api_key: config
                .api_key
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_KEY.to_string()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            models: config.models.clone(),
        }
    }

    fn build_request(&self, req: &OpinionRequest) -> ChatRequest {
        ChatRequest {
            model: req.model.clone(),
            messages: chat_messages(req.system_prompt.as_deref(), &req.prompt),
            stream: false,
            temperature: req.temperature,
            max_tokens: req.max_tokens,
            top_p: req.top_p,
            frequency_penalty: req.frequency_penalty,
            presence_penalty: req.presence_penalty,
            stop: req.stop_sequences.clone(),
        }
    }

    async fn call(&self, req: &OpinionRequest) -> Result<String, ProviderError> {
        let body = self.build_request(req);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %req.model, base_url = %self.base_url, "Calling OpenAI-compatible endpoint");

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
                    vendor: "OpenAI-compatible endpoint",
                    detail: e.to_string(),
                })?;

        reply.first_content().ok_or_else(|| {
            ProviderError::NoContent("No response received from OpenAI-compatible endpoint".into())
        })
    }
}

#[async_trait]
impl OpinionProvider for OpenAiCompatibleProvider {
    async fn get_response(&self, request: &OpinionRequest) -> Outcome {
        match self.call(request).await {
            Ok(text) => Outcome::success(text),
            Err(e) => {
                error!(error = %e, "OpenAI-compatible request failed");
                failure(self.display_name(), e)
            }
        }
    }

    fn available_models(&self) -> Vec<String> {
        self.models.clone()
    }

    fn is_valid_model(&self, model: &str) -> bool {
        self.models.is_empty() || self.models.iter().any(|m| m == model)
    }

    fn supports_reasoning_effort(&self) -> bool {
        false
    }

    fn supports_reasoning_effort_for_model(&self, _model: &str) -> bool {
        false
    }

    fn display_name(&self) -> &'static str {
        "OpenAI-compatible endpoint"
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mindbridge_core::ProviderId;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str, api_key: Option<&str>, models: &[&str]) -> OpenAiCompatibleProvider {
        OpenAiCompatibleProvider::new(&OpenAiCompatibleConfig {
            api_key: api_key.map(String::from),
            base_url: base_url.to_string(),
            models: models.iter().map(|m| m.to_string()).collect(),
        })
    }

    fn request(model: &str) -> OpinionRequest {
        OpinionRequest::new(ProviderId::OpenAiCompatible, model, "ping")
    }

    #[test]
    fn test_empty_model_list_accepts_anything() {
        let p = provider("http://x/v1", None, &[]);
        assert!(p.is_valid_model("whatever-model"));
        assert!(p.available_models().is_empty());
    }

    #[test]
    fn test_declared_model_list_is_enforced() {
        let p = provider("http://x/v1", None, &["qwen2", "phi-3"]);
        assert!(p.is_valid_model("qwen2"));
        assert!(!p.is_valid_model("whatever-model"));
    }

    #[test]
    fn test_forwards_sampling_fields() {
        let p = provider("http://x/v1", None, &[]);
        let mut req = request("qwen2");
        req.top_p = Some(0.9);
        req.frequency_penalty = Some(0.5);
        req.presence_penalty = Some(-0.5);
        req.stop_sequences = Some(vec!["END".to_string()]);

        let body = serde_json::to_value(p.build_request(&req)).unwrap();
        assert_eq!(body["top_p"], 0.9);
        assert_eq!(body["frequency_penalty"], 0.5);
        assert_eq!(body["presence_penalty"], -0.5);
        assert_eq!(body["stop"][0], "END");
        assert_eq!(body["stream"], false);
    }

    #[tokio::test]
    async fn test_placeholder_key_when_unconfigured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer dummy-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "pong"}}]
            })))
            .mount(&server)
            .await;

        let outcome = provider(&server.uri(), None, &[])
            .get_response(&request("qwen2"))
            .await;
        assert_eq!(outcome, Outcome::success("pong"));
    }

    #[tokio::test]
    async fn test_configured_key_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer real-key"))
            .and(body_partial_json(serde_json::json!({"model": "phi-3"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "ok"}}]
            })))
            .mount(&server)
            .await;

        let outcome = provider(&server.uri(), Some("real-key"), &["phi-3"])
            .get_response(&request("phi-3"))
            .await;
        assert_eq!(outcome, Outcome::success("ok"));
    }

    #[tokio::test]
    async fn test_error_prefix_uses_display_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;

        let outcome = provider(&server.uri(), None, &[])
            .get_response(&request("qwen2"))
            .await;
        match outcome {
            Outcome::Failure { message } => {
                assert_eq!(
                    message,
                    "Error from OpenAI-compatible endpoint: internal error"
                );
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
