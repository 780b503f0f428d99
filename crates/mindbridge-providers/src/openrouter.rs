//! OpenRouter adapter.
//!
//! OpenRouter fronts many upstream vendors behind one chat-completions
//! endpoint at a fixed base URL. It asks callers to identify themselves
//! with attribution headers on every request.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error};

use mindbridge_core::config::OpenRouterConfig;
use mindbridge_core::{OpinionRequest, Outcome};

use crate::error::ProviderError;
use crate::http::{build_client, chat_messages, extract_openai_error, ChatCompletionReply, ChatMessage};
use crate::traits::{failure, OpinionProvider};

const BASE_URL: &str = "https://openrouter.ai/api/v1";

const REFERER: &str = "https://github.com/mindbridge-ai/mindbridge";
const TITLE: &str = "Mindbridge";

const MODELS: &[&str] = &[
    "openai/gpt-4-turbo-preview",
    "anthropic/claude-3-sonnet",
    "anthropic/claude-3-opus",
    "google/gemini-pro",
    "meta/llama-3",
    "mistral/mistral-medium",
];

pub struct OpenRouterProvider {
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
    max_tokens: u32,
}

impl OpenRouterProvider {
    pub fn new(config: &OpenRouterConfig) -> Self {
        OpenRouterProvider {
            client: build_client(),
            api_key: config.api_key.clone(),
            base_url: BASE_URL.to_string(),
        }
    }

    #[cfg(test)]
    fn with_base_url(config: &OpenRouterConfig, base_url: &str) -> Self {
        OpenRouterProvider {
            client: build_client(),
            api_key: config.api_key.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn build_request(&self, req: &OpinionRequest) -> ChatRequest {
        ChatRequest {
            model: req.model.clone(),
            messages: chat_messages(req.system_prompt.as_deref(), &req.prompt),
            stream: false,
            temperature: req.temperature,
            max_tokens: req.max_tokens,
        }
    }

    async fn call(&self, req: &OpinionRequest) -> Result<String, ProviderError> {
        let body = self.build_request(req);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(model = %req.model, "Calling OpenRouter");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", TITLE)
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
                    vendor: "OpenRouter",
                    detail: e.to_string(),
                })?;

        reply
            .first_content()
            .ok_or_else(|| ProviderError::NoContent("No response received from OpenRouter".into()))
    }
}

#[async_trait]
impl OpinionProvider for OpenRouterProvider {
    async fn get_response(&self, request: &OpinionRequest) -> Outcome {
        match self.call(request).await {
            Ok(text) => Outcome::success(text),
            Err(e) => {
                error!(error = %e, "OpenRouter request failed");
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
        "OpenRouter"
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

    fn provider(base_url: &str) -> OpenRouterProvider {
        OpenRouterProvider::with_base_url(
            &OpenRouterConfig {
                api_key: "or-test".to_string(),
            },
            base_url,
        )
    }

    fn request(model: &str) -> OpinionRequest {
        OpinionRequest::new(ProviderId::OpenRouter, model, "compare the options")
    }

    #[test]
    fn test_fixed_base_url() {
        let p = OpenRouterProvider::new(&OpenRouterConfig {
            api_key: "or-test".to_string(),
        });
        assert_eq!(p.base_url, "https://openrouter.ai/api/v1");
    }

    #[test]
    fn test_no_reasoning_support() {
        let p = provider("http://x");
        assert!(!p.supports_reasoning_effort());
        assert!(!p.supports_reasoning_effort_for_model("openai/gpt-4-turbo-preview"));
    }

    #[test]
    fn test_request_pins_stream_off() {
        let p = provider("http://x");
        let body = serde_json::to_value(p.build_request(&request("google/gemini-pro"))).unwrap();
        assert_eq!(body["stream"], false);
        assert_eq!(body["max_tokens"], 1024);
    }

    #[tokio::test]
    async fn test_sends_attribution_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer or-test"))
            .and(header("HTTP-Referer", REFERER))
            .and(header("X-Title", TITLE))
            .and(body_partial_json(serde_json::json!({
                "model": "anthropic/claude-3-opus"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "routed"}}]
            })))
            .mount(&server)
            .await;

        let outcome = provider(&server.uri())
            .get_response(&request("anthropic/claude-3-opus"))
            .await;
        assert_eq!(outcome, Outcome::success("routed"));
    }

    #[tokio::test]
    async fn test_api_error_message_extraction() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(402).set_body_json(serde_json::json!({
                "error": {"message": "Insufficient credits", "code": 402}
            })))
            .mount(&server)
            .await;

        let outcome = provider(&server.uri())
            .get_response(&request("meta/llama-3"))
            .await;
        match outcome {
            Outcome::Failure { message } => {
                assert_eq!(message, "Error from OpenRouter: Insufficient credits");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
