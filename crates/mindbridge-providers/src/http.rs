//! Shared HTTP plumbing for the chat-completions family of vendors.
//!
//! OpenAI, DeepSeek, OpenRouter, and generic compatible endpoints all
//! speak the same message/response dialect; only the request envelope
//! and error body differ per vendor, so those stay in each adapter.

use serde::{Deserialize, Serialize};

/// Per-request HTTP timeout. There is no separate timeout layer in the
/// core contract; this client default governs hang behavior.
const HTTP_TIMEOUT_SECS: u64 = 120;

/// Build the connection-pooled client each adapter holds.
pub(crate) fn build_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
        .expect("Failed to build HTTP client")
}

// ─────────────────────────────────────────────
// Chat-completions wire shapes
// ─────────────────────────────────────────────

/// One turn in an OpenAI-style message list.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "system",
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "user",
            content: content.into(),
        }
    }
}

/// Assemble the standard two-slot message list: system prompt (when
/// present) followed by the user turn.
pub(crate) fn chat_messages(system_prompt: Option<&str>, prompt: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = system_prompt {
        messages.push(ChatMessage::system(system));
    }
    messages.push(ChatMessage::user(prompt));
    messages
}

/// Minimal chat-completions reply: everything except the first
/// choice's text is ignored.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionReply {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatReplyMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatReplyMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionReply {
    /// Text of the first choice, if any.
    pub fn first_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|s| !s.is_empty())
    }
}

/// Extract the message from an OpenAI-style error body:
/// `{ "error": { "message": … } }`.
pub(crate) fn extract_openai_error(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(String::from)
}
