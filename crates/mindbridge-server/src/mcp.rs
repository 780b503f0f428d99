//! MCP server over stdio.
//!
//! JSON-RPC 2.0, newline-delimited: one request per line on stdin, one
//! response per line on stdout. All diagnostics go to stderr — stdout
//! belongs to the protocol stream.
//!
//! Tool-level failures (bad arguments, provider errors) come back as
//! error envelopes inside a successful JSON-RPC response; only protocol
//! violations (invalid JSON, unknown method, malformed params) produce
//! JSON-RPC errors.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use mindbridge_core::{OpinionRequest, ToolResponse};
use mindbridge_providers::ProviderRegistry;

use crate::dispatch;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "mindbridge";

const PARSE_ERROR: i32 = -32700;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;

// ─────────────────────────────────────────────
// JSON-RPC framing
// ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    /// Absent for notifications, which never get a response.
    #[serde(default)]
    id: Option<serde_json::Value>,
    method: String,
    #[serde(default)]
    params: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

impl JsonRpcResponse {
    fn result(id: serde_json::Value, result: serde_json::Value) -> Self {
        JsonRpcResponse {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: serde_json::Value, code: i32, message: impl Into<String>) -> Self {
        JsonRpcResponse {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

// ─────────────────────────────────────────────
// Server
// ─────────────────────────────────────────────

pub struct McpServer {
    registry: ProviderRegistry,
}

impl McpServer {
    pub fn new(registry: ProviderRegistry) -> Self {
        McpServer { registry }
    }

    /// Serve until stdin closes or a termination signal arrives.
    pub async fn run(&self) -> anyhow::Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        let mut lines = stdin.lines();

        info!(protocol = PROTOCOL_VERSION, "MCP server listening on stdio");

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line? {
                        Some(line) => {
                            if let Some(response) = self.handle_line(&line).await {
                                stdout.write_all(response.as_bytes()).await?;
                                stdout.write_all(b"\n").await?;
                                stdout.flush().await?;
                            }
                        }
                        None => {
                            info!("stdin closed, shutting down");
                            return Ok(());
                        }
                    }
                }
                _ = shutdown_signal() => {
                    info!("termination signal received, shutting down");
                    return Ok(());
                }
            }
        }
    }

    /// Process one raw input line. Returns `None` for blank lines and
    /// notifications, which get no response.
    pub async fn handle_line(&self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                warn!(error = %e, "Discarding unparseable input line");
                let response = JsonRpcResponse::error(
                    serde_json::Value::Null,
                    PARSE_ERROR,
                    format!("Parse error: {e}"),
                );
                return serde_json::to_string(&response).ok();
            }
        };

        debug!(method = %request.method, "Handling request");

        let Some(id) = request.id else {
            // Notifications (notifications/initialized and friends) are
            // acknowledged by silence.
            return None;
        };

        let response = self.handle_request(id, &request.method, request.params).await;
        serde_json::to_string(&response).ok()
    }

    async fn handle_request(
        &self,
        id: serde_json::Value,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> JsonRpcResponse {
        match method {
            "initialize" => JsonRpcResponse::result(
                id,
                serde_json::json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": { "tools": {} },
                    "serverInfo": {
                        "name": SERVER_NAME,
                        "version": env!("CARGO_PKG_VERSION"),
                    },
                }),
            ),
            "ping" => JsonRpcResponse::result(id, serde_json::json!({})),
            "tools/list" => JsonRpcResponse::result(
                id,
                serde_json::json!({ "tools": tool_definitions() }),
            ),
            "tools/call" => {
                let params: ToolCallParams = match params
                    .ok_or_else(|| "missing params".to_string())
                    .and_then(|p| serde_json::from_value(p).map_err(|e| e.to_string()))
                {
                    Ok(p) => p,
                    Err(e) => {
                        return JsonRpcResponse::error(
                            id,
                            INVALID_PARAMS,
                            format!("Invalid params: {e}"),
                        )
                    }
                };
                self.call_tool(id, params).await
            }
            other => JsonRpcResponse::error(id, METHOD_NOT_FOUND, format!("Method not found: {other}")),
        }
    }

    async fn call_tool(&self, id: serde_json::Value, params: ToolCallParams) -> JsonRpcResponse {
        let response = match params.name.as_str() {
            "getSecondOpinion" => self.get_second_opinion(params.arguments).await,
            "listProviders" => dispatch::list_providers(&self.registry),
            "listReasoningModels" => dispatch::list_reasoning_models(),
            other => {
                return JsonRpcResponse::error(id, INVALID_PARAMS, format!("Unknown tool: {other}"))
            }
        };

        match serde_json::to_value(&response) {
            Ok(value) => JsonRpcResponse::result(id, value),
            Err(e) => JsonRpcResponse::error(id, INVALID_PARAMS, e.to_string()),
        }
    }

    /// Argument decoding and shape validation happen here so a bad tool
    /// call surfaces as an error envelope, not a protocol failure.
    async fn get_second_opinion(&self, arguments: serde_json::Value) -> ToolResponse {
        let request: OpinionRequest = match serde_json::from_value(arguments) {
            Ok(req) => req,
            Err(e) => return ToolResponse::error(format!("Error: {e}")),
        };

        if let Err(e) = request.validate() {
            return ToolResponse::error(format!("Error: {e}"));
        }

        dispatch::get_second_opinion(&self.registry, &request).await
    }
}

async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let ctrl_c = tokio::signal::ctrl_c();
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(_) => {
            // No SIGTERM stream; ctrl_c alone still works.
            let _ = ctrl_c.await;
            return;
        }
    };

    tokio::select! {
        _ = ctrl_c => {}
        _ = sigterm.recv() => {}
    }
}

/// Tool declarations for `tools/list`, input schemas included.
fn tool_definitions() -> serde_json::Value {
    let effort = serde_json::json!({
        "type": "string",
        "enum": ["low", "medium", "high"],
        "description": "How much internal reasoning the model should perform",
    });

    serde_json::json!([
        {
            "name": "getSecondOpinion",
            "description": "Get responses from various LLM providers",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "prompt": { "type": "string", "minLength": 1 },
                    "provider": {
                        "type": "string",
                        "enum": ["openai", "anthropic", "deepseek", "google",
                                 "openrouter", "ollama", "openaiCompatible"],
                    },
                    "model": { "type": "string", "minLength": 1 },
                    "systemPrompt": { "type": "string" },
                    "temperature": { "type": "number", "minimum": 0, "maximum": 1 },
                    "maxTokens": { "type": "integer", "minimum": 1, "default": 1024 },
                    "reasoning_effort": effort,
                    "top_p": { "type": "number", "minimum": 0, "maximum": 1 },
                    "top_k": { "type": "integer", "minimum": 1 },
                    "stop_sequences": { "type": "array", "items": { "type": "string" } },
                    "frequency_penalty": { "type": "number", "minimum": -2, "maximum": 2 },
                    "presence_penalty": { "type": "number", "minimum": -2, "maximum": 2 },
                    "stream": { "type": "boolean" },
                },
                "required": ["prompt", "provider", "model"],
            },
        },
        {
            "name": "listProviders",
            "description": "List all configured LLM providers and their available models",
            "inputSchema": { "type": "object", "properties": {} },
        },
        {
            "name": "listReasoningModels",
            "description": "List all available models that support reasoning capabilities",
            "inputSchema": { "type": "object", "properties": {} },
        },
    ])
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use mindbridge_core::config::{OllamaConfig, ServerConfig};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn server_with(base_url: &str) -> McpServer {
        McpServer::new(ProviderRegistry::from_config(&ServerConfig {
            ollama: Some(OllamaConfig {
                base_url: base_url.to_string(),
            }),
            ..ServerConfig::default()
        }))
    }

    fn offline_server() -> McpServer {
        server_with("http://127.0.0.1:1")
    }

    async fn roundtrip(server: &McpServer, line: &str) -> serde_json::Value {
        let response = server.handle_line(line).await.expect("expected a response");
        serde_json::from_str(&response).unwrap()
    }

    #[tokio::test]
    async fn test_initialize() {
        let server = offline_server();
        let response = roundtrip(
            &server,
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"test","version":"0"}}}"#,
        )
        .await;

        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(response["result"]["serverInfo"]["name"], "mindbridge");
        assert!(response["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn test_ping() {
        let server = offline_server();
        let response = roundtrip(&server, r#"{"jsonrpc":"2.0","id":"p1","method":"ping"}"#).await;
        assert_eq!(response["id"], "p1");
        assert!(response["result"].is_object());
    }

    #[tokio::test]
    async fn test_tools_list_declares_all_three() {
        let server = offline_server();
        let response =
            roundtrip(&server, r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#).await;

        let tools = response["result"]["tools"].as_array().unwrap();
        let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(
            names,
            vec!["getSecondOpinion", "listProviders", "listReasoningModels"]
        );
        assert_eq!(
            tools[0]["inputSchema"]["required"],
            serde_json::json!(["prompt", "provider", "model"])
        );
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let server = offline_server();
        assert!(server
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await
            .is_none());
        assert!(server.handle_line("").await.is_none());
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let server = offline_server();
        let response = roundtrip(&server, "{not json").await;
        assert_eq!(response["error"]["code"], -32700);
        assert!(response["id"].is_null());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let server = offline_server();
        let response =
            roundtrip(&server, r#"{"jsonrpc":"2.0","id":3,"method":"resources/list"}"#).await;
        assert_eq!(response["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn test_tools_call_without_params_is_invalid() {
        let server = offline_server();
        let response =
            roundtrip(&server, r#"{"jsonrpc":"2.0","id":4,"method":"tools/call"}"#).await;
        assert_eq!(response["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_invalid_params() {
        let server = offline_server();
        let response = roundtrip(
            &server,
            r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"doMagic","arguments":{}}}"#,
        )
        .await;
        assert_eq!(response["error"]["code"], -32602);
        assert!(response["error"]["message"]
            .as_str()
            .unwrap()
            .contains("doMagic"));
    }

    #[tokio::test]
    async fn test_malformed_tool_arguments_are_an_error_envelope() {
        // Missing required fields is a tool-level error, not a protocol
        // failure: the JSON-RPC response succeeds, the envelope carries
        // the problem.
        let server = offline_server();
        let response = roundtrip(
            &server,
            r#"{"jsonrpc":"2.0","id":6,"method":"tools/call","params":{"name":"getSecondOpinion","arguments":{"prompt":"hi"}}}"#,
        )
        .await;

        assert!(response.get("error").is_none());
        assert_eq!(response["result"]["isError"], true);
        assert!(response["result"]["content"][0]["text"]
            .as_str()
            .unwrap()
            .starts_with("Error: "));
    }

    #[tokio::test]
    async fn test_shape_violation_is_an_error_envelope() {
        let server = offline_server();
        let response = roundtrip(
            &server,
            r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"getSecondOpinion","arguments":{"prompt":"hi","provider":"ollama","model":"llama2","temperature":3.0}}}"#,
        )
        .await;

        assert_eq!(response["result"]["isError"], true);
        assert!(response["result"]["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("temperature"));
    }

    #[tokio::test]
    async fn test_full_tool_call_round_trip() {
        let mock = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": {"content": "a second opinion"}
            })))
            .mount(&mock)
            .await;

        let server = server_with(&mock.uri());
        let response = roundtrip(
            &server,
            r#"{"jsonrpc":"2.0","id":8,"method":"tools/call","params":{"name":"getSecondOpinion","arguments":{"prompt":"hi","provider":"ollama","model":"llama2"}}}"#,
        )
        .await;

        assert!(response["result"].get("isError").is_none());
        assert_eq!(
            response["result"]["content"][0]["text"],
            "a second opinion"
        );
    }

    #[tokio::test]
    async fn test_list_reasoning_models_via_rpc() {
        let server = offline_server();
        let response = roundtrip(
            &server,
            r#"{"jsonrpc":"2.0","id":9,"method":"tools/call","params":{"name":"listReasoningModels"}}"#,
        )
        .await;

        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        let value: serde_json::Value = serde_json::from_str(text).unwrap();
        assert!(value["models"]
            .as_array()
            .unwrap()
            .iter()
            .any(|m| m == "deepseek-reasoner"));
    }
}
