//! Anthropic chat model using the Messages API.
//!
//! This module is only available when the `anthropic` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::{RagError, Result};
use crate::model::{ChatModel, ChatRequest, ChatResponse, ContentBlock, Role, StopReason};

/// The default Anthropic Messages API endpoint.
const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";

/// The API version header value the client pins.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// A [`ChatModel`] backed by the Anthropic Messages API.
///
/// The crate's [`ContentBlock`] serialization matches the Messages API wire
/// shape, so request and response bodies carry the blocks directly.
pub struct AnthropicChatModel {
    client: reqwest::Client,
    api_key: String,
}

impl AnthropicChatModel {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::Model {
                provider: "Anthropic".into(),
                message: "API key must not be empty".into(),
            });
        }
        Ok(Self { client: reqwest::Client::new(), api_key })
    }

    /// Create a new client using the `ANTHROPIC_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").map_err(|_| RagError::Model {
            provider: "Anthropic".into(),
            message: "ANTHROPIC_API_KEY environment variable not set".into(),
        })?;
        Self::new(api_key)
    }
}

// ── Messages API request/response types ────────────────────────────

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: &'a [WireMessage],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
}

#[derive(Serialize)]
struct WireMessage {
    role: Role,
    content: Vec<ContentBlock>,
}

#[derive(Serialize)]
struct WireTool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: &'a serde_json::Value,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<StopReason>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── ChatModel implementation ───────────────────────────────────────

#[async_trait]
impl ChatModel for AnthropicChatModel {
    fn name(&self) -> &str {
        "Anthropic"
    }

    async fn generate(&self, request: ChatRequest) -> Result<ChatResponse> {
        debug!(
            provider = "Anthropic",
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "sending messages request"
        );

        let messages: Vec<WireMessage> = request
            .messages
            .iter()
            .map(|m| WireMessage { role: m.role, content: m.content.clone() })
            .collect();
        let tools: Vec<WireTool<'_>> = request
            .tools
            .iter()
            .map(|t| WireTool {
                name: &t.name,
                description: &t.description,
                input_schema: &t.input_schema,
            })
            .collect();
        let body = MessagesRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: &request.system,
            messages: &messages,
            tools,
        };

        let response = self
            .client
            .post(ANTHROPIC_MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "Anthropic", error = %e, "request failed");
                RagError::Model {
                    provider: "Anthropic".into(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = "Anthropic", %status, "API error");
            return Err(RagError::Model {
                provider: "Anthropic".into(),
                message: format!("API returned {status}: {detail}"),
            });
        }

        let parsed: MessagesResponse = response.json().await.map_err(|e| {
            error!(provider = "Anthropic", error = %e, "failed to parse response");
            RagError::Model {
                provider: "Anthropic".into(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        Ok(ChatResponse {
            content: parsed.content,
            stop_reason: parsed.stop_reason.unwrap_or(StopReason::EndTurn),
        })
    }
}
