//! Language-model capability trait and its message types.
//!
//! The orchestrator treats the model as an opaque capability: it sends a
//! system prompt, a message list, and tool schemas, and receives back either
//! answer text or tool-invocation requests. Message content is modeled as
//! typed blocks so a tool-use response can be echoed back verbatim alongside
//! its tool results on the follow-up call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// The author of a [`ChatMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The end user (and, by convention, tool results).
    User,
    /// The model.
    Assistant,
}

/// One block of message content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain answer text.
    Text {
        /// The text.
        text: String,
    },
    /// A tool-invocation request emitted by the model.
    ToolUse {
        /// Opaque ID correlating this request with its result.
        id: String,
        /// Name of the registered tool to invoke.
        name: String,
        /// Tool arguments as a JSON object.
        input: Value,
    },
    /// The outcome of one tool invocation, fed back to the model.
    ToolResult {
        /// The `id` of the [`ContentBlock::ToolUse`] this answers.
        tool_use_id: String,
        /// The tool's textual output.
        content: String,
    },
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who authored the message.
    pub role: Role,
    /// Ordered content blocks.
    pub content: Vec<ContentBlock>,
}

impl ChatMessage {
    /// A user message holding plain text.
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, content: vec![ContentBlock::Text { text: text.into() }] }
    }

    /// An assistant message holding the given blocks.
    pub fn assistant(content: Vec<ContentBlock>) -> Self {
        Self { role: Role::Assistant, content }
    }

    /// A user message holding tool results.
    pub fn tool_results(content: Vec<ContentBlock>) -> Self {
        Self { role: Role::User, content }
    }
}

/// A tool schema exposed to the model verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool's unique name.
    pub name: String,
    /// What the tool does, phrased for the model.
    pub description: String,
    /// JSON Schema for the tool's parameters.
    pub input_schema: Value,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model produced a complete answer.
    EndTurn,
    /// The model is requesting tool invocations.
    ToolUse,
    /// Generation was cut off at the token limit.
    MaxTokens,
    /// Any other provider-specific stop reason, treated as a completed turn.
    #[serde(other)]
    Other,
}

/// A request to the language-model capability.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// The model identifier.
    pub model: String,
    /// System instructions, including any conversation-history block.
    pub system: String,
    /// The conversation so far.
    pub messages: Vec<ChatMessage>,
    /// Tool schemas the model may invoke. Empty means tools are unavailable
    /// for this call.
    pub tools: Vec<ToolDefinition>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
}

/// A response from the language-model capability.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Ordered content blocks: text and/or tool-use requests.
    pub content: Vec<ContentBlock>,
    /// Why generation stopped.
    pub stop_reason: StopReason,
}

impl ChatResponse {
    /// Concatenated text of all text blocks.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// All tool-use requests in this response, in order.
    pub fn tool_calls(&self) -> Vec<(&str, &str, &Value)> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => {
                    Some((id.as_str(), name.as_str(), input))
                }
                _ => None,
            })
            .collect()
    }
}

/// The language-model capability.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// A human-readable provider/model name, used in error reports.
    fn name(&self) -> &str;

    /// Generate one response for the given request.
    async fn generate(&self, request: ChatRequest) -> Result<ChatResponse>;
}
