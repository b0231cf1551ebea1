//! Chat-completions wire payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::ports::{ChatMessage, ChatRole, Completion, ToolCall, ToolDefinition};

#[derive(Debug, Serialize)]
pub(super) struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<OutboundMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<OutboundTool<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<&'static str>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub(super) struct OutboundMessage<'a> {
    role: &'static str,
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<OutboundToolCall<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(super) struct OutboundTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: OutboundFunction<'a>,
}

#[derive(Debug, Serialize)]
struct OutboundFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Debug, Serialize)]
struct OutboundToolCall<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    function: OutboundFunctionCall<'a>,
}

#[derive(Debug, Serialize)]
struct OutboundFunctionCall<'a> {
    name: &'a str,
    arguments: &'a str,
}

fn role_name(role: ChatRole) -> &'static str {
    match role {
        ChatRole::System => "system",
        ChatRole::User => "user",
        ChatRole::Assistant => "assistant",
        ChatRole::Tool => "tool",
    }
}

impl<'a> From<&'a ChatMessage> for OutboundMessage<'a> {
    fn from(message: &'a ChatMessage) -> Self {
        Self {
            role: role_name(message.role),
            content: message.content.as_deref(),
            tool_calls: message
                .tool_calls
                .iter()
                .map(|call| OutboundToolCall {
                    id: call.id.as_str(),
                    kind: "function",
                    function: OutboundFunctionCall {
                        name: call.name.as_str(),
                        arguments: call.arguments.as_str(),
                    },
                })
                .collect(),
            tool_call_id: message.tool_call_id.as_deref(),
        }
    }
}

impl<'a> From<&'a ToolDefinition> for OutboundTool<'a> {
    fn from(tool: &'a ToolDefinition) -> Self {
        Self {
            kind: "function",
            function: OutboundFunction {
                name: tool.name.as_str(),
                description: tool.description.as_str(),
                parameters: &tool.parameters,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: InboundMessage,
}

#[derive(Debug, Deserialize)]
struct InboundMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<InboundToolCall>,
}

#[derive(Debug, Deserialize)]
struct InboundToolCall {
    id: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    function: InboundFunctionCall,
}

#[derive(Debug, Deserialize)]
struct InboundFunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

impl ChatCompletionResponse {
    /// First choice as a domain completion; `fallback_model` fills a missing
    /// `model` field.
    pub(super) fn into_completion(self, fallback_model: &str) -> Result<Completion, String> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| "response contained no choices".to_owned())?;
        let tool_calls = choice
            .message
            .tool_calls
            .into_iter()
            .filter(|call| call.kind.as_deref().is_none_or(|kind| kind == "function"))
            .map(|call| ToolCall {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();
        Ok(Completion {
            content: choice.message.content,
            tool_calls,
            model: self.model.unwrap_or_else(|| fallback_model.to_owned()),
        })
    }
}
