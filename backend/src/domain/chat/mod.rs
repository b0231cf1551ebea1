//! Chat orchestration between the reader, the language model, and the book
//! catalogue.
//!
//! A chat turn sanitises the input, rebuilds history (from the request or
//! from the stored conversation), then loops over model completions while the
//! model keeps asking for tools. Tool results go back to the model; the last
//! search's book cards go back to the reader with the final reply.

mod history;
mod prompt;
mod sanitize;
mod service;
mod tools;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;
use utoipa::ToSchema;

use crate::domain::{Book, ConversationId, UserId};

pub use history::{history_from_messages, BOOKS_SHOWN_PREFIX};
pub use prompt::SYSTEM_PROMPT;
pub use sanitize::{
    HISTORY_LIMIT, MAX_MESSAGE_CHARS, escape_html, normalize_text, sanitize_history,
    sanitize_text,
};
pub use service::{ChatService, MAX_TOOL_STEPS, NO_REPLY_FALLBACK, map_model_error};
pub use tools::{GET_BOOK_DETAILS, SEARCH_BOOKS, tool_definitions};

/// One prior turn supplied by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTurn {
    pub role: String,
    pub content: String,
}

/// Input of one chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub user_id: UserId,
    pub message: String,
    pub history: Vec<HistoryTurn>,
    pub conversation_id: Option<ConversationId>,
}

/// A chat turn that passed validation and ownership checks.
///
/// `display_text` is what gets stored; `model_text` is the escaped copy sent
/// to the model. `history` is already resolved against the stored
/// conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedTurn {
    pub user_id: UserId,
    pub display_text: String,
    pub model_text: String,
    pub history: Vec<HistoryTurn>,
    pub conversation_id: Option<ConversationId>,
}

/// Record of a tool the model invoked during the turn.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvocation {
    pub tool: String,
    pub arguments: Value,
    pub ok: bool,
}

/// Output of one chat turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatReply {
    pub message: String,
    pub books: Vec<Book>,
    pub tool_invocations: Vec<ToolInvocation>,
    pub conversation_id: Option<ConversationId>,
    pub model: String,
}

/// Progress notifications emitted while a turn runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    ToolCall { tool: String, arguments: Value },
    ToolResult { tool: String, ok: bool },
    Books { books: Vec<Book> },
    Message { content: String },
    Done {
        #[serde(rename = "conversationId", skip_serializing_if = "Option::is_none")]
        conversation_id: Option<ConversationId>,
        model: String,
    },
    Error { code: String, message: String },
}

impl ChatEvent {
    /// Server-sent event name for the variant.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Books { .. } => "books",
            Self::Message { .. } => "message",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }
}

/// Optional sink for [`ChatEvent`]s.
///
/// The JSON endpoint passes [`ChatEventSender::disabled`]; the streaming
/// endpoint forwards events to the response body.
#[derive(Debug, Clone, Default)]
pub struct ChatEventSender(Option<UnboundedSender<ChatEvent>>);

impl ChatEventSender {
    pub fn new(sender: UnboundedSender<ChatEvent>) -> Self {
        Self(Some(sender))
    }

    pub fn disabled() -> Self {
        Self(None)
    }

    /// Send an event; a closed receiver (client gone) is not an error.
    pub fn emit(&self, event: ChatEvent) {
        if let Some(sender) = &self.0 {
            if sender.send(event).is_err() {
                debug!("chat event receiver dropped");
            }
        }
    }
}
