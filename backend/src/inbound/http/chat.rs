//! Chat HTTP handlers.
//!
//! ```text
//! POST /api/v1/chat {"message":"something like Dune","history":[],"conversationId":null}
//! POST /api/v1/chat/stream  (same body, answered with text/event-stream)
//! ```
//!
//! The streaming variant runs the orchestration on a spawned local task and
//! forwards [`ChatEvent`]s through a channel into the response body.

use std::convert::Infallible;

use actix_web::http::header;
use actix_web::web::Bytes;
use actix_web::{HttpResponse, post, web};
use futures_util::stream;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::domain::chat::{
    ChatEvent, ChatEventSender, ChatReply, ChatRequest, HistoryTurn, ToolInvocation,
};
use crate::domain::{Book, Error, TraceId, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::redact_if_internal;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, missing_field_error, parse_conversation_id};

/// One prior turn. Entries with an unknown role or no content are dropped.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct HistoryEntry {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequestBody {
    pub message: Option<String>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub message: String,
    pub books: Vec<Book>,
    pub tool_invocations: Vec<ToolInvocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub model: String,
}

impl From<ChatReply> for ChatResponse {
    fn from(reply: ChatReply) -> Self {
        Self {
            message: reply.message,
            books: reply.books,
            tool_invocations: reply.tool_invocations,
            conversation_id: reply.conversation_id.map(|id| id.to_string()),
            model: reply.model,
        }
    }
}

fn parse_chat_request(user_id: UserId, body: ChatRequestBody) -> Result<ChatRequest, Error> {
    let message = body
        .message
        .ok_or_else(|| missing_field_error(FieldName::new("message")))?;
    let conversation_id = body
        .conversation_id
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| parse_conversation_id(raw.trim()))
        .transpose()?;
    Ok(ChatRequest {
        user_id,
        message,
        history: body
            .history
            .into_iter()
            .map(|entry| HistoryTurn {
                role: entry.role,
                content: entry.content,
            })
            .collect(),
        conversation_id,
    })
}

/// Run one chat turn and answer with the assistant's reply.
#[utoipa::path(
    post,
    path = "/api/v1/chat",
    request_body = ChatRequestBody,
    responses(
        (status = 200, description = "Assistant reply", body = ChatResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown conversation", body = Error),
        (status = 429, description = "Assistant rate limited", body = Error),
        (status = 502, description = "Assistant unavailable", body = Error),
        (status = 504, description = "Assistant timed out", body = Error)
    ),
    tags = ["chat"],
    operation_id = "chat"
)]
#[post("/chat")]
pub async fn chat(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ChatRequestBody>,
) -> ApiResult<web::Json<ChatResponse>> {
    let user_id = session.require_user_id()?;
    let request = parse_chat_request(user_id, payload.into_inner())?;
    let reply = state
        .chat
        .chat(request, ChatEventSender::disabled())
        .await?;
    Ok(web::Json(ChatResponse::from(reply)))
}

/// Format one server-sent event frame.
fn sse_frame(event: &ChatEvent) -> Bytes {
    match serde_json::to_string(event) {
        Ok(data) => Bytes::from(format!("event: {}\ndata: {data}\n\n", event.name())),
        Err(err) => {
            error!(error = %err, event = event.name(), "failed to encode chat event");
            Bytes::from_static(b"event: error\ndata: {\"type\":\"error\",\"code\":\"internal_error\",\"message\":\"Internal server error\"}\n\n")
        }
    }
}

fn error_event(error: &Error) -> ChatEvent {
    let visible = redact_if_internal(error);
    ChatEvent::Error {
        code: visible.code().as_str().to_owned(),
        message: visible.message().to_owned(),
    }
}

/// Run one chat turn, streaming progress as server-sent events.
///
/// Validation, authentication, and conversation ownership failures are
/// answered with a JSON error before the stream opens. Failures during the
/// turn arrive as an `error` event that ends the stream.
#[utoipa::path(
    post,
    path = "/api/v1/chat/stream",
    request_body = ChatRequestBody,
    responses(
        (status = 200, description = "Event stream of tool_call, tool_result, books, message, done, or error events", content_type = "text/event-stream", body = String),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown conversation", body = Error)
    ),
    tags = ["chat"],
    operation_id = "chatStream"
)]
#[post("/chat/stream")]
pub async fn chat_stream(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ChatRequestBody>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let request = parse_chat_request(user_id, payload.into_inner())?;
    let turn = state.chat.prepare(request).await?;

    let (sender, receiver) = mpsc::unbounded_channel();
    let command = state.chat.clone();
    let trace_id = TraceId::current().unwrap_or_else(TraceId::generate);
    actix_web::rt::spawn(TraceId::scope(trace_id, async move {
        let events = ChatEventSender::new(sender.clone());
        if let Err(err) = command.run(turn, events).await {
            warn!(code = err.code().as_str(), error = %err, "streamed chat turn failed");
            if sender.send(error_event(&err)).is_err() {
                warn!("chat stream closed before the error was delivered");
            }
        }
    }));

    let body = stream::unfold(receiver, |mut receiver| async move {
        receiver
            .recv()
            .await
            .map(|event| (Ok::<_, Infallible>(sse_frame(&event)), receiver))
    });

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .insert_header(("X-Accel-Buffering", "no"))
        .streaming(body))
}
