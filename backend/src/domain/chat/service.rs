//! Chat orchestration service.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::history::history_from_messages;
use super::sanitize::{normalize_text, sanitize_history, sanitize_text};
use super::tools::{
    GET_BOOK_DETAILS, GetBookDetailsArgs, SEARCH_BOOKS, SearchBooksArgs, details_payload,
    error_payload, parse_arguments, search_payload, tool_definitions,
};
use super::{
    ChatEvent, ChatEventSender, ChatReply, ChatRequest, HistoryTurn, PreparedTurn, ToolInvocation,
};
use crate::domain::ports::{
    BookSearch, ChatCommand, ChatMessage, ChatModel, ChatModelError, CompletionRequest,
    ConversationsCommand, ToolCall,
};
use crate::domain::{
    Book, BookId, BookSearchQuery, ConversationId, Error, MessageRole, NewMessage, UserId,
};

/// Tool rounds allowed before the model must answer in text.
pub const MAX_TOOL_STEPS: usize = 5;
/// Reply used when the model returns no text at all.
pub const NO_REPLY_FALLBACK: &str = "Sorry, I couldn't come up with a reply. Please try again.";

/// Translate model failures into client-facing errors.
///
/// A rejected provider key is a server misconfiguration, so it surfaces as an
/// upstream error rather than asking the reader to log in again.
pub fn map_model_error(error: ChatModelError) -> Error {
    match error {
        ChatModelError::Timeout { .. } => {
            Error::gateway_timeout("the assistant took too long to respond; please try again")
        }
        ChatModelError::Unauthorized { message } => {
            error!(%message, "chat model rejected the configured credentials");
            Error::upstream("the assistant is not available right now")
        }
        ChatModelError::RateLimited { .. } => {
            Error::rate_limited("too many requests; please wait a moment")
        }
        ChatModelError::Upstream { .. }
        | ChatModelError::Transport { .. }
        | ChatModelError::Decode { .. } => {
            Error::upstream("the assistant could not process your message")
        }
    }
}

struct ToolOutcome {
    payload: Value,
    ok: bool,
    books: Option<Vec<Book>>,
}

impl ToolOutcome {
    fn failed(message: &str) -> Self {
        Self {
            payload: error_payload(message),
            ok: false,
            books: None,
        }
    }
}

/// Chat service orchestrating the model, catalogue, and conversation store.
#[derive(Clone)]
pub struct ChatService<M, B, C> {
    model: Arc<M>,
    books: Arc<B>,
    conversations: Arc<C>,
}

impl<M, B, C> ChatService<M, B, C> {
    pub fn new(model: Arc<M>, books: Arc<B>, conversations: Arc<C>) -> Self {
        Self {
            model,
            books,
            conversations,
        }
    }
}

impl<M, B, C> ChatService<M, B, C>
where
    M: ChatModel,
    B: BookSearch,
    C: ConversationsCommand,
{
    /// History for the model: the client's turns, or the stored conversation
    /// when the client sent none.
    async fn resolve_history(
        &self,
        user_id: &UserId,
        conversation_id: Option<&ConversationId>,
        supplied: Vec<HistoryTurn>,
    ) -> Result<Vec<HistoryTurn>, Error> {
        let Some(conversation_id) = conversation_id else {
            return Ok(supplied);
        };
        // Also the ownership check for the persistence that follows.
        let stored = self.conversations.messages(user_id, conversation_id).await?;
        if supplied.is_empty() {
            debug!(%conversation_id, turns = stored.len(), "history rebuilt from store");
            Ok(history_from_messages(&stored))
        } else {
            Ok(supplied)
        }
    }

    async fn persist(
        &self,
        user_id: &UserId,
        conversation_id: &ConversationId,
        message: NewMessage,
    ) -> Result<(), Error> {
        let saved = self
            .conversations
            .save_message(user_id, conversation_id, message)
            .await?;
        if saved.is_duplicate() {
            debug!(%conversation_id, "chat message already stored");
        }
        Ok(())
    }

    async fn run_tool(&self, call: &ToolCall, arguments: &Value) -> ToolOutcome {
        match call.name.as_str() {
            SEARCH_BOOKS => self.search_books(arguments).await,
            GET_BOOK_DETAILS => self.book_details(arguments).await,
            other => {
                warn!(tool = other, "model requested an unknown tool");
                ToolOutcome::failed(&format!("unknown tool {other}"))
            }
        }
    }

    async fn search_books(&self, arguments: &Value) -> ToolOutcome {
        let args: SearchBooksArgs = match serde_json::from_value(arguments.clone()) {
            Ok(args) => args,
            Err(err) => return ToolOutcome::failed(&format!("invalid arguments: {err}")),
        };
        let query = match BookSearchQuery::try_new(
            &args.query,
            args.max_results,
            args.order_by.as_deref(),
            None,
        ) {
            Ok(query) => query,
            Err(err) => return ToolOutcome::failed(&err.to_string()),
        };
        match self.books.search(&query).await {
            Ok(page) => ToolOutcome {
                payload: search_payload(query.query(), &page),
                ok: true,
                books: Some(page.books),
            },
            Err(err) => ToolOutcome::failed(err.message()),
        }
    }

    async fn book_details(&self, arguments: &Value) -> ToolOutcome {
        let args: GetBookDetailsArgs = match serde_json::from_value(arguments.clone()) {
            Ok(args) => args,
            Err(err) => return ToolOutcome::failed(&format!("invalid arguments: {err}")),
        };
        let id = match BookId::new(&args.book_id) {
            Ok(id) => id,
            Err(err) => return ToolOutcome::failed(&err.to_string()),
        };
        match self.books.details(&id).await {
            Ok(details) => ToolOutcome {
                payload: details_payload(&details),
                ok: true,
                books: None,
            },
            Err(err) => ToolOutcome::failed(err.message()),
        }
    }
}

#[async_trait]
impl<M, B, C> ChatCommand for ChatService<M, B, C>
where
    M: ChatModel,
    B: BookSearch,
    C: ConversationsCommand,
{
    async fn prepare(&self, request: ChatRequest) -> Result<PreparedTurn, Error> {
        let ChatRequest {
            user_id,
            message,
            history,
            conversation_id,
        } = request;

        let display_text = normalize_text(&message);
        if display_text.is_empty() {
            return Err(Error::invalid_request("message must not be empty"));
        }
        let history = self
            .resolve_history(&user_id, conversation_id.as_ref(), history)
            .await?;
        Ok(PreparedTurn {
            user_id,
            model_text: sanitize_text(&message),
            display_text,
            history,
            conversation_id,
        })
    }

    async fn run(&self, turn: PreparedTurn, events: ChatEventSender) -> Result<ChatReply, Error> {
        let PreparedTurn {
            user_id,
            display_text,
            model_text,
            history,
            conversation_id,
        } = turn;

        if let Some(id) = &conversation_id {
            self.persist(
                &user_id,
                id,
                NewMessage::from_parts(MessageRole::User, display_text, Vec::new()),
            )
            .await?;
        }

        let mut messages = vec![ChatMessage::system(super::SYSTEM_PROMPT)];
        messages.extend(
            sanitize_history(&history)
                .into_iter()
                .map(|(role, content)| match role {
                    MessageRole::User => ChatMessage::user(content),
                    MessageRole::Assistant => ChatMessage::assistant(content),
                }),
        );
        messages.push(ChatMessage::user(model_text));

        let mut invocations = Vec::new();
        let mut books = Vec::new();
        let mut model = String::new();
        let mut reply = None;

        for step in 0..=MAX_TOOL_STEPS {
            let offer_tools = step < MAX_TOOL_STEPS;
            let completion = self
                .model
                .complete(&CompletionRequest {
                    messages: messages.clone(),
                    tools: if offer_tools {
                        tool_definitions()
                    } else {
                        Vec::new()
                    },
                })
                .await
                .map_err(|err| {
                    error!(error = %err, step, "chat completion failed");
                    map_model_error(err)
                })?;
            model = completion.model;

            if completion.tool_calls.is_empty() || !offer_tools {
                reply = completion.content;
                break;
            }

            messages.push(ChatMessage::tool_request(
                completion.content,
                completion.tool_calls.clone(),
            ));
            for call in &completion.tool_calls {
                let arguments = parse_arguments(&call.arguments);
                events.emit(ChatEvent::ToolCall {
                    tool: call.name.clone(),
                    arguments: arguments.clone(),
                });
                let outcome = self.run_tool(call, &arguments).await;
                info!(tool = %call.name, ok = outcome.ok, step, "tool executed");
                events.emit(ChatEvent::ToolResult {
                    tool: call.name.clone(),
                    ok: outcome.ok,
                });
                if let Some(found) = outcome.books {
                    books = found;
                }
                invocations.push(ToolInvocation {
                    tool: call.name.clone(),
                    arguments,
                    ok: outcome.ok,
                });
                messages.push(ChatMessage::tool_result(
                    call.id.clone(),
                    outcome.payload.to_string(),
                ));
            }
        }

        let reply = reply
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| NO_REPLY_FALLBACK.to_owned());

        if let Some(id) = &conversation_id {
            self.persist(
                &user_id,
                id,
                NewMessage::from_parts(MessageRole::Assistant, reply.clone(), books.clone()),
            )
            .await?;
        }

        if !books.is_empty() {
            events.emit(ChatEvent::Books {
                books: books.clone(),
            });
        }
        events.emit(ChatEvent::Message {
            content: reply.clone(),
        });
        events.emit(ChatEvent::Done {
            conversation_id,
            model: model.clone(),
        });

        Ok(ChatReply {
            message: reply,
            books,
            tool_invocations: invocations,
            conversation_id,
            model,
        })
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
