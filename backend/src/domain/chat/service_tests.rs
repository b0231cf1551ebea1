//! Tests for the chat orchestration loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{TimeZone, Utc};
use mockall::predicate::always;
use rstest::{fixture, rstest};
use tokio::sync::mpsc;

use super::*;
use crate::domain::chat::{BOOKS_SHOWN_PREFIX, MAX_MESSAGE_CHARS};
use crate::domain::ports::{Completion, MockBookSearch, MockChatModel};
use crate::domain::{BookSearchPage, ConversationService, ErrorCode};
use crate::test_support::{InMemoryConversationRepository, MutableClock};

type Conversations = ConversationService<InMemoryConversationRepository>;

#[fixture]
fn conversations() -> Arc<Conversations> {
    let clock = Arc::new(MutableClock::new(
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0)
            .single()
            .expect("valid timestamp"),
    ));
    Arc::new(ConversationService::new(
        Arc::new(InMemoryConversationRepository::default()),
        clock,
    ))
}

fn book(id: &str, title: &str) -> Book {
    Book {
        id: id.to_owned(),
        title: title.to_owned(),
        authors: vec!["Ursula K. Le Guin".to_owned()],
        description: String::new(),
        thumbnail: String::new(),
        published_date: None,
        publisher: None,
        page_count: 0,
        categories: Vec::new(),
        average_rating: 0.0,
        ratings_count: 0,
        language: None,
        preview_link: None,
        info_link: None,
    }
}

fn text(content: &str) -> Completion {
    Completion {
        content: Some(content.to_owned()),
        tool_calls: Vec::new(),
        model: "test-model".to_owned(),
    }
}

fn search_call(id: &str, query: &str) -> Completion {
    Completion {
        content: None,
        tool_calls: vec![ToolCall {
            id: id.to_owned(),
            name: SEARCH_BOOKS.to_owned(),
            arguments: format!("{{\"query\":\"{query}\"}}"),
        }],
        model: "test-model".to_owned(),
    }
}

fn request(user_id: UserId, message: &str, conversation_id: Option<ConversationId>) -> ChatRequest {
    ChatRequest {
        user_id,
        message: message.to_owned(),
        history: Vec::new(),
        conversation_id,
    }
}

fn drain(mut receiver: mpsc::UnboundedReceiver<ChatEvent>) -> Vec<&'static str> {
    let mut names = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        names.push(event.name());
    }
    names
}

#[rstest]
#[tokio::test]
async fn plain_reply_is_returned_without_tools(conversations: Arc<Conversations>) {
    let mut model = MockChatModel::new();
    model
        .expect_complete()
        .withf(|request| {
            request.tools.len() == 2
                && request.messages.last().and_then(|m| m.content.as_deref())
                    == Some("hi &lt;there&gt;")
        })
        .times(1)
        .returning(|_| Ok(text("Hello! What do you like to read?")));
    let service = ChatService::new(Arc::new(model), Arc::new(MockBookSearch::new()), conversations);

    let reply = service
        .chat(request(UserId::random(), "  hi <there> ", None), ChatEventSender::disabled())
        .await
        .expect("chat succeeds");

    assert_eq!(reply.message, "Hello! What do you like to read?");
    assert!(reply.books.is_empty());
    assert!(reply.tool_invocations.is_empty());
    assert_eq!(reply.model, "test-model");
}

#[rstest]
#[tokio::test]
async fn search_tool_results_reach_the_reply_and_events(conversations: Arc<Conversations>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut model = MockChatModel::new();
    let counter = Arc::clone(&calls);
    model.expect_complete().times(2).returning(move |request| {
        match counter.fetch_add(1, Ordering::SeqCst) {
            0 => Ok(search_call("call-1", "earthsea")),
            _ => {
                let tool_turn = request
                    .messages
                    .last()
                    .expect("tool result appended");
                assert_eq!(tool_turn.tool_call_id.as_deref(), Some("call-1"));
                Ok(text("Here are some Earthsea books."))
            }
        }
    });
    let mut books = MockBookSearch::new();
    books
        .expect_search()
        .withf(|query| query.query() == "earthsea")
        .times(1)
        .returning(|_| {
            Ok(BookSearchPage {
                books: vec![book("e1", "A Wizard of Earthsea"), book("e2", "The Tombs of Atuan")],
                total_items: 2,
            })
        });
    let service = ChatService::new(Arc::new(model), Arc::new(books), conversations);
    let (sender, receiver) = mpsc::unbounded_channel();

    let reply = service
        .chat(
            request(UserId::random(), "fantasy by Le Guin", None),
            ChatEventSender::new(sender),
        )
        .await
        .expect("chat succeeds");

    assert_eq!(reply.books.len(), 2);
    assert_eq!(reply.tool_invocations.len(), 1);
    assert!(reply.tool_invocations.iter().all(|call| call.ok));
    assert_eq!(
        drain(receiver),
        vec!["tool_call", "tool_result", "books", "message", "done"]
    );
}

#[rstest]
#[tokio::test]
async fn failing_tool_is_reported_to_the_model(conversations: Arc<Conversations>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut model = MockChatModel::new();
    model.expect_complete().times(2).returning(move |request| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            return Ok(search_call("call-1", "anything"));
        }
        let payload = request
            .messages
            .last()
            .and_then(|m| m.content.clone())
            .expect("tool payload");
        assert!(payload.contains("\"success\":false"));
        Ok(text("The catalogue is unavailable right now."))
    });
    let mut books = MockBookSearch::new();
    books
        .expect_search()
        .returning(|_| Err(Error::service_unavailable("catalogue down")));
    let service = ChatService::new(Arc::new(model), Arc::new(books), conversations);

    let reply = service
        .chat(request(UserId::random(), "anything", None), ChatEventSender::disabled())
        .await
        .expect("chat succeeds");

    assert!(reply.books.is_empty());
    assert_eq!(reply.tool_invocations.first().map(|call| call.ok), Some(false));
}

#[rstest]
#[tokio::test]
async fn tool_loop_stops_after_the_step_limit(conversations: Arc<Conversations>) {
    let mut model = MockChatModel::new();
    model
        .expect_complete()
        .with(always())
        .times(MAX_TOOL_STEPS + 1)
        .returning(|request| {
            if request.tools.is_empty() {
                Ok(text("Final answer."))
            } else {
                Ok(search_call("loop", "again"))
            }
        });
    let mut books = MockBookSearch::new();
    books.expect_search().times(MAX_TOOL_STEPS).returning(|_| {
        Ok(BookSearchPage {
            books: Vec::new(),
            total_items: 0,
        })
    });
    let service = ChatService::new(Arc::new(model), Arc::new(books), conversations);

    let reply = service
        .chat(request(UserId::random(), "loop", None), ChatEventSender::disabled())
        .await
        .expect("chat succeeds");

    assert_eq!(reply.message, "Final answer.");
    assert_eq!(reply.tool_invocations.len(), MAX_TOOL_STEPS);
}

#[rstest]
#[tokio::test]
async fn empty_model_reply_uses_fallback(conversations: Arc<Conversations>) {
    let mut model = MockChatModel::new();
    model.expect_complete().returning(|_| Ok(text("   ")));
    let service = ChatService::new(Arc::new(model), Arc::new(MockBookSearch::new()), conversations);

    let reply = service
        .chat(request(UserId::random(), "hello", None), ChatEventSender::disabled())
        .await
        .expect("chat succeeds");

    assert_eq!(reply.message, NO_REPLY_FALLBACK);
}

#[rstest]
#[tokio::test]
async fn blank_message_is_rejected(conversations: Arc<Conversations>) {
    let service = ChatService::new(
        Arc::new(MockChatModel::new()),
        Arc::new(MockBookSearch::new()),
        conversations,
    );

    let err = service
        .chat(request(UserId::random(), "   ", None), ChatEventSender::disabled())
        .await
        .expect_err("blank message rejected");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[case(ChatModelError::timeout("slow"), ErrorCode::GatewayTimeout)]
#[case(ChatModelError::unauthorized("bad key"), ErrorCode::UpstreamError)]
#[case(ChatModelError::rate_limited("slow down"), ErrorCode::RateLimited)]
#[case(ChatModelError::transport("reset"), ErrorCode::UpstreamError)]
#[tokio::test]
async fn model_errors_map_to_client_codes(
    conversations: Arc<Conversations>,
    #[case] failure: ChatModelError,
    #[case] expected: ErrorCode,
) {
    let mut model = MockChatModel::new();
    model
        .expect_complete()
        .return_once(move |_| Err(failure));
    let service = ChatService::new(Arc::new(model), Arc::new(MockBookSearch::new()), conversations);

    let err = service
        .chat(request(UserId::random(), "hello", None), ChatEventSender::disabled())
        .await
        .expect_err("model failure surfaces");

    assert_eq!(err.code(), expected);
}

#[rstest]
#[tokio::test]
async fn conversation_turns_are_persisted_and_replayed(conversations: Arc<Conversations>) {
    let owner = UserId::random();
    let conversation = conversations
        .create(&owner, None, None)
        .await
        .expect("create conversation");

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mut model = MockChatModel::new();
    model.expect_complete().returning(move |request| {
        match counter.fetch_add(1, Ordering::SeqCst) {
            0 => Ok(search_call("c1", "earthsea")),
            1 => Ok(text("Two classics.")),
            _ => {
                // Second turn: system, replayed user, replayed assistant, new user.
                assert_eq!(request.messages.len(), 4);
                let replayed = request
                    .messages
                    .get(2)
                    .and_then(|m| m.content.clone())
                    .expect("assistant turn replayed");
                assert!(replayed.contains(BOOKS_SHOWN_PREFIX));
                assert!(replayed.contains("bookId: e2"));
                Ok(text("The second one is The Tombs of Atuan."))
            }
        }
    });
    let mut books = MockBookSearch::new();
    books.expect_search().returning(|_| {
        Ok(BookSearchPage {
            books: vec![book("e1", "A Wizard of Earthsea"), book("e2", "The Tombs of Atuan")],
            total_items: 2,
        })
    });
    let service = ChatService::new(Arc::new(model), Arc::new(books), Arc::clone(&conversations));

    service
        .chat(
            request(owner, "earthsea books", Some(conversation.id)),
            ChatEventSender::disabled(),
        )
        .await
        .expect("first turn");
    let stored = conversations
        .messages(&owner, &conversation.id)
        .await
        .expect("messages");
    assert_eq!(stored.len(), 2);
    assert_eq!(stored.get(1).map(|m| m.books.len()), Some(2));

    let reply = service
        .chat(
            request(owner, "tell me about the second one", Some(conversation.id)),
            ChatEventSender::disabled(),
        )
        .await
        .expect("second turn");
    assert_eq!(reply.conversation_id, Some(conversation.id));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[rstest]
#[tokio::test]
async fn foreign_conversation_is_not_found(conversations: Arc<Conversations>) {
    let conversation = conversations
        .create(&UserId::random(), None, None)
        .await
        .expect("create conversation");
    let service = ChatService::new(
        Arc::new(MockChatModel::new()),
        Arc::new(MockBookSearch::new()),
        conversations,
    );

    let err = service
        .chat(
            request(UserId::random(), "hello", Some(conversation.id)),
            ChatEventSender::disabled(),
        )
        .await
        .expect_err("not the owner");

    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn prepare_checks_ownership_without_storing_anything(conversations: Arc<Conversations>) {
    let owner = UserId::random();
    let conversation = conversations
        .create(&owner, None, None)
        .await
        .expect("create conversation");
    let service = ChatService::new(
        Arc::new(MockChatModel::new()),
        Arc::new(MockBookSearch::new()),
        Arc::clone(&conversations),
    );
    let long = format!("  {} ", "'".repeat(MAX_MESSAGE_CHARS));

    let turn = service
        .prepare(request(owner, &long, Some(conversation.id)))
        .await
        .expect("owner may chat");

    assert_eq!(turn.display_text.chars().count(), MAX_MESSAGE_CHARS);
    assert_eq!(turn.model_text.chars().count(), MAX_MESSAGE_CHARS);
    assert!(turn.model_text.starts_with("&#x27;"));
    let stored = conversations
        .messages(&owner, &conversation.id)
        .await
        .expect("messages");
    assert!(stored.is_empty());
}
