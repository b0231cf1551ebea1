//! In-process application world shared by the behaviour suites.
//!
//! Real domain services run over the in-memory repositories from
//! `bookchat::test_support`. The chat model and book catalogue are
//! scripted, so no scenario touches the network or PostgreSQL.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use actix_session::config::CookieContentSecurity;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::Method;
use actix_web::rt::System;
use actix_web::{App, test, web};
use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use serde_json::Value;

use bookchat::Trace;
use bookchat::domain::chat::ChatService;
use bookchat::domain::ports::{
    BookCatalogue, BookCatalogueError, ChatModel, ChatModelError, Completion, CompletionRequest,
    ToolCall,
};
use bookchat::domain::{
    Book, BookDetails, BookId, BookSearchPage, BookSearchQuery, BookSearchService,
    ConversationService, ReadingListService, RecommendationService, UserAccountService,
};
use bookchat::inbound::http::{auth, books, chat, conversations, reading_list, reading_stats};
use bookchat::inbound::http::error::{json_error_handler, query_error_handler};
use bookchat::inbound::http::state::{HttpState, HttpStatePorts};
use bookchat::test_support::{
    InMemoryConversationRepository, InMemoryReadingListRepository,
    InMemoryRecommendationRepository, InMemoryUserRepository, PlaintextPasswordHasher,
};

pub const READER_PASSWORD: &str = "Secret123";
pub const MODEL_NAME: &str = "scripted-model";

/// Model that replays queued completions, then answers with a fixed line.
#[derive(Default)]
pub struct ScriptedModel {
    queue: Mutex<VecDeque<Completion>>,
}

impl ScriptedModel {
    pub fn push_tool_call(&self, name: &str, arguments: Value) {
        self.push(Completion {
            content: None,
            tool_calls: vec![ToolCall {
                id: format!("call-{name}"),
                name: name.to_owned(),
                arguments: arguments.to_string(),
            }],
            model: MODEL_NAME.to_owned(),
        });
    }

    pub fn push_reply(&self, text: &str) {
        self.push(Completion {
            content: Some(text.to_owned()),
            tool_calls: Vec::new(),
            model: MODEL_NAME.to_owned(),
        });
    }

    fn push(&self, completion: Completion) {
        self.queue
            .lock()
            .expect("model queue lock")
            .push_back(completion);
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn complete(&self, _request: &CompletionRequest) -> Result<Completion, ChatModelError> {
        let next = self.queue.lock().expect("model queue lock").pop_front();
        Ok(next.unwrap_or_else(|| Completion {
            content: Some("Happy reading!".to_owned()),
            tool_calls: Vec::new(),
            model: MODEL_NAME.to_owned(),
        }))
    }
}

/// Catalogue answering every search with the same single volume.
pub struct FixedCatalogue;

pub fn catalogue_book() -> Book {
    Book {
        id: "zyTCAlFPjgYC".to_owned(),
        title: "Dune".to_owned(),
        authors: vec!["Frank Herbert".to_owned()],
        description: "Desert planet politics.".to_owned(),
        thumbnail: String::new(),
        published_date: Some("1965".to_owned()),
        publisher: None,
        page_count: 412,
        categories: vec!["Fiction".to_owned()],
        average_rating: 4.5,
        ratings_count: 120,
        language: Some("en".to_owned()),
        preview_link: None,
        info_link: None,
    }
}

#[async_trait]
impl BookCatalogue for FixedCatalogue {
    async fn search(&self, _query: &BookSearchQuery) -> Result<BookSearchPage, BookCatalogueError> {
        Ok(BookSearchPage {
            books: vec![catalogue_book()],
            total_items: 1,
        })
    }

    async fn details(&self, _id: &BookId) -> Result<Option<BookDetails>, BookCatalogueError> {
        Ok(None)
    }
}

fn build_app(
    state: web::Data<HttpState>,
    key: Key,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .cookie_content_security(CookieContentSecurity::Private)
        .build();
    App::new()
        .app_data(state)
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .wrap(Trace)
        .service(
            web::scope("/api/v1")
                .wrap(session)
                .service(auth::register)
                .service(auth::login)
                .service(auth::logout)
                .service(auth::me)
                .service(books::search_books)
                .service(chat::chat)
                .service(chat::chat_stream)
                .service(conversations::create_conversation)
                .service(conversations::list_conversations)
                .service(conversations::list_messages)
                .service(conversations::save_message)
                .service(reading_list::list_reading_list)
                .service(reading_list::add_to_reading_list)
                .service(reading_list::remove_from_reading_list)
                .service(reading_list::mark_as_read)
                .service(reading_stats::reading_stats),
        )
}

/// Last response captured by [`AppWorld::send`].
#[derive(Debug, Default, Clone)]
pub struct Captured {
    pub status: u16,
    pub body: Value,
}

pub struct AppWorld {
    key: Key,
    state: web::Data<HttpState>,
    pub model: Arc<ScriptedModel>,
    cookie: RefCell<Option<Cookie<'static>>>,
    last: RefCell<Option<Captured>>,
    pub conversation_id: RefCell<Option<String>>,
}

impl AppWorld {
    pub fn new() -> Self {
        let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
        let model = Arc::new(ScriptedModel::default());
        let books = Arc::new(BookSearchService::new(Arc::new(FixedCatalogue)));
        let conversations = Arc::new(ConversationService::new(
            Arc::new(InMemoryConversationRepository::default()),
            clock.clone(),
        ));
        let chat = Arc::new(ChatService::new(
            model.clone(),
            books.clone(),
            conversations.clone(),
        ));
        let reading_list = Arc::new(ReadingListService::new(
            Arc::new(InMemoryReadingListRepository::default()),
            clock.clone(),
        ));
        let recommendations = Arc::new(RecommendationService::new(
            Arc::new(InMemoryRecommendationRepository::default()),
            clock.clone(),
        ));
        let accounts = Arc::new(UserAccountService::new(
            Arc::new(InMemoryUserRepository::default()),
            Arc::new(PlaintextPasswordHasher),
            clock,
        ));
        let state = web::Data::new(HttpState::new(HttpStatePorts {
            accounts,
            books,
            chat,
            conversations,
            reading_list: reading_list.clone(),
            reading_stats: reading_list,
            recommendations,
        }));
        Self {
            key: Key::generate(),
            state,
            model,
            cookie: RefCell::new(None),
            last: RefCell::new(None),
            conversation_id: RefCell::new(None),
        }
    }

    /// Issue one request against a fresh app instance sharing this world's
    /// state and session key.
    pub fn send(&self, method: Method, path: &str, payload: Option<Value>) -> Captured {
        let state = self.state.clone();
        let key = self.key.clone();
        let cookie = self.cookie.borrow().clone();
        let path = path.to_owned();
        let (captured, set_cookie) = System::new().block_on(async move {
            let app = test::init_service(build_app(state, key)).await;
            let mut request = test::TestRequest::default().method(method).uri(&path);
            if let Some(cookie) = cookie {
                request = request.cookie(cookie);
            }
            if let Some(payload) = payload {
                request = request.set_json(payload);
            }
            let response = test::call_service(&app, request.to_request()).await;
            let status = response.status().as_u16();
            let set_cookie = response
                .response()
                .cookies()
                .find(|cookie| cookie.name() == "session")
                .map(Cookie::into_owned);
            let bytes = test::read_body(response).await;
            let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (Captured { status, body }, set_cookie)
        });

        if let Some(cookie) = set_cookie {
            *self.cookie.borrow_mut() = (!cookie.value().is_empty()).then_some(cookie);
        }
        *self.last.borrow_mut() = Some(captured.clone());
        captured
    }

    pub fn get(&self, path: &str) -> Captured {
        self.send(Method::GET, path, None)
    }

    pub fn post(&self, path: &str, payload: Value) -> Captured {
        self.send(Method::POST, path, Some(payload))
    }

    pub fn last(&self) -> Captured {
        self.last.borrow().clone().expect("a request was sent")
    }

    pub fn register(&self, email: &str) -> Captured {
        self.post(
            "/api/v1/auth/register",
            serde_json::json!({ "email": email, "password": READER_PASSWORD, "name": "Ada" }),
        )
    }

    pub fn login(&self, email: &str, password: &str) -> Captured {
        self.post(
            "/api/v1/auth/login",
            serde_json::json!({ "email": email, "password": password }),
        )
    }

    /// Register and sign in a reader, asserting both succeed.
    pub fn sign_in(&self, email: &str) {
        assert_eq!(self.register(email).status, 201, "registration");
        assert_eq!(self.login(email, READER_PASSWORD).status, 200, "login");
    }

    pub fn conversation_path(&self, suffix: &str) -> String {
        let id = self
            .conversation_id
            .borrow()
            .clone()
            .expect("conversation started");
        format!("/api/v1/conversations/{id}{suffix}")
    }
}
