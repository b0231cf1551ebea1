//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{HttpResponse, test as actix_test, web};

use crate::domain::UserId;
use crate::domain::ports::{
    MockAccountService, MockBookSearch, MockChatCommand, MockConversationsCommand,
    MockReadingListCommand, MockReadingStatsQuery, MockRecommendationsCommand,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::{HttpState, HttpStatePorts};

/// Fixed user id persisted by [`login_route`].
pub const TEST_USER_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";
/// Path of the helper route that logs [`TEST_USER_ID`] in.
pub const TEST_LOGIN_PATH: &str = "/__test/login";

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

pub fn test_user_id() -> UserId {
    UserId::new(TEST_USER_ID).expect("fixture user id")
}

/// Route that stores [`TEST_USER_ID`] in the session.
pub fn login_route(cfg: &mut web::ServiceConfig) {
    cfg.route(
        TEST_LOGIN_PATH,
        web::get().to(|session: SessionContext| async move {
            session.persist_user(&test_user_id())?;
            Ok::<_, crate::domain::Error>(HttpResponse::Ok().finish())
        }),
    );
}

/// Call [`TEST_LOGIN_PATH`] and return the session cookie it sets.
pub async fn session_cookie<S, B>(app: &S) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
{
    let response =
        actix_test::call_service(app, actix_test::TestRequest::get().uri(TEST_LOGIN_PATH).to_request()).await;
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
        .expect("session cookie set")
}

/// Mock driving ports; tests set expectations on the ports they exercise.
#[derive(Default)]
pub struct MockPorts {
    pub accounts: MockAccountService,
    pub books: MockBookSearch,
    pub chat: MockChatCommand,
    pub conversations: MockConversationsCommand,
    pub reading_list: MockReadingListCommand,
    pub reading_stats: MockReadingStatsQuery,
    pub recommendations: MockRecommendationsCommand,
}

impl MockPorts {
    pub fn into_state(self) -> web::Data<HttpState> {
        web::Data::new(HttpState::new(HttpStatePorts {
            accounts: Arc::new(self.accounts),
            books: Arc::new(self.books),
            chat: Arc::new(self.chat),
            conversations: Arc::new(self.conversations),
            reading_list: Arc::new(self.reading_list),
            reading_stats: Arc::new(self.reading_stats),
            recommendations: Arc::new(self.recommendations),
        }))
    }
}
