//! Cookie session access for handlers.
//!
//! The cookie carries only the reader's id. Handlers call
//! [`SessionContext::require_user_id`] and never touch `actix_session`
//! directly; a missing id and an unreadable one both answer 401 with
//! different messages.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";

pub const AUTH_REQUIRED_MESSAGE: &str = "authentication required";
pub const INVALID_SESSION_MESSAGE: &str = "session is invalid or expired";

/// Reader identity stored in the cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionUser {
    Anonymous,
    Reader(UserId),
    /// The cookie decrypted but the stored id does not parse.
    Invalid,
}

#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Bind the session to `user_id`, rotating the cookie so a pre-login
    /// session id cannot be replayed.
    pub fn persist_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(USER_ID_KEY, user_id.to_string())
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Drop everything and expire the cookie.
    pub fn clear(&self) {
        self.0.purge();
    }

    pub fn user(&self) -> Result<SessionUser, Error> {
        let raw = self
            .0
            .get::<String>(USER_ID_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        Ok(match raw {
            None => SessionUser::Anonymous,
            Some(raw) => UserId::new(&raw).map_or_else(
                |error| {
                    warn!(%error, "session cookie holds an unparseable user id");
                    SessionUser::Invalid
                },
                SessionUser::Reader,
            ),
        })
    }

    /// The signed-in reader, or `401 Unauthorized`.
    pub fn require_user_id(&self) -> Result<UserId, Error> {
        match self.user()? {
            SessionUser::Reader(id) => Ok(id),
            SessionUser::Anonymous => Err(Error::unauthorized(AUTH_REQUIRED_MESSAGE)),
            SessionUser::Invalid => Err(Error::unauthorized(INVALID_SESSION_MESSAGE)),
        }
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let session = Session::from_request(req, payload);
        Box::pin(async move { session.await.map(Self::new) })
    }
}
