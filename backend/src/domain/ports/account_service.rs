//! Driving port for account use-cases.
//!
//! Inbound adapters call this port to register, authenticate, and resolve the
//! session user without importing persistence or hashing adapters.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, Registration, User, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Create an account. Duplicate emails fail with a conflict.
    async fn register(&self, registration: &Registration) -> Result<User, Error>;

    /// Validate credentials, record the login, and return the user.
    async fn login(&self, credentials: &LoginCredentials) -> Result<User, Error>;

    /// Resolve the user behind a session; unknown ids are unauthorised.
    async fn current_user(&self, user_id: &UserId) -> Result<User, Error>;
}
