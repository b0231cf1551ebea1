//! Account services: registration, login, and session user resolution.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{
    AccountService, PasswordHashError, PasswordHasher, UserPersistenceError, UserRepository,
};
use crate::domain::{Error, LoginCredentials, Registration, StoredUser, User, UserId};

/// Message shared by every credential failure so callers cannot test for
/// registered emails.
pub const INVALID_CREDENTIALS: &str = "invalid credentials";

fn map_repository_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::DuplicateEmail { .. } => {
            Error::conflict("an account with this email already exists")
        }
    }
}

fn map_hash_error(error: PasswordHashError) -> Error {
    Error::internal(error.to_string())
}

/// Account service backed by a user repository and a password hasher.
#[derive(Clone)]
pub struct UserAccountService<R, H> {
    users: Arc<R>,
    hasher: Arc<H>,
    clock: Arc<dyn Clock>,
}

impl<R, H> UserAccountService<R, H> {
    pub fn new(users: Arc<R>, hasher: Arc<H>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            hasher,
            clock,
        }
    }
}

#[async_trait]
impl<R, H> AccountService for UserAccountService<R, H>
where
    R: UserRepository,
    H: PasswordHasher,
{
    async fn register(&self, registration: &Registration) -> Result<User, Error> {
        let password_hash = self
            .hasher
            .hash(registration.password())
            .map_err(map_hash_error)?;
        let stored = StoredUser {
            user: User {
                id: UserId::random(),
                email: registration.email().clone(),
                name: registration.name().clone(),
                created_at: self.clock.utc(),
                last_login: None,
            },
            password_hash,
        };
        self.users
            .create(&stored)
            .await
            .map_err(map_repository_error)?;
        info!(user_id = %stored.user.id, "account registered");
        Ok(stored.user)
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<User, Error> {
        let Some(stored) = self
            .users
            .find_by_email(credentials.email())
            .await
            .map_err(map_repository_error)?
        else {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };

        let verified = match self
            .hasher
            .verify(credentials.password(), &stored.password_hash)
        {
            Ok(verified) => verified,
            Err(error @ PasswordHashError::MalformedHash { .. }) => {
                warn!(user_id = %stored.user.id, %error, "stored password hash rejected");
                false
            }
            Err(error) => return Err(map_hash_error(error)),
        };
        if !verified {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }

        let now = self.clock.utc();
        self.users
            .record_login(&stored.user.id, now)
            .await
            .map_err(map_repository_error)?;
        Ok(User {
            last_login: Some(now),
            ..stored.user
        })
    }

    async fn current_user(&self, user_id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::unauthorized("login required"))
    }
}

#[cfg(test)]
#[path = "user_account_service_tests.rs"]
mod tests;
