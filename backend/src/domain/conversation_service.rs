//! Conversation and message services.
//!
//! Every operation first resolves the conversation for the session user, so
//! foreign conversations surface as "not found".

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::debug;

use crate::domain::ports::{
    ConversationRepository, ConversationRepositoryError, ConversationsCommand,
};
use crate::domain::{
    CONVERSATION_LIST_LIMIT, Conversation, ConversationChanges, ConversationId, Error, Message,
    NewMessage, SavedMessage, UserId, message_dedup_window,
};

pub(crate) fn map_repository_error(error: ConversationRepositoryError) -> Error {
    match error {
        ConversationRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("conversation repository unavailable: {message}"))
        }
        ConversationRepositoryError::Query { message } => {
            Error::internal(format!("conversation repository error: {message}"))
        }
    }
}

fn conversation_not_found(id: &ConversationId) -> Error {
    Error::not_found(format!("conversation {id} not found"))
}

#[derive(Clone)]
pub struct ConversationService<R> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> ConversationService<R> {
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }
}

impl<R> ConversationService<R>
where
    R: ConversationRepository,
{
    async fn require_owned(
        &self,
        user_id: &UserId,
        id: &ConversationId,
    ) -> Result<Conversation, Error> {
        self.repo
            .find_for_user(id, user_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| conversation_not_found(id))
    }
}

#[async_trait]
impl<R> ConversationsCommand for ConversationService<R>
where
    R: ConversationRepository,
{
    async fn list(&self, user_id: &UserId) -> Result<Vec<Conversation>, Error> {
        self.repo
            .list_for_user(user_id, CONVERSATION_LIST_LIMIT)
            .await
            .map_err(map_repository_error)
    }

    async fn create(
        &self,
        user_id: &UserId,
        title: Option<String>,
        first_message: Option<String>,
    ) -> Result<Conversation, Error> {
        let conversation = Conversation::start(
            *user_id,
            title.as_deref(),
            first_message.as_deref(),
            self.clock.utc(),
        );
        self.repo
            .create(&conversation)
            .await
            .map_err(map_repository_error)?;
        Ok(conversation)
    }

    async fn update(
        &self,
        user_id: &UserId,
        id: &ConversationId,
        changes: ConversationChanges,
    ) -> Result<Conversation, Error> {
        self.repo
            .update(id, user_id, &changes, self.clock.utc())
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| conversation_not_found(id))
    }

    async fn delete(&self, user_id: &UserId, id: &ConversationId) -> Result<(), Error> {
        let deleted = self
            .repo
            .delete(id, user_id)
            .await
            .map_err(map_repository_error)?;
        if deleted {
            Ok(())
        } else {
            Err(conversation_not_found(id))
        }
    }

    async fn messages(
        &self,
        user_id: &UserId,
        id: &ConversationId,
    ) -> Result<Vec<Message>, Error> {
        self.require_owned(user_id, id).await?;
        self.repo
            .list_messages(id)
            .await
            .map_err(map_repository_error)
    }

    async fn save_message(
        &self,
        user_id: &UserId,
        id: &ConversationId,
        message: NewMessage,
    ) -> Result<SavedMessage, Error> {
        self.require_owned(user_id, id).await?;
        let now = self.clock.utc();
        if let Some(existing) = self
            .repo
            .find_recent_duplicate(
                id,
                message.role(),
                message.content(),
                now - message_dedup_window(),
            )
            .await
            .map_err(map_repository_error)?
        {
            debug!(conversation_id = %id, message_id = %existing.id, "duplicate message suppressed");
            return Ok(SavedMessage::Duplicate(existing));
        }

        let stored = message.into_message(*id, now);
        self.repo
            .append_message(&stored)
            .await
            .map_err(map_repository_error)?;
        Ok(SavedMessage::Created(stored))
    }
}

#[cfg(test)]
#[path = "conversation_service_tests.rs"]
mod tests;
