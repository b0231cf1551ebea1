//! Driving port for conversation and message use-cases.

use async_trait::async_trait;

use crate::domain::{
    Conversation, ConversationChanges, ConversationId, Error, Message, NewMessage, SavedMessage,
    UserId,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConversationsCommand: Send + Sync {
    /// Recent conversations of the user, newest first.
    async fn list(&self, user_id: &UserId) -> Result<Vec<Conversation>, Error>;

    async fn create(
        &self,
        user_id: &UserId,
        title: Option<String>,
        first_message: Option<String>,
    ) -> Result<Conversation, Error>;

    async fn update(
        &self,
        user_id: &UserId,
        id: &ConversationId,
        changes: ConversationChanges,
    ) -> Result<Conversation, Error>;

    async fn delete(&self, user_id: &UserId, id: &ConversationId) -> Result<(), Error>;

    /// Messages of an owned conversation, oldest first.
    async fn messages(&self, user_id: &UserId, id: &ConversationId)
    -> Result<Vec<Message>, Error>;

    /// Save a message unless an identical one was saved moments ago.
    async fn save_message(
        &self,
        user_id: &UserId,
        id: &ConversationId,
        message: NewMessage,
    ) -> Result<SavedMessage, Error>;
}
