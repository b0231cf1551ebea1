//! Port for conversation and message persistence.
//!
//! Conversation reads and writes take the owning [`UserId`]; a conversation
//! owned by someone else behaves exactly like a missing one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{
    Conversation, ConversationChanges, ConversationId, Message, MessageRole, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by conversation repository adapters.
    pub enum ConversationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "conversation repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "conversation repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Most recently updated conversations of `user_id`, newest first.
    async fn list_for_user(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<Conversation>, ConversationRepositoryError>;

    /// Fetch one conversation if it belongs to `user_id`.
    async fn find_for_user(
        &self,
        id: &ConversationId,
        user_id: &UserId,
    ) -> Result<Option<Conversation>, ConversationRepositoryError>;

    async fn create(&self, conversation: &Conversation) -> Result<(), ConversationRepositoryError>;

    /// Apply `changes` and set `updated_at`; `None` when nothing matched.
    async fn update(
        &self,
        id: &ConversationId,
        user_id: &UserId,
        changes: &ConversationChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Conversation>, ConversationRepositoryError>;

    /// Delete the conversation and its messages; `false` when nothing matched.
    async fn delete(
        &self,
        id: &ConversationId,
        user_id: &UserId,
    ) -> Result<bool, ConversationRepositoryError>;

    /// Every conversation id in the store, for maintenance jobs.
    async fn list_all_ids(&self) -> Result<Vec<ConversationId>, ConversationRepositoryError>;

    /// Messages of a conversation, oldest first.
    async fn list_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Message>, ConversationRepositoryError>;

    /// Latest message with the same role and content created at or after `since`.
    async fn find_recent_duplicate(
        &self,
        conversation_id: &ConversationId,
        role: MessageRole,
        content: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<Message>, ConversationRepositoryError>;

    /// Insert a message, bump the conversation's `updated_at` to the message
    /// time, and increment its `message_count`.
    async fn append_message(&self, message: &Message) -> Result<(), ConversationRepositoryError>;

    /// Delete the given messages and reset `message_count` to the number left.
    /// Returns the remaining count.
    async fn remove_messages(
        &self,
        conversation_id: &ConversationId,
        message_ids: &[Uuid],
    ) -> Result<i64, ConversationRepositoryError>;
}
