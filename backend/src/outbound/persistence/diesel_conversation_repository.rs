//! PostgreSQL-backed `ConversationRepository` implementation using Diesel ORM.
//!
//! Message writes and the header counter they maintain run in one
//! transaction, so `message_count` never drifts from the stored rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::AsyncConnection as _;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::{ConversationRepository, ConversationRepositoryError};
use crate::domain::{
    Book, Conversation, ConversationChanges, ConversationId, Message, MessageRole, UserId,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{ConversationRow, ConversationUpdate, MessageRow};
use super::pool::{DbPool, PoolError};
use super::schema::{conversations, messages};

/// Diesel-backed implementation of the `ConversationRepository` port.
#[derive(Clone)]
pub struct DieselConversationRepository {
    pool: DbPool,
}

impl DieselConversationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ConversationRepositoryError {
    map_basic_pool_error(error, ConversationRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ConversationRepositoryError {
    map_basic_diesel_error(
        error,
        ConversationRepositoryError::query,
        ConversationRepositoryError::connection,
    )
}

fn row_to_conversation(row: ConversationRow) -> Conversation {
    Conversation {
        id: ConversationId::from(row.id),
        user_id: UserId::from(row.user_id),
        title: row.title,
        preview: row.preview,
        message_count: row.message_count,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn conversation_to_row(conversation: &Conversation) -> ConversationRow {
    ConversationRow {
        id: *conversation.id.as_uuid(),
        user_id: *conversation.user_id.as_uuid(),
        title: conversation.title.clone(),
        preview: conversation.preview.clone(),
        message_count: conversation.message_count,
        created_at: conversation.created_at,
        updated_at: conversation.updated_at,
    }
}

fn row_to_message(row: MessageRow) -> Result<Message, ConversationRepositoryError> {
    let role = row.role.parse::<MessageRole>().map_err(|err| {
        warn!(message_id = %row.id, %err, "stored message has an unknown role");
        ConversationRepositoryError::query("stored message has an unknown role")
    })?;
    // Book cards are display data; an unreadable payload loses the cards,
    // not the message.
    let books = serde_json::from_value::<Vec<Book>>(row.books).unwrap_or_else(|err| {
        warn!(message_id = %row.id, %err, "stored book cards could not be decoded");
        Vec::new()
    });
    Ok(Message {
        id: row.id,
        conversation_id: ConversationId::from(row.conversation_id),
        role,
        content: row.content,
        books,
        created_at: row.created_at,
    })
}

fn message_to_row(message: &Message) -> Result<MessageRow, ConversationRepositoryError> {
    let books = serde_json::to_value(&message.books)
        .map_err(|err| ConversationRepositoryError::query(format!("encode books: {err}")))?;
    Ok(MessageRow {
        id: message.id,
        conversation_id: *message.conversation_id.as_uuid(),
        role: message.role.as_str().to_owned(),
        content: message.content.clone(),
        books,
        created_at: message.created_at,
    })
}

#[async_trait]
impl ConversationRepository for DieselConversationRepository {
    async fn list_for_user(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<Conversation>, ConversationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ConversationRow> = conversations::table
            .filter(conversations::user_id.eq(user_id.as_uuid()))
            .order_by(conversations::updated_at.desc())
            .limit(limit)
            .select(ConversationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_conversation).collect())
    }

    async fn find_for_user(
        &self,
        id: &ConversationId,
        user_id: &UserId,
    ) -> Result<Option<Conversation>, ConversationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<ConversationRow> = conversations::table
            .filter(conversations::id.eq(id.as_uuid()))
            .filter(conversations::user_id.eq(user_id.as_uuid()))
            .select(ConversationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(row_to_conversation))
    }

    async fn create(&self, conversation: &Conversation) -> Result<(), ConversationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(conversations::table)
            .values(&conversation_to_row(conversation))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(
        &self,
        id: &ConversationId,
        user_id: &UserId,
        changes: &ConversationChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Conversation>, ConversationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let update = ConversationUpdate {
            title: changes.title.as_deref(),
            preview: changes.preview.as_deref(),
            message_count: changes.message_count,
            updated_at,
        };
        let row: Option<ConversationRow> = diesel::update(
            conversations::table
                .filter(conversations::id.eq(id.as_uuid()))
                .filter(conversations::user_id.eq(user_id.as_uuid())),
        )
        .set(&update)
        .returning(ConversationRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;
        Ok(row.map(row_to_conversation))
    }

    async fn delete(
        &self,
        id: &ConversationId,
        user_id: &UserId,
    ) -> Result<bool, ConversationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        // Messages go with the header via ON DELETE CASCADE.
        let deleted = diesel::delete(
            conversations::table
                .filter(conversations::id.eq(id.as_uuid()))
                .filter(conversations::user_id.eq(user_id.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn list_all_ids(&self) -> Result<Vec<ConversationId>, ConversationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let ids: Vec<Uuid> = conversations::table
            .order_by(conversations::created_at.asc())
            .select(conversations::id)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(ids.into_iter().map(ConversationId::from).collect())
    }

    async fn list_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Message>, ConversationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<MessageRow> = messages::table
            .filter(messages::conversation_id.eq(conversation_id.as_uuid()))
            .order_by((messages::created_at.asc(), messages::id.asc()))
            .select(MessageRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter().map(row_to_message).collect()
    }

    async fn find_recent_duplicate(
        &self,
        conversation_id: &ConversationId,
        role: MessageRole,
        content: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<Message>, ConversationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<MessageRow> = messages::table
            .filter(messages::conversation_id.eq(conversation_id.as_uuid()))
            .filter(messages::role.eq(role.as_str()))
            .filter(messages::content.eq(content))
            .filter(messages::created_at.ge(since))
            .order_by(messages::created_at.desc())
            .select(MessageRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_message).transpose()
    }

    async fn append_message(&self, message: &Message) -> Result<(), ConversationRepositoryError> {
        let row = message_to_row(message)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let touched = conn
            .transaction(|conn| {
                async move {
                    diesel::insert_into(messages::table)
                        .values(&row)
                        .execute(conn)
                        .await?;
                    diesel::update(conversations::table.find(row.conversation_id))
                        .set((
                            conversations::message_count.eq(conversations::message_count + 1),
                            conversations::updated_at.eq(row.created_at),
                        ))
                        .execute(conn)
                        .await
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        if touched == 0 {
            return Err(ConversationRepositoryError::query(format!(
                "conversation {} does not exist",
                message.conversation_id
            )));
        }
        Ok(())
    }

    async fn remove_messages(
        &self,
        conversation_id: &ConversationId,
        message_ids: &[Uuid],
    ) -> Result<i64, ConversationRepositoryError> {
        let conversation = *conversation_id.as_uuid();
        let ids = message_ids.to_vec();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                diesel::delete(
                    messages::table
                        .filter(messages::conversation_id.eq(conversation))
                        .filter(messages::id.eq_any(&ids)),
                )
                .execute(conn)
                .await?;
                let remaining: i64 = messages::table
                    .filter(messages::conversation_id.eq(conversation))
                    .count()
                    .get_result(conn)
                    .await?;
                let count = i32::try_from(remaining).unwrap_or(i32::MAX);
                diesel::update(conversations::table.find(conversation))
                    .set(conversations::message_count.eq(count))
                    .execute(conn)
                    .await?;
                Ok(remaining)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn message_row(role: &str, books: serde_json::Value) -> MessageRow {
        MessageRow {
            id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            role: role.to_owned(),
            content: "hello".to_owned(),
            books,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn message_rows_decode_book_cards() {
        let row = message_row("assistant", json!([{ "id": "abc", "title": "Dune" }]));
        let message = row_to_message(row).expect("valid row");
        assert_eq!(message.role, MessageRole::Assistant);
        assert_eq!(
            message.books.iter().next().map(|b| b.id.as_str()),
            Some("abc")
        );
    }

    #[rstest]
    fn unreadable_book_cards_are_dropped() {
        let message = row_to_message(message_row("user", json!({ "oops": true })))
            .expect("message survives");
        assert!(message.books.is_empty());
    }

    #[rstest]
    fn unknown_roles_are_query_errors() {
        let err = row_to_message(message_row("system", json!([]))).expect_err("bad role");
        assert!(matches!(err, ConversationRepositoryError::Query { .. }));
    }

    #[rstest]
    fn messages_encode_books_as_json_arrays() {
        let message = row_to_message(message_row("assistant", json!([{ "id": "x", "title": "T" }])))
            .expect("valid row");
        let row = message_to_row(&message).expect("encode");
        assert_eq!(row.books[0]["id"], json!("x"));
        assert_eq!(row.role, "assistant");
    }
}
