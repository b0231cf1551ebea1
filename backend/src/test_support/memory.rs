//! In-memory implementations of the driven ports.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::ports::{
    ConversationRepository, ConversationRepositoryError, FinishedReading, PasswordHashError,
    PasswordHasher, ReadingListRepository, ReadingListRepositoryError, RecommendationRepository,
    RecommendationRepositoryError, UserPersistenceError, UserRepository,
};
use crate::domain::{
    Conversation, ConversationChanges, ConversationId, Email, Message, MessageRole,
    ReadingListEntry, Recommendation, StoredUser, User, UserId,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("in-memory store mutex poisoned"),
    }
}

#[derive(Default)]
struct ConversationStore {
    conversations: HashMap<ConversationId, Conversation>,
    messages: Vec<Message>,
}

/// Conversation store mirroring the PostgreSQL adapter.
#[derive(Default)]
pub struct InMemoryConversationRepository(Mutex<ConversationStore>);

impl InMemoryConversationRepository {
    /// Insert a message without touching the conversation header, the way
    /// legacy rows written before deduplication look.
    pub fn insert_raw_message(&self, message: Message) {
        lock(&self.0).messages.push(message);
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn list_for_user(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<Conversation>, ConversationRepositoryError> {
        let store = lock(&self.0);
        let mut owned: Vec<Conversation> = store
            .conversations
            .values()
            .filter(|c| c.user_id == *user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        owned.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(owned)
    }

    async fn find_for_user(
        &self,
        id: &ConversationId,
        user_id: &UserId,
    ) -> Result<Option<Conversation>, ConversationRepositoryError> {
        Ok(lock(&self.0)
            .conversations
            .get(id)
            .filter(|c| c.user_id == *user_id)
            .cloned())
    }

    async fn create(&self, conversation: &Conversation) -> Result<(), ConversationRepositoryError> {
        lock(&self.0)
            .conversations
            .insert(conversation.id, conversation.clone());
        Ok(())
    }

    async fn update(
        &self,
        id: &ConversationId,
        user_id: &UserId,
        changes: &ConversationChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Conversation>, ConversationRepositoryError> {
        let mut store = lock(&self.0);
        let Some(conversation) = store
            .conversations
            .get_mut(id)
            .filter(|c| c.user_id == *user_id)
        else {
            return Ok(None);
        };
        if let Some(title) = &changes.title {
            conversation.title.clone_from(title);
        }
        if let Some(count) = changes.message_count {
            conversation.message_count = count;
        }
        if let Some(preview) = &changes.preview {
            conversation.preview.clone_from(preview);
        }
        conversation.updated_at = updated_at;
        Ok(Some(conversation.clone()))
    }

    async fn delete(
        &self,
        id: &ConversationId,
        user_id: &UserId,
    ) -> Result<bool, ConversationRepositoryError> {
        let mut store = lock(&self.0);
        let owned = store
            .conversations
            .get(id)
            .is_some_and(|c| c.user_id == *user_id);
        if owned {
            store.conversations.remove(id);
            store.messages.retain(|m| m.conversation_id != *id);
        }
        Ok(owned)
    }

    async fn list_all_ids(&self) -> Result<Vec<ConversationId>, ConversationRepositoryError> {
        let store = lock(&self.0);
        let mut headers: Vec<&Conversation> = store.conversations.values().collect();
        headers.sort_by_key(|c| c.created_at);
        Ok(headers.into_iter().map(|c| c.id).collect())
    }

    async fn list_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Message>, ConversationRepositoryError> {
        let store = lock(&self.0);
        let mut messages: Vec<Message> = store
            .messages
            .iter()
            .filter(|m| m.conversation_id == *conversation_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn find_recent_duplicate(
        &self,
        conversation_id: &ConversationId,
        role: MessageRole,
        content: &str,
        since: DateTime<Utc>,
    ) -> Result<Option<Message>, ConversationRepositoryError> {
        Ok(lock(&self.0)
            .messages
            .iter()
            .filter(|m| {
                m.conversation_id == *conversation_id
                    && m.role == role
                    && m.content == content
                    && m.created_at >= since
            })
            .max_by_key(|m| m.created_at)
            .cloned())
    }

    async fn append_message(&self, message: &Message) -> Result<(), ConversationRepositoryError> {
        let mut store = lock(&self.0);
        let Some(conversation) = store.conversations.get_mut(&message.conversation_id) else {
            return Err(ConversationRepositoryError::query(format!(
                "conversation {} does not exist",
                message.conversation_id
            )));
        };
        conversation.message_count += 1;
        conversation.updated_at = message.created_at;
        store.messages.push(message.clone());
        Ok(())
    }

    async fn remove_messages(
        &self,
        conversation_id: &ConversationId,
        message_ids: &[Uuid],
    ) -> Result<i64, ConversationRepositoryError> {
        let mut store = lock(&self.0);
        store.messages.retain(|m| !message_ids.contains(&m.id));
        let remaining = store
            .messages
            .iter()
            .filter(|m| m.conversation_id == *conversation_id)
            .count();
        let count = i32::try_from(remaining).unwrap_or(i32::MAX);
        if let Some(conversation) = store.conversations.get_mut(conversation_id) {
            conversation.message_count = count;
        }
        Ok(i64::from(count))
    }
}

/// Reading list store enforcing one entry per (user, book).
#[derive(Default)]
pub struct InMemoryReadingListRepository(Mutex<Vec<ReadingListEntry>>);

#[async_trait]
impl ReadingListRepository for InMemoryReadingListRepository {
    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ReadingListEntry>, ReadingListRepositoryError> {
        let mut entries: Vec<ReadingListEntry> = lock(&self.0)
            .iter()
            .filter(|e| e.user_id == *user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        Ok(entries)
    }

    async fn insert(&self, entry: &ReadingListEntry) -> Result<(), ReadingListRepositoryError> {
        let mut entries = lock(&self.0);
        if entries
            .iter()
            .any(|e| e.user_id == entry.user_id && e.book_id == entry.book_id)
        {
            return Err(ReadingListRepositoryError::duplicate(entry.book_id.clone()));
        }
        entries.push(entry.clone());
        Ok(())
    }

    async fn remove(
        &self,
        user_id: &UserId,
        book_id: &str,
    ) -> Result<bool, ReadingListRepositoryError> {
        let mut entries = lock(&self.0);
        let before = entries.len();
        entries.retain(|e| !(e.user_id == *user_id && e.book_id == book_id));
        Ok(entries.len() != before)
    }

    async fn mark_read(
        &self,
        user_id: &UserId,
        book_id: &str,
        finished: &FinishedReading,
    ) -> Result<Option<ReadingListEntry>, ReadingListRepositoryError> {
        let mut entries = lock(&self.0);
        let Some(entry) = entries
            .iter_mut()
            .find(|e| e.user_id == *user_id && e.book_id == book_id)
        else {
            return Ok(None);
        };
        entry.is_read = true;
        entry.user_rating = finished.rating;
        entry.user_review.clone_from(&finished.review);
        entry.date_finished = Some(finished.date_finished);
        Ok(Some(entry.clone()))
    }

    async fn list_finished(
        &self,
        user_id: &UserId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<ReadingListEntry>, ReadingListRepositoryError> {
        Ok(lock(&self.0)
            .iter()
            .filter(|e| e.user_id == *user_id && e.is_read)
            .filter(|e| match since {
                None => true,
                Some(start) => e.date_finished.is_some_and(|d| d >= start),
            })
            .cloned()
            .collect())
    }
}

/// Recommendation click store keyed by (user, book).
#[derive(Default)]
pub struct InMemoryRecommendationRepository(Mutex<Vec<Recommendation>>);

#[async_trait]
impl RecommendationRepository for InMemoryRecommendationRepository {
    async fn list_recent(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<Recommendation>, RecommendationRepositoryError> {
        let mut clicks: Vec<Recommendation> = lock(&self.0)
            .iter()
            .filter(|r| r.user_id == *user_id)
            .cloned()
            .collect();
        clicks.sort_by(|a, b| b.clicked_at.cmp(&a.clicked_at));
        clicks.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(clicks)
    }

    async fn record_click(
        &self,
        recommendation: &Recommendation,
        clicked_at: DateTime<Utc>,
    ) -> Result<(Recommendation, bool), RecommendationRepositoryError> {
        let mut clicks = lock(&self.0);
        if let Some(existing) = clicks.iter_mut().find(|r| {
            r.user_id == recommendation.user_id && r.book_id == recommendation.book_id
        }) {
            existing.clicked_at = clicked_at;
            return Ok((existing.clone(), false));
        }
        let mut created = recommendation.clone();
        created.clicked_at = clicked_at;
        clicks.push(created.clone());
        Ok((created, true))
    }
}

/// Account store enforcing unique e-mail addresses.
#[derive(Default)]
pub struct InMemoryUserRepository(Mutex<HashMap<UserId, StoredUser>>);

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &StoredUser) -> Result<(), UserPersistenceError> {
        let mut users = lock(&self.0);
        if users.values().any(|u| u.user.email == user.user.email) {
            return Err(UserPersistenceError::duplicate_email(
                user.user.email.to_string(),
            ));
        }
        users.insert(user.user.id, user.clone());
        Ok(())
    }

    async fn find_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<StoredUser>, UserPersistenceError> {
        Ok(lock(&self.0)
            .values()
            .find(|u| u.user.email == *email)
            .cloned())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(lock(&self.0).get(id).map(|u| u.user.clone()))
    }

    async fn record_login(
        &self,
        id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<(), UserPersistenceError> {
        if let Some(stored) = lock(&self.0).get_mut(id) {
            stored.user.last_login = Some(at);
        }
        Ok(())
    }
}

const PLAINTEXT_PREFIX: &str = "plain$";

/// Reversible "hasher" that keeps tests fast; never wire it into a server.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaintextPasswordHasher;

impl PasswordHasher for PlaintextPasswordHasher {
    fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        Ok(format!("{PLAINTEXT_PREFIX}{password}"))
    }

    fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, PasswordHashError> {
        stored_hash
            .strip_prefix(PLAINTEXT_PREFIX)
            .map(|stored| stored == password)
            .ok_or_else(|| PasswordHashError::malformed_hash("missing plaintext prefix"))
    }
}
