//! Port for reading list persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ReadingListEntry, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by reading list repository adapters.
    pub enum ReadingListRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "reading list repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "reading list repository query failed: {message}",
        /// The user already has this book on their list.
        Duplicate { book_id: String } =>
            "book {book_id} is already on the reading list",
    }
}

/// Fields written when a book is marked as read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedReading {
    pub rating: Option<i16>,
    pub review: Option<String>,
    pub date_finished: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReadingListRepository: Send + Sync {
    /// Entries of `user_id`, most recently added first.
    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ReadingListEntry>, ReadingListRepositoryError>;

    /// Insert an entry. Fails with `Duplicate` for an existing (user, book) pair.
    async fn insert(&self, entry: &ReadingListEntry) -> Result<(), ReadingListRepositoryError>;

    /// Remove an entry; `false` when nothing matched.
    async fn remove(
        &self,
        user_id: &UserId,
        book_id: &str,
    ) -> Result<bool, ReadingListRepositoryError>;

    /// Mark an entry as read; `None` when nothing matched.
    async fn mark_read(
        &self,
        user_id: &UserId,
        book_id: &str,
        finished: &FinishedReading,
    ) -> Result<Option<ReadingListEntry>, ReadingListRepositoryError>;

    /// Read entries of `user_id`, optionally finished at or after `since`.
    async fn list_finished(
        &self,
        user_id: &UserId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<ReadingListEntry>, ReadingListRepositoryError>;
}
