//! Driving port for reading list use-cases.

use async_trait::async_trait;

use crate::domain::{Error, MarkAsRead, NewReadingListEntry, ReadingListEntry, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReadingListCommand: Send + Sync {
    async fn list(&self, user_id: &UserId) -> Result<Vec<ReadingListEntry>, Error>;

    /// Add a book; a second add of the same book is a conflict.
    async fn add(
        &self,
        user_id: &UserId,
        entry: NewReadingListEntry,
    ) -> Result<ReadingListEntry, Error>;

    async fn remove(&self, user_id: &UserId, book_id: &str) -> Result<(), Error>;

    async fn mark_as_read(
        &self,
        user_id: &UserId,
        request: MarkAsRead,
    ) -> Result<ReadingListEntry, Error>;
}
