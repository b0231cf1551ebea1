//! PostgreSQL-backed `ReadingListRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::warn;

use crate::domain::ports::{FinishedReading, ReadingListRepository, ReadingListRepositoryError};
use crate::domain::{Priority, ReadingListEntry, UserId};

use super::diesel_basic_error_mapping::{
    is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::models::{FinishedReadingUpdate, ReadingListRow};
use super::pool::{DbPool, PoolError};
use super::schema::reading_list;

const USER_BOOK_CONSTRAINT: &str = "reading_list_user_book_key";

/// Diesel-backed implementation of the `ReadingListRepository` port.
#[derive(Clone)]
pub struct DieselReadingListRepository {
    pool: DbPool,
}

impl DieselReadingListRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ReadingListRepositoryError {
    map_basic_pool_error(error, ReadingListRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ReadingListRepositoryError {
    map_basic_diesel_error(
        error,
        ReadingListRepositoryError::query,
        ReadingListRepositoryError::connection,
    )
}

fn row_to_entry(row: ReadingListRow) -> ReadingListEntry {
    let priority = row.priority.parse::<Priority>().unwrap_or_else(|()| {
        warn!(
            value = %row.priority,
            entry_id = %row.id,
            "unrecognised priority value, defaulting to medium"
        );
        Priority::default()
    });
    ReadingListEntry {
        id: row.id,
        user_id: UserId::from(row.user_id),
        book_id: row.book_id,
        title: row.title,
        authors: row.authors,
        thumbnail: row.thumbnail,
        description: row.description,
        page_count: row.page_count,
        categories: row.categories,
        published_date: row.published_date,
        publisher: row.publisher,
        priority,
        notes: row.notes,
        is_read: row.is_read,
        added_at: row.added_at,
        date_finished: row.date_finished,
        user_rating: row.user_rating,
        user_review: row.user_review,
    }
}

fn entry_to_row(entry: &ReadingListEntry) -> ReadingListRow {
    ReadingListRow {
        id: entry.id,
        user_id: *entry.user_id.as_uuid(),
        book_id: entry.book_id.clone(),
        title: entry.title.clone(),
        authors: entry.authors.clone(),
        thumbnail: entry.thumbnail.clone(),
        description: entry.description.clone(),
        page_count: entry.page_count,
        categories: entry.categories.clone(),
        published_date: entry.published_date.clone(),
        publisher: entry.publisher.clone(),
        priority: entry.priority.as_str().to_owned(),
        notes: entry.notes.clone(),
        is_read: entry.is_read,
        added_at: entry.added_at,
        date_finished: entry.date_finished,
        user_rating: entry.user_rating,
        user_review: entry.user_review.clone(),
    }
}

#[async_trait]
impl ReadingListRepository for DieselReadingListRepository {
    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ReadingListEntry>, ReadingListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ReadingListRow> = reading_list::table
            .filter(reading_list::user_id.eq(user_id.as_uuid()))
            .order_by(reading_list::added_at.desc())
            .select(ReadingListRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_entry).collect())
    }

    async fn insert(&self, entry: &ReadingListEntry) -> Result<(), ReadingListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(reading_list::table)
            .values(&entry_to_row(entry))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| {
                if is_unique_violation(&err, Some(USER_BOOK_CONSTRAINT)) {
                    ReadingListRepositoryError::duplicate(entry.book_id.clone())
                } else {
                    map_diesel_error(err)
                }
            })
    }

    async fn remove(
        &self,
        user_id: &UserId,
        book_id: &str,
    ) -> Result<bool, ReadingListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            reading_list::table
                .filter(reading_list::user_id.eq(user_id.as_uuid()))
                .filter(reading_list::book_id.eq(book_id)),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn mark_read(
        &self,
        user_id: &UserId,
        book_id: &str,
        finished: &FinishedReading,
    ) -> Result<Option<ReadingListEntry>, ReadingListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let update = FinishedReadingUpdate {
            is_read: true,
            date_finished: Some(finished.date_finished),
            user_rating: finished.rating,
            user_review: finished.review.as_deref(),
        };
        let row: Option<ReadingListRow> = diesel::update(
            reading_list::table
                .filter(reading_list::user_id.eq(user_id.as_uuid()))
                .filter(reading_list::book_id.eq(book_id)),
        )
        .set(&update)
        .returning(ReadingListRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;
        Ok(row.map(row_to_entry))
    }

    async fn list_finished(
        &self,
        user_id: &UserId,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<ReadingListEntry>, ReadingListRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = reading_list::table
            .filter(reading_list::user_id.eq(user_id.as_uuid()))
            .filter(reading_list::is_read.eq(true))
            .into_boxed();
        if let Some(start) = since {
            query = query.filter(reading_list::date_finished.ge(start));
        }
        let rows: Vec<ReadingListRow> = query
            .order_by(reading_list::date_finished.desc())
            .select(ReadingListRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_entry).collect())
    }
}
