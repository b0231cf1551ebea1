//! Reading list and reading statistics services.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::ports::{
    FinishedReading, ReadingListCommand, ReadingListRepository, ReadingListRepositoryError,
    ReadingStatsQuery,
};
use crate::domain::{
    Error, GroupBy, MarkAsRead, NewReadingListEntry, ReadingListEntry, ReadingStats,
    StatsPeriod, UserId, compute_reading_stats,
};

fn map_repository_error(error: ReadingListRepositoryError) -> Error {
    match error {
        ReadingListRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("reading list repository unavailable: {message}"))
        }
        ReadingListRepositoryError::Query { message } => {
            Error::internal(format!("reading list repository error: {message}"))
        }
        ReadingListRepositoryError::Duplicate { book_id } => {
            Error::conflict(format!("book {book_id} is already on your reading list"))
        }
    }
}

fn entry_not_found(book_id: &str) -> Error {
    Error::not_found(format!("book {book_id} is not on your reading list"))
}

/// Service implementing the reading list and statistics driving ports.
#[derive(Clone)]
pub struct ReadingListService<R> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> ReadingListService<R> {
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }
}

#[async_trait]
impl<R> ReadingListCommand for ReadingListService<R>
where
    R: ReadingListRepository,
{
    async fn list(&self, user_id: &UserId) -> Result<Vec<ReadingListEntry>, Error> {
        self.repo
            .list_for_user(user_id)
            .await
            .map_err(map_repository_error)
    }

    async fn add(
        &self,
        user_id: &UserId,
        entry: NewReadingListEntry,
    ) -> Result<ReadingListEntry, Error> {
        let entry = entry.into_entry(*user_id, self.clock.utc());
        self.repo
            .insert(&entry)
            .await
            .map_err(map_repository_error)?;
        Ok(entry)
    }

    async fn remove(&self, user_id: &UserId, book_id: &str) -> Result<(), Error> {
        let removed = self
            .repo
            .remove(user_id, book_id)
            .await
            .map_err(map_repository_error)?;
        if removed {
            Ok(())
        } else {
            Err(entry_not_found(book_id))
        }
    }

    async fn mark_as_read(
        &self,
        user_id: &UserId,
        request: MarkAsRead,
    ) -> Result<ReadingListEntry, Error> {
        let finished = FinishedReading {
            rating: request.rating,
            review: request.review,
            date_finished: request.date_finished.unwrap_or_else(|| self.clock.utc()),
        };
        self.repo
            .mark_read(user_id, &request.book_id, &finished)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| entry_not_found(&request.book_id))
    }
}

#[async_trait]
impl<R> ReadingStatsQuery for ReadingListService<R>
where
    R: ReadingListRepository,
{
    async fn stats(
        &self,
        user_id: &UserId,
        period: StatsPeriod,
        group_by: Option<GroupBy>,
    ) -> Result<ReadingStats, Error> {
        let now = self.clock.utc();
        let entries = self
            .repo
            .list_finished(user_id, period.start(now))
            .await
            .map_err(map_repository_error)?;
        Ok(compute_reading_stats(&entries, period, group_by, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::MockReadingListRepository;
    use crate::domain::reading_list::BookMetadata;
    use crate::test_support::{InMemoryReadingListRepository, MutableClock};
    use chrono::{Duration, TimeZone, Utc};
    use rstest::{fixture, rstest};

    #[fixture]
    fn clock() -> Arc<MutableClock> {
        Arc::new(MutableClock::new(
            Utc.with_ymd_and_hms(2025, 6, 10, 18, 0, 0)
                .single()
                .expect("valid timestamp"),
        ))
    }

    fn entry(book_id: &str) -> NewReadingListEntry {
        NewReadingListEntry::try_new(
            Some(book_id),
            Some("Title"),
            BookMetadata {
                page_count: Some(100),
                ..BookMetadata::default()
            },
            Some("high"),
            None,
        )
        .expect("valid entry")
    }

    #[rstest]
    #[tokio::test]
    async fn adding_twice_conflicts(clock: Arc<MutableClock>) {
        let service =
            ReadingListService::new(Arc::new(InMemoryReadingListRepository::default()), clock);
        let user = UserId::random();
        service.add(&user, entry("abc")).await.expect("first add");
        let err = service.add(&user, entry("abc")).await.expect_err("second add");
        assert_eq!(err.code(), ErrorCode::Conflict);

        let other = UserId::random();
        service
            .add(&other, entry("abc"))
            .await
            .expect("same book for another reader");
    }

    #[rstest]
    #[tokio::test]
    async fn list_is_newest_first(clock: Arc<MutableClock>) {
        let service = ReadingListService::new(
            Arc::new(InMemoryReadingListRepository::default()),
            clock.clone(),
        );
        let user = UserId::random();
        service.add(&user, entry("first")).await.expect("add");
        clock.advance_seconds(60);
        service.add(&user, entry("second")).await.expect("add");

        let ids: Vec<String> = service
            .list(&user)
            .await
            .expect("list")
            .into_iter()
            .map(|e| e.book_id)
            .collect();
        assert_eq!(ids, ["second", "first"]);
    }

    #[rstest]
    #[tokio::test]
    async fn mark_as_read_defaults_finish_date_to_now(clock: Arc<MutableClock>) {
        let service = ReadingListService::new(
            Arc::new(InMemoryReadingListRepository::default()),
            clock.clone(),
        );
        let user = UserId::random();
        service.add(&user, entry("abc")).await.expect("add");

        let request = MarkAsRead::try_new(Some("abc"), Some(4), Some("Loved it".into()), None)
            .expect("valid");
        let updated = service.mark_as_read(&user, request).await.expect("mark");
        assert!(updated.is_read);
        assert_eq!(updated.user_rating, Some(4));
        assert_eq!(updated.date_finished, Some(clock.utc()));

        let stats = service
            .stats(&user, StatsPeriod::Week, None)
            .await
            .expect("stats");
        assert_eq!(stats.total_books, 1);
        assert_eq!(stats.total_pages, 100);
        assert_eq!(stats.current_streak_days, 1);
    }

    #[rstest]
    #[tokio::test]
    async fn missing_entries_are_not_found(clock: Arc<MutableClock>) {
        let service =
            ReadingListService::new(Arc::new(InMemoryReadingListRepository::default()), clock);
        let user = UserId::random();
        let remove = service.remove(&user, "nope").await.expect_err("remove");
        let mark = service
            .mark_as_read(
                &user,
                MarkAsRead::try_new(Some("nope"), None, None, None).expect("valid"),
            )
            .await
            .expect_err("mark");
        assert_eq!(remove.code(), ErrorCode::NotFound);
        assert_eq!(mark.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn stats_pass_the_period_start_to_the_repository(clock: Arc<MutableClock>) {
        let expected_start = clock.utc() - Duration::days(7);
        let mut repo = MockReadingListRepository::new();
        repo.expect_list_finished()
            .withf(move |_, since| *since == Some(expected_start))
            .return_once(|_, _| Ok(Vec::new()));
        let service = ReadingListService::new(Arc::new(repo), clock);

        let stats = service
            .stats(&UserId::random(), StatsPeriod::Week, Some(GroupBy::Author))
            .await
            .expect("stats");
        assert_eq!(stats.total_books, 0);
    }
}
