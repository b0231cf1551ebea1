//! Recommendation click tracking service.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::ports::{
    RecommendationRepository, RecommendationRepositoryError, RecommendationsCommand,
    TrackedRecommendation,
};
use crate::domain::{
    Error, RECOMMENDATION_LIST_LIMIT, Recommendation, RecommendationClick, UserId,
};

fn map_repository_error(error: RecommendationRepositoryError) -> Error {
    match error {
        RecommendationRepositoryError::Connection { message } => Error::service_unavailable(
            format!("recommendation repository unavailable: {message}"),
        ),
        RecommendationRepositoryError::Query { message } => {
            Error::internal(format!("recommendation repository error: {message}"))
        }
    }
}

#[derive(Clone)]
pub struct RecommendationService<R> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> RecommendationService<R> {
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }
}

#[async_trait]
impl<R> RecommendationsCommand for RecommendationService<R>
where
    R: RecommendationRepository,
{
    async fn list(&self, user_id: &UserId) -> Result<Vec<Recommendation>, Error> {
        self.repo
            .list_recent(user_id, RECOMMENDATION_LIST_LIMIT)
            .await
            .map_err(map_repository_error)
    }

    async fn track(
        &self,
        user_id: &UserId,
        click: RecommendationClick,
    ) -> Result<TrackedRecommendation, Error> {
        let now = self.clock.utc();
        let candidate = click.into_recommendation(*user_id, now);
        let (recommendation, created) = self
            .repo
            .record_click(&candidate, now)
            .await
            .map_err(map_repository_error)?;
        Ok(TrackedRecommendation {
            recommendation,
            created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecommendationDetails;
    use crate::test_support::{InMemoryRecommendationRepository, MutableClock};
    use chrono::Utc;

    fn click(book_id: &str) -> RecommendationClick {
        RecommendationClick::try_new(
            Some(book_id),
            Some("Dune"),
            Some("https://books.example/dune"),
            RecommendationDetails::default(),
        )
        .expect("valid click")
    }

    #[tokio::test]
    async fn repeated_click_refreshes_timestamp() {
        let clock = Arc::new(MutableClock::new(Utc::now()));
        let service = RecommendationService::new(
            Arc::new(InMemoryRecommendationRepository::default()),
            clock.clone(),
        );
        let user = UserId::random();

        let first = service.track(&user, click("dune")).await.expect("first");
        clock.advance_seconds(120);
        let second = service.track(&user, click("dune")).await.expect("second");

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(second.recommendation.id, first.recommendation.id);
        assert_eq!(second.recommendation.clicked_at, clock.utc());
        assert_eq!(service.list(&user).await.expect("list").len(), 1);
    }

    #[tokio::test]
    async fn list_is_most_recent_click_first() {
        let clock = Arc::new(MutableClock::new(Utc::now()));
        let service = RecommendationService::new(
            Arc::new(InMemoryRecommendationRepository::default()),
            clock.clone(),
        );
        let user = UserId::random();
        service.track(&user, click("a")).await.expect("a");
        clock.advance_seconds(1);
        service.track(&user, click("b")).await.expect("b");
        clock.advance_seconds(1);
        service.track(&user, click("a")).await.expect("a again");

        let order: Vec<String> = service
            .list(&user)
            .await
            .expect("list")
            .into_iter()
            .map(|r| r.book_id)
            .collect();
        assert_eq!(order, ["a", "b"]);
    }
}
