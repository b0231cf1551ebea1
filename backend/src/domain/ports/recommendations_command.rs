//! Driving port for recommendation click tracking.

use async_trait::async_trait;

use crate::domain::{Error, Recommendation, RecommendationClick, UserId};

/// Outcome of recording a click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedRecommendation {
    pub recommendation: Recommendation,
    pub created: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecommendationsCommand: Send + Sync {
    async fn list(&self, user_id: &UserId) -> Result<Vec<Recommendation>, Error>;

    async fn track(
        &self,
        user_id: &UserId,
        click: RecommendationClick,
    ) -> Result<TrackedRecommendation, Error>;
}
