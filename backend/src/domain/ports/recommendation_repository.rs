//! Port for recommendation click persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Recommendation, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by recommendation repository adapters.
    pub enum RecommendationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "recommendation repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "recommendation repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecommendationRepository: Send + Sync {
    /// Most recently clicked recommendations, newest first.
    async fn list_recent(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<Recommendation>, RecommendationRepositoryError>;

    /// Insert a new click or, for an existing (user, book) pair, refresh its
    /// `clicked_at`. Returns the stored record and whether it was created.
    async fn record_click(
        &self,
        recommendation: &Recommendation,
        clicked_at: DateTime<Utc>,
    ) -> Result<(Recommendation, bool), RecommendationRepositoryError>;
}
