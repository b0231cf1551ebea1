//! PostgreSQL-backed `RecommendationRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{RecommendationRepository, RecommendationRepositoryError};
use crate::domain::{Recommendation, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::RecommendationRow;
use super::pool::{DbPool, PoolError};
use super::schema::recommendations;

/// Diesel-backed implementation of the `RecommendationRepository` port.
#[derive(Clone)]
pub struct DieselRecommendationRepository {
    pool: DbPool,
}

impl DieselRecommendationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> RecommendationRepositoryError {
    map_basic_pool_error(error, RecommendationRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> RecommendationRepositoryError {
    map_basic_diesel_error(
        error,
        RecommendationRepositoryError::query,
        RecommendationRepositoryError::connection,
    )
}

fn row_to_recommendation(row: RecommendationRow) -> Recommendation {
    Recommendation {
        id: row.id,
        user_id: UserId::from(row.user_id),
        book_id: row.book_id,
        title: row.title,
        authors: row.authors,
        thumbnail: row.thumbnail,
        description: row.description,
        published_date: row.published_date,
        publisher: row.publisher,
        page_count: row.page_count,
        rating: row.rating,
        preview_link: row.preview_link,
        clicked_at: row.clicked_at,
    }
}

fn recommendation_to_row(
    recommendation: &Recommendation,
    clicked_at: DateTime<Utc>,
) -> RecommendationRow {
    RecommendationRow {
        id: recommendation.id,
        user_id: *recommendation.user_id.as_uuid(),
        book_id: recommendation.book_id.clone(),
        title: recommendation.title.clone(),
        authors: recommendation.authors.clone(),
        thumbnail: recommendation.thumbnail.clone(),
        description: recommendation.description.clone(),
        published_date: recommendation.published_date.clone(),
        publisher: recommendation.publisher.clone(),
        page_count: recommendation.page_count,
        rating: recommendation.rating.clone(),
        preview_link: recommendation.preview_link.clone(),
        clicked_at,
    }
}

#[async_trait]
impl RecommendationRepository for DieselRecommendationRepository {
    async fn list_recent(
        &self,
        user_id: &UserId,
        limit: i64,
    ) -> Result<Vec<Recommendation>, RecommendationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<RecommendationRow> = recommendations::table
            .filter(recommendations::user_id.eq(user_id.as_uuid()))
            .order_by(recommendations::clicked_at.desc())
            .limit(limit)
            .select(RecommendationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_recommendation).collect())
    }

    /// Insert the click, or refresh `clicked_at` on the existing (user, book)
    /// row. The returned flag is true when a new row was written.
    async fn record_click(
        &self,
        recommendation: &Recommendation,
        clicked_at: DateTime<Utc>,
    ) -> Result<(Recommendation, bool), RecommendationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = recommendation_to_row(recommendation, clicked_at);
        let stored: RecommendationRow = diesel::insert_into(recommendations::table)
            .values(&row)
            .on_conflict((recommendations::user_id, recommendations::book_id))
            .do_update()
            .set(recommendations::clicked_at.eq(excluded(recommendations::clicked_at)))
            .returning(RecommendationRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let created = stored.id == recommendation.id;
        Ok((row_to_recommendation(stored), created))
    }
}
