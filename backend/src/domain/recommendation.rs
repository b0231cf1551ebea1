//! Recommendation click tracking.
//!
//! A recommendation is recorded when a reader opens a suggested book's
//! preview. Re-opening the same book refreshes `clicked_at` instead of
//! creating a second record.

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::user::UserId;

/// Most recent recommendations returned by a listing.
pub const RECOMMENDATION_LIST_LIMIT: i64 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecommendationValidationError {
    MissingField { field: &'static str },
}

impl RecommendationValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField { field } => field,
        }
    }
}

impl fmt::Display for RecommendationValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { field } => write!(f, "{field} is required"),
        }
    }
}

impl std::error::Error for RecommendationValidationError {}

/// Stored recommendation click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    pub id: Uuid,
    pub user_id: UserId,
    pub book_id: String,
    pub title: String,
    pub authors: Option<String>,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub published_date: Option<String>,
    pub publisher: Option<String>,
    pub page_count: Option<i32>,
    pub rating: Option<String>,
    pub preview_link: String,
    pub clicked_at: DateTime<Utc>,
}

/// Display metadata captured with a click.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecommendationDetails {
    pub authors: Option<String>,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub published_date: Option<String>,
    pub publisher: Option<String>,
    pub page_count: Option<i32>,
    pub rating: Option<String>,
}

/// Validated click to record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationClick {
    book_id: String,
    title: String,
    preview_link: String,
    details: RecommendationDetails,
}

fn required(
    value: Option<&str>,
    field: &'static str,
) -> Result<String, RecommendationValidationError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .ok_or(RecommendationValidationError::MissingField { field })
}

impl RecommendationClick {
    pub fn try_new(
        book_id: Option<&str>,
        title: Option<&str>,
        preview_link: Option<&str>,
        details: RecommendationDetails,
    ) -> Result<Self, RecommendationValidationError> {
        Ok(Self {
            book_id: required(book_id, "bookId")?,
            title: required(title, "title")?,
            preview_link: required(preview_link, "previewLink")?,
            details,
        })
    }

    pub fn book_id(&self) -> &str {
        self.book_id.as_str()
    }

    pub fn into_recommendation(self, user_id: UserId, now: DateTime<Utc>) -> Recommendation {
        let RecommendationDetails {
            authors,
            thumbnail,
            description,
            published_date,
            publisher,
            page_count,
            rating,
        } = self.details;
        Recommendation {
            id: Uuid::new_v4(),
            user_id,
            book_id: self.book_id,
            title: self.title,
            authors,
            thumbnail,
            description,
            published_date,
            publisher,
            page_count,
            rating,
            preview_link: self.preview_link,
            clicked_at: now,
        }
    }
}
