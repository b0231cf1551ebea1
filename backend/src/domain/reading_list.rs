//! Reading list entries and the validation applied to them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::user::UserId;

/// Reading priority; unknown values fall back to [`Priority::Medium`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Lenient parse used for request payloads.
    pub fn from_lenient(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for Priority {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(()),
        }
    }
}

/// Validation errors for reading list operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadingListValidationError {
    MissingBookId,
    MissingTitle,
    RatingOutOfRange { value: i64 },
}

impl ReadingListValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingBookId => "bookId",
            Self::MissingTitle => "title",
            Self::RatingOutOfRange { .. } => "rating",
        }
    }
}

impl fmt::Display for ReadingListValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingBookId => write!(f, "bookId is required"),
            Self::MissingTitle => write!(f, "title is required"),
            Self::RatingOutOfRange { value } => {
                write!(f, "rating must be between 1 and 5 (got {value})")
            }
        }
    }
}

impl std::error::Error for ReadingListValidationError {}

/// Trimmed, non-empty book identifier for reading list operations.
pub fn require_book_id(raw: Option<&str>) -> Result<String, ReadingListValidationError> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .ok_or(ReadingListValidationError::MissingBookId)
}

/// Stored reading list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingListEntry {
    pub id: Uuid,
    pub user_id: UserId,
    pub book_id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub page_count: Option<i32>,
    pub categories: Vec<String>,
    pub published_date: Option<String>,
    pub publisher: Option<String>,
    pub priority: Priority,
    pub notes: String,
    pub is_read: bool,
    pub added_at: DateTime<Utc>,
    pub date_finished: Option<DateTime<Utc>>,
    pub user_rating: Option<i16>,
    pub user_review: Option<String>,
}

/// Optional book metadata supplied when adding to the list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookMetadata {
    pub authors: Vec<String>,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub page_count: Option<i32>,
    pub categories: Vec<String>,
    pub published_date: Option<String>,
    pub publisher: Option<String>,
}

/// Validated request to add a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReadingListEntry {
    book_id: String,
    title: String,
    metadata: BookMetadata,
    priority: Priority,
    notes: String,
}

impl NewReadingListEntry {
    pub fn try_new(
        book_id: Option<&str>,
        title: Option<&str>,
        metadata: BookMetadata,
        priority: Option<&str>,
        notes: Option<&str>,
    ) -> Result<Self, ReadingListValidationError> {
        let book_id = require_book_id(book_id)?;
        let title = title
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(ReadingListValidationError::MissingTitle)?;
        Ok(Self {
            book_id,
            title: title.to_owned(),
            metadata,
            priority: Priority::from_lenient(priority),
            notes: notes.unwrap_or_default().to_owned(),
        })
    }

    pub fn book_id(&self) -> &str {
        self.book_id.as_str()
    }

    /// Materialise the stored entry for `user_id`.
    pub fn into_entry(self, user_id: UserId, now: DateTime<Utc>) -> ReadingListEntry {
        let BookMetadata {
            authors,
            thumbnail,
            description,
            page_count,
            categories,
            published_date,
            publisher,
        } = self.metadata;
        ReadingListEntry {
            id: Uuid::new_v4(),
            user_id,
            book_id: self.book_id,
            title: self.title,
            authors,
            thumbnail,
            description,
            page_count,
            categories,
            published_date,
            publisher,
            priority: self.priority,
            notes: self.notes,
            is_read: false,
            added_at: now,
            date_finished: None,
            user_rating: None,
            user_review: None,
        }
    }
}

/// Validated "finished reading" update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkAsRead {
    pub book_id: String,
    pub rating: Option<i16>,
    pub review: Option<String>,
    pub date_finished: Option<DateTime<Utc>>,
}

impl MarkAsRead {
    pub fn try_new(
        book_id: Option<&str>,
        rating: Option<i64>,
        review: Option<String>,
        date_finished: Option<DateTime<Utc>>,
    ) -> Result<Self, ReadingListValidationError> {
        let book_id = require_book_id(book_id)?;
        let rating = rating
            .map(|value| {
                i16::try_from(value)
                    .ok()
                    .filter(|n| (1..=5).contains(n))
                    .ok_or(ReadingListValidationError::RatingOutOfRange { value })
            })
            .transpose()?;
        Ok(Self {
            book_id,
            rating,
            review,
            date_finished,
        })
    }
}
