//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions to domain types live beside
//! the repository that reads them.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{conversations, messages, reading_list, recommendations, users};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub name: &'a str,
    pub password_hash: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Conversations and messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = conversations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ConversationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub preview: String,
    pub message_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial header update; `None` fields are left untouched.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = conversations)]
pub(crate) struct ConversationUpdate<'a> {
    pub title: Option<&'a str>,
    pub preview: Option<&'a str>,
    pub message_count: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MessageRow {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: String,
    pub content: String,
    pub books: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Reading list
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = reading_list)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ReadingListRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub page_count: Option<i32>,
    pub categories: Vec<String>,
    pub published_date: Option<String>,
    pub publisher: Option<String>,
    pub priority: String,
    pub notes: String,
    pub is_read: bool,
    pub added_at: DateTime<Utc>,
    pub date_finished: Option<DateTime<Utc>>,
    pub user_rating: Option<i16>,
    pub user_review: Option<String>,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = reading_list)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct FinishedReadingUpdate<'a> {
    pub is_read: bool,
    pub date_finished: Option<DateTime<Utc>>,
    pub user_rating: Option<i16>,
    pub user_review: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = recommendations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RecommendationRow {
    pub id: Uuid,
    pub user_id: Uuid,
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
