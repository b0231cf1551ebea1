//! Reading list HTTP handlers.
//!
//! ```text
//! GET    /api/v1/reading-list
//! POST   /api/v1/reading-list {"bookId":"zyTCAlFPjgYC","title":"The Google Story","priority":"high"}
//! DELETE /api/v1/reading-list?bookId=zyTCAlFPjgYC
//! PATCH  /api/v1/reading-list {"bookId":"zyTCAlFPjgYC","rating":5,"dateFinished":"2025-03-01"}
//! ```

use actix_web::{HttpResponse, delete, get, patch, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::reading_list::require_book_id;
use crate::domain::{
    BookMetadata, Error, MarkAsRead, NewReadingListEntry, Priority, ReadingListEntry,
    ReadingListValidationError,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, field_error, parse_optional_timestamp};

/// Stored entry as returned to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadingListEntryResponse {
    pub id: Uuid,
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

impl From<ReadingListEntry> for ReadingListEntryResponse {
    fn from(entry: ReadingListEntry) -> Self {
        Self {
            id: entry.id,
            book_id: entry.book_id,
            title: entry.title,
            authors: entry.authors,
            thumbnail: entry.thumbnail,
            description: entry.description,
            page_count: entry.page_count,
            categories: entry.categories,
            published_date: entry.published_date,
            publisher: entry.publisher,
            priority: entry.priority,
            notes: entry.notes,
            is_read: entry.is_read,
            added_at: entry.added_at,
            date_finished: entry.date_finished,
            user_rating: entry.user_rating,
            user_review: entry.user_review,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadingListResponse {
    pub books: Vec<ReadingListEntryResponse>,
    pub total: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AddedResponse {
    pub book: ReadingListEntryResponse,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RemovedResponse {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkedAsReadResponse {
    pub message: String,
    pub data: ReadingListEntryResponse,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddToReadingListRequest {
    pub book_id: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub page_count: Option<i32>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub published_date: Option<String>,
    pub publisher: Option<String>,
    /// `high`, `medium`, or `low`; anything else is stored as `medium`.
    pub priority: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RemoveParams {
    pub book_id: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkAsReadRequest {
    pub book_id: Option<String>,
    /// 1..=5.
    pub rating: Option<i64>,
    pub review: Option<String>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`; defaults to now.
    pub date_finished: Option<String>,
}

fn map_reading_list_error(err: ReadingListValidationError) -> Error {
    let code = match err {
        ReadingListValidationError::MissingBookId | ReadingListValidationError::MissingTitle => {
            "missing_field"
        }
        ReadingListValidationError::RatingOutOfRange { .. } => "rating_out_of_range",
    };
    field_error(err.field(), code, &err)
}

fn parse_new_entry(payload: AddToReadingListRequest) -> Result<NewReadingListEntry, Error> {
    let AddToReadingListRequest {
        book_id,
        title,
        authors,
        thumbnail,
        description,
        page_count,
        categories,
        published_date,
        publisher,
        priority,
        notes,
    } = payload;
    NewReadingListEntry::try_new(
        book_id.as_deref(),
        title.as_deref(),
        BookMetadata {
            authors,
            thumbnail,
            description,
            page_count,
            categories,
            published_date,
            publisher,
        },
        priority.as_deref(),
        notes.as_deref(),
    )
    .map_err(map_reading_list_error)
}

fn parse_mark_as_read(payload: MarkAsReadRequest) -> Result<MarkAsRead, Error> {
    let date_finished = parse_optional_timestamp(
        payload.date_finished.as_deref(),
        FieldName::new("dateFinished"),
    )?;
    MarkAsRead::try_new(
        payload.book_id.as_deref(),
        payload.rating,
        payload.review,
        date_finished,
    )
    .map_err(map_reading_list_error)
}

/// The reader's list, most recently added first.
#[utoipa::path(
    get,
    path = "/api/v1/reading-list",
    responses(
        (status = 200, description = "Reading list", body = ReadingListResponse),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["reading-list"],
    operation_id = "listReadingList"
)]
#[get("/reading-list")]
pub async fn list_reading_list(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<ReadingListResponse>> {
    let user_id = session.require_user_id()?;
    let entries = state.reading_list.list(&user_id).await?;
    let books: Vec<ReadingListEntryResponse> = entries.into_iter().map(Into::into).collect();
    Ok(web::Json(ReadingListResponse {
        total: books.len(),
        books,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/reading-list",
    request_body = AddToReadingListRequest,
    responses(
        (status = 201, description = "Book added", body = AddedResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 409, description = "Book already on the list", body = Error)
    ),
    tags = ["reading-list"],
    operation_id = "addToReadingList"
)]
#[post("/reading-list")]
pub async fn add_to_reading_list(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<AddToReadingListRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let entry = parse_new_entry(payload.into_inner())?;
    let stored = state.reading_list.add(&user_id, entry).await?;
    Ok(HttpResponse::Created().json(AddedResponse {
        book: stored.into(),
        message: "Book added to your reading list".to_owned(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/reading-list",
    params(RemoveParams),
    responses(
        (status = 200, description = "Book removed", body = RemovedResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Book not on the list", body = Error)
    ),
    tags = ["reading-list"],
    operation_id = "removeFromReadingList"
)]
#[delete("/reading-list")]
pub async fn remove_from_reading_list(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<RemoveParams>,
) -> ApiResult<web::Json<RemovedResponse>> {
    let user_id = session.require_user_id()?;
    let book_id = require_book_id(params.book_id.as_deref()).map_err(map_reading_list_error)?;
    state.reading_list.remove(&user_id, &book_id).await?;
    Ok(web::Json(RemovedResponse {
        message: "Book removed from your reading list".to_owned(),
    }))
}

/// Mark a listed book as finished, with an optional rating and review.
#[utoipa::path(
    patch,
    path = "/api/v1/reading-list",
    request_body = MarkAsReadRequest,
    responses(
        (status = 200, description = "Entry updated", body = MarkedAsReadResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Book not on the list", body = Error)
    ),
    tags = ["reading-list"],
    operation_id = "markAsRead"
)]
#[patch("/reading-list")]
pub async fn mark_as_read(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<MarkAsReadRequest>,
) -> ApiResult<web::Json<MarkedAsReadResponse>> {
    let user_id = session.require_user_id()?;
    let request = parse_mark_as_read(payload.into_inner())?;
    let updated = state.reading_list.mark_as_read(&user_id, request).await?;
    Ok(web::Json(MarkedAsReadResponse {
        message: "Book marked as read".to_owned(),
        data: updated.into(),
    }))
}
