//! Book catalogue HTTP handlers.
//!
//! ```text
//! GET /api/v1/books/search?query=dune&maxResults=5&orderBy=newest&startIndex=0
//! GET /api/v1/books/{id}
//! ```

use actix_web::{get, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Book, BookDetails, BookId, BookQueryValidationError, BookSearchQuery, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::field_error;

/// Query parameters for a catalogue search.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Free-text search; required and non-blank.
    pub query: Option<String>,
    /// 1..=40, default 10.
    pub max_results: Option<i64>,
    /// `relevance` (default) or `newest`.
    pub order_by: Option<String>,
    /// Zero-based offset, default 0.
    pub start_index: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub books: Vec<Book>,
    pub total_items: u64,
}

fn map_query_error(err: BookQueryValidationError) -> Error {
    let code = match err {
        BookQueryValidationError::EmptyQuery => "missing_query",
        BookQueryValidationError::MaxResultsOutOfRange { .. } => "max_results_out_of_range",
        BookQueryValidationError::InvalidOrderBy { .. } => "invalid_order_by",
        BookQueryValidationError::NegativeStartIndex { .. } => "negative_start_index",
        BookQueryValidationError::InvalidBookId => "invalid_book_id",
    };
    field_error(err.field(), code, &err)
}

fn parse_search(params: SearchParams) -> Result<BookSearchQuery, Error> {
    BookSearchQuery::try_new(
        params.query.as_deref().unwrap_or_default(),
        params.max_results,
        params.order_by.as_deref(),
        params.start_index,
    )
    .map_err(map_query_error)
}

/// Search the catalogue.
#[utoipa::path(
    get,
    path = "/api/v1/books/search",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching books", body = SearchResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 429, description = "Catalogue rate limited", body = Error),
        (status = 502, description = "Catalogue error", body = Error),
        (status = 503, description = "Catalogue unreachable", body = Error),
        (status = 504, description = "Catalogue timed out", body = Error)
    ),
    tags = ["books"],
    operation_id = "searchBooks"
)]
#[get("/books/search")]
pub async fn search_books(
    state: web::Data<HttpState>,
    session: SessionContext,
    params: web::Query<SearchParams>,
) -> ApiResult<web::Json<SearchResponse>> {
    session.require_user_id()?;
    let query = parse_search(params.into_inner())?;
    let page = state.books.search(&query).await?;
    Ok(web::Json(SearchResponse {
        books: page.books,
        total_items: page.total_items,
    }))
}

/// Fetch one volume.
#[utoipa::path(
    get,
    path = "/api/v1/books/{id}",
    params(("id" = String, Path, description = "Catalogue volume id")),
    responses(
        (status = 200, description = "Book details", body = BookDetails),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Unknown volume", body = Error),
        (status = 502, description = "Catalogue error", body = Error)
    ),
    tags = ["books"],
    operation_id = "getBookDetails"
)]
#[get("/books/{id}")]
pub async fn book_details(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<BookDetails>> {
    session.require_user_id()?;
    let id = BookId::new(path.into_inner()).map_err(map_query_error)?;
    let details = state.books.details(&id).await?;
    Ok(web::Json(details))
}
