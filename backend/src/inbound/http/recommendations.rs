//! Recommendation click-tracking HTTP handlers.
//!
//! ```text
//! GET  /api/v1/recommendations
//! POST /api/v1/recommendations {"bookId":"B1","title":"Dune","previewLink":"https://..."}
//! ```

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::ports::TrackedRecommendation;
use crate::domain::{
    Error, Recommendation, RecommendationClick, RecommendationDetails,
    RecommendationValidationError,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::field_error;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub id: Uuid,
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

impl From<Recommendation> for RecommendationResponse {
    fn from(value: Recommendation) -> Self {
        Self {
            id: value.id,
            book_id: value.book_id,
            title: value.title,
            authors: value.authors,
            thumbnail: value.thumbnail,
            description: value.description,
            published_date: value.published_date,
            publisher: value.publisher,
            page_count: value.page_count,
            rating: value.rating,
            preview_link: value.preview_link,
            clicked_at: value.clicked_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecommendationListResponse {
    pub recommendations: Vec<RecommendationResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecommendationEnvelope {
    pub recommendation: RecommendationResponse,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackRecommendationRequest {
    pub book_id: Option<String>,
    pub title: Option<String>,
    pub preview_link: Option<String>,
    /// Comma-joined author names.
    pub authors: Option<String>,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub published_date: Option<String>,
    pub publisher: Option<String>,
    pub page_count: Option<i32>,
    /// Catalogue rating, sent as a number or a string.
    #[schema(value_type = Option<String>)]
    pub rating: Option<Value>,
}

fn rating_text(raw: Option<Value>) -> Option<String> {
    match raw? {
        Value::String(text) => Some(text).filter(|text| !text.trim().is_empty()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn map_click_error(err: RecommendationValidationError) -> Error {
    field_error(err.field(), "missing_field", &err)
}

fn parse_click(payload: TrackRecommendationRequest) -> Result<RecommendationClick, Error> {
    let TrackRecommendationRequest {
        book_id,
        title,
        preview_link,
        authors,
        thumbnail,
        description,
        published_date,
        publisher,
        page_count,
        rating,
    } = payload;
    RecommendationClick::try_new(
        book_id.as_deref(),
        title.as_deref(),
        preview_link.as_deref(),
        RecommendationDetails {
            authors,
            thumbnail,
            description,
            published_date,
            publisher,
            page_count,
            rating: rating_text(rating),
        },
    )
    .map_err(map_click_error)
}

/// Recently opened recommendations, newest click first.
#[utoipa::path(
    get,
    path = "/api/v1/recommendations",
    responses(
        (status = 200, description = "At most 20 recommendations", body = RecommendationListResponse),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["recommendations"],
    operation_id = "listRecommendations"
)]
#[get("/recommendations")]
pub async fn list_recommendations(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<RecommendationListResponse>> {
    let user_id = session.require_user_id()?;
    let recommendations = state.recommendations.list(&user_id).await?;
    Ok(web::Json(RecommendationListResponse {
        recommendations: recommendations.into_iter().map(Into::into).collect(),
    }))
}

/// Record that the reader opened a recommended book.
#[utoipa::path(
    post,
    path = "/api/v1/recommendations",
    request_body = TrackRecommendationRequest,
    responses(
        (status = 201, description = "Click recorded", body = RecommendationEnvelope),
        (status = 200, description = "Existing click refreshed", body = RecommendationEnvelope),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["recommendations"],
    operation_id = "trackRecommendation"
)]
#[post("/recommendations")]
pub async fn track_recommendation(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<TrackRecommendationRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let click = parse_click(payload.into_inner())?;
    let TrackedRecommendation {
        recommendation,
        created,
    } = state.recommendations.track(&user_id, click).await?;
    let body = RecommendationEnvelope {
        recommendation: recommendation.into(),
    };
    Ok(if created {
        HttpResponse::Created().json(body)
    } else {
        HttpResponse::Ok().json(body)
    })
}
