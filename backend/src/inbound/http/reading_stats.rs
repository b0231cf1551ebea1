//! Reading statistics HTTP handler.
//!
//! ```text
//! POST /api/v1/reading-stats {"period":"year","groupBy":"genre"}
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, GroupBy, ReadingStats, StatsPeriod, StatsValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::field_error;

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReadingStatsRequest {
    /// `all-time` (default), `year`, `month`, or `week`.
    pub period: Option<String>,
    /// `genre`, `author`, or `year`.
    pub group_by: Option<String>,
}

fn map_stats_error(err: StatsValidationError) -> Error {
    match &err {
        StatsValidationError::InvalidPeriod { .. } => field_error("period", "invalid_period", &err),
        StatsValidationError::InvalidGroupBy { .. } => {
            field_error("groupBy", "invalid_group_by", &err)
        }
    }
}

fn parse_stats_request(
    request: ReadingStatsRequest,
) -> Result<(StatsPeriod, Option<GroupBy>), Error> {
    let period = request
        .period
        .as_deref()
        .filter(|raw| !raw.is_empty())
        .map(str::parse)
        .transpose()
        .map_err(map_stats_error)?
        .unwrap_or_default();
    let group_by = request
        .group_by
        .as_deref()
        .filter(|raw| !raw.is_empty())
        .map(str::parse)
        .transpose()
        .map_err(map_stats_error)?;
    Ok((period, group_by))
}

/// Aggregate the reader's finished books. An absent body means all time.
#[utoipa::path(
    post,
    path = "/api/v1/reading-stats",
    request_body(content = ReadingStatsRequest, description = "Optional; defaults to all time"),
    responses(
        (status = 200, description = "Reading statistics", body = ReadingStats),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["reading-stats"],
    operation_id = "readingStats"
)]
#[post("/reading-stats")]
pub async fn reading_stats(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: Option<web::Json<ReadingStatsRequest>>,
) -> ApiResult<web::Json<ReadingStats>> {
    let user_id = session.require_user_id()?;
    let request = payload.map(web::Json::into_inner).unwrap_or_default();
    let (period, group_by) = parse_stats_request(request)?;
    let stats = state
        .reading_stats
        .stats(&user_id, period, group_by)
        .await?;
    Ok(web::Json(stats))
}
