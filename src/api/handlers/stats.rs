//! Handlers for dashboard and per-link statistics.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use validator::Validate;

use crate::api::dto::stats::{DashboardResponse, LinkStatsQuery, LinkStatsResponse};
use crate::api::middleware::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Dashboard rollup for the caller's links.
///
/// # Endpoint
///
/// `GET /api/stats`
///
/// # Response
///
/// ```json
/// {
///   "totalClicks": 120,
///   "totalLinks": 8,
///   "weeklyChange": 25,
///   "topSource": "https://news.ycombinator.com",
///   "topSourcePercentage": 40
/// }
/// ```
///
/// `weeklyChange` compares the last 7 days with the 7 before, in percent.
/// `topSource` is `"Direct"` when no click carried a referrer.
pub async fn dashboard_handler(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<DashboardResponse>, AppError> {
    let stats = state.stats_service.dashboard(Some(user.id())).await?;

    Ok(Json(stats.into()))
}

/// Click history and top referrers for one of the caller's links.
///
/// # Endpoint
///
/// `GET /api/stats/link/{id}?days=30`
///
/// # Query Parameters
///
/// - `days` (optional): history window, 1-365 (default: 30)
///
/// # Errors
///
/// Returns 404 if the link does not exist or belongs to someone else.
/// Returns 400 if `days` is out of range.
pub async fn link_stats_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LinkStatsQuery>,
) -> Result<Json<LinkStatsResponse>, AppError> {
    query.validate()?;

    let stats = state
        .stats_service
        .link_stats(id, user.id(), query.days())
        .await?;

    Ok(Json(stats.into()))
}
