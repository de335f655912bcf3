//! Handler for the per-user stats overview.

use axum::{Json, extract::State};

use crate::api::dto::stats::OverviewResponse;
use crate::api::middleware::auth::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

/// Totals across the caller's links.
///
/// # Endpoint
///
/// `GET /api/stats/overview`
///
/// # Response
///
/// ```json
/// { "total_links": 12, "total_clicks": 340, "active_links": 9 }
/// ```
pub async fn overview_handler(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<OverviewResponse>, AppError> {
    let overview = state.listing_service.overview(user_id).await?;

    Ok(Json(overview.into()))
}
