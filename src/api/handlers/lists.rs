//! Handlers for link listing views.

use axum::{
    Json,
    extract::{Query, State},
};

use crate::api::dto::links::LinkListResponse;
use crate::api::dto::pagination::{InactivityParams, LimitParams};
use crate::api::middleware::auth::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

/// Most accessed active links across all users.
///
/// # Endpoint
///
/// `GET /api/links/popular?limit=10`
///
/// Cached per `limit` (1..=100, default 10). Any mutation of a link drops
/// the cached views.
pub async fn popular_links_handler(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<LinkListResponse>, AppError> {
    let limit = params.validate()?;

    Ok(Json(state.listing_service.popular(limit).await?.into()))
}

/// Most recently created links across all users.
///
/// # Endpoint
///
/// `GET /api/links/recent?limit=10`
pub async fn recent_links_handler(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> Result<Json<LinkListResponse>, AppError> {
    let limit = params.validate()?;

    Ok(Json(state.listing_service.recent(limit).await?.into()))
}

/// The caller's links already flagged as expired by the sweeper.
///
/// # Endpoint
///
/// `GET /api/links/expired`
pub async fn expired_links_handler(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<LinkListResponse>, AppError> {
    Ok(Json(state.listing_service.expired(user_id).await?.into()))
}

/// The caller's inactive links not accessed for `days` days.
///
/// # Endpoint
///
/// `GET /api/links/inactive?days=30`
pub async fn inactive_links_handler(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<InactivityParams>,
) -> Result<Json<LinkListResponse>, AppError> {
    let days = params.validate()?;

    Ok(Json(
        state.listing_service.inactive(user_id, days).await?.into(),
    ))
}
