//! Handlers for link management endpoints.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::links::{
    CreateLinkRequest, LinkListResponse, LinkPageResponse, LinkResponse, PaginationMeta,
    UpdateLinkRequest,
};
use crate::api::dto::pagination::{PaginationParams, SearchParams};
use crate::api::middleware::auth::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link owned by the caller.
///
/// # Endpoint
///
/// `POST /api/links`
///
/// # Request Body
///
/// ```json
/// {
///   "original_url": "https://example.com/page",
///   "custom_alias": "promo",                 // optional, becomes the short code
///   "project_id": 3,                         // optional, must be the caller's
///   "expires_at": "2026-12-31T23:59:59Z"     // optional
/// }
/// ```
///
/// # Errors
///
/// Returns 400 Bad Request if the URL or alias is invalid.
/// Returns 404 Not Found if the project is not one of the caller's.
/// Returns 409 Conflict if the alias is already taken as a code or alias.
pub async fn create_link_handler(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<LinkResponse>), AppError> {
    payload.validate()?;

    let link = state.link_service.create(user_id, payload.into()).await?;

    Ok((StatusCode::CREATED, Json(link.into())))
}

/// Returns link details by short code or alias. Does not count as an access.
///
/// # Endpoint
///
/// `GET /api/links/{code}`
///
/// # Errors
///
/// Returns 404 Not Found if no link answers to the code.
/// Returns 410 Gone if the link is expired.
pub async fn get_link_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<LinkResponse>, AppError> {
    let link = state.link_service.get_by_code(&code).await?;

    Ok(Json(link.into()))
}

/// Changes the destination and/or expiry of one of the caller's links.
///
/// # Endpoint
///
/// `PUT /api/links/{code}`
///
/// # Request Body
///
/// ```json
/// {
///   "original_url": "https://new-destination.com",
///   "expires_at": "2026-12-31T23:59:59Z"
/// }
/// ```
///
/// Both fields are optional. The cached views containing the link are
/// invalidated before the response is sent.
///
/// # Errors
///
/// Returns 400 Bad Request if validation fails.
/// Returns 403 Forbidden if the link belongs to someone else.
/// Returns 404 Not Found if no link answers to the code.
pub async fn update_link_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(payload): Json<UpdateLinkRequest>,
) -> Result<Json<LinkResponse>, AppError> {
    payload.validate()?;

    let link = state
        .link_service
        .update(user_id, &code, payload.into())
        .await?;

    Ok(Json(link.into()))
}

/// Deletes one of the caller's links.
///
/// # Endpoint
///
/// `DELETE /api/links/{code}`
///
/// # Errors
///
/// Returns 403 Forbidden if the link belongs to someone else.
/// Returns 404 Not Found if no link answers to the code.
pub async fn delete_link_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<StatusCode, AppError> {
    state.link_service.delete(user_id, &code).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Lists the caller's links, newest first.
///
/// # Endpoint
///
/// `GET /api/links`
///
/// # Query Parameters
///
/// - `page` (optional): Page number (default: 1)
/// - `page_size` (optional): Items per page (default: 25, max: 100)
///
/// # Errors
///
/// Returns 400 Bad Request if pagination parameters are invalid.
pub async fn list_links_handler(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<PaginationParams>,
) -> Result<Json<LinkPageResponse>, AppError> {
    let (page, page_size) = params.validate()?;

    let (items, total_items) = state
        .listing_service
        .list_mine(user_id, page, page_size)
        .await?;

    Ok(Json(LinkPageResponse {
        pagination: PaginationMeta::new(page, page_size, total_items),
        items: items.into_iter().map(LinkResponse::from).collect(),
    }))
}

/// Finds the caller's links pointing at a destination.
///
/// # Endpoint
///
/// `GET /api/links/search?original_url=https://example.com`
///
/// The query is normalized like destinations are on create. No match yields an
/// empty list.
pub async fn search_links_handler(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<SearchParams>,
) -> Result<Json<LinkListResponse>, AppError> {
    let links = state
        .listing_service
        .search(user_id, &params.original_url)
        .await?;

    Ok(Json(links.into()))
}

/// Returns counters of one of the caller's links.
///
/// # Endpoint
///
/// `GET /api/links/{code}/stats`
///
/// Served from the view cache when possible, so `access_count` may lag behind
/// live redirects by up to the cache TTL.
///
/// # Errors
///
/// Returns 403 Forbidden if the link belongs to someone else.
/// Returns 404 Not Found if no link answers to the code.
pub async fn link_stats_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<LinkResponse>, AppError> {
    let link = state.listing_service.link_stats(user_id, &code).await?;

    Ok(Json(link.into()))
}
