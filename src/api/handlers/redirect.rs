//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    response::Redirect,
};
use serde_json::json;

use crate::domain::entities::Resolution;
use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code or custom alias to its destination.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Atomically record the access if the link is live (count + `last_accessed_at`)
/// 2. If nothing was recorded, look the code up to tell expired from missing
/// 3. Return 307 Temporary Redirect to the stored destination
///
/// The view cache is never consulted, so an update or expiry is visible to the
/// very next redirect.
///
/// # Errors
///
/// Returns 404 Not Found if no link answers to the code.
/// Returns 410 Gone if the link is expired, whether or not the sweeper has flagged it yet.
/// Returns 503 Service Unavailable if the store fails or times out.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect, AppError> {
    match state.redirect_service.resolve(&code).await? {
        Resolution::Active(link) => Ok(Redirect::temporary(&link.original_url)),
        Resolution::Expired(link) => Err(AppError::gone(
            "Link has expired",
            json!({ "code": code, "expires_at": link.expires_at }),
        )),
        Resolution::Missing => Err(AppError::not_found(
            "Short link not found",
            json!({ "code": code }),
        )),
    }
}
