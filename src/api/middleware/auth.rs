//! Bearer token authentication middleware.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;
use serde_json::json;

use crate::{error::AppError, state::AppState};

/// Id of the authenticated caller, placed in request extensions by [`layer`].
///
/// Handlers take it as an extractor. Outside the authenticated router it
/// rejects with `401 Unauthorized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub i64);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<CurrentUser>().copied().ok_or_else(|| {
            AppError::unauthorized("Unauthorized", json!({"reason": "No authenticated user"}))
        })
    }
}

/// Resolves `Authorization: Bearer <token>` to its user and stores a
/// [`CurrentUser`] for the handlers.
///
/// Responds `401 Unauthorized` when the header is missing or malformed, or the
/// token is unknown or revoked.
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();

    let AuthBearer(token) = AuthBearer::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            AppError::unauthorized(
                "Unauthorized",
                json!({"reason": "Authorization header is missing or invalid"}),
            )
        })?;

    let user_id = st.auth_service.authenticate(&token).await?;
    parts.extensions.insert(CurrentUser(user_id));

    Ok(next.run(Request::from_parts(parts, body)).await)
}
