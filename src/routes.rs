//! Full HTTP surface of the service.
//!
//! | Path          | Auth   | Rate limit        |
//! |---------------|--------|-------------------|
//! | `GET /{code}` | none   | 2/s, burst 100    |
//! | `GET /health` | none   | 2/s, burst 100    |
//! | `/api/*`      | bearer | 1/s, burst 10     |
//!
//! Every request is traced, and a trailing slash is dropped before routing.

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::{auth, rate_limit, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Builds the service router.
///
/// With `behind_proxy`, rate limits key on `X-Forwarded-For` / `X-Real-IP`
/// rather than the socket peer. Only set it behind a trusted reverse proxy.
pub fn app_router(state: AppState, behind_proxy: bool) -> NormalizePath<Router> {
    let redirects = Router::new()
        .route("/{code}", get(redirect_handler))
        .route("/health", get(health_handler))
        .layer(rate_limit::layer(behind_proxy));

    let api = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer))
        .layer(rate_limit::secure_layer(behind_proxy));

    let router = redirects
        .nest("/api", api)
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
