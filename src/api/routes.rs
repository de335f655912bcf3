//! API route configuration.
//!
//! All API endpoints require Bearer token authentication via
//! [`crate::api::middleware::auth`].

use crate::api::handlers::{
    create_link_handler, create_project_handler, delete_link_handler, delete_project_handler,
    expired_links_handler, get_link_handler, inactive_links_handler, link_stats_handler,
    list_links_handler, list_projects_handler, overview_handler, popular_links_handler,
    project_links_handler, recent_links_handler, search_links_handler, update_link_handler,
    update_project_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, put},
};

/// All API routes, protected by Bearer token authentication.
///
/// # Endpoints
///
/// - `POST   /links`                 - Create a short link
/// - `GET    /links`                 - Caller's links (paginated)
/// - `GET    /links/popular`         - Most accessed links (cached)
/// - `GET    /links/recent`          - Newest links (cached)
/// - `GET    /links/expired`         - Caller's expired links
/// - `GET    /links/inactive`        - Caller's inactive links
/// - `GET    /links/search`          - Caller's links by destination
/// - `GET    /links/{code}`          - Link details (no access recorded)
/// - `PUT    /links/{code}`          - Update destination / expiry
/// - `DELETE /links/{code}`          - Delete a link
/// - `GET    /links/{code}/stats`    - Per-link counters (cached)
/// - `GET    /stats/overview`        - Totals across the caller's links
/// - `POST   /projects`              - Create a project
/// - `GET    /projects`              - Caller's projects
/// - `PUT    /projects/{id}`         - Rename a project
/// - `DELETE /projects/{id}`         - Delete a project, detaching its links
/// - `GET    /projects/{id}/links`   - Links of a project
///
/// Static segments such as `/links/popular` take precedence over `/links/{code}`,
/// so those words can never be resolved as link details.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/links", get(list_links_handler).post(create_link_handler))
        .route("/links/popular", get(popular_links_handler))
        .route("/links/recent", get(recent_links_handler))
        .route("/links/expired", get(expired_links_handler))
        .route("/links/inactive", get(inactive_links_handler))
        .route("/links/search", get(search_links_handler))
        .route(
            "/links/{code}",
            get(get_link_handler)
                .put(update_link_handler)
                .delete(delete_link_handler),
        )
        .route("/links/{code}/stats", get(link_stats_handler))
        .route("/stats/overview", get(overview_handler))
        .route(
            "/projects",
            get(list_projects_handler).post(create_project_handler),
        )
        .route(
            "/projects/{id}",
            put(update_project_handler).delete(delete_project_handler),
        )
        .route("/projects/{id}/links", get(project_links_handler))
}
