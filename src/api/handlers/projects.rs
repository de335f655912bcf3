//! Handlers for project endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::links::LinkListResponse;
use crate::api::dto::projects::{ProjectListResponse, ProjectRequest, ProjectResponse};
use crate::api::middleware::auth::CurrentUser;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a project owned by the caller.
///
/// # Endpoint
///
/// `POST /api/projects`
pub async fn create_project_handler(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(payload): Json<ProjectRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>), AppError> {
    payload.validate()?;

    let project = state
        .project_service
        .create(user_id, payload.name, payload.description)
        .await?;

    Ok((StatusCode::CREATED, Json(project.into())))
}

/// Lists the caller's projects.
///
/// # Endpoint
///
/// `GET /api/projects`
pub async fn list_projects_handler(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<ProjectListResponse>, AppError> {
    let projects = state.project_service.list(user_id).await?;

    Ok(Json(ProjectListResponse {
        items: projects.into_iter().map(ProjectResponse::from).collect(),
    }))
}

/// Renames or re-describes one of the caller's projects.
///
/// # Endpoint
///
/// `PUT /api/projects/{id}`
///
/// # Errors
///
/// Returns 404 Not Found for missing projects and for projects of other users.
pub async fn update_project_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(payload): Json<ProjectRequest>,
) -> Result<Json<ProjectResponse>, AppError> {
    payload.validate()?;

    let project = state
        .project_service
        .update(user_id, id, payload.name, payload.description)
        .await?;

    Ok(Json(project.into()))
}

/// Deletes one of the caller's projects. Its links are kept and detached.
///
/// # Endpoint
///
/// `DELETE /api/projects/{id}`
///
/// # Errors
///
/// Returns 404 Not Found for missing projects and for projects of other users.
pub async fn delete_project_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<StatusCode, AppError> {
    state.project_service.delete(user_id, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Lists the links grouped under one of the caller's projects.
///
/// # Endpoint
///
/// `GET /api/projects/{id}/links`
pub async fn project_links_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<LinkListResponse>, AppError> {
    let links = state.listing_service.project_links(user_id, id).await?;

    Ok(Json(links.into()))
}
