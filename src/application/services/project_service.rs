//! Project bookkeeping for link grouping.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::info;

use super::deadline::bounded;
use crate::domain::entities::{NewProject, Project};
use crate::domain::repositories::{LinkRepository, ProjectRepository};
use crate::error::AppError;
use crate::infrastructure::cache::ViewCache;

/// Service for user-owned projects.
///
/// Deleting a project detaches its links (`project_id` becomes null) instead of
/// deleting them.
pub struct ProjectService {
    projects: Arc<dyn ProjectRepository>,
    links: Arc<dyn LinkRepository>,
    views: ViewCache,
    store_timeout: Duration,
}

impl ProjectService {
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        links: Arc<dyn LinkRepository>,
        views: ViewCache,
        store_timeout: Duration,
    ) -> Self {
        Self {
            projects,
            links,
            views,
            store_timeout,
        }
    }

    pub async fn create(
        &self,
        user_id: i64,
        name: String,
        description: Option<String>,
    ) -> Result<Project, AppError> {
        let project = bounded(
            self.store_timeout,
            "create_project",
            self.projects.create(NewProject {
                name,
                description,
                user_id,
            }),
        )
        .await?;

        info!(project_id = project.id, user_id, "Project created");
        Ok(project)
    }

    pub async fn list(&self, user_id: i64) -> Result<Vec<Project>, AppError> {
        bounded(
            self.store_timeout,
            "list_projects",
            self.projects.list_by_user(user_id),
        )
        .await
    }

    /// Renames or re-describes one of the caller's projects.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the project does not exist or belongs to someone else.
    pub async fn update(
        &self,
        user_id: i64,
        project_id: i64,
        name: String,
        description: Option<String>,
    ) -> Result<Project, AppError> {
        self.find_owned(user_id, project_id).await?;

        bounded(
            self.store_timeout,
            "update_project",
            self.projects.update(project_id, name, description),
        )
        .await?
        .ok_or_else(|| project_not_found(project_id))
    }

    /// Deletes one of the caller's projects, detaching its links first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the project does not exist or belongs to someone else.
    pub async fn delete(&self, user_id: i64, project_id: i64) -> Result<(), AppError> {
        self.find_owned(user_id, project_id).await?;

        let detached = bounded(
            self.store_timeout,
            "detach_project",
            self.links.detach_project(project_id),
        )
        .await?;
        self.views.invalidate_links(&detached).await;

        let removed = bounded(
            self.store_timeout,
            "delete_project",
            self.projects.delete(project_id),
        )
        .await?;

        if !removed {
            return Err(project_not_found(project_id));
        }

        info!(
            project_id,
            user_id,
            detached = detached.len(),
            "Project deleted"
        );
        Ok(())
    }

    async fn find_owned(&self, user_id: i64, project_id: i64) -> Result<Project, AppError> {
        bounded(
            self.store_timeout,
            "find_project",
            self.projects.find_by_id(project_id),
        )
        .await?
        .filter(|project| project.user_id == user_id)
        .ok_or_else(|| project_not_found(project_id))
    }
}

fn project_not_found(project_id: i64) -> AppError {
    AppError::not_found("Project not found", json!({ "project_id": project_id }))
}
