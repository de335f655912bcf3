//! Repository trait for projects.

use crate::domain::entities::{NewProject, Project};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for link projects.
///
/// The link core only relies on [`ProjectRepository::exists_and_owned_by`];
/// the remaining operations back the project endpoints.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn create(&self, new_project: NewProject) -> Result<Project, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Project>, AppError>;

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Project>, AppError>;

    /// Returns true if project `project_id` exists and belongs to `user_id`.
    async fn exists_and_owned_by(&self, project_id: i64, user_id: i64) -> Result<bool, AppError>;

    /// Replaces name and description of project `id`. Returns `None` if it does not exist.
    async fn update(
        &self,
        id: i64,
        name: String,
        description: Option<String>,
    ) -> Result<Option<Project>, AppError>;

    /// Deletes a project row. Returns whether a row was removed.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}
