//! Repository trait for the authoritative link store.

use crate::domain::entities::{Link, LinkOverview, LinkPatch, NewLink};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Repository interface for links.
///
/// The store owns uniqueness of the code space and the row-level atomicity of
/// every per-link mutation. Counters are incremented in place by the backend,
/// never read-modified-written by callers.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::MemoryStore`] - In-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Inserts a new link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if `short_code` or `custom_alias` is already
    /// taken as either a short code or an alias by another link.
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError>;

    /// Finds a link whose short code or custom alias equals `code`.
    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError>;

    /// Finds the owner's links pointing at `original_url`.
    async fn find_by_original_url(
        &self,
        user_id: i64,
        original_url: &str,
    ) -> Result<Vec<Link>, AppError>;

    /// Atomically records one access if the link exists and is not expired at `now`.
    ///
    /// Increments `access_count` and sets `last_accessed_at = now` in a single
    /// conditional statement.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Link))` with the post-increment state when the access counted
    /// - `Ok(None)` when no live link answers to `code`
    async fn record_access(&self, code: &str, now: DateTime<Utc>)
    -> Result<Option<Link>, AppError>;

    /// Applies `patch` to link `id` if it is owned by `owner_id`.
    ///
    /// Returns `Ok(None)` when no such owned link exists.
    async fn update(
        &self,
        id: i64,
        owner_id: i64,
        patch: LinkPatch,
    ) -> Result<Option<Link>, AppError>;

    /// Deletes link `id` if it is owned by `owner_id`. Returns whether a row was removed.
    async fn delete(&self, id: i64, owner_id: i64) -> Result<bool, AppError>;

    /// Lists a user's links, newest first.
    async fn list_by_user(
        &self,
        user_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Link>, AppError>;

    /// Counts a user's links.
    async fn count_by_user(&self, user_id: i64) -> Result<i64, AppError>;

    /// Lists links grouped under a project, newest first.
    async fn list_by_project(&self, project_id: i64) -> Result<Vec<Link>, AppError>;

    /// Lists a user's links flagged as expired, latest deadline first.
    async fn list_expired(&self, user_id: i64) -> Result<Vec<Link>, AppError>;

    /// Lists a user's inactive links last accessed at or before `since`.
    async fn list_inactive(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<Link>, AppError>;

    /// Lists active links by `access_count` descending, ties broken by lowest id.
    async fn list_popular(&self, limit: i64) -> Result<Vec<Link>, AppError>;

    /// Lists the most recently created links.
    async fn list_recent(&self, limit: i64) -> Result<Vec<Link>, AppError>;

    /// Aggregates totals for a user.
    async fn overview(&self, user_id: i64) -> Result<LinkOverview, AppError>;

    /// Flags every link with `expires_at <= now` and `is_expired = false` as expired
    /// and inactive. Returns the links that changed.
    async fn mark_expired(&self, now: DateTime<Utc>) -> Result<Vec<Link>, AppError>;

    /// Flags active links last accessed at or before `cutoff` as inactive.
    /// Never-accessed links are left alone. Returns the links that changed.
    async fn mark_inactive(&self, cutoff: DateTime<Utc>) -> Result<Vec<Link>, AppError>;

    /// Lists every link flagged as expired.
    async fn list_purgeable(&self) -> Result<Vec<Link>, AppError>;

    /// Deletes link `id` if it is still flagged as expired.
    async fn purge(&self, id: i64) -> Result<bool, AppError>;

    /// Clears `project_id` on every link of a project. Returns the links that changed.
    async fn detach_project(&self, project_id: i64) -> Result<Vec<Link>, AppError>;

    /// Cheap round trip used by health checks.
    async fn ping(&self) -> Result<(), AppError>;
}
