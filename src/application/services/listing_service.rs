//! Link listings, cached views and per-user aggregates.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::debug;

use super::deadline::bounded;
use super::sweeper_service::inactivity_cutoff;
use crate::domain::entities::{Link, LinkOverview};
use crate::domain::repositories::{LinkRepository, ProjectRepository};
use crate::error::AppError;
use crate::infrastructure::cache::{ViewCache, popular_key, recent_key, stats_key};
use crate::utils::url_normalizer::normalize_url;

/// Read-side service for link listings.
///
/// Popular, recent and per-link stats views are read through the [`ViewCache`];
/// owner-scoped listings always go to the store.
pub struct ListingService {
    links: Arc<dyn LinkRepository>,
    projects: Arc<dyn ProjectRepository>,
    views: ViewCache,
    store_timeout: Duration,
}

impl ListingService {
    pub fn new(
        links: Arc<dyn LinkRepository>,
        projects: Arc<dyn ProjectRepository>,
        views: ViewCache,
        store_timeout: Duration,
    ) -> Self {
        Self {
            links,
            projects,
            views,
            store_timeout,
        }
    }

    /// Returns one page of the caller's links plus their total count.
    pub async fn list_mine(
        &self,
        user_id: i64,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<Link>, i64), AppError> {
        let offset = (page - 1) * page_size;

        let items = bounded(
            self.store_timeout,
            "list_by_user",
            self.links.list_by_user(user_id, offset, page_size),
        )
        .await?;
        let total = bounded(
            self.store_timeout,
            "count_by_user",
            self.links.count_by_user(user_id),
        )
        .await?;

        Ok((items, total))
    }

    /// Most accessed active links, read through the cache.
    pub async fn popular(&self, limit: i64) -> Result<Vec<Link>, AppError> {
        let key = popular_key(limit);
        if let Some(links) = self.views.get_links(&key).await {
            return Ok(links);
        }

        let links = bounded(
            self.store_timeout,
            "list_popular",
            self.links.list_popular(limit),
        )
        .await?;
        self.views.put_links(&key, &links).await;

        Ok(links)
    }

    /// Most recently created links, read through the cache.
    pub async fn recent(&self, limit: i64) -> Result<Vec<Link>, AppError> {
        let key = recent_key(limit);
        if let Some(links) = self.views.get_links(&key).await {
            return Ok(links);
        }

        let links = bounded(
            self.store_timeout,
            "list_recent",
            self.links.list_recent(limit),
        )
        .await?;
        self.views.put_links(&key, &links).await;

        Ok(links)
    }

    /// The caller's links already flagged as expired.
    pub async fn expired(&self, user_id: i64) -> Result<Vec<Link>, AppError> {
        bounded(
            self.store_timeout,
            "list_expired",
            self.links.list_expired(user_id),
        )
        .await
    }

    /// The caller's inactive links whose last access is at least `days` old.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `days` is out of range.
    pub async fn inactive(&self, user_id: i64, days: i64) -> Result<Vec<Link>, AppError> {
        let since = inactivity_cutoff(days)?;

        bounded(
            self.store_timeout,
            "list_inactive",
            self.links.list_inactive(user_id, since),
        )
        .await
    }

    /// Links grouped under one of the caller's projects.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the project does not exist or belongs to someone else.
    pub async fn project_links(
        &self,
        user_id: i64,
        project_id: i64,
    ) -> Result<Vec<Link>, AppError> {
        let owned = bounded(
            self.store_timeout,
            "project_exists_and_owned_by",
            self.projects.exists_and_owned_by(project_id, user_id),
        )
        .await?;

        if !owned {
            return Err(AppError::not_found(
                "Project not found",
                json!({ "project_id": project_id }),
            ));
        }

        bounded(
            self.store_timeout,
            "list_by_project",
            self.links.list_by_project(project_id),
        )
        .await
    }

    /// The caller's links pointing at `original_url`.
    ///
    /// The query is normalized the same way destinations are on create, so
    /// `HTTPS://Example.com` finds links stored as `https://example.com/`.
    pub async fn search(&self, user_id: i64, original_url: &str) -> Result<Vec<Link>, AppError> {
        let needle =
            normalize_url(original_url).unwrap_or_else(|_| original_url.trim().to_string());

        bounded(
            self.store_timeout,
            "find_by_original_url",
            self.links.find_by_original_url(user_id, &needle),
        )
        .await
    }

    /// Stats for one of the caller's links, read through the cache.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if nothing answers to `code`.
    /// Returns [`AppError::Forbidden`] if the caller does not own the link.
    pub async fn link_stats(&self, user_id: i64, code: &str) -> Result<Link, AppError> {
        let key = stats_key(code);

        let link = match self.views.get_link(&key).await {
            Some(link) => link,
            None => {
                let link = bounded(
                    self.store_timeout,
                    "find_by_code",
                    self.links.find_by_code(code),
                )
                .await?
                .ok_or_else(|| AppError::not_found("Link not found", json!({ "code": code })))?;

                self.views.put_link(&key, &link).await;
                link
            }
        };

        if !link.is_owned_by(user_id) {
            return Err(AppError::forbidden(
                "Not enough permissions",
                json!({ "code": code }),
            ));
        }

        Ok(link)
    }

    /// Totals across the caller's links.
    pub async fn overview(&self, user_id: i64) -> Result<LinkOverview, AppError> {
        let overview = bounded(
            self.store_timeout,
            "overview",
            self.links.overview(user_id),
        )
        .await?;

        debug!(user_id, total_links = overview.total_links, "Computed stats overview");
        Ok(overview)
    }
}
