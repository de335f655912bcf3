//! Link creation, lookup and mutation service.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

use super::deadline::bounded;
use crate::domain::entities::{Link, LinkPatch, NewLink};
use crate::domain::repositories::{LinkRepository, ProjectRepository};
use crate::error::AppError;
use crate::infrastructure::cache::ViewCache;
use crate::utils::code_generator::{generate_code, validate_custom_alias};
use crate::utils::url_normalizer::normalize_url;

/// Generated codes tried before giving up on a create.
const MAX_CODE_ATTEMPTS: usize = 5;

/// Caller-supplied fields of a new link.
#[derive(Debug, Clone, Default)]
pub struct CreateLink {
    pub original_url: String,
    pub custom_alias: Option<String>,
    pub project_id: Option<i64>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Service for creating and mutating shortened links.
///
/// Every successful mutation invalidates the cached views that could contain
/// the link before returning.
pub struct LinkService {
    links: Arc<dyn LinkRepository>,
    projects: Arc<dyn ProjectRepository>,
    views: ViewCache,
    code_length: usize,
    store_timeout: Duration,
}

impl LinkService {
    /// Creates a new link service.
    pub fn new(
        links: Arc<dyn LinkRepository>,
        projects: Arc<dyn ProjectRepository>,
        views: ViewCache,
        code_length: usize,
        store_timeout: Duration,
    ) -> Self {
        Self {
            links,
            projects,
            views,
            code_length,
            store_timeout,
        }
    }

    /// Creates a short link owned by `user_id`.
    ///
    /// # Code allocation
    ///
    /// - With a custom alias, the alias is validated and becomes the short code.
    ///   A taken alias fails immediately with [`AppError::Conflict`].
    /// - Otherwise a random code is generated and the insert retried on collision,
    ///   up to 5 attempts.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the URL or alias is invalid.
    /// Returns [`AppError::NotFound`] if `project_id` is not a project of `user_id`.
    /// Returns [`AppError::Conflict`] if the custom alias is taken.
    /// Returns [`AppError::Unavailable`] if no free code was found or the store timed out.
    pub async fn create(&self, user_id: i64, input: CreateLink) -> Result<Link, AppError> {
        let original_url = normalize_url(&input.original_url).map_err(|e| {
            AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
        })?;

        if let Some(alias) = input.custom_alias.as_deref() {
            validate_custom_alias(alias)?;
        }

        if let Some(project_id) = input.project_id {
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
        }

        let template = NewLink {
            original_url,
            short_code: String::new(),
            custom_alias: input.custom_alias.clone(),
            user_id,
            project_id: input.project_id,
            expires_at: input.expires_at,
            created_at: Utc::now(),
        };

        let link = match input.custom_alias {
            Some(alias) => {
                self.insert(NewLink {
                    short_code: alias,
                    ..template
                })
                .await?
            }
            None => self.insert_with_generated_code(template).await?,
        };

        self.views.invalidate_link(&link).await;

        info!(
            link_id = link.id,
            code = %link.short_code,
            user_id,
            "Link created"
        );
        Ok(link)
    }

    async fn insert(&self, new_link: NewLink) -> Result<Link, AppError> {
        bounded(self.store_timeout, "create_link", self.links.create(new_link)).await
    }

    async fn insert_with_generated_code(&self, template: NewLink) -> Result<Link, AppError> {
        for attempt in 1..=MAX_CODE_ATTEMPTS {
            let candidate = NewLink {
                short_code: generate_code(self.code_length),
                ..template.clone()
            };

            match self.insert(candidate).await {
                Err(AppError::Conflict { .. }) => {
                    debug!(attempt, "Generated code collided, retrying");
                }
                other => return other,
            }
        }

        warn!(attempts = MAX_CODE_ATTEMPTS, "Could not allocate a free short code");
        Err(AppError::unavailable(
            "Failed to generate unique code",
            json!({ "attempts": MAX_CODE_ATTEMPTS }),
        ))
    }

    /// Retrieves a link by short code or alias without recording an access.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if nothing answers to `code`.
    /// Returns [`AppError::Gone`] if the link is expired, flagged or not.
    pub async fn get_by_code(&self, code: &str) -> Result<Link, AppError> {
        let link = self.find_existing(code).await?;

        if link.is_expired_at(Utc::now()) {
            return Err(AppError::gone(
                "Link has expired",
                json!({ "code": code, "expires_at": link.expires_at }),
            ));
        }

        Ok(link)
    }

    /// Changes destination and/or expiry of a link owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if nothing answers to `code`.
    /// Returns [`AppError::Forbidden`] if `user_id` does not own the link.
    /// Returns [`AppError::Validation`] if the new URL is invalid.
    pub async fn update(
        &self,
        user_id: i64,
        code: &str,
        mut patch: LinkPatch,
    ) -> Result<Link, AppError> {
        if let Some(url) = patch.original_url.as_deref() {
            let normalized = normalize_url(url).map_err(|e| {
                AppError::bad_request("Invalid URL format", json!({ "reason": e.to_string() }))
            })?;
            patch.original_url = Some(normalized);
        }

        let link = self.find_owned(user_id, code).await?;

        if patch.is_empty() {
            return Ok(link);
        }

        let updated = bounded(
            self.store_timeout,
            "update_link",
            self.links.update(link.id, user_id, patch),
        )
        .await?
        .ok_or_else(|| AppError::not_found("Link not found", json!({ "code": code })))?;

        self.views.invalidate_link(&updated).await;

        info!(link_id = updated.id, code, user_id, "Link updated");
        Ok(updated)
    }

    /// Deletes a link owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if nothing answers to `code`.
    /// Returns [`AppError::Forbidden`] if `user_id` does not own the link.
    pub async fn delete(&self, user_id: i64, code: &str) -> Result<(), AppError> {
        let link = self.find_owned(user_id, code).await?;

        let removed = bounded(
            self.store_timeout,
            "delete_link",
            self.links.delete(link.id, user_id),
        )
        .await?;

        if !removed {
            return Err(AppError::not_found("Link not found", json!({ "code": code })));
        }

        self.views.invalidate_link(&link).await;

        info!(link_id = link.id, code, user_id, "Link deleted");
        Ok(())
    }

    async fn find_existing(&self, code: &str) -> Result<Link, AppError> {
        bounded(
            self.store_timeout,
            "find_by_code",
            self.links.find_by_code(code),
        )
        .await?
        .ok_or_else(|| AppError::not_found("Link not found", json!({ "code": code })))
    }

    async fn find_owned(&self, user_id: i64, code: &str) -> Result<Link, AppError> {
        let link = self.find_existing(code).await?;

        if !link.is_owned_by(user_id) {
            return Err(AppError::forbidden(
                "Not enough permissions",
                json!({ "code": code }),
            ));
        }

        Ok(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::deadline::DEFAULT_STORE_TIMEOUT;
    use crate::domain::entities::link::fixtures::link;
    use crate::domain::repositories::{MockLinkRepository, MockProjectRepository};
    use crate::infrastructure::cache::{
        DEFAULT_CACHE_TIMEOUT, DEFAULT_VIEW_TTL, MemoryCache, popular_key, recent_key, stats_key,
    };
    use chrono::Duration as ChronoDuration;

    fn views() -> ViewCache {
        ViewCache::new(
            Arc::new(MemoryCache::default()),
            DEFAULT_VIEW_TTL,
            DEFAULT_CACHE_TIMEOUT,
        )
    }

    fn service(links: MockLinkRepository, projects: MockProjectRepository) -> LinkService {
        service_with_views(links, projects, views())
    }

    fn service_with_views(
        links: MockLinkRepository,
        projects: MockProjectRepository,
        views: ViewCache,
    ) -> LinkService {
        LinkService::new(
            Arc::new(links),
            Arc::new(projects),
            views,
            6,
            DEFAULT_STORE_TIMEOUT,
        )
    }

    fn stored(new_link: NewLink, id: i64) -> Link {
        Link {
            id,
            original_url: new_link.original_url,
            short_code: new_link.short_code,
            custom_alias: new_link.custom_alias,
            user_id: new_link.user_id,
            project_id: new_link.project_id,
            created_at: new_link.created_at,
            expires_at: new_link.expires_at,
            last_accessed_at: None,
            access_count: 0,
            is_active: true,
            is_expired: false,
        }
    }

    fn request(url: &str) -> CreateLink {
        CreateLink {
            original_url: url.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_generates_six_char_code() {
        let mut links = MockLinkRepository::new();
        links
            .expect_create()
            .withf(|l| l.short_code.len() == 6 && l.custom_alias.is_none())
            .times(1)
            .returning(|l| Ok(stored(l, 1)));

        let link = service(links, MockProjectRepository::new())
            .create(1, request("https://example.com"))
            .await
            .unwrap();

        assert_eq!(link.short_code.len(), 6);
        assert!(link.short_code.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(link.original_url, "https://example.com/");
        assert!(link.is_active);
        assert!(!link.is_expired);
        assert_eq!(link.access_count, 0);
    }

    #[tokio::test]
    async fn test_create_normalizes_url() {
        let mut links = MockLinkRepository::new();
        links
            .expect_create()
            .withf(|l| l.original_url == "https://example.com/path")
            .times(1)
            .returning(|l| Ok(stored(l, 1)));

        let result = service(links, MockProjectRepository::new())
            .create(1, request("https://EXAMPLE.COM:443/path"))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_url_before_store() {
        let mut links = MockLinkRepository::new();
        links.expect_create().times(0);

        let err = service(links, MockProjectRepository::new())
            .create(1, request("ftp://example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_retries_generated_code_on_collision() {
        let mut links = MockLinkRepository::new();
        let mut calls = 0;
        links.expect_create().times(3).returning(move |l| {
            calls += 1;
            if calls < 3 {
                Err(AppError::conflict("taken", json!({})))
            } else {
                Ok(stored(l, 9))
            }
        });

        let link = service(links, MockProjectRepository::new())
            .create(1, request("https://example.com"))
            .await
            .unwrap();

        assert_eq!(link.id, 9);
    }

    #[tokio::test]
    async fn test_create_gives_up_after_max_attempts() {
        let mut links = MockLinkRepository::new();
        links
            .expect_create()
            .times(MAX_CODE_ATTEMPTS)
            .returning(|_| Err(AppError::conflict("taken", json!({}))));

        let err = service(links, MockProjectRepository::new())
            .create(1, request("https://example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_create_with_taken_alias_fails_without_retry() {
        let mut links = MockLinkRepository::new();
        links
            .expect_create()
            .withf(|l| l.short_code == "promo" && l.custom_alias.as_deref() == Some("promo"))
            .times(1)
            .returning(|_| Err(AppError::conflict("taken", json!({}))));

        let err = service(links, MockProjectRepository::new())
            .create(
                1,
                CreateLink {
                    custom_alias: Some("promo".to_string()),
                    ..request("https://example.com")
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_create_rejects_reserved_alias() {
        let mut links = MockLinkRepository::new();
        links.expect_create().times(0);

        let err = service(links, MockProjectRepository::new())
            .create(
                1,
                CreateLink {
                    custom_alias: Some("api".to_string()),
                    ..request("https://example.com")
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_create_in_foreign_project_is_not_found() {
        let mut links = MockLinkRepository::new();
        links.expect_create().times(0);
        let mut projects = MockProjectRepository::new();
        projects
            .expect_exists_and_owned_by()
            .withf(|project_id, user_id| *project_id == 5 && *user_id == 1)
            .times(1)
            .returning(|_, _| Ok(false));

        let err = service(links, projects)
            .create(
                1,
                CreateLink {
                    project_id: Some(5),
                    ..request("https://example.com")
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_create_invalidates_list_views() {
        let views = views();
        views
            .put_links(&recent_key(10), &[link(1, "old001")])
            .await;

        let mut links = MockLinkRepository::new();
        links.expect_create().returning(|l| Ok(stored(l, 2)));

        service_with_views(links, MockProjectRepository::new(), views.clone())
            .create(1, request("https://example.com"))
            .await
            .unwrap();

        assert!(views.get_links(&recent_key(10)).await.is_none());
    }

    #[tokio::test]
    async fn test_get_by_code_reports_lazy_expiry_as_gone() {
        let mut expired = link(1, "abc123");
        expired.expires_at = Some(Utc::now() - ChronoDuration::seconds(1));

        let mut links = MockLinkRepository::new();
        links
            .expect_find_by_code()
            .returning(move |_| Ok(Some(expired.clone())));

        let err = service(links, MockProjectRepository::new())
            .get_by_code("abc123")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Gone { .. }));
    }

    #[tokio::test]
    async fn test_get_by_code_missing() {
        let mut links = MockLinkRepository::new();
        links.expect_find_by_code().returning(|_| Ok(None));

        let err = service(links, MockProjectRepository::new())
            .get_by_code("nope")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_by_non_owner_is_forbidden() {
        let mut links = MockLinkRepository::new();
        links
            .expect_find_by_code()
            .returning(|code| Ok(Some(link(1, code))));
        links.expect_update().times(0);

        let err = service(links, MockProjectRepository::new())
            .update(
                2,
                "abc123",
                LinkPatch {
                    original_url: Some("https://new.example.com".to_string()),
                    expires_at: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_update_invalidates_views_for_link() {
        let views = views();
        let original = link(1, "abc123");
        views.put_link(&stats_key("abc123"), &original).await;
        views
            .put_links(&popular_key(10), &[original.clone()])
            .await;

        let mut links = MockLinkRepository::new();
        links
            .expect_find_by_code()
            .returning(|code| Ok(Some(link(1, code))));
        links
            .expect_update()
            .withf(|id, owner, patch| {
                *id == 1
                    && *owner == 1
                    && patch.original_url.as_deref() == Some("https://new.example.com/")
            })
            .times(1)
            .returning(|id, _, patch| {
                let mut updated = link(id, "abc123");
                updated.original_url = patch.original_url.unwrap_or_default();
                Ok(Some(updated))
            });

        let updated = service_with_views(links, MockProjectRepository::new(), views.clone())
            .update(
                1,
                "abc123",
                LinkPatch {
                    original_url: Some("https://new.example.com".to_string()),
                    expires_at: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.original_url, "https://new.example.com/");
        assert!(views.get_link(&stats_key("abc123")).await.is_none());
        assert!(views.get_links(&popular_key(10)).await.is_none());
    }

    #[tokio::test]
    async fn test_empty_patch_returns_link_unchanged() {
        let mut links = MockLinkRepository::new();
        links
            .expect_find_by_code()
            .returning(|code| Ok(Some(link(1, code))));
        links.expect_update().times(0);

        let unchanged = service(links, MockProjectRepository::new())
            .update(1, "abc123", LinkPatch::default())
            .await
            .unwrap();

        assert_eq!(unchanged.short_code, "abc123");
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let mut links = MockLinkRepository::new();
        links.expect_find_by_code().returning(|_| Ok(None));
        links.expect_delete().times(0);

        let err = service(links, MockProjectRepository::new())
            .delete(1, "nope")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_by_non_owner_is_forbidden() {
        let mut links = MockLinkRepository::new();
        links
            .expect_find_by_code()
            .returning(|code| Ok(Some(link(1, code))));
        links.expect_delete().times(0);

        let err = service(links, MockProjectRepository::new())
            .delete(2, "abc123")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_delete_by_owner() {
        let mut links = MockLinkRepository::new();
        links
            .expect_find_by_code()
            .returning(|code| Ok(Some(link(1, code))));
        links
            .expect_delete()
            .withf(|id, owner| *id == 1 && *owner == 1)
            .times(1)
            .returning(|_, _| Ok(true));

        let result = service(links, MockProjectRepository::new())
            .delete(1, "abc123")
            .await;

        assert!(result.is_ok());
    }
}
