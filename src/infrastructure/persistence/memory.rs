//! In-process storage.
//!
//! Will be destroyed on process shutdown. Backs integration tests and local runs
//! without PostgreSQL.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use tokio::sync::Mutex;

use crate::domain::entities::{Link, LinkOverview, LinkPatch, NewLink, NewProject, Project};
use crate::domain::repositories::{ApiToken, LinkRepository, ProjectRepository, TokenRepository};
use crate::error::AppError;

#[derive(Debug, Default)]
struct Tables {
    links: BTreeMap<i64, Link>,
    projects: BTreeMap<i64, Project>,
    tokens: BTreeMap<i64, ApiToken>,
    token_last_used: HashMap<i64, DateTime<Utc>>,
    next_link_id: i64,
    next_project_id: i64,
    next_token_id: i64,
}

impl Tables {
    fn code_taken(&self, code: &str) -> bool {
        self.links.values().any(|link| link.answers_to(code))
    }

    fn links_where(&self, keep: impl Fn(&Link) -> bool) -> Vec<Link> {
        self.links.values().filter(|l| keep(l)).cloned().collect()
    }
}

/// An in-memory store implementing every repository trait.
///
/// All tables sit behind one mutex, so each repository call is atomic with respect
/// to every other call. The lock is never held across any other await.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest first, ties broken by highest id.
fn newest_first(a: &Link, b: &Link) -> std::cmp::Ordering {
    b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id))
}

#[async_trait]
impl LinkRepository for MemoryStore {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let mut tables = self.tables.lock().await;

        let taken = tables.code_taken(&new_link.short_code)
            || new_link
                .custom_alias
                .as_deref()
                .is_some_and(|alias| tables.code_taken(alias));
        if taken {
            return Err(AppError::conflict(
                "Short code or custom alias already exists",
                json!({ "code": new_link.short_code }),
            ));
        }

        tables.next_link_id += 1;
        let link = Link {
            id: tables.next_link_id,
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
        };
        tables.links.insert(link.id, link.clone());

        Ok(link)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        Ok(self
            .tables
            .lock()
            .await
            .links
            .values()
            .find(|link| link.answers_to(code))
            .cloned())
    }

    async fn find_by_original_url(
        &self,
        user_id: i64,
        original_url: &str,
    ) -> Result<Vec<Link>, AppError> {
        let mut links = self
            .tables
            .lock()
            .await
            .links_where(|l| l.user_id == user_id && l.original_url == original_url);
        links.sort_by(newest_first);
        Ok(links)
    }

    async fn record_access(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Link>, AppError> {
        let mut tables = self.tables.lock().await;

        let Some(link) = tables
            .links
            .values_mut()
            .find(|link| link.answers_to(code) && !link.is_expired_at(now))
        else {
            return Ok(None);
        };

        link.access_count += 1;
        link.last_accessed_at = Some(now);
        Ok(Some(link.clone()))
    }

    async fn update(
        &self,
        id: i64,
        owner_id: i64,
        patch: LinkPatch,
    ) -> Result<Option<Link>, AppError> {
        let mut tables = self.tables.lock().await;

        let Some(link) = tables
            .links
            .get_mut(&id)
            .filter(|link| link.is_owned_by(owner_id))
        else {
            return Ok(None);
        };

        if let Some(original_url) = patch.original_url {
            link.original_url = original_url;
        }
        if let Some(expires_at) = patch.expires_at {
            link.expires_at = Some(expires_at);
        }
        Ok(Some(link.clone()))
    }

    async fn delete(&self, id: i64, owner_id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;

        let owned = tables
            .links
            .get(&id)
            .is_some_and(|link| link.is_owned_by(owner_id));
        if owned {
            tables.links.remove(&id);
        }
        Ok(owned)
    }

    async fn list_by_user(
        &self,
        user_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Link>, AppError> {
        let mut links = self
            .tables
            .lock()
            .await
            .links_where(|l| l.user_id == user_id);
        links.sort_by(newest_first);

        Ok(links
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count_by_user(&self, user_id: i64) -> Result<i64, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables.links.values().filter(|l| l.user_id == user_id).count() as i64)
    }

    async fn list_by_project(&self, project_id: i64) -> Result<Vec<Link>, AppError> {
        let mut links = self
            .tables
            .lock()
            .await
            .links_where(|l| l.project_id == Some(project_id));
        links.sort_by(newest_first);
        Ok(links)
    }

    async fn list_expired(&self, user_id: i64) -> Result<Vec<Link>, AppError> {
        let mut links = self
            .tables
            .lock()
            .await
            .links_where(|l| l.user_id == user_id && l.is_expired);
        links.sort_by(|a, b| b.expires_at.cmp(&a.expires_at).then(b.id.cmp(&a.id)));
        Ok(links)
    }

    async fn list_inactive(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<Link>, AppError> {
        let mut links = self.tables.lock().await.links_where(|l| {
            l.user_id == user_id && !l.is_active && l.last_accessed_at.is_some_and(|t| t <= since)
        });
        links.sort_by(|a, b| {
            b.last_accessed_at
                .cmp(&a.last_accessed_at)
                .then(b.id.cmp(&a.id))
        });
        Ok(links)
    }

    async fn list_popular(&self, limit: i64) -> Result<Vec<Link>, AppError> {
        let mut links = self.tables.lock().await.links_where(|l| l.is_active);
        links.sort_by(|a, b| b.access_count.cmp(&a.access_count).then(a.id.cmp(&b.id)));
        links.truncate(limit.max(0) as usize);
        Ok(links)
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Link>, AppError> {
        let mut links = self.tables.lock().await.links_where(|_| true);
        links.sort_by(newest_first);
        links.truncate(limit.max(0) as usize);
        Ok(links)
    }

    async fn overview(&self, user_id: i64) -> Result<LinkOverview, AppError> {
        let tables = self.tables.lock().await;

        Ok(tables
            .links
            .values()
            .filter(|l| l.user_id == user_id)
            .fold(LinkOverview::default(), |mut acc, link| {
                acc.total_links += 1;
                acc.total_clicks += link.access_count;
                acc.active_links += i64::from(link.is_active);
                acc
            }))
    }

    async fn mark_expired(&self, now: DateTime<Utc>) -> Result<Vec<Link>, AppError> {
        let mut tables = self.tables.lock().await;

        Ok(tables
            .links
            .values_mut()
            .filter(|l| !l.is_expired && l.expires_at.is_some_and(|deadline| deadline <= now))
            .map(|link| {
                link.is_expired = true;
                link.is_active = false;
                link.clone()
            })
            .collect())
    }

    async fn mark_inactive(&self, cutoff: DateTime<Utc>) -> Result<Vec<Link>, AppError> {
        let mut tables = self.tables.lock().await;

        Ok(tables
            .links
            .values_mut()
            .filter(|l| l.is_active && l.last_accessed_at.is_some_and(|t| t <= cutoff))
            .map(|link| {
                link.is_active = false;
                link.clone()
            })
            .collect())
    }

    async fn list_purgeable(&self) -> Result<Vec<Link>, AppError> {
        Ok(self.tables.lock().await.links_where(|l| l.is_expired))
    }

    async fn purge(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;

        let expired = tables.links.get(&id).is_some_and(|l| l.is_expired);
        if expired {
            tables.links.remove(&id);
        }
        Ok(expired)
    }

    async fn detach_project(&self, project_id: i64) -> Result<Vec<Link>, AppError> {
        let mut tables = self.tables.lock().await;

        Ok(tables
            .links
            .values_mut()
            .filter(|l| l.project_id == Some(project_id))
            .map(|link| {
                link.project_id = None;
                link.clone()
            })
            .collect())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[async_trait]
impl ProjectRepository for MemoryStore {
    async fn create(&self, new_project: NewProject) -> Result<Project, AppError> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();

        tables.next_project_id += 1;
        let project = Project {
            id: tables.next_project_id,
            name: new_project.name,
            description: new_project.description,
            user_id: new_project.user_id,
            created_at: now,
            updated_at: now,
        };
        tables.projects.insert(project.id, project.clone());

        Ok(project)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Project>, AppError> {
        Ok(self.tables.lock().await.projects.get(&id).cloned())
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Project>, AppError> {
        let mut projects: Vec<Project> = self
            .tables
            .lock()
            .await
            .projects
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(projects)
    }

    async fn exists_and_owned_by(&self, project_id: i64, user_id: i64) -> Result<bool, AppError> {
        Ok(self
            .tables
            .lock()
            .await
            .projects
            .get(&project_id)
            .is_some_and(|p| p.user_id == user_id))
    }

    async fn update(
        &self,
        id: i64,
        name: String,
        description: Option<String>,
    ) -> Result<Option<Project>, AppError> {
        let mut tables = self.tables.lock().await;

        Ok(tables.projects.get_mut(&id).map(|project| {
            project.name = name;
            project.description = description;
            project.updated_at = Utc::now();
            project.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.tables.lock().await.projects.remove(&id).is_some())
    }
}

#[async_trait]
impl TokenRepository for MemoryStore {
    async fn find_user_by_token(&self, token_hash: &str) -> Result<Option<i64>, AppError> {
        Ok(self
            .tables
            .lock()
            .await
            .tokens
            .values()
            .find(|t| t.token_hash == token_hash && t.revoked_at.is_none())
            .map(|t| t.user_id))
    }

    async fn update_last_used(&self, token_hash: &str) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;

        let id = tables
            .tokens
            .values()
            .find(|t| t.token_hash == token_hash && t.revoked_at.is_none())
            .map(|t| t.id);
        if let Some(id) = id {
            tables.token_last_used.insert(id, Utc::now());
        }
        Ok(())
    }

    async fn create_token(
        &self,
        user_id: i64,
        name: &str,
        token_hash: &str,
    ) -> Result<ApiToken, AppError> {
        let mut tables = self.tables.lock().await;

        if tables
            .tokens
            .values()
            .any(|t| t.token_hash == token_hash || t.name == name)
        {
            return Err(AppError::conflict(
                "Token already exists",
                json!({ "name": name }),
            ));
        }

        tables.next_token_id += 1;
        let token = ApiToken {
            id: tables.next_token_id,
            user_id,
            name: name.to_string(),
            token_hash: token_hash.to_string(),
            created_at: Utc::now(),
            revoked_at: None,
        };
        tables.tokens.insert(token.id, token.clone());

        Ok(token)
    }

    async fn list_tokens(&self) -> Result<Vec<ApiToken>, AppError> {
        let mut tokens: Vec<ApiToken> = self.tables.lock().await.tokens.values().cloned().collect();
        tokens.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(tokens)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ApiToken>, AppError> {
        Ok(self.tables.lock().await.tokens.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ApiToken>, AppError> {
        Ok(self
            .tables
            .lock()
            .await
            .tokens
            .values()
            .find(|t| t.name == name)
            .cloned())
    }

    async fn revoke_token(&self, id: i64) -> Result<(), AppError> {
        let mut tables = self.tables.lock().await;

        match tables.tokens.get_mut(&id) {
            Some(token) if token.revoked_at.is_none() => {
                token.revoked_at = Some(Utc::now());
                Ok(())
            }
            _ => Err(AppError::not_found(
                "Token not found or already revoked",
                json!({ "id": id }),
            )),
        }
    }
}
