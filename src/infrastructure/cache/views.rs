//! Cached read views and their invalidation rules.
//!
//! Only aggregate views live here: the popular and recent listings and per-link
//! stats. Redirects never read from this cache.

use super::service::{CacheError, CacheService};
use crate::domain::entities::Link;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_VIEW_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_millis(250);

const POPULAR_PATTERN: &str = "popular_links:*";
const RECENT_PATTERN: &str = "recent_links:*";

pub fn popular_key(limit: i64) -> String {
    format!("popular_links:{limit}")
}

pub fn recent_key(limit: i64) -> String {
    format!("recent_links:{limit}")
}

pub fn stats_key(code: &str) -> String {
    format!("link_stats:{code}")
}

/// Denormalized link record stored in cached views.
///
/// Carries every [`Link`] field so a hit can be rendered without touching the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSnapshot {
    pub id: i64,
    pub original_url: String,
    pub short_code: String,
    pub custom_alias: Option<String>,
    pub user_id: i64,
    pub project_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub access_count: i64,
    pub is_active: bool,
    pub is_expired: bool,
}

impl From<&Link> for LinkSnapshot {
    fn from(link: &Link) -> Self {
        Self {
            id: link.id,
            original_url: link.original_url.clone(),
            short_code: link.short_code.clone(),
            custom_alias: link.custom_alias.clone(),
            user_id: link.user_id,
            project_id: link.project_id,
            created_at: link.created_at,
            expires_at: link.expires_at,
            last_accessed_at: link.last_accessed_at,
            access_count: link.access_count,
            is_active: link.is_active,
            is_expired: link.is_expired,
        }
    }
}

impl From<LinkSnapshot> for Link {
    fn from(s: LinkSnapshot) -> Self {
        Self {
            id: s.id,
            original_url: s.original_url,
            short_code: s.short_code,
            custom_alias: s.custom_alias,
            user_id: s.user_id,
            project_id: s.project_id,
            created_at: s.created_at,
            expires_at: s.expires_at,
            last_accessed_at: s.last_accessed_at,
            access_count: s.access_count,
            is_active: s.is_active,
            is_expired: s.is_expired,
        }
    }
}

/// Fail-open view cache over any [`CacheService`] backend.
///
/// Every backend call is bounded by a timeout. Failures are logged and then
/// behave as a miss (reads) or are dropped (writes and invalidations), so a dead
/// cache slows list endpoints down but never fails them.
#[derive(Clone)]
pub struct ViewCache {
    backend: Arc<dyn CacheService>,
    ttl: Duration,
    timeout: Duration,
}

impl ViewCache {
    pub fn new(backend: Arc<dyn CacheService>, ttl: Duration, timeout: Duration) -> Self {
        Self {
            backend,
            ttl,
            timeout,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.backend()
    }

    pub async fn health_check(&self) -> bool {
        tokio::time::timeout(self.timeout, self.backend.health_check())
            .await
            .unwrap_or(false)
    }

    pub async fn get_links(&self, key: &str) -> Option<Vec<Link>> {
        let snapshots: Vec<LinkSnapshot> = self.get_json(key).await?;
        Some(snapshots.into_iter().map(Link::from).collect())
    }

    pub async fn put_links(&self, key: &str, links: &[Link]) {
        let snapshots: Vec<LinkSnapshot> = links.iter().map(LinkSnapshot::from).collect();
        self.put_json(key, &snapshots).await;
    }

    pub async fn get_link(&self, key: &str) -> Option<Link> {
        self.get_json::<LinkSnapshot>(key).await.map(Link::from)
    }

    pub async fn put_link(&self, key: &str, link: &Link) {
        self.put_json(key, &LinkSnapshot::from(link)).await;
    }

    /// Drops every view that could contain `link`.
    pub async fn invalidate_link(&self, link: &Link) {
        self.invalidate_links(std::slice::from_ref(link)).await;
    }

    /// Drops the stats views of every link in `links`, then all listings once.
    pub async fn invalidate_links(&self, links: &[Link]) {
        if links.is_empty() {
            return;
        }
        for code in links.iter().flat_map(Link::codes) {
            let key = stats_key(code);
            self.bounded("delete", &key, self.backend.delete(&key)).await;
        }
        self.invalidate_lists().await;
    }

    /// Drops all popular and recent listings, whatever their limit.
    pub async fn invalidate_lists(&self) {
        for pattern in [POPULAR_PATTERN, RECENT_PATTERN] {
            if let Some(removed) = self
                .bounded("delete_matching", pattern, self.backend.delete_matching(pattern))
                .await
            {
                debug!(pattern, removed, "Invalidated cached views");
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.bounded("get", key, self.backend.get(key)).await??;

        match serde_json::from_str(&raw) {
            Ok(value) => {
                debug!(key, "Cache hit");
                Some(value)
            }
            Err(e) => {
                warn!(
                    key,
                    error = %CacheError::Decode(e.to_string()),
                    "Discarding undecodable cache entry"
                );
                self.bounded("delete", key, self.backend.delete(key)).await;
                None
            }
        }
    }

    async fn put_json<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "Failed to encode cache entry");
                return;
            }
        };
        self.bounded("set", key, self.backend.set(key, &raw, self.ttl)).await;
    }

    /// Runs a backend call under the timeout, logging and swallowing any failure.
    async fn bounded<T>(
        &self,
        op: &'static str,
        key: &str,
        call: impl Future<Output = Result<T, CacheError>>,
    ) -> Option<T> {
        let outcome = match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(self.timeout)),
        };

        match outcome {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(
                    op,
                    key,
                    backend = self.backend.backend(),
                    error = %e,
                    "Cache call failed, continuing without cache"
                );
                None
            }
        }
    }
}
