//! Redirect resolution: code in, destination or terminal outcome out.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::deadline::bounded;
use crate::domain::entities::{Link, Resolution};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// Resolves short codes against the store.
///
/// Never consults the view cache: every resolution sees fresh expiry state and
/// bumps the counter in the store itself.
pub struct RedirectService {
    links: Arc<dyn LinkRepository>,
    store_timeout: Duration,
}

impl RedirectService {
    pub fn new(links: Arc<dyn LinkRepository>, store_timeout: Duration) -> Self {
        Self {
            links,
            store_timeout,
        }
    }

    /// Resolves `code`, recording one access when the link is live.
    ///
    /// The access is recorded by a single conditional update that also checks
    /// expiry, so an expired link is never counted. Only when that update matches
    /// nothing is the link looked up again to tell an expired link from a missing one.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unavailable`] if the store fails or times out.
    pub async fn resolve(&self, code: &str) -> Result<Resolution, AppError> {
        let now = Utc::now();

        let resolution = match self.record_access(code, now).await? {
            Some(link) => Resolution::Active(link),
            None => match self.find(code).await? {
                None => Resolution::Missing,
                Some(link) if link.is_expired_at(now) => Resolution::Expired(link),
                // Created between the two statements: count it now.
                Some(_) => match self.record_access(code, Utc::now()).await? {
                    Some(link) => Resolution::Active(link),
                    // Expired or deleted since the lookup.
                    None => match self.find(code).await? {
                        Some(link) => Resolution::Expired(link),
                        None => Resolution::Missing,
                    },
                },
            },
        };

        let outcome = match &resolution {
            Resolution::Active(_) => "active",
            Resolution::Expired(_) => "expired",
            Resolution::Missing => "missing",
        };
        metrics::counter!("snaplink_resolutions_total", "outcome" => outcome).increment(1);
        debug!(code, outcome, "Resolved short code");

        Ok(resolution)
    }

    async fn find(&self, code: &str) -> Result<Option<Link>, AppError> {
        bounded(
            self.store_timeout,
            "find_by_code",
            self.links.find_by_code(code),
        )
        .await
    }

    async fn record_access(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Link>, AppError> {
        bounded(
            self.store_timeout,
            "record_access",
            self.links.record_access(code, now),
        )
        .await
    }
}
