//! Lifecycle sweeper: time-driven link state transitions.
//!
//! Each pass is idempotent and safe to run next to live traffic. Scheduling lives
//! outside: [`SweeperService::spawn`] for an in-process interval, or the `admin sweep`
//! command for cron.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde_json::json;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, error, info, warn};

use super::deadline::bounded;
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::ViewCache;

/// Default age of the last access after which a link is marked inactive.
pub const DEFAULT_INACTIVITY_DAYS: i64 = 30;

/// Longest accepted inactivity window, about a hundred years.
pub const MAX_INACTIVITY_DAYS: i64 = 36_500;

/// The instant `days` before now.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if `days` is outside `1..=MAX_INACTIVITY_DAYS`.
pub fn inactivity_cutoff(days: i64) -> Result<DateTime<Utc>, AppError> {
    (1..=MAX_INACTIVITY_DAYS)
        .contains(&days)
        .then(|| TimeDelta::try_days(days))
        .flatten()
        .and_then(|window| Utc::now().checked_sub_signed(window))
        .ok_or_else(|| {
            AppError::bad_request(
                format!("Days must be between 1 and {MAX_INACTIVITY_DAYS}"),
                json!({ "days": days }),
            )
        })
}

/// Attempts per purged record, including the first.
const PURGE_ATTEMPTS: usize = 3;

/// Counts of what a sweep changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub expired: usize,
    pub deactivated: usize,
    pub purged: usize,
    pub failed: usize,
}

impl SweepReport {
    fn merge(&mut self, other: SweepReport) {
        self.expired += other.expired;
        self.deactivated += other.deactivated;
        self.purged += other.purged;
        self.failed += other.failed;
    }
}

pub struct SweeperService {
    links: Arc<dyn LinkRepository>,
    views: ViewCache,
    store_timeout: Duration,
    inactivity_days: i64,
}

impl SweeperService {
    pub fn new(
        links: Arc<dyn LinkRepository>,
        views: ViewCache,
        store_timeout: Duration,
        inactivity_days: i64,
    ) -> Self {
        Self {
            links,
            views,
            store_timeout,
            inactivity_days,
        }
    }

    /// Flags links past their deadline as expired and inactive, in one bulk update.
    pub async fn mark_expired(&self) -> Result<SweepReport, AppError> {
        let changed = bounded(
            self.store_timeout,
            "mark_expired",
            self.links.mark_expired(Utc::now()),
        )
        .await?;

        self.views.invalidate_links(&changed).await;

        if !changed.is_empty() {
            info!(count = changed.len(), "Marked links as expired");
        }
        Ok(SweepReport {
            expired: changed.len(),
            ..Default::default()
        })
    }

    /// Flags active links not accessed for the configured number of days as inactive.
    ///
    /// Links that were never accessed are not touched.
    pub async fn mark_inactive(&self) -> Result<SweepReport, AppError> {
        let cutoff = inactivity_cutoff(self.inactivity_days)?;

        let changed = bounded(
            self.store_timeout,
            "mark_inactive",
            self.links.mark_inactive(cutoff),
        )
        .await?;

        self.views.invalidate_links(&changed).await;

        if !changed.is_empty() {
            info!(
                count = changed.len(),
                days = self.inactivity_days,
                "Marked links as inactive"
            );
        }
        Ok(SweepReport {
            deactivated: changed.len(),
            ..Default::default()
        })
    }

    /// Deletes every link flagged as expired.
    ///
    /// Each record is deleted and invalidated on its own, with retries. A record
    /// that still fails is logged and counted, and the batch moves on.
    pub async fn purge_expired(&self) -> Result<SweepReport, AppError> {
        let candidates = bounded(
            self.store_timeout,
            "list_purgeable",
            self.links.list_purgeable(),
        )
        .await?;

        let mut report = SweepReport::default();

        for link in candidates {
            // 50ms, then 100ms, before jitter.
            let strategy = ExponentialBackoff::from_millis(2)
                .factor(25)
                .max_delay(Duration::from_secs(1))
                .map(jitter)
                .take(PURGE_ATTEMPTS - 1);

            let outcome = Retry::spawn(strategy, || {
                bounded(self.store_timeout, "purge", self.links.purge(link.id))
            })
            .await;

            match outcome {
                Ok(true) => {
                    self.views.invalidate_link(&link).await;
                    report.purged += 1;
                }
                // Already deleted since listing.
                Ok(false) => {}
                Err(e) => {
                    warn!(link_id = link.id, error = %e, "Failed to purge expired link");
                    report.failed += 1;
                }
            }
        }

        if report.purged > 0 || report.failed > 0 {
            info!(
                purged = report.purged,
                failed = report.failed,
                "Purged expired links"
            );
        }
        Ok(report)
    }

    /// Runs all three passes in order. A failing pass is logged and counted; the
    /// remaining passes still run.
    pub async fn run_once(&self) -> SweepReport {
        let mut report = SweepReport::default();

        for (pass, result) in [
            ("mark_expired", self.mark_expired().await),
            ("mark_inactive", self.mark_inactive().await),
            ("purge_expired", self.purge_expired().await),
        ] {
            match result {
                Ok(partial) => report.merge(partial),
                Err(e) => {
                    error!(pass, error = %e, "Sweep pass failed");
                    report.failed += 1;
                }
            }
        }

        report
    }

    /// Runs [`Self::run_once`] every `every`, starting immediately.
    pub fn spawn(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        info!(interval_secs = every.as_secs(), "Starting lifecycle sweeper");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let report = self.run_once().await;
                debug!(?report, "Sweep finished");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::deadline::DEFAULT_STORE_TIMEOUT;
    use crate::domain::entities::link::fixtures::link;
    use crate::domain::repositories::MockLinkRepository;
    use crate::infrastructure::cache::{
        DEFAULT_CACHE_TIMEOUT, DEFAULT_VIEW_TTL, MemoryCache, popular_key, stats_key,
    };

    fn views() -> ViewCache {
        ViewCache::new(
            Arc::new(MemoryCache::default()),
            DEFAULT_VIEW_TTL,
            DEFAULT_CACHE_TIMEOUT,
        )
    }

    fn sweeper(links: MockLinkRepository, views: ViewCache) -> SweeperService {
        SweeperService::new(
            Arc::new(links),
            views,
            DEFAULT_STORE_TIMEOUT,
            DEFAULT_INACTIVITY_DAYS,
        )
    }

    fn expired(id: i64, code: &str) -> crate::domain::entities::Link {
        let mut l = link(id, code);
        l.is_expired = true;
        l.is_active = false;
        l
    }

    #[tokio::test]
    async fn test_mark_expired_invalidates_changed_links() {
        let views = views();
        views.put_link(&stats_key("abc123"), &link(1, "abc123")).await;
        views.put_links(&popular_key(10), &[link(1, "abc123")]).await;

        let mut links = MockLinkRepository::new();
        links
            .expect_mark_expired()
            .times(1)
            .returning(|_| Ok(vec![expired(1, "abc123")]));

        let report = sweeper(links, views.clone()).mark_expired().await.unwrap();

        assert_eq!(report.expired, 1);
        assert!(views.get_link(&stats_key("abc123")).await.is_none());
        assert!(views.get_links(&popular_key(10)).await.is_none());
    }

    #[tokio::test]
    async fn test_mark_inactive_uses_configured_cutoff() {
        let mut links = MockLinkRepository::new();
        links
            .expect_mark_inactive()
            .withf(|cutoff| {
                let age = Utc::now() - *cutoff;
                age >= chrono::Duration::days(30) && age < chrono::Duration::days(31)
            })
            .times(1)
            .returning(|_| Ok(vec![]));

        let report = sweeper(links, views()).mark_inactive().await.unwrap();

        assert_eq!(report, SweepReport::default());
    }

    #[test]
    fn test_inactivity_cutoff_bounds() {
        assert!(inactivity_cutoff(1).is_ok());
        assert!(inactivity_cutoff(MAX_INACTIVITY_DAYS).is_ok());
        assert!(matches!(inactivity_cutoff(0), Err(AppError::Validation { .. })));
        assert!(inactivity_cutoff(MAX_INACTIVITY_DAYS + 1).is_err());
        assert!(inactivity_cutoff(200_000_000).is_err());
        assert!(inactivity_cutoff(i64::MAX).is_err());
    }

    #[tokio::test]
    async fn test_oversized_window_fails_pass_without_store_call() {
        let mut links = MockLinkRepository::new();
        links.expect_mark_inactive().times(0);

        let service = SweeperService::new(
            Arc::new(links),
            views(),
            DEFAULT_STORE_TIMEOUT,
            200_000_000,
        );

        assert!(service.mark_inactive().await.is_err());
    }

    #[tokio::test]
    async fn test_purge_with_no_candidates_is_noop() {
        let mut links = MockLinkRepository::new();
        links.expect_list_purgeable().returning(|| Ok(vec![]));
        links.expect_purge().times(0);

        let report = sweeper(links, views()).purge_expired().await.unwrap();

        assert_eq!(report.purged, 0);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn test_purge_continues_past_failing_record() {
        let mut links = MockLinkRepository::new();
        links
            .expect_list_purgeable()
            .returning(|| Ok(vec![expired(1, "bad001"), expired(2, "good02")]));
        links
            .expect_purge()
            .withf(|id| *id == 1)
            .times(PURGE_ATTEMPTS)
            .returning(|_| Err(AppError::unavailable("Database unavailable", json!({}))));
        links
            .expect_purge()
            .withf(|id| *id == 2)
            .times(1)
            .returning(|_| Ok(true));

        let report = sweeper(links, views()).purge_expired().await.unwrap();

        assert_eq!(report.purged, 1);
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn test_purge_recovers_on_retry() {
        let mut links = MockLinkRepository::new();
        links
            .expect_list_purgeable()
            .returning(|| Ok(vec![expired(1, "abc123")]));
        let mut calls = 0;
        links.expect_purge().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(AppError::unavailable("Database unavailable", json!({})))
            } else {
                Ok(true)
            }
        });

        let report = sweeper(links, views()).purge_expired().await.unwrap();

        assert_eq!(report.purged, 1);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn test_run_once_keeps_going_after_failed_pass() {
        let mut links = MockLinkRepository::new();
        links
            .expect_mark_expired()
            .returning(|_| Err(AppError::unavailable("Database unavailable", json!({}))));
        links
            .expect_mark_inactive()
            .returning(|_| Ok(vec![link(3, "idle03")]));
        links.expect_list_purgeable().returning(|| Ok(vec![]));

        let report = sweeper(links, views()).run_once().await;

        assert_eq!(
            report,
            SweepReport {
                expired: 0,
                deactivated: 1,
                purged: 0,
                failed: 1,
            }
        );
    }
}
