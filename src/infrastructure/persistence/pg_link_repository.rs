//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::{FromRow, PgPool};
use std::sync::Arc;

use crate::domain::entities::{Link, LinkOverview, LinkPatch, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

const LINK_COLUMNS: &str = "id, original_url, short_code, custom_alias, user_id, project_id, \
     created_at, expires_at, last_accessed_at, access_count, is_active, is_expired";

#[derive(FromRow)]
struct LinkRow {
    id: i64,
    original_url: String,
    short_code: String,
    custom_alias: Option<String>,
    user_id: i64,
    project_id: Option<i64>,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    last_accessed_at: Option<DateTime<Utc>>,
    access_count: i64,
    is_active: bool,
    is_expired: bool,
}

impl From<LinkRow> for Link {
    fn from(r: LinkRow) -> Self {
        Link {
            id: r.id,
            original_url: r.original_url,
            short_code: r.short_code,
            custom_alias: r.custom_alias,
            user_id: r.user_id,
            project_id: r.project_id,
            created_at: r.created_at,
            expires_at: r.expires_at,
            last_accessed_at: r.last_accessed_at,
            access_count: r.access_count,
            is_active: r.is_active,
            is_expired: r.is_expired,
        }
    }
}

fn into_links(rows: Vec<LinkRow>) -> Vec<Link> {
    rows.into_iter().map(Link::from).collect()
}

/// PostgreSQL repository for link storage and retrieval.
///
/// Every per-link mutation is a single statement, so row-level locking in
/// Postgres provides the atomicity the link core relies on.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn fetch_links(&self, sql: &str) -> Result<Vec<Link>, AppError> {
        let rows = sqlx::query_as::<_, LinkRow>(sql)
            .fetch_all(self.pool.as_ref())
            .await?;
        Ok(into_links(rows))
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        // The NOT EXISTS guard reports the common case cleanly; the unique index
        // on short_code still catches concurrent inserts of the same code.
        let sql = format!(
            r#"
            INSERT INTO links (original_url, short_code, custom_alias, user_id, project_id, expires_at, created_at)
            SELECT $1, $2, $3, $4, $5, $6, $7
            WHERE NOT EXISTS (
                SELECT 1 FROM links
                WHERE short_code IN ($2, $3) OR custom_alias IN ($2, $3)
            )
            RETURNING {LINK_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(&new_link.original_url)
            .bind(&new_link.short_code)
            .bind(&new_link.custom_alias)
            .bind(new_link.user_id)
            .bind(new_link.project_id)
            .bind(new_link.expires_at)
            .bind(new_link.created_at)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(Link::from).ok_or_else(|| {
            AppError::conflict(
                "Short code or custom alias already exists",
                json!({ "code": new_link.short_code }),
            )
        })
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM links WHERE short_code = $1 OR custom_alias = $1 LIMIT 1"
        );

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(code)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Link::from))
    }

    async fn find_by_original_url(
        &self,
        user_id: i64,
        original_url: &str,
    ) -> Result<Vec<Link>, AppError> {
        let sql = format!(
            r#"
            SELECT {LINK_COLUMNS} FROM links
            WHERE user_id = $1 AND original_url = $2
            ORDER BY created_at DESC, id DESC
            "#
        );

        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(user_id)
            .bind(original_url)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(into_links(rows))
    }

    async fn record_access(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Link>, AppError> {
        let sql = format!(
            r#"
            UPDATE links
            SET access_count = access_count + 1,
                last_accessed_at = $2
            WHERE (short_code = $1 OR custom_alias = $1)
              AND is_expired = FALSE
              AND (expires_at IS NULL OR expires_at > $2)
            RETURNING {LINK_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(code)
            .bind(now)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Link::from))
    }

    async fn update(
        &self,
        id: i64,
        owner_id: i64,
        patch: LinkPatch,
    ) -> Result<Option<Link>, AppError> {
        let sql = format!(
            r#"
            UPDATE links
            SET original_url = COALESCE($3, original_url),
                expires_at = COALESCE($4, expires_at)
            WHERE id = $1 AND user_id = $2
            RETURNING {LINK_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(id)
            .bind(owner_id)
            .bind(patch.original_url)
            .bind(patch.expires_at)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(Link::from))
    }

    async fn delete(&self, id: i64, owner_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM links WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_by_user(
        &self,
        user_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<Link>, AppError> {
        let sql = format!(
            r#"
            SELECT {LINK_COLUMNS} FROM links
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#
        );

        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(into_links(rows))
    }

    async fn count_by_user(&self, user_id: i64) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM links WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn list_by_project(&self, project_id: i64) -> Result<Vec<Link>, AppError> {
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM links WHERE project_id = $1 ORDER BY created_at DESC, id DESC"
        );

        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(project_id)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(into_links(rows))
    }

    async fn list_expired(&self, user_id: i64) -> Result<Vec<Link>, AppError> {
        let sql = format!(
            r#"
            SELECT {LINK_COLUMNS} FROM links
            WHERE user_id = $1 AND is_expired = TRUE
            ORDER BY expires_at DESC NULLS LAST, id DESC
            "#
        );

        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(into_links(rows))
    }

    async fn list_inactive(
        &self,
        user_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<Link>, AppError> {
        let sql = format!(
            r#"
            SELECT {LINK_COLUMNS} FROM links
            WHERE user_id = $1
              AND is_active = FALSE
              AND last_accessed_at <= $2
            ORDER BY last_accessed_at DESC, id DESC
            "#
        );

        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(user_id)
            .bind(since)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(into_links(rows))
    }

    async fn list_popular(&self, limit: i64) -> Result<Vec<Link>, AppError> {
        let sql = format!(
            r#"
            SELECT {LINK_COLUMNS} FROM links
            WHERE is_active = TRUE
            ORDER BY access_count DESC, id ASC
            LIMIT $1
            "#
        );

        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(limit)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(into_links(rows))
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<Link>, AppError> {
        let sql = format!(
            "SELECT {LINK_COLUMNS} FROM links ORDER BY created_at DESC, id DESC LIMIT $1"
        );

        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(limit)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(into_links(rows))
    }

    async fn overview(&self, user_id: i64) -> Result<LinkOverview, AppError> {
        let (total_links, total_clicks, active_links): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(access_count), 0)::BIGINT,
                COUNT(*) FILTER (WHERE is_active)
            FROM links
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(LinkOverview {
            total_links,
            total_clicks,
            active_links,
        })
    }

    async fn mark_expired(&self, now: DateTime<Utc>) -> Result<Vec<Link>, AppError> {
        let sql = format!(
            r#"
            UPDATE links
            SET is_expired = TRUE, is_active = FALSE
            WHERE expires_at <= $1 AND is_expired = FALSE
            RETURNING {LINK_COLUMNS}
            "#
        );

        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(now)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(into_links(rows))
    }

    async fn mark_inactive(&self, cutoff: DateTime<Utc>) -> Result<Vec<Link>, AppError> {
        let sql = format!(
            r#"
            UPDATE links
            SET is_active = FALSE
            WHERE last_accessed_at <= $1 AND is_active = TRUE
            RETURNING {LINK_COLUMNS}
            "#
        );

        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(cutoff)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(into_links(rows))
    }

    async fn list_purgeable(&self) -> Result<Vec<Link>, AppError> {
        self.fetch_links(&format!(
            "SELECT {LINK_COLUMNS} FROM links WHERE is_expired = TRUE ORDER BY id"
        ))
        .await
    }

    async fn purge(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM links WHERE id = $1 AND is_expired = TRUE")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn detach_project(&self, project_id: i64) -> Result<Vec<Link>, AppError> {
        let sql = format!(
            r#"
            UPDATE links
            SET project_id = NULL
            WHERE project_id = $1
            RETURNING {LINK_COLUMNS}
            "#
        );

        let rows = sqlx::query_as::<_, LinkRow>(&sql)
            .bind(project_id)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(into_links(rows))
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
