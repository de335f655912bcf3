//! PostgreSQL link repository tests. Need `DATABASE_URL`; run with `--ignored`.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use snaplink::domain::entities::{LinkPatch, NewLink, NewProject};
use snaplink::domain::repositories::{LinkRepository, ProjectRepository};
use snaplink::error::AppError;
use snaplink::infrastructure::persistence::{PgLinkRepository, PgProjectRepository};

fn new_link(code: &str, alias: Option<&str>) -> NewLink {
    NewLink {
        original_url: "https://example.com/".to_string(),
        short_code: code.to_string(),
        custom_alias: alias.map(str::to_string),
        user_id: 1,
        project_id: None,
        expires_at: None,
        created_at: Utc::now(),
    }
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_create_link(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    let link = repo.create(new_link("abc123", None)).await.unwrap();

    assert_eq!(link.short_code, "abc123");
    assert_eq!(link.original_url, "https://example.com/");
    assert_eq!(link.access_count, 0);
    assert!(link.is_active);
    assert!(!link.is_expired);
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_create_duplicate_code_conflicts(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    repo.create(new_link("promo", Some("promo"))).await.unwrap();

    let result = repo.create(new_link("promo", None)).await;

    assert!(matches!(result, Err(AppError::Conflict { .. })));
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_find_by_code_not_found(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    assert!(repo.find_by_code("notfound").await.unwrap().is_none());
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_record_access_increments(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    repo.create(new_link("abc123", None)).await.unwrap();

    repo.record_access("abc123", Utc::now()).await.unwrap();
    let link = repo
        .record_access("abc123", Utc::now())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(link.access_count, 2);
    assert!(link.last_accessed_at.is_some());
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_record_access_skips_expired(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    repo.create(NewLink {
        expires_at: Some(Utc::now() - Duration::minutes(1)),
        ..new_link("old123", None)
    })
    .await
    .unwrap();

    assert!(repo.record_access("old123", Utc::now()).await.unwrap().is_none());
    let link = repo.find_by_code("old123").await.unwrap().unwrap();
    assert_eq!(link.access_count, 0);
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_update_requires_owner(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    let link = repo.create(new_link("abc123", None)).await.unwrap();
    let patch = LinkPatch {
        original_url: Some("https://example.org/".to_string()),
        expires_at: None,
    };

    assert!(repo.update(link.id, 2, patch.clone()).await.unwrap().is_none());
    let updated = repo.update(link.id, 1, patch).await.unwrap().unwrap();
    assert_eq!(updated.original_url, "https://example.org/");
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_mark_expired_then_purge(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    let stale = repo
        .create(NewLink {
            expires_at: Some(Utc::now() - Duration::minutes(1)),
            ..new_link("old123", None)
        })
        .await
        .unwrap();
    repo.create(new_link("live12", None)).await.unwrap();

    let changed = repo.mark_expired(Utc::now()).await.unwrap();
    assert_eq!(changed.len(), 1);
    assert!(changed[0].is_expired);
    assert!(!changed[0].is_active);
    assert!(repo.mark_expired(Utc::now()).await.unwrap().is_empty());

    assert_eq!(repo.list_expired(1).await.unwrap().len(), 1);
    assert!(repo.purge(stale.id).await.unwrap());
    assert!(repo.find_by_code("old123").await.unwrap().is_none());
    assert!(repo.find_by_code("live12").await.unwrap().is_some());
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_mark_inactive_skips_never_accessed(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    repo.create(new_link("fresh1", None)).await.unwrap();
    repo.create(new_link("dusty1", None)).await.unwrap();
    repo.record_access("dusty1", Utc::now() - Duration::days(40))
        .await
        .unwrap();

    let changed = repo
        .mark_inactive(Utc::now() - Duration::days(30))
        .await
        .unwrap();

    assert_eq!(changed.len(), 1);
    assert_eq!(changed[0].short_code, "dusty1");
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_popular_order(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    repo.create(new_link("aaa111", None)).await.unwrap();
    repo.create(new_link("bbb222", None)).await.unwrap();
    repo.create(new_link("ccc333", None)).await.unwrap();
    repo.record_access("ccc333", Utc::now()).await.unwrap();

    let codes: Vec<String> = repo
        .list_popular(10)
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.short_code)
        .collect();

    assert_eq!(codes, vec!["ccc333", "aaa111", "bbb222"]);
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_overview_counts(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));
    repo.create(new_link("abc123", None)).await.unwrap();
    repo.create(new_link("def456", None)).await.unwrap();
    repo.record_access("abc123", Utc::now()).await.unwrap();

    let overview = repo.overview(1).await.unwrap();

    assert_eq!(overview.total_links, 2);
    assert_eq!(overview.total_clicks, 1);
    assert_eq!(overview.active_links, 2);
    assert_eq!(repo.overview(2).await.unwrap().total_links, 0);
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_detach_project(pool: PgPool) {
    let pool = Arc::new(pool);
    let projects = PgProjectRepository::new(pool.clone());
    let repo = PgLinkRepository::new(pool);
    let project = projects
        .create(NewProject {
            name: "Spring".to_string(),
            description: None,
            user_id: 1,
        })
        .await
        .unwrap();
    repo.create(NewLink {
        project_id: Some(project.id),
        ..new_link("abc123", None)
    })
    .await
    .unwrap();

    let detached = repo.detach_project(project.id).await.unwrap();

    assert_eq!(detached.len(), 1);
    assert!(detached[0].project_id.is_none());
    assert!(repo.list_by_project(project.id).await.unwrap().is_empty());
}

#[sqlx::test]
#[ignore = "requires PostgreSQL"]
async fn test_ping(pool: PgPool) {
    let repo = PgLinkRepository::new(Arc::new(pool));

    assert!(repo.ping().await.is_ok());
}
