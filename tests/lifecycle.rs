mod common;

use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use serde_json::{Value, json};
use snaplink::domain::entities::Resolution;
use snaplink::prelude::SweepReport;
use snaplink::domain::repositories::LinkRepository;
use snaplink::infrastructure::cache::{CacheService, stats_key};

async fn create_expired(app: &common::TestApp, token: &str, url: &str) -> String {
    let link = app
        .create_link(
            token,
            json!({ "original_url": url, "expires_at": Utc::now() - Duration::minutes(1) }),
        )
        .await;
    link["short_code"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_run_once_expires_then_purges() {
    let app = common::spawn_app();
    let token = app.token_for(1).await;
    let expired = create_expired(&app, &token, "https://example.com/sale").await;
    let live = app.create_url(&token, "https://example.com/live").await;

    let report = app.state.sweeper_service.run_once().await;

    assert_eq!(report.expired, 1);
    assert_eq!(report.purged, 1);
    assert_eq!(report.failed, 0);
    assert!(app.store.find_by_code(&expired).await.unwrap().is_none());
    assert!(app.store.find_by_code(&live).await.unwrap().is_some());
}

#[tokio::test]
async fn test_run_once_is_idempotent() {
    let app = common::spawn_app();
    let token = app.token_for(1).await;
    create_expired(&app, &token, "https://example.com/sale").await;

    app.state.sweeper_service.run_once().await;
    let second = app.state.sweeper_service.run_once().await;

    assert_eq!(second, SweepReport::default());
}

#[tokio::test]
async fn test_never_accessed_link_is_not_deactivated() {
    let app = common::spawn_app();
    let token = app.token_for(1).await;
    let code = app.create_url(&token, "https://example.com/fresh").await;

    let report = app.state.sweeper_service.mark_inactive().await.unwrap();

    assert_eq!(report.deactivated, 0);
    assert!(app.store.find_by_code(&code).await.unwrap().unwrap().is_active);
}

#[tokio::test]
async fn test_sweep_drops_cached_stats() {
    let app = common::spawn_app();
    let token = app.token_for(1).await;
    let link = app
        .create_link(
            &token,
            json!({
                "original_url": "https://example.com/flash",
                "expires_at": Utc::now() + Duration::milliseconds(200),
            }),
        )
        .await;
    let code = link["short_code"].as_str().unwrap();

    let before = app
        .server
        .get(&format!("/api/links/{code}/stats"))
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(before["is_expired"], false);
    assert!(app.cache.get(&stats_key(code)).await.unwrap().is_some());

    tokio::time::sleep(StdDuration::from_millis(300)).await;
    app.state.sweeper_service.mark_expired().await.unwrap();

    assert!(app.cache.get(&stats_key(code)).await.unwrap().is_none());
    let after = app
        .server
        .get(&format!("/api/links/{code}/stats"))
        .authorization_bearer(&token)
        .await
        .json::<Value>();
    assert_eq!(after["is_expired"], true);
}

#[tokio::test]
async fn test_spawned_sweeper_runs_in_background() {
    let app = common::spawn_app();
    let token = app.token_for(1).await;
    let expired = create_expired(&app, &token, "https://example.com/sale").await;

    let handle = app
        .state
        .sweeper_service
        .clone()
        .spawn(StdDuration::from_millis(20));
    tokio::time::sleep(StdDuration::from_millis(200)).await;
    handle.abort();

    assert!(app.store.find_by_code(&expired).await.unwrap().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolves_are_all_counted() {
    const RESOLVES: i64 = 50;

    let app = common::spawn_app();
    let token = app.token_for(1).await;
    let code = app.create_url(&token, "https://example.com/hot").await;

    let tasks: Vec<_> = (0..RESOLVES)
        .map(|_| {
            let redirects = app.state.redirect_service.clone();
            let code = code.clone();
            tokio::spawn(async move { redirects.resolve(&code).await })
        })
        .collect();

    for task in tasks {
        let resolution = task.await.unwrap().unwrap();
        assert!(matches!(resolution, Resolution::Active(_)));
    }

    let link = app.store.find_by_code(&code).await.unwrap().unwrap();
    assert_eq!(link.access_count, RESOLVES);
}

#[tokio::test]
async fn test_expired_resolution_carries_link() {
    let app = common::spawn_app();
    let token = app.token_for(1).await;
    let code = create_expired(&app, &token, "https://example.com/sale").await;

    let resolution = app.state.redirect_service.resolve(&code).await.unwrap();

    match resolution {
        Resolution::Expired(link) => assert_eq!(link.access_count, 0),
        other => panic!("expected an expired resolution, got {other:?}"),
    }
    assert_eq!(
        app.state.redirect_service.resolve("nothing").await.unwrap(),
        Resolution::Missing
    );
}
