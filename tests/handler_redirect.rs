mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;
use snaplink::domain::repositories::LinkRepository;

#[tokio::test]
async fn test_redirect_success() {
    let app = common::spawn_app();
    let token = app.token_for(1).await;
    let code = app.create_url(&token, "https://example.com/page").await;

    let response = app.server.get(&format!("/{code}")).await;

    response.assert_status(StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.header("location"), "https://example.com/page");
}

#[tokio::test]
async fn test_redirect_records_access() {
    let app = common::spawn_app();
    let token = app.token_for(1).await;
    let code = app.create_url(&token, "https://example.com/page").await;

    app.server.get(&format!("/{code}")).await;
    app.server.get(&format!("/{code}")).await;

    let link = app.store.find_by_code(&code).await.unwrap().unwrap();
    assert_eq!(link.access_count, 2);
    assert!(link.last_accessed_at.is_some());
}

#[tokio::test]
async fn test_redirect_not_found() {
    let app = common::spawn_app();

    let response = app.server.get("/nonexistent").await;

    response.assert_status_not_found();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_redirect_expired_is_gone_and_not_counted() {
    let app = common::spawn_app();
    let token = app.token_for(1).await;
    let link = app
        .create_link(
            &token,
            json!({
                "original_url": "https://example.com/sale",
                "expires_at": Utc::now() - Duration::minutes(1),
            }),
        )
        .await;
    let code = link["short_code"].as_str().unwrap();

    let response = app.server.get(&format!("/{code}")).await;

    response.assert_status(StatusCode::GONE);
    let stored = app.store.find_by_code(code).await.unwrap().unwrap();
    assert_eq!(stored.access_count, 0);
    assert!(stored.last_accessed_at.is_none());
}

#[tokio::test]
async fn test_redirect_by_alias() {
    let app = common::spawn_app();
    let token = app.token_for(1).await;
    app.create_link(
        &token,
        json!({ "original_url": "https://example.com/promo", "custom_alias": "promo" }),
    )
    .await;

    let response = app.server.get("/promo").await;

    response.assert_status(StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(response.header("location"), "https://example.com/promo");
}

#[tokio::test]
async fn test_inactive_link_still_redirects() {
    let app = common::spawn_app();
    let token = app.token_for(1).await;
    let code = app.create_url(&token, "https://example.com/old").await;

    app.store
        .record_access(&code, Utc::now() - Duration::days(40))
        .await
        .unwrap();
    let report = app.state.sweeper_service.mark_inactive().await.unwrap();
    assert_eq!(report.deactivated, 1);

    let response = app.server.get(&format!("/{code}")).await;

    response.assert_status(StatusCode::TEMPORARY_REDIRECT);
    let link = app.store.find_by_code(&code).await.unwrap().unwrap();
    assert!(!link.is_active);
    assert_eq!(link.access_count, 2);
}

#[tokio::test]
async fn test_redirect_does_not_require_token() {
    let app = common::spawn_app();
    let token = app.token_for(1).await;
    let code = app.create_url(&token, "https://example.com/public").await;

    app.server
        .get(&format!("/{code}"))
        .await
        .assert_status(StatusCode::TEMPORARY_REDIRECT);
}
