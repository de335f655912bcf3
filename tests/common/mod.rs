#![allow(dead_code)]

use axum::{Router, middleware, routing::get};
use axum_test::TestServer;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

use snaplink::api;
use snaplink::api::handlers::{health_handler, redirect_handler};
use snaplink::api::middleware::auth;
use snaplink::infrastructure::cache::{MemoryCache, ViewCache};
use snaplink::infrastructure::persistence::MemoryStore;
use snaplink::state::{AppState, ServiceSettings};

pub const TEST_SECRET: &str = "test-signing-secret";

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub store: MemoryStore,
    pub cache: Arc<MemoryCache>,
}

pub fn create_test_state(store: MemoryStore, cache: Arc<MemoryCache>) -> AppState {
    let links = Arc::new(store.clone());
    let projects = Arc::new(store.clone());
    let tokens = Arc::new(store);

    AppState::new(
        links,
        projects,
        tokens,
        ViewCache::new(cache, Duration::from_secs(300), Duration::from_millis(250)),
        ServiceSettings {
            code_length: 6,
            store_timeout: Duration::from_secs(5),
            inactivity_days: 30,
            token_signing_secret: TEST_SECRET.to_string(),
        },
    )
}

/// The production route table without rate limiting, which needs peer addresses.
pub fn test_router(state: AppState) -> Router {
    let api_router = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    Router::new()
        .route("/{code}", get(redirect_handler))
        .route("/health", get(health_handler))
        .nest("/api", api_router)
        .with_state(state)
}

pub fn spawn_app() -> TestApp {
    let store = MemoryStore::new();
    let cache = Arc::new(MemoryCache::default());
    let state = create_test_state(store.clone(), cache.clone());
    let server = TestServer::new(test_router(state.clone())).unwrap();

    TestApp {
        server,
        state,
        store,
        cache,
    }
}

impl TestApp {
    /// Issues a bearer token for `user_id`.
    pub async fn token_for(&self, user_id: i64) -> String {
        let (_, raw) = self
            .state
            .auth_service
            .issue_token(user_id, &format!("user-{user_id}"))
            .await
            .unwrap();
        raw
    }

    /// Creates a link through the API and returns its JSON.
    pub async fn create_link(&self, token: &str, body: Value) -> Value {
        let response = self
            .server
            .post("/api/links")
            .authorization_bearer(token)
            .json(&body)
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<Value>()
    }

    pub async fn create_url(&self, token: &str, url: &str) -> String {
        let link = self.create_link(token, json!({ "original_url": url })).await;
        link["short_code"].as_str().unwrap().to_string()
    }
}
