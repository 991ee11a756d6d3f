//! Shared helpers for the HTTP integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use discover_api::auth::token::generate_token;
use discover_api::cache::{CacheError, TokenStore, TOKEN_STATUS_NORMAL};
use discover_api::config::{AdminConfig, AppConfig, ShareConfig};
use discover_api::router::build_app_router;
use discover_api::state::AppState;

pub const ADMIN_ID: &str = "admin-1";
pub const USER_ID: &str = "user-2";

/// Status recorded for a kicked token.
const TOKEN_STATUS_KICKED: &str = "2";

/// Build a test `AppConfig` with one discover admin and a fixed secret.
pub fn test_config() -> AppConfig {
    AppConfig {
        share: ShareConfig {
            discover_admin: vec![ADMIN_ID.to_string()],
            ..ShareConfig::default()
        },
        admin: AdminConfig {
            secret: "integration-test-secret".to_string(),
            ..AdminConfig::default()
        },
        ..AppConfig::default()
    }
}

/// In-memory [`TokenStore`] standing in for Redis.
#[derive(Default)]
pub struct MemoryTokenStore {
    statuses: Mutex<HashMap<String, HashMap<String, String>>>,
}

impl MemoryTokenStore {
    pub fn set(&self, user_id: &str, token: &str, status: &str) {
        self.statuses
            .lock()
            .unwrap()
            .entry(user_id.to_string())
            .or_default()
            .insert(token.to_string(), status.to_string());
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn token_statuses(&self, user_id: &str) -> Result<HashMap<String, String>, CacheError> {
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Router plus tokens minted against its configuration.
pub struct TestApp {
    pub app: Router,
    /// Active token for a discover admin.
    pub admin_token: String,
    /// Active token for a user who is not an admin.
    pub user_token: String,
    /// Token for the admin that the account service has kicked.
    pub revoked_token: String,
    /// Token signed with a different secret.
    pub forged_token: String,
}

/// Build the full application router with all middleware layers, using the
/// given database pool and an in-memory token store.
pub fn build_test_app(pool: PgPool) -> TestApp {
    let config = test_config();
    let tokens = Arc::new(MemoryTokenStore::default());

    let admin_token = generate_token(ADMIN_ID, 1, &config.admin).unwrap();
    let user_token = generate_token(USER_ID, 1, &config.admin).unwrap();
    let revoked_token = generate_token(ADMIN_ID, 2, &config.admin).unwrap();
    let forged_token = generate_token(
        ADMIN_ID,
        1,
        &AdminConfig {
            secret: "some-other-secret".to_string(),
            ..AdminConfig::default()
        },
    )
    .unwrap();

    tokens.set(ADMIN_ID, &admin_token, TOKEN_STATUS_NORMAL);
    tokens.set(USER_ID, &user_token, TOKEN_STATUS_NORMAL);
    tokens.set(ADMIN_ID, &revoked_token, TOKEN_STATUS_KICKED);

    let config = Arc::new(config);
    let state = AppState::new(pool, Arc::clone(&config), tokens);
    let app = build_app_router(state, &config.api).unwrap();

    TestApp {
        app,
        admin_token,
        user_token,
        revoked_token,
        forged_token,
    }
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("token", token);
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, request(Method::GET, uri, None, None)).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, request(Method::GET, uri, Some(token), None)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, request(Method::POST, uri, Some(token), Some(body))).await
}

pub async fn delete_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, request(Method::DELETE, uri, Some(token), Some(body))).await
}

/// Send raw text as a JSON body.
pub async fn post_raw_auth(app: Router, uri: &str, body: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("token", token)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Assert the status and return the parsed body.
pub async fn expect_json(response: Response<Body>, status: StatusCode) -> serde_json::Value {
    assert_eq!(response.status(), status);
    body_json(response).await
}
