#![allow(dead_code)]

use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use dbpilot_api::auth::jwt::JwtConfig;
use dbpilot_api::config::ServerConfig;
use dbpilot_api::router::build_app_router;
use dbpilot_api::state::AppState;
use dbpilot_proxy::ProxyClient;

/// Build a test `ServerConfig` with safe defaults pointing at `proxy_url`.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default),
/// a 30-second request timeout, and a 2-second execution bound.
pub fn test_config(proxy_url: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        proxy_url: proxy_url.to_string(),
        proxy_timeout_secs: 5,
        execution_timeout_secs: 2,
        password_min_length: 8,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            expiry_hours: 1,
        },
    }
}

/// Build the full application router against `pool` and a proxy at
/// `proxy_url`, using the same middleware stack as production.
pub fn build_test_app(pool: PgPool, proxy_url: &str) -> Router {
    let config = test_config(proxy_url);
    let proxy = ProxyClient::new(proxy_url, Duration::from_secs(config.proxy_timeout_secs))
        .expect("proxy client should build");
    let state = AppState::new(pool, config.clone(), proxy);
    build_app_router(state, &config)
}

/// Router for tests that never reach the proxy.
pub fn build_app(pool: PgPool) -> Router {
    build_test_app(pool, "http://127.0.0.1:9")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn put_json_auth(app: Router, uri: &str, body: Value, token: &str) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Sign up a user through the API and return `(user_id, token)`.
pub async fn signup(app: Router, email: &str) -> (i64, String) {
    let body = serde_json::json!({
        "name": "Test User",
        "email": email,
        "password": "correct-horse-battery",
    });
    let response = post_json(app, "/api/auth/signup", body).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    let json = body_json(response).await;
    (
        json["user"]["id"].as_i64().unwrap(),
        json["token"].as_str().unwrap().to_string(),
    )
}

/// Create a project through the API and return its id.
pub async fn create_project(app: Router, token: &str, body: Value) -> i64 {
    let response = post_json_auth(app, "/api/projects", body, token).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["id"].as_i64().unwrap()
}

/// A PostgreSQL project with the given flags merged in.
pub fn project_body(flags: Value) -> Value {
    let mut body = serde_json::json!({
        "name": "Shop",
        "description": "Orders and customers",
        "database_type": "postgresql",
        "connection_string": "postgres://app@db/shop",
    });
    if let (Some(target), Some(extra)) = (body.as_object_mut(), flags.as_object()) {
        for (k, v) in extra {
            target.insert(k.clone(), v.clone());
        }
    }
    body
}
