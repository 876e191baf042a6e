//! Gated execution through the HTTP layer against a mock SQL proxy.
//!
//! Each test checks both the response and the audit trail it leaves behind.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::{body_json, get_auth, post_auth, post_json_auth, project_body, put_json_auth};
use serde_json::{json, Value};
use sqlx::PgPool;
use wiremock::matchers::{body_json as body_matches, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Fixture {
    pool: PgPool,
    server: MockServer,
    token: String,
    project_id: i64,
}

impl Fixture {
    async fn new(pool: PgPool, flags: Value) -> Self {
        let server = MockServer::start().await;
        let app = common::build_test_app(pool.clone(), &server.uri());
        let (_, token) = common::signup(app.clone(), "exec@example.com").await;
        let project_id = common::create_project(app, &token, project_body(flags)).await;
        Self {
            pool,
            server,
            token,
            project_id,
        }
    }

    fn app(&self) -> axum::Router {
        common::build_test_app(self.pool.clone(), &self.server.uri())
    }

    async fn execute(&self, body: Value) -> axum::http::Response<axum::body::Body> {
        let uri = format!("/api/projects/{}/execute-sql", self.project_id);
        post_json_auth(self.app(), &uri, body, &self.token).await
    }

    async fn query_logs(&self) -> Vec<Value> {
        let uri = format!("/api/projects/{}/queries", self.project_id);
        let response = get_auth(self.app(), &uri, &self.token).await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["data"].as_array().unwrap().clone()
    }
}

// ---------------------------------------------------------------------------
// Policy scenarios
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_read_denied_never_reaches_proxy(pool: PgPool) {
    let fx = Fixture::new(pool, json!({"allow_read": false})).await;
    Mock::given(method("POST"))
        .and(path("/execute-sql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(0)
        .mount(&fx.server)
        .await;

    let response = fx.execute(json!({"query": "SELECT * FROM users;"})).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "FORBIDDEN");
    assert_eq!(json["error"], "Read operations are not allowed for this project");
    assert!(fx.query_logs().await.is_empty(), "denials leave no audit row");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_allowed_ddl_is_delegated_and_logged(pool: PgPool) {
    let fx = Fixture::new(pool, json!({"allow_ddl": true})).await;
    Mock::given(method("POST"))
        .and(path("/execute-sql"))
        .and(body_matches(json!({"query": "DROP TABLE users;"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "query_type": "DROP",
            "message": "Table dropped"
        })))
        .expect(1)
        .mount(&fx.server)
        .await;

    let response = fx.execute(json!({"query": "DROP TABLE users;"})).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["query_type"], "DDL");
    assert_eq!(json["result"]["success"], true);
    assert!(json["query_log_id"].is_i64());
    assert!(json["execution_time_ms"].is_i64());

    let logs = fx.query_logs().await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["id"], json["query_log_id"]);
    assert_eq!(logs[0]["status"], "success");
    assert_eq!(logs[0]["query_type"], "DDL");
    assert_eq!(logs[0]["query"], "DROP TABLE users;");
    assert_eq!(logs[0]["result"], "Table dropped");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_backend_error_is_logged_and_surfaced(pool: PgPool) {
    let fx = Fixture::new(pool, json!({})).await;
    Mock::given(method("POST"))
        .and(path("/execute-sql"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"detail": "connection refused"})),
        )
        .expect(1)
        .mount(&fx.server)
        .await;

    let response = fx
        .execute(json!({"query": "UPDATE users SET name='x' WHERE id=1;"}))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["code"], "EXECUTION_FAILED");
    assert_eq!(json["error"], "proxy error (500): connection refused");

    let logs = fx.query_logs().await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["status"], "error");
    assert_eq!(logs[0]["query_type"], "UPDATE");
    assert_eq!(logs[0]["error"], "proxy error (500): connection refused");
    assert!(logs[0]["rows_affected"].is_null());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_validate_requires_read_regardless_of_class(pool: PgPool) {
    let fx = Fixture::new(pool, json!({"allow_read": false})).await;
    Mock::given(method("POST"))
        .and(path("/validate-sql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(0)
        .mount(&fx.server)
        .await;

    let uri = format!("/api/projects/{}/validate-sql", fx.project_id);
    let response =
        post_json_auth(fx.app(), &uri, json!({"query": "DELETE FROM orders"}), &fx.token).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(fx.query_logs().await.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_validate_returns_plan(pool: PgPool) {
    let fx = Fixture::new(pool, json!({})).await;
    Mock::given(method("POST"))
        .and(path("/validate-sql"))
        .and(body_matches(json!({"query": "DELETE FROM orders"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "dry_run": true,
            "explain": ["Delete on orders", "  ->  Seq Scan on orders"],
            "message": "Query validated successfully"
        })))
        .mount(&fx.server)
        .await;

    let uri = format!("/api/projects/{}/validate-sql", fx.project_id);
    let response =
        post_json_auth(fx.app(), &uri, json!({"query": "DELETE FROM orders"}), &fx.token).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["explain"][0], "Delete on orders");
    assert!(fx.query_logs().await.is_empty(), "validation is not audited");
}

// ---------------------------------------------------------------------------
// Edge cases
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_blank_query_is_rejected(pool: PgPool) {
    let fx = Fixture::new(pool, json!({})).await;

    let response = fx.execute(json!({"query": "   "})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Query is required");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_dry_run_is_forwarded(pool: PgPool) {
    let fx = Fixture::new(pool, json!({})).await;
    Mock::given(method("POST"))
        .and(path("/execute-sql"))
        .and(body_matches(json!({"query": "DELETE FROM orders", "dry_run": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "dry_run": true,
            "explain": ["Delete on orders"]
        })))
        .expect(1)
        .mount(&fx.server)
        .await;

    let response = fx
        .execute(json!({"query": "DELETE FROM orders", "dry_run": true}))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["query_type"], "DELETE");
    assert_eq!(json["result"]["dry_run"], true);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_slow_backend_times_out_and_is_logged(pool: PgPool) {
    let fx = Fixture::new(pool, json!({})).await;
    Mock::given(method("POST"))
        .and(path("/execute-sql"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true}))
                .set_delay(Duration::from_secs(4)),
        )
        .mount(&fx.server)
        .await;

    let response = fx.execute(json!({"query": "SELECT pg_sleep(10)"})).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Query execution timed out after 2000ms");

    let logs = fx.query_logs().await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["status"], "error");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_policy_change_applies_to_next_request(pool: PgPool) {
    let fx = Fixture::new(pool, json!({})).await;
    Mock::given(method("POST"))
        .and(path("/execute-sql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "affected_rows": 3
        })))
        .expect(1)
        .mount(&fx.server)
        .await;

    let update = json!({"query": "UPDATE orders SET shipped = true"});
    let response = fx.execute(update.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let uri = format!("/api/projects/{}", fx.project_id);
    let response = put_json_auth(fx.app(), &uri, json!({"allow_write": false}), &fx.token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = fx.execute(update).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Write operations are not allowed for this project");

    let logs = fx.query_logs().await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["result"], "Affected rows: 3");
    assert_eq!(logs[0]["rows_affected"], 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_other_users_project_is_not_found(pool: PgPool) {
    let fx = Fixture::new(pool, json!({})).await;
    let (_, intruder) = common::signup(fx.app(), "intruder@example.com").await;

    let uri = format!("/api/projects/{}/execute-sql", fx.project_id);
    let response = post_json_auth(fx.app(), &uri, json!({"query": "SELECT 1"}), &intruder).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Connection management
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_connect_sends_project_connection(pool: PgPool) {
    let fx = Fixture::new(pool, json!({})).await;
    Mock::given(method("POST"))
        .and(path("/connect-db"))
        .and(body_matches(json!({
            "db_type": "postgresql",
            "connection_string": "postgres://app@db/shop"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Connected",
            "connection_info": {"type": "postgresql", "host": "db", "port": 5432, "database": "shop", "connected": true}
        })))
        .expect(1)
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/db-info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "postgresql", "host": "db", "port": 5432, "database": "shop", "connected": true
        })))
        .mount(&fx.server)
        .await;

    let uri = format!("/api/projects/{}/connect-db", fx.project_id);
    let response = post_auth(fx.app(), &uri, &fx.token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["connection_info"]["database"], "shop");

    let uri = format!("/api/projects/{}/db-info", fx.project_id);
    let response = get_auth(fx.app(), &uri, &fx.token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["type"], "postgresql");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_proxy_failure_on_disconnect_is_502(pool: PgPool) {
    let fx = Fixture::new(pool, json!({})).await;
    Mock::given(method("POST"))
        .and(path("/disconnect-db"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "No database connected"})),
        )
        .mount(&fx.server)
        .await;

    let uri = format!("/api/projects/{}/disconnect-db", fx.project_id);
    let response = post_auth(fx.app(), &uri, &fx.token).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["code"], "PROXY_ERROR");
    assert_eq!(json["error"], "proxy error (400): No database connected");
}
