pub mod auth;
pub mod chat;
pub mod dashboard;
pub mod health;
pub mod project;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/signup                                     signup (public)
/// /auth/login                                      login (public)
///
/// /projects                                        list, create
/// /projects/{id}                                   get, update, delete
/// /projects/{id}/permissions                       policy (GET)
/// /projects/{id}/connect-db                        connect proxy (POST)
/// /projects/{id}/disconnect-db                     disconnect proxy (POST)
/// /projects/{id}/db-info                           connection info (GET)
/// /projects/{id}/execute-sql                       gated execution (POST)
/// /projects/{id}/validate-sql                      gated plan-only (POST)
/// /projects/{id}/summary                           totals + recent queries (GET)
/// /projects/{id}/queries                           query log page (GET)
///
/// /chat/{project_id}                               ask the assistant (POST)
/// /chat/{project_id}/history                       conversation (GET)
///
/// /dashboard                                       per-user totals (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/projects", project::router())
        .nest("/chat", chat::router())
        .nest("/dashboard", dashboard::router())
}
