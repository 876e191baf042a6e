//! Route definitions for the `/projects` resource.
//!
//! Also mounts the project-scoped database operations and query history
//! under `/projects/{id}/...`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{dashboard, database, project};
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                      -> list
/// POST   /                      -> create
/// GET    /{id}                  -> get_by_id
/// PUT    /{id}                  -> update
/// DELETE /{id}                  -> delete
/// GET    /{id}/permissions      -> get_permissions
///
/// POST   /{id}/connect-db       -> connect_db
/// POST   /{id}/disconnect-db    -> disconnect_db
/// GET    /{id}/db-info          -> db_info
/// POST   /{id}/execute-sql      -> execute_sql
/// POST   /{id}/validate-sql     -> validate_sql
///
/// GET    /{id}/summary          -> project_summary
/// GET    /{id}/queries          -> list_queries
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list).post(project::create))
        .route(
            "/{id}",
            get(project::get_by_id)
                .put(project::update)
                .delete(project::delete),
        )
        .route("/{id}/permissions", get(project::get_permissions))
        .route("/{id}/connect-db", post(database::connect_db))
        .route("/{id}/disconnect-db", post(database::disconnect_db))
        .route("/{id}/db-info", get(database::db_info))
        .route("/{id}/execute-sql", post(database::execute_sql))
        .route("/{id}/validate-sql", post(database::validate_sql))
        .route("/{id}/summary", get(dashboard::project_summary))
        .route("/{id}/queries", get(dashboard::list_queries))
}
