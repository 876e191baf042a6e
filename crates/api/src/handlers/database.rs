//! Handlers for project-scoped database operations.
//!
//! Connection management talks to the SQL proxy directly. Statement execution
//! and validation go through the [`ExecutionCoordinator`], which classifies,
//! authorizes against the project's policy, delegates, and audits.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use dbpilot_core::coordinator::{ExecutionCoordinator, ExecutionReport, ExecutionRequest};
use dbpilot_core::execution::ValidationResult;
use dbpilot_core::types::DbId;
use dbpilot_proxy::types::{ConnectDbResponse, ConnectionInfo, DisconnectDbResponse};
use serde::Deserialize;

use crate::error::AppResult;
use crate::handlers::project::find_owned_project;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Request body for `POST /projects/{id}/execute-sql`.
#[derive(Debug, Deserialize)]
pub struct ExecuteSqlBody {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub dry_run: bool,
}

/// Request body for `POST /projects/{id}/validate-sql`.
#[derive(Debug, Deserialize)]
pub struct ValidateSqlBody {
    #[serde(default)]
    pub query: String,
}

/// POST /api/projects/{id}/connect-db
pub async fn connect_db(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<ConnectDbResponse>> {
    let project = find_owned_project(&state, id, auth.user_id).await?;

    let response = state
        .proxy
        .connect_db(&project.database_type, &project.connection_string)
        .await?;

    tracing::info!(
        user_id = auth.user_id,
        project_id = id,
        database_type = %project.database_type,
        connected = response.connection_info.connected,
        "Connected project database"
    );
    Ok(Json(response))
}

/// POST /api/projects/{id}/disconnect-db
pub async fn disconnect_db(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DisconnectDbResponse>> {
    find_owned_project(&state, id, auth.user_id).await?;

    let response = state.proxy.disconnect_db().await?;
    tracing::info!(user_id = auth.user_id, project_id = id, "Disconnected project database");
    Ok(Json(response))
}

/// GET /api/projects/{id}/db-info
pub async fn db_info(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<ConnectionInfo>> {
    find_owned_project(&state, id, auth.user_id).await?;

    let info = state.proxy.db_info().await?;
    Ok(Json(info))
}

/// POST /api/projects/{id}/execute-sql
///
/// Runs (or dry-runs) one statement if the project's policy allows its class.
/// Every attempt that reaches the proxy is written to the query log.
pub async fn execute_sql(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<ExecuteSqlBody>,
) -> AppResult<Json<ExecutionReport>> {
    let coordinator = ExecutionCoordinator::new(
        state.gate_store.clone(),
        Arc::clone(&state.proxy),
        state.config.execution_timeout(),
    );

    let report = coordinator
        .execute(&ExecutionRequest {
            principal_id: auth.user_id,
            project_id: id,
            query: body.query,
            dry_run: body.dry_run,
        })
        .await?;

    Ok(Json(report))
}

/// POST /api/projects/{id}/validate-sql
///
/// Explains a statement without running it. Requires read permission.
pub async fn validate_sql(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(body): Json<ValidateSqlBody>,
) -> AppResult<Json<ValidationResult>> {
    let coordinator = ExecutionCoordinator::new(
        state.gate_store.clone(),
        Arc::clone(&state.proxy),
        state.config.execution_timeout(),
    );

    let result = coordinator.validate(auth.user_id, id, &body.query).await?;
    Ok(Json(result))
}
