//! Handlers for usage totals and per-project query history.

use axum::extract::{Path, Query, State};
use axum::Json;
use dbpilot_core::pagination::{
    clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, RECENT_QUERY_COUNT,
};
use dbpilot_core::types::DbId;
use dbpilot_db::models::dashboard::DashboardStats;
use dbpilot_db::models::query_log::QueryLog;
use dbpilot_db::repositories::{DashboardRepo, QueryLogRepo};
use serde::Serialize;

use crate::error::AppResult;
use crate::handlers::project::find_owned_project;
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Response for `GET /projects/{id}/summary`.
#[derive(Debug, Serialize)]
pub struct ProjectSummary {
    pub project_id: DbId,
    pub project_name: String,
    pub database_type: String,
    pub total_queries: i64,
    pub recent_queries: Vec<QueryLog>,
}

/// GET /api/dashboard
pub async fn get_dashboard(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<DashboardStats>>> {
    let stats = DashboardRepo::stats_for_user(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: stats }))
}

/// GET /api/projects/{id}/summary
pub async fn project_summary(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProjectSummary>>> {
    let project = find_owned_project(&state, id, auth.user_id).await?;

    let total_queries = QueryLogRepo::count_by_project(&state.pool, id).await?;
    let recent_queries =
        QueryLogRepo::list_by_project(&state.pool, id, RECENT_QUERY_COUNT, 0).await?;

    Ok(Json(DataResponse {
        data: ProjectSummary {
            project_id: project.id,
            project_name: project.name,
            database_type: project.database_type,
            total_queries,
            recent_queries,
        },
    }))
}

/// GET /api/projects/{id}/queries?limit=&offset=
pub async fn list_queries(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<QueryLog>>>> {
    find_owned_project(&state, id, auth.user_id).await?;

    let limit = clamp_limit(params.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
    let offset = clamp_offset(params.offset);
    let logs = QueryLogRepo::list_by_project(&state.pool, id, limit, offset).await?;

    Ok(Json(DataResponse { data: logs }))
}
