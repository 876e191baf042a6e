//! Handlers for the `/projects` resource and its permission policy.
//!
//! Every lookup is scoped to the authenticated owner; another user's project
//! is reported as not found.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use dbpilot_core::error::CoreError;
use dbpilot_core::project::{validate_name, validate_new_project};
use dbpilot_core::types::DbId;
use dbpilot_db::models::permission::{Permission, PermissionFlags};
use dbpilot_db::models::project::{CreateProject, Project, ProjectWithPermission, UpdateProject};
use dbpilot_db::repositories::{PermissionRepo, ProjectRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /projects`. Omitted flags default to `true`.
#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub database_type: String,
    #[serde(default)]
    pub connection_string: String,
    pub allow_ddl: Option<bool>,
    pub allow_write: Option<bool>,
    pub allow_read: Option<bool>,
    pub allow_delete: Option<bool>,
}

/// Request body for `PUT /projects/{id}`. Omitted fields are left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub connection_string: Option<String>,
    pub allow_ddl: Option<bool>,
    pub allow_write: Option<bool>,
    pub allow_read: Option<bool>,
    pub allow_delete: Option<bool>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/projects
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateProjectRequest>,
) -> AppResult<(StatusCode, Json<ProjectWithPermission>)> {
    let database_type =
        validate_new_project(&input.name, &input.database_type, &input.connection_string)?;

    let (project, permission) = ProjectRepo::create(
        &state.pool,
        &CreateProject {
            user_id: auth.user_id,
            name: input.name.trim().to_string(),
            description: input.description,
            database_type: database_type.as_str().to_string(),
            connection_string: input.connection_string,
            permissions: PermissionFlags {
                allow_ddl: input.allow_ddl,
                allow_write: input.allow_write,
                allow_read: input.allow_read,
                allow_delete: input.allow_delete,
            },
        },
    )
    .await?;

    tracing::info!(
        user_id = auth.user_id,
        project_id = project.id,
        database_type = %database_type,
        "Project created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ProjectWithPermission {
            project,
            permission: Some(permission),
        }),
    ))
}

/// GET /api/projects
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ProjectWithPermission>>> {
    let projects = ProjectRepo::list_by_user(&state.pool, auth.user_id).await?;
    let ids: Vec<DbId> = projects.iter().map(|p| p.id).collect();

    let mut policies: HashMap<DbId, Permission> =
        PermissionRepo::list_by_projects(&state.pool, &ids)
            .await?
            .into_iter()
            .map(|perm| (perm.project_id, perm))
            .collect();

    let items = projects
        .into_iter()
        .map(|project| ProjectWithPermission {
            permission: policies.remove(&project.id),
            project,
        })
        .collect();

    Ok(Json(items))
}

/// GET /api/projects/{id}
pub async fn get_by_id(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<ProjectWithPermission>> {
    let project = find_owned_project(&state, id, auth.user_id).await?;
    let permission = PermissionRepo::find_by_project(&state.pool, project.id).await?;
    Ok(Json(ProjectWithPermission {
        project,
        permission,
    }))
}

/// PUT /api/projects/{id}
pub async fn update(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProjectRequest>,
) -> AppResult<Json<ProjectWithPermission>> {
    let name = input
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    if let Some(name) = &name {
        validate_name(name)?;
    }
    let connection_string = input.connection_string.filter(|c| !c.trim().is_empty());

    let changes = UpdateProject {
        name,
        description: input.description,
        connection_string,
        permissions: PermissionFlags {
            allow_ddl: input.allow_ddl,
            allow_write: input.allow_write,
            allow_read: input.allow_read,
            allow_delete: input.allow_delete,
        },
    };

    let project = ProjectRepo::update(&state.pool, id, auth.user_id, &changes)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))?;

    if !changes.permissions.is_empty() {
        tracing::info!(
            user_id = auth.user_id,
            project_id = id,
            flags = ?changes.permissions,
            "Project permissions updated"
        );
    }

    let permission = PermissionRepo::find_by_project(&state.pool, project.id).await?;
    Ok(Json(ProjectWithPermission {
        project,
        permission,
    }))
}

/// DELETE /api/projects/{id}
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let deleted = ProjectRepo::soft_delete(&state.pool, id, auth.user_id).await?;
    if deleted {
        tracing::info!(user_id = auth.user_id, project_id = id, "Project deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))
    }
}

/// GET /api/projects/{id}/permissions
pub async fn get_permissions(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Permission>> {
    let project = find_owned_project(&state, id, auth.user_id).await?;
    let permission = PermissionRepo::find_by_project(&state.pool, project.id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Permission",
            id,
        }))?;
    Ok(Json(permission))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load a live project owned by `user_id`, or 404.
pub(crate) async fn find_owned_project(
    state: &AppState,
    id: DbId,
    user_id: DbId,
) -> AppResult<Project> {
    ProjectRepo::find_owned(&state.pool, id, user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id,
        }))
}
