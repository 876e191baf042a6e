//! Project entity model and DTOs.

use dbpilot_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

use crate::models::permission::{Permission, PermissionFlags};

/// A project row from the `projects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub description: Option<String>,
    /// `"mysql"` or `"postgresql"`.
    pub database_type: String,
    pub connection_string: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A project together with its policy, as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectWithPermission {
    #[serde(flatten)]
    pub project: Project,
    pub permission: Option<Permission>,
}

/// DTO for creating a new project and its policy.
#[derive(Debug, Clone)]
pub struct CreateProject {
    pub user_id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub database_type: String,
    pub connection_string: String,
    /// Omitted flags default to `true`.
    pub permissions: PermissionFlags,
}

/// DTO for updating an existing project. All fields are optional.
#[derive(Debug, Clone, Default)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub connection_string: Option<String>,
    pub permissions: PermissionFlags,
}
