//! Repository for the `permissions` table.

use dbpilot_core::types::DbId;
use sqlx::PgPool;

use crate::models::permission::Permission;

/// Column list shared across queries to avoid repetition.
pub(crate) const COLUMNS: &str =
    "id, project_id, allow_ddl, allow_write, allow_read, allow_delete, created_at, updated_at";

pub struct PermissionRepo;

impl PermissionRepo {
    /// The live policy for a project, if one exists.
    pub async fn find_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Option<Permission>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM permissions WHERE project_id = $1 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, Permission>(&query)
            .bind(project_id)
            .fetch_optional(pool)
            .await
    }

    /// Live policies for a batch of projects, in no particular order.
    pub async fn list_by_projects(
        pool: &PgPool,
        project_ids: &[DbId],
    ) -> Result<Vec<Permission>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM permissions \
             WHERE project_id = ANY($1) AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, Permission>(&query)
            .bind(project_ids)
            .fetch_all(pool)
            .await
    }
}
