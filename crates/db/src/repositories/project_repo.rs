//! Repository for the `projects` table.
//!
//! A project and its permission policy are written together: creation and
//! soft-deletion run in a single transaction so a project is never visible
//! without the policy it was created with.

use dbpilot_core::types::DbId;
use sqlx::PgPool;

use crate::models::permission::Permission;
use crate::models::project::{CreateProject, Project, UpdateProject};
use crate::repositories::permission_repo::COLUMNS as PERMISSION_COLUMNS;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, name, description, database_type, connection_string, \
                       created_at, updated_at";

/// Provides owner-scoped CRUD operations for projects.
pub struct ProjectRepo;

impl ProjectRepo {
    /// Insert a project and its policy in one transaction.
    ///
    /// Omitted permission flags default to `true`.
    pub async fn create(
        pool: &PgPool,
        input: &CreateProject,
    ) -> Result<(Project, Permission), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO projects (user_id, name, description, database_type, connection_string)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(input.user_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.database_type)
            .bind(&input.connection_string)
            .fetch_one(&mut *tx)
            .await?;

        let query = format!(
            "INSERT INTO permissions (project_id, allow_ddl, allow_write, allow_read, allow_delete)
             VALUES ($1, COALESCE($2, TRUE), COALESCE($3, TRUE), COALESCE($4, TRUE), COALESCE($5, TRUE))
             RETURNING {PERMISSION_COLUMNS}"
        );
        let flags = &input.permissions;
        let permission = sqlx::query_as::<_, Permission>(&query)
            .bind(project.id)
            .bind(flags.allow_ddl)
            .bind(flags.allow_write)
            .bind(flags.allow_read)
            .bind(flags.allow_delete)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((project, permission))
    }

    /// Find a project owned by `user_id`. Excludes soft-deleted rows.
    pub async fn find_owned(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects \
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's projects, most recently created first.
    pub async fn list_by_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Project>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM projects \
             WHERE user_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Project>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Update a project and, if any flag is set, its policy.
    ///
    /// Only non-`None` fields are applied. A project that predates policies
    /// gets one created, with unspecified flags defaulting to `true`.
    /// Returns `None` if the project does not exist or is not owned by `user_id`.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
        input: &UpdateProject,
    ) -> Result<Option<Project>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE projects SET
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                connection_string = COALESCE($5, connection_string)
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        let Some(project) = sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(user_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.connection_string)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let flags = &input.permissions;
        if !flags.is_empty() {
            sqlx::query(
                "INSERT INTO permissions (project_id, allow_ddl, allow_write, allow_read, allow_delete)
                 VALUES ($1, COALESCE($2, TRUE), COALESCE($3, TRUE), COALESCE($4, TRUE), COALESCE($5, TRUE))
                 ON CONFLICT (project_id) WHERE deleted_at IS NULL DO UPDATE SET
                    allow_ddl = COALESCE($2, permissions.allow_ddl),
                    allow_write = COALESCE($3, permissions.allow_write),
                    allow_read = COALESCE($4, permissions.allow_read),
                    allow_delete = COALESCE($5, permissions.allow_delete)",
            )
            .bind(project.id)
            .bind(flags.allow_ddl)
            .bind(flags.allow_write)
            .bind(flags.allow_read)
            .bind(flags.allow_delete)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(Some(project))
    }

    /// Soft-delete a project with its policy, query logs, and messages.
    ///
    /// Returns `true` if the project was marked deleted.
    pub async fn soft_delete(pool: &PgPool, id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let result = sqlx::query(
            "UPDATE projects SET deleted_at = NOW() \
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        for table in ["permissions", "query_logs", "messages"] {
            sqlx::query(&format!(
                "UPDATE {table} SET deleted_at = NOW() \
                 WHERE project_id = $1 AND deleted_at IS NULL"
            ))
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}
