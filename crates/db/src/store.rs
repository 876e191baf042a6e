//! PostgreSQL-backed [`GateStore`] for the execution coordinator.

use dbpilot_core::audit::QueryLogEntry;
use dbpilot_core::coordinator::{GateStore, ProjectAccess, StoreError};
use dbpilot_core::permission::PermissionPolicy;
use dbpilot_core::types::DbId;
use sqlx::PgPool;

use crate::repositories::QueryLogRepo;

/// Owner-scoped project lookup joined with its live policy, if any.
#[derive(sqlx::FromRow)]
struct AccessRow {
    project_id: DbId,
    allow_ddl: Option<bool>,
    allow_write: Option<bool>,
    allow_read: Option<bool>,
    allow_delete: Option<bool>,
}

impl AccessRow {
    fn into_access(self) -> ProjectAccess {
        let policy = match (self.allow_ddl, self.allow_write, self.allow_read, self.allow_delete) {
            (Some(allow_ddl), Some(allow_write), Some(allow_read), Some(allow_delete)) => {
                Some(PermissionPolicy {
                    allow_ddl,
                    allow_write,
                    allow_read,
                    allow_delete,
                })
            }
            _ => None,
        };
        ProjectAccess {
            project_id: self.project_id,
            policy,
        }
    }
}

/// Reads policies and appends audit rows through a shared pool.
#[derive(Clone)]
pub struct PgGateStore {
    pool: PgPool,
}

impl PgGateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl GateStore for PgGateStore {
    async fn find_project_access(
        &self,
        principal_id: DbId,
        project_id: DbId,
    ) -> Result<Option<ProjectAccess>, StoreError> {
        let row = sqlx::query_as::<_, AccessRow>(
            "SELECT p.id AS project_id, perm.allow_ddl, perm.allow_write, perm.allow_read, perm.allow_delete
             FROM projects p
             LEFT JOIN permissions perm
               ON perm.project_id = p.id AND perm.deleted_at IS NULL
             WHERE p.id = $1 AND p.user_id = $2 AND p.deleted_at IS NULL",
        )
        .bind(project_id)
        .bind(principal_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError(e.to_string()))?;

        Ok(row.map(AccessRow::into_access))
    }

    async fn append_query_log(&self, entry: &QueryLogEntry) -> Result<DbId, StoreError> {
        let log = QueryLogRepo::create(&self.pool, entry)
            .await
            .map_err(|e| StoreError(e.to_string()))?;
        tracing::debug!(
            project_id = entry.project_id,
            query_log_id = log.id,
            status = %entry.status,
            "Query log appended"
        );
        Ok(log.id)
    }
}
