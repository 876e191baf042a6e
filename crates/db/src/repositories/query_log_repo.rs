//! Repository for the append-only `query_logs` table.

use dbpilot_core::audit::QueryLogEntry;
use dbpilot_core::types::DbId;
use sqlx::PgPool;

use crate::models::query_log::QueryLog;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_id, query, query_type, status, result, error, \
                       rows_affected, execution_time_ms, created_at";

/// Insert and read audit rows. There is deliberately no update method.
pub struct QueryLogRepo;

impl QueryLogRepo {
    /// Append one audit row.
    pub async fn create(pool: &PgPool, entry: &QueryLogEntry) -> Result<QueryLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO query_logs
                (project_id, query, query_type, status, result, error, rows_affected, execution_time_ms)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, QueryLog>(&query)
            .bind(entry.project_id)
            .bind(&entry.query)
            .bind(&entry.query_type)
            .bind(entry.status.as_str())
            .bind(&entry.result)
            .bind(&entry.error)
            .bind(entry.rows_affected)
            .bind(entry.execution_time_ms)
            .fetch_one(pool)
            .await
    }

    /// A project's audit rows, newest first.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<QueryLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM query_logs \
             WHERE project_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, QueryLog>(&query)
            .bind(project_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count_by_project(pool: &PgPool, project_id: DbId) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM query_logs WHERE project_id = $1 AND deleted_at IS NULL",
        )
        .bind(project_id)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }
}
