//! Audit rows from the `query_logs` table.

use dbpilot_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct QueryLog {
    pub id: DbId,
    pub project_id: DbId,
    pub query: String,
    pub query_type: String,
    pub status: String,
    pub result: Option<String>,
    pub error: Option<String>,
    pub rows_affected: Option<i64>,
    pub execution_time_ms: Option<i64>,
    pub created_at: Timestamp,
}
