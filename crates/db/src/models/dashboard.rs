//! Aggregate counts for the dashboard.

use serde::Serialize;
use sqlx::FromRow;

/// Per-user totals, excluding soft-deleted rows.
#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct DashboardStats {
    pub total_projects: i64,
    pub total_queries: i64,
    pub total_messages: i64,
}
