//! Read-only aggregates for the dashboard.

use dbpilot_core::types::DbId;
use sqlx::PgPool;

use crate::models::dashboard::DashboardStats;

pub struct DashboardRepo;

impl DashboardRepo {
    /// Totals across all of a user's live projects.
    pub async fn stats_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<DashboardStats, sqlx::Error> {
        sqlx::query_as::<_, DashboardStats>(
            "SELECT
                (SELECT COUNT(*) FROM projects p
                  WHERE p.user_id = $1 AND p.deleted_at IS NULL) AS total_projects,
                (SELECT COUNT(*) FROM query_logs q
                  JOIN projects p ON p.id = q.project_id
                  WHERE p.user_id = $1 AND p.deleted_at IS NULL AND q.deleted_at IS NULL) AS total_queries,
                (SELECT COUNT(*) FROM messages m
                  JOIN projects p ON p.id = m.project_id
                  WHERE p.user_id = $1 AND p.deleted_at IS NULL AND m.deleted_at IS NULL) AS total_messages",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }
}
