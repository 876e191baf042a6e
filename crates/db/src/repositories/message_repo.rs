//! Repository for the `messages` table.

use dbpilot_core::chat::MessageRole;
use dbpilot_core::types::DbId;
use sqlx::PgPool;

use crate::models::message::Message;

const COLUMNS: &str = "id, project_id, role, content, created_at";

pub struct MessageRepo;

impl MessageRepo {
    pub async fn create(
        pool: &PgPool,
        project_id: DbId,
        role: MessageRole,
        content: &str,
    ) -> Result<Message, sqlx::Error> {
        let query = format!(
            "INSERT INTO messages (project_id, role, content)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(project_id)
            .bind(role.as_str())
            .bind(content)
            .fetch_one(pool)
            .await
    }

    /// A project's conversation, oldest first.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<Message>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM messages \
             WHERE project_id = $1 AND deleted_at IS NULL \
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, Message>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }
}
