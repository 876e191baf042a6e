//! Chat message rows.

use dbpilot_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `messages` table. `content` is plain text for user
/// messages and a JSON reply envelope for assistant messages.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Message {
    pub id: DbId,
    pub project_id: DbId,
    pub role: String,
    pub content: String,
    pub created_at: Timestamp,
}
