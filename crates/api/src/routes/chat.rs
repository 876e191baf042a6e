//! Route definitions for the `/chat` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::chat;
use crate::state::AppState;

/// Routes mounted at `/chat`.
///
/// ```text
/// POST /{project_id}            -> send_message
/// GET  /{project_id}/history    -> history
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{project_id}", post(chat::send_message))
        .route("/{project_id}/history", get(chat::history))
}
