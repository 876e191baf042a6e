//! Handlers for the project chat: ask a question, get prose plus an optional
//! proposed statement back.
//!
//! A proposed statement is never executed here. It is recorded in the query
//! log with status `generated` so the audit trail shows what was suggested.

use axum::extract::{Path, State};
use axum::Json;
use dbpilot_core::audit::generated_log_entry;
use dbpilot_core::chat::{generation_failed_message, validate_question, AssistantReply, MessageRole};
use dbpilot_core::types::{DbId, Timestamp};
use dbpilot_db::models::message::Message;
use dbpilot_db::repositories::{MessageRepo, QueryLogRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::handlers::project::find_owned_project;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /chat/{project_id}`.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub content: String,
}

/// One message as shown to the client.
///
/// Assistant replies that carry the structured envelope are returned in
/// `ai_response`; everything else is plain `content`.
#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub id: DbId,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_response: Option<AssistantReply>,
    pub created_at: Timestamp,
}

impl From<Message> for ChatMessage {
    fn from(message: Message) -> Self {
        let reply = match MessageRole::parse(&message.role) {
            Some(MessageRole::Assistant) => AssistantReply::decode(&message.content),
            _ => None,
        };
        let (content, ai_response) = match reply {
            Some(reply) => (None, Some(reply)),
            None => (Some(message.content), None),
        };
        Self {
            id: message.id,
            role: message.role,
            content,
            ai_response,
            created_at: message.created_at,
        }
    }
}

/// Response for `POST /chat/{project_id}`.
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub user_message: ChatMessage,
    pub assistant_message: ChatMessage,
    /// Audit row for the proposed statement, if one was proposed and logged.
    pub query_log_id: Option<DbId>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/chat/{project_id}
pub async fn send_message(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
    Json(input): Json<SendMessageRequest>,
) -> AppResult<Json<SendMessageResponse>> {
    let project = find_owned_project(&state, project_id, auth.user_id).await?;
    validate_question(&input.content)?;

    let user_message =
        MessageRepo::create(&state.pool, project_id, MessageRole::User, &input.content).await?;

    let generated = match state
        .proxy
        .generate_sql(&input.content, &project.database_type, "")
        .await
    {
        Ok(generated) => generated,
        Err(err) => {
            tracing::warn!(
                user_id = auth.user_id,
                project_id,
                error = %err,
                "SQL generation failed"
            );
            record_apology(&state, project_id, &err.to_string()).await;
            return Err(AppError::Proxy(err));
        }
    };

    let reply = AssistantReply::new(generated.content, Some(generated.query));
    let assistant_message =
        MessageRepo::create(&state.pool, project_id, MessageRole::Assistant, &reply.encode()?)
            .await?;

    let query_log_id = match &reply.query {
        Some(query) => record_generated_query(&state, project_id, query).await,
        None => None,
    };

    tracing::info!(
        user_id = auth.user_id,
        project_id,
        proposed_query = reply.query.is_some(),
        "Chat reply generated"
    );

    Ok(Json(SendMessageResponse {
        user_message: user_message.into(),
        assistant_message: assistant_message.into(),
        query_log_id,
    }))
}

/// GET /api/chat/{project_id}/history
pub async fn history(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(project_id): Path<DbId>,
) -> AppResult<Json<Vec<ChatMessage>>> {
    find_owned_project(&state, project_id, auth.user_id).await?;

    let messages = MessageRepo::list_by_project(&state.pool, project_id).await?;
    Ok(Json(messages.into_iter().map(ChatMessage::from).collect()))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Store the assistant's apology for a failed generation. A failed write is
/// logged and never replaces the proxy error.
async fn record_apology(state: &AppState, project_id: DbId, detail: &str) {
    let apology = generation_failed_message(detail);
    if let Err(err) =
        MessageRepo::create(&state.pool, project_id, MessageRole::Assistant, &apology).await
    {
        tracing::warn!(project_id, error = %err, "Failed to store apology message");
    }
}

/// A failed write only costs the audit row; the reply is still returned.
async fn record_generated_query(state: &AppState, project_id: DbId, query: &str) -> Option<DbId> {
    let entry = generated_log_entry(project_id, query);
    match QueryLogRepo::create(&state.pool, &entry).await {
        Ok(log) => Some(log.id),
        Err(err) => {
            tracing::warn!(project_id, error = %err, "Failed to log generated query");
            None
        }
    }
}
