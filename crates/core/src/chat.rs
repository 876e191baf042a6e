//! Chat message roles and the stored form of assistant replies.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Prefix of the assistant message stored when generation fails.
pub const GENERATION_FAILED_PREFIX: &str =
    "I'm sorry, I encountered an error while processing your request: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured assistant reply: prose plus an optional proposed statement.
///
/// Persisted as JSON in the message `content` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantReply {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl AssistantReply {
    /// Build a reply, treating a blank proposed query as no query.
    pub fn new(content: impl Into<String>, query: Option<String>) -> Self {
        Self {
            content: content.into(),
            query: query.filter(|q| !q.trim().is_empty()),
        }
    }

    pub fn encode(&self) -> Result<String, CoreError> {
        serde_json::to_string(self).map_err(|e| CoreError::Internal(e.to_string()))
    }

    /// Parse stored assistant content. Returns `None` for plain-text content,
    /// such as the apology stored after a failed generation.
    pub fn decode(stored: &str) -> Option<Self> {
        serde_json::from_str(stored).ok()
    }
}

/// Text stored as the assistant's reply when generation fails.
pub fn generation_failed_message(detail: &str) -> String {
    format!("{GENERATION_FAILED_PREFIX}{detail}")
}

/// Reject empty chat input.
pub fn validate_question(content: &str) -> Result<(), CoreError> {
    if content.trim().is_empty() {
        return Err(CoreError::Validation("Message content is required".into()));
    }
    Ok(())
}
