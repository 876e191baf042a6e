//! Audit row construction for query attempts.
//!
//! One [`QueryLogEntry`] is built per attempt that reaches execution (and per
//! assistant-proposed query). Entries are append-only: once built with a
//! terminal status they are persisted and never updated.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classifier::{classify, QueryType};
use crate::execution::{BackendError, ExecutionResult};
use crate::types::DbId;

/// Result text stored for queries the assistant proposed but nobody ran.
pub const GENERATED_RESULT_TEXT: &str = "Query generated but not executed yet";

/// Lifecycle status of a logged query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    Success,
    Error,
    Generated,
    Pending,
}

impl QueryStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Generated => "generated",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An audit row ready to be persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryLogEntry {
    pub project_id: DbId,
    /// Raw query text exactly as submitted.
    pub query: String,
    /// String form of the classification.
    pub query_type: String,
    pub status: QueryStatus,
    pub result: Option<String>,
    pub error: Option<String>,
    pub rows_affected: Option<i64>,
    /// Wall-clock milliseconds around the delegated call.
    pub execution_time_ms: Option<i64>,
}

/// Build the audit row for an execution attempt.
///
/// On success the result column holds, in order of preference: a JSON
/// snapshot of a read with rows, an `"Affected rows: N"` summary for a write,
/// or the backend's plain message. On failure only the error text is kept.
pub fn build_log_entry(
    project_id: DbId,
    query: &str,
    query_type: QueryType,
    outcome: &Result<ExecutionResult, BackendError>,
    elapsed: Duration,
) -> QueryLogEntry {
    let mut entry = QueryLogEntry {
        project_id,
        query: query.to_string(),
        query_type: query_type.as_str().to_string(),
        status: QueryStatus::Success,
        result: None,
        error: None,
        rows_affected: None,
        execution_time_ms: Some(duration_ms(elapsed)),
    };

    match outcome {
        Ok(result) => {
            if result.row_count > 0 {
                entry.rows_affected = Some(result.row_count);
                // A snapshot that fails to serialize is dropped, never fatal.
                entry.result = serde_json::to_string(result).ok();
            } else if result.affected_rows > 0 {
                entry.rows_affected = Some(result.affected_rows);
                entry.result = Some(format!("Affected rows: {}", result.affected_rows));
            } else if let Some(message) = result.message.as_ref().filter(|m| !m.is_empty()) {
                entry.result = Some(message.clone());
            }
        }
        Err(err) => {
            entry.status = QueryStatus::Error;
            entry.error = Some(err.to_string());
        }
    }

    entry
}

/// Build the audit row for a query the assistant proposed.
pub fn generated_log_entry(project_id: DbId, query: &str) -> QueryLogEntry {
    QueryLogEntry {
        project_id,
        query: query.to_string(),
        query_type: classify(query).as_str().to_string(),
        status: QueryStatus::Generated,
        result: Some(GENERATED_RESULT_TEXT.to_string()),
        error: None,
        rows_affected: None,
        execution_time_ms: None,
    }
}

fn duration_ms(elapsed: Duration) -> i64 {
    i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
}
