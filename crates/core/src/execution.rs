//! Results returned by the external SQL-execution backend and the trait the
//! coordinator delegates execution through.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Outcome of a statement run by the execution backend.
///
/// Field names match the proxy's JSON so the same type is used on the wire and
/// in audit snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rows: Vec<Vec<serde_json::Value>>,
    /// Rows returned by a read.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub row_count: i64,
    /// Rows touched by a write.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub affected_rows: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dry_run: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub explain: Vec<String>,
}

/// Outcome of a validate (plan-only explain) call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub explain: Vec<String>,
    #[serde(default)]
    pub message: String,
}

fn is_zero(n: &i64) -> bool {
    *n == 0
}

/// Failure of a delegated execution call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The backend answered with an error; the text is kept verbatim.
    #[error("{0}")]
    Failed(String),

    /// The call did not finish within the caller's bound.
    #[error("Query execution timed out after {0}ms")]
    TimedOut(u64),
}

/// The external service that actually connects to the target database.
///
/// Implemented by the HTTP proxy client; tests use scripted fakes.
pub trait SqlExecutor: Send + Sync {
    /// Run `query`, or only plan it when `dry_run` is set.
    fn execute(
        &self,
        query: &str,
        dry_run: bool,
    ) -> impl Future<Output = Result<ExecutionResult, BackendError>> + Send;

    /// Explain `query` without executing it.
    fn validate(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<ValidationResult, BackendError>> + Send;
}

impl<T: SqlExecutor> SqlExecutor for Arc<T> {
    fn execute(
        &self,
        query: &str,
        dry_run: bool,
    ) -> impl Future<Output = Result<ExecutionResult, BackendError>> + Send {
        (**self).execute(query, dry_run)
    }

    fn validate(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<ValidationResult, BackendError>> + Send {
        (**self).validate(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_sparse_proxy_payload() {
        let json = r#"{"success": true, "affected_rows": 3, "message": "ok"}"#;
        let result: ExecutionResult = serde_json::from_str(json).unwrap();
        assert!(result.success);
        assert_eq!(result.affected_rows, 3);
        assert_eq!(result.row_count, 0);
        assert!(result.rows.is_empty());
        assert_eq!(result.message.as_deref(), Some("ok"));
    }

    #[test]
    fn serialization_omits_empty_fields() {
        let result = ExecutionResult {
            success: true,
            row_count: 1,
            columns: vec!["id".into()],
            rows: vec![vec![serde_json::json!(1)]],
            ..Default::default()
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "success": true,
                "columns": ["id"],
                "rows": [[1]],
                "row_count": 1
            })
        );
    }

    #[test]
    fn backend_error_display() {
        assert_eq!(
            BackendError::Failed("connection refused".into()).to_string(),
            "connection refused"
        );
        assert_eq!(
            BackendError::TimedOut(1500).to_string(),
            "Query execution timed out after 1500ms"
        );
    }
}
