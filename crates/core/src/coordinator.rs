//! Classify → authorize → execute → audit orchestration.
//!
//! [`ExecutionCoordinator`] is built per request from cloned collaborator
//! handles, so concurrent requests share nothing mutable. The policy is
//! re-read on every call; a policy change applies to the very next request.
//!
//! ```text
//! Received ─► Classified ─► Denied                                   (terminal)
//!                       └─► Authorized ─► Executing ─► Succeeded ─┐
//!                                                  └─► Failed ────┴─► Logged ─► Done
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::audit::{build_log_entry, QueryLogEntry};
use crate::classifier::{classify, QueryType};
use crate::execution::{BackendError, ExecutionResult, SqlExecutor, ValidationResult};
use crate::permission::{authorize, authorize_validation, Decision, PermissionPolicy};
use crate::types::DbId;

/// Message returned when the query text is missing or blank.
pub const QUERY_REQUIRED: &str = "Query is required";

/// Message returned when the execution task ends without an outcome.
pub const EXECUTION_ABORTED: &str = "Query execution was aborted";

/// Failure reported by a storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct StoreError(pub String);

/// A project as seen by the gate: it exists, belongs to the principal, and
/// carries its policy if one was ever created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectAccess {
    pub project_id: DbId,
    pub policy: Option<PermissionPolicy>,
}

/// Persistent state the coordinator touches: one policy read, one log append.
pub trait GateStore: Send + Sync {
    /// Load the project's policy if the project exists, is not deleted, and is
    /// owned by `principal_id`. `Ok(None)` means "no such project for you".
    fn find_project_access(
        &self,
        principal_id: DbId,
        project_id: DbId,
    ) -> impl Future<Output = Result<Option<ProjectAccess>, StoreError>> + Send;

    /// Append one audit row, returning its id.
    fn append_query_log(
        &self,
        entry: &QueryLogEntry,
    ) -> impl Future<Output = Result<DbId, StoreError>> + Send;
}

impl<T: GateStore> GateStore for Arc<T> {
    fn find_project_access(
        &self,
        principal_id: DbId,
        project_id: DbId,
    ) -> impl Future<Output = Result<Option<ProjectAccess>, StoreError>> + Send {
        (**self).find_project_access(principal_id, project_id)
    }

    fn append_query_log(
        &self,
        entry: &QueryLogEntry,
    ) -> impl Future<Output = Result<DbId, StoreError>> + Send {
        (**self).append_query_log(entry)
    }
}

/// Errors surfaced to the caller. Each maps to a distinct transport status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    /// The project's policy forbids the classified operation.
    #[error("{0}")]
    AuthorizationDenied(String),

    /// Empty or missing query text.
    #[error("{0}")]
    ValidationInput(String),

    /// The project does not exist, is deleted, or belongs to someone else.
    #[error("Project with id {0} not found")]
    ProjectNotFound(DbId),

    /// The backend returned an error or timed out. Detail kept verbatim.
    #[error("{0}")]
    ExecutionFailed(String),

    /// The policy could not be read.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

/// One execute call as received from the transport layer.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    /// Authenticated principal, supplied by the identity provider.
    pub principal_id: DbId,
    pub project_id: DbId,
    pub query: String,
    pub dry_run: bool,
}

/// What a successful execution hands back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    pub query_type: QueryType,
    pub execution_time_ms: i64,
    /// Id of the audit row, or `None` if persisting it failed.
    pub query_log_id: Option<DbId>,
    pub result: ExecutionResult,
}

/// Sequences a single request through the gate.
///
/// Collaborators are owned handles (a pool, an `Arc`) so the execute-and-audit
/// step can outlive the caller's future.
pub struct ExecutionCoordinator<S, E> {
    store: S,
    executor: E,
    timeout: Duration,
}

impl<S, E> ExecutionCoordinator<S, E>
where
    S: GateStore + Clone + 'static,
    E: SqlExecutor + Clone + 'static,
{
    /// `timeout` bounds the delegated call; elapsing counts as a failure.
    pub fn new(store: S, executor: E, timeout: Duration) -> Self {
        Self {
            store,
            executor,
            timeout,
        }
    }

    /// Classify, authorize, delegate, and audit one statement.
    ///
    /// Denials and input errors return before any external call and leave no
    /// audit row. Every attempt that reaches the backend is logged, whether it
    /// succeeds, fails, or times out. Nothing is retried.
    pub async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionReport, GateError> {
        let query = request.query.as_str();
        if query.trim().is_empty() {
            return Err(GateError::ValidationInput(QUERY_REQUIRED.to_string()));
        }

        let access = self
            .load_access(request.principal_id, request.project_id)
            .await?;

        let query_type = classify(query);
        if let Decision::Deny(reason) = authorize(query_type, access.policy.as_ref()) {
            tracing::warn!(
                user_id = request.principal_id,
                project_id = request.project_id,
                query_type = %query_type,
                %reason,
                "Query denied by project policy"
            );
            return Err(GateError::AuthorizationDenied(reason));
        }

        // Detached so a dropped request future cannot skip the audit append.
        let attempt = tokio::spawn(run_and_audit(
            self.store.clone(),
            self.executor.clone(),
            self.timeout,
            request.project_id,
            query.to_string(),
            query_type,
            request.dry_run,
        ));
        let (outcome, query_log_id, execution_time_ms) = match attempt.await {
            Ok(finished) => finished,
            Err(err) => {
                tracing::error!(
                    project_id = request.project_id,
                    error = %err,
                    "Query execution task aborted"
                );
                return Err(GateError::ExecutionFailed(EXECUTION_ABORTED.to_string()));
            }
        };

        match outcome {
            Ok(result) => {
                tracing::info!(
                    user_id = request.principal_id,
                    project_id = request.project_id,
                    query_type = %query_type,
                    dry_run = request.dry_run,
                    elapsed_ms = execution_time_ms,
                    "Query executed"
                );
                Ok(ExecutionReport {
                    query_type,
                    execution_time_ms,
                    query_log_id,
                    result,
                })
            }
            Err(err) => {
                tracing::warn!(
                    user_id = request.principal_id,
                    project_id = request.project_id,
                    query_type = %query_type,
                    elapsed_ms = execution_time_ms,
                    error = %err,
                    "Query execution failed"
                );
                Err(GateError::ExecutionFailed(err.to_string()))
            }
        }
    }

    /// Plan-only validation. Requires read permission regardless of the
    /// statement's class. Not audited.
    pub async fn validate(
        &self,
        principal_id: DbId,
        project_id: DbId,
        query: &str,
    ) -> Result<ValidationResult, GateError> {
        if query.trim().is_empty() {
            return Err(GateError::ValidationInput(QUERY_REQUIRED.to_string()));
        }

        let access = self.load_access(principal_id, project_id).await?;

        if let Decision::Deny(reason) = authorize_validation(access.policy.as_ref()) {
            tracing::warn!(
                user_id = principal_id,
                project_id,
                %reason,
                "Validation denied by project policy"
            );
            return Err(GateError::AuthorizationDenied(reason));
        }

        match tokio::time::timeout(self.timeout, self.executor.validate(query)).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(err)) => Err(GateError::ExecutionFailed(err.to_string())),
            Err(_) => Err(GateError::ExecutionFailed(
                BackendError::TimedOut(millis(self.timeout)).to_string(),
            )),
        }
    }

    async fn load_access(
        &self,
        principal_id: DbId,
        project_id: DbId,
    ) -> Result<ProjectAccess, GateError> {
        match self.store.find_project_access(principal_id, project_id).await {
            Ok(Some(access)) => Ok(access),
            Ok(None) => Err(GateError::ProjectNotFound(project_id)),
            Err(err) => {
                tracing::error!(project_id, error = %err, "Failed to load project policy");
                Err(GateError::Store(err))
            }
        }
    }
}

/// Delegate one statement under `timeout`, then append its audit row.
///
/// Returns the outcome, the audit row id (if the append succeeded), and the
/// recorded duration in milliseconds.
async fn run_and_audit<S, E>(
    store: S,
    executor: E,
    timeout: Duration,
    project_id: DbId,
    query: String,
    query_type: QueryType,
    dry_run: bool,
) -> (Result<ExecutionResult, BackendError>, Option<DbId>, i64)
where
    S: GateStore,
    E: SqlExecutor,
{
    let started = Instant::now();
    let outcome = match tokio::time::timeout(timeout, executor.execute(&query, dry_run)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(BackendError::TimedOut(millis(timeout))),
    };
    let elapsed = started.elapsed();

    let entry = build_log_entry(project_id, &query, query_type, &outcome, elapsed);
    let query_log_id = persist_log(&store, &entry).await;
    (outcome, query_log_id, entry.execution_time_ms.unwrap_or_default())
}

/// A failed append is reported here and nowhere else; it never replaces the
/// execution outcome.
async fn persist_log<S: GateStore>(store: &S, entry: &QueryLogEntry) -> Option<DbId> {
    match store.append_query_log(entry).await {
        Ok(id) => Some(id),
        Err(err) => {
            tracing::warn!(
                project_id = entry.project_id,
                status = %entry.status,
                error = %err,
                "Failed to persist query log"
            );
            None
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use assert_matches::assert_matches;

    use super::*;
    use crate::audit::QueryStatus;

    const OWNER: DbId = 1;
    const PROJECT: DbId = 10;
    const TIMEOUT: Duration = Duration::from_secs(5);

    #[derive(Default)]
    struct FakeStore {
        projects: HashMap<(DbId, DbId), Option<PermissionPolicy>>,
        logs: Mutex<Vec<QueryLogEntry>>,
        fail_reads: bool,
        fail_appends: bool,
    }

    impl FakeStore {
        fn with_policy(policy: Option<PermissionPolicy>) -> Self {
            let mut store = Self::default();
            store.projects.insert((OWNER, PROJECT), policy);
            store
        }

        fn failing_reads(mut self) -> Self {
            self.fail_reads = true;
            self
        }

        fn failing_appends(mut self) -> Self {
            self.fail_appends = true;
            self
        }

        fn logs(&self) -> Vec<QueryLogEntry> {
            self.logs.lock().unwrap().clone()
        }
    }

    impl GateStore for FakeStore {
        async fn find_project_access(
            &self,
            principal_id: DbId,
            project_id: DbId,
        ) -> Result<Option<ProjectAccess>, StoreError> {
            if self.fail_reads {
                return Err(StoreError("pool timed out".into()));
            }
            Ok(self
                .projects
                .get(&(principal_id, project_id))
                .map(|policy| ProjectAccess {
                    project_id,
                    policy: *policy,
                }))
        }

        async fn append_query_log(&self, entry: &QueryLogEntry) -> Result<DbId, StoreError> {
            if self.fail_appends {
                return Err(StoreError("disk full".into()));
            }
            let mut logs = self.logs.lock().unwrap();
            logs.push(entry.clone());
            Ok(logs.len() as DbId)
        }
    }

    struct FakeExecutor {
        outcome: Result<ExecutionResult, BackendError>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl FakeExecutor {
        fn returning(outcome: Result<ExecutionResult, BackendError>) -> Self {
            Self {
                outcome,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        fn succeeding() -> Self {
            Self::returning(Ok(ExecutionResult {
                success: true,
                message: Some("ok".into()),
                ..Default::default()
            }))
        }

        fn delayed(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SqlExecutor for FakeExecutor {
        async fn execute(
            &self,
            _query: &str,
            _dry_run: bool,
        ) -> Result<ExecutionResult, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.outcome.clone()
        }

        async fn validate(&self, _query: &str) -> Result<ValidationResult, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ValidationResult {
                success: true,
                dry_run: true,
                explain: vec!["Seq Scan on users".into()],
                message: "Query is valid".into(),
            })
        }
    }

    fn request(query: &str) -> ExecutionRequest {
        ExecutionRequest {
            principal_id: OWNER,
            project_id: PROJECT,
            query: query.to_string(),
            dry_run: false,
        }
    }

    fn coordinator_for(
        store: &Arc<FakeStore>,
        executor: &Arc<FakeExecutor>,
        timeout: Duration,
    ) -> ExecutionCoordinator<Arc<FakeStore>, Arc<FakeExecutor>> {
        ExecutionCoordinator::new(Arc::clone(store), Arc::clone(executor), timeout)
    }

    fn policy(ddl: bool, write: bool, read: bool, delete: bool) -> PermissionPolicy {
        PermissionPolicy {
            allow_ddl: ddl,
            allow_write: write,
            allow_read: read,
            allow_delete: delete,
        }
    }

    #[tokio::test]
    async fn read_denied_short_circuits_without_log() {
        let store = Arc::new(FakeStore::with_policy(Some(policy(true, true, false, true))));
        let executor = Arc::new(FakeExecutor::succeeding());
        let coordinator = coordinator_for(&store, &executor, TIMEOUT);

        let result = coordinator.execute(&request("SELECT * FROM users;")).await;

        assert_matches!(
            result,
            Err(GateError::AuthorizationDenied(reason))
                if reason == "Read operations are not allowed for this project"
        );
        assert_eq!(executor.calls(), 0);
        assert!(store.logs().is_empty());
    }

    #[tokio::test]
    async fn allowed_ddl_is_executed_and_logged() {
        let store = Arc::new(FakeStore::with_policy(Some(policy(true, false, false, false))));
        let executor = Arc::new(FakeExecutor::succeeding());
        let coordinator = coordinator_for(&store, &executor, TIMEOUT);

        let report = coordinator
            .execute(&request("DROP TABLE users;"))
            .await
            .expect("DDL should be allowed");

        assert_eq!(report.query_type, QueryType::Ddl);
        assert_eq!(report.query_log_id, Some(1));
        assert_eq!(executor.calls(), 1);
        let logs = store.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, QueryStatus::Success);
        assert_eq!(logs[0].query_type, "DDL");
        assert_eq!(logs[0].query, "DROP TABLE users;");
    }

    #[tokio::test]
    async fn backend_error_is_logged_and_reported() {
        let store = Arc::new(FakeStore::with_policy(Some(PermissionPolicy::default())));
        let executor = Arc::new(FakeExecutor::returning(Err(BackendError::Failed(
            "connection refused".into(),
        ))));
        let coordinator = coordinator_for(&store, &executor, TIMEOUT);

        let result = coordinator
            .execute(&request("UPDATE users SET name='x' WHERE id=1;"))
            .await;

        assert_matches!(result, Err(GateError::ExecutionFailed(detail)) if detail == "connection refused");
        let logs = store.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, QueryStatus::Error);
        assert_eq!(logs[0].error.as_deref(), Some("connection refused"));
        assert_eq!(logs[0].rows_affected, None);
        assert_eq!(logs[0].query_type, "UPDATE");
        assert_eq!(executor.calls(), 1, "failed executions are never retried");
    }

    #[tokio::test]
    async fn timeout_becomes_failure_and_is_logged() {
        let store = Arc::new(FakeStore::with_policy(None));
        let executor = Arc::new(FakeExecutor::succeeding().delayed(Duration::from_secs(5)));
        let coordinator = coordinator_for(&store, &executor, Duration::from_millis(50));

        let result = coordinator.execute(&request("SELECT pg_sleep(10)")).await;

        assert_matches!(
            result,
            Err(GateError::ExecutionFailed(detail)) if detail == "Query execution timed out after 50ms"
        );
        let logs = store.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, QueryStatus::Error);
        assert!(logs[0].execution_time_ms.unwrap() >= 50);
    }

    #[tokio::test]
    async fn dropped_caller_still_logs_attempt() {
        let store = Arc::new(FakeStore::with_policy(None));
        let executor = Arc::new(FakeExecutor::succeeding().delayed(Duration::from_millis(200)));
        let coordinator = coordinator_for(&store, &executor, TIMEOUT);

        let request = request("DELETE FROM users");
        let outer =
            tokio::time::timeout(Duration::from_millis(50), coordinator.execute(&request)).await;
        assert!(outer.is_err(), "caller gives up before the backend answers");
        assert_eq!(executor.calls(), 1);

        tokio::time::sleep(Duration::from_millis(400)).await;
        let logs = store.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, QueryStatus::Success);
        assert_eq!(logs[0].query_type, "DELETE");
    }

    #[tokio::test]
    async fn log_failure_does_not_mask_success() {
        let store = Arc::new(FakeStore::with_policy(None).failing_appends());
        let executor = Arc::new(FakeExecutor::succeeding());
        let coordinator = coordinator_for(&store, &executor, TIMEOUT);

        let report = coordinator
            .execute(&request("INSERT INTO t VALUES (1)"))
            .await
            .expect("execution outcome must survive a log failure");

        assert_eq!(report.query_type, QueryType::Insert);
        assert_eq!(report.query_log_id, None);
    }

    #[tokio::test]
    async fn log_failure_does_not_mask_execution_error() {
        let store = Arc::new(FakeStore::with_policy(None).failing_appends());
        let executor = Arc::new(FakeExecutor::returning(Err(BackendError::Failed(
            "syntax error".into(),
        ))));
        let coordinator = coordinator_for(&store, &executor, TIMEOUT);

        let result = coordinator.execute(&request("DELETE FROM t")).await;
        assert_matches!(result, Err(GateError::ExecutionFailed(detail)) if detail == "syntax error");
    }

    #[tokio::test]
    async fn blank_query_is_rejected_before_any_call() {
        let store = Arc::new(FakeStore::with_policy(None));
        let executor = Arc::new(FakeExecutor::succeeding());
        let coordinator = coordinator_for(&store, &executor, TIMEOUT);

        for query in ["", "   \n"] {
            let result = coordinator.execute(&request(query)).await;
            assert_matches!(result, Err(GateError::ValidationInput(msg)) if msg == QUERY_REQUIRED);
        }
        assert_eq!(executor.calls(), 0);
        assert!(store.logs().is_empty());
    }

    #[tokio::test]
    async fn foreign_project_is_not_found() {
        let store = Arc::new(FakeStore::with_policy(None));
        let executor = Arc::new(FakeExecutor::succeeding());
        let coordinator = coordinator_for(&store, &executor, TIMEOUT);

        let mut req = request("SELECT 1");
        req.principal_id = 99;
        let result = coordinator.execute(&req).await;

        assert_matches!(result, Err(GateError::ProjectNotFound(PROJECT)));
        assert_eq!(executor.calls(), 0);
    }

    #[tokio::test]
    async fn store_read_failure_is_reported() {
        let store = Arc::new(FakeStore::with_policy(None).failing_reads());
        let executor = Arc::new(FakeExecutor::succeeding());
        let coordinator = coordinator_for(&store, &executor, TIMEOUT);

        let result = coordinator.execute(&request("SELECT 1")).await;
        assert_matches!(result, Err(GateError::Store(_)));
        assert_eq!(executor.calls(), 0);
    }

    #[tokio::test]
    async fn other_statements_bypass_restrictive_policy() {
        let store = Arc::new(FakeStore::with_policy(Some(policy(false, false, false, false))));
        let executor = Arc::new(FakeExecutor::succeeding());
        let coordinator = coordinator_for(&store, &executor, TIMEOUT);

        let report = coordinator.execute(&request("SET search_path TO public")).await;
        assert_matches!(report, Ok(r) if r.query_type == QueryType::Other);
    }

    #[tokio::test]
    async fn validate_requires_read_regardless_of_type() {
        let store = Arc::new(FakeStore::with_policy(Some(policy(true, true, false, true))));
        let executor = Arc::new(FakeExecutor::succeeding());
        let coordinator = coordinator_for(&store, &executor, TIMEOUT);

        let result = coordinator.validate(OWNER, PROJECT, "DROP TABLE users").await;

        assert_matches!(
            result,
            Err(GateError::AuthorizationDenied(reason))
                if reason == crate::permission::VALIDATION_READ_REQUIRED
        );
        assert_eq!(executor.calls(), 0);
    }

    #[tokio::test]
    async fn validate_passes_through_and_is_not_logged() {
        let store = Arc::new(FakeStore::with_policy(Some(policy(false, false, true, false))));
        let executor = Arc::new(FakeExecutor::succeeding());
        let coordinator = coordinator_for(&store, &executor, TIMEOUT);

        let result = coordinator
            .validate(OWNER, PROJECT, "DELETE FROM users")
            .await
            .expect("read permission is enough to validate");

        assert!(result.success);
        assert_eq!(result.explain, vec!["Seq Scan on users".to_string()]);
        assert!(store.logs().is_empty());
    }
}
