//! REST client for the proxy endpoints.

use std::time::Duration;

use dbpilot_core::execution::{BackendError, SqlExecutor};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::{
    ConnectDbRequest, ConnectDbResponse, ConnectionInfo, DisconnectDbResponse, ErrorBody,
    ExecuteSqlRequest, ExecutionResult, GenerateSqlRequest, GenerateSqlResponse,
    ValidateSqlRequest, ValidationResult,
};

/// Errors from the proxy API layer.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("failed to send request: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success status with a `{"detail": ...}` body.
    #[error("proxy error ({status}): {detail}")]
    Api { status: u16, detail: String },

    /// Non-success status without a usable detail.
    #[error("proxy request failed with status {0}")]
    Status(u16),

    /// A success response whose body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// HTTP client for one proxy deployment.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: reqwest::Client,
    base_url: String,
}

impl ProxyClient {
    /// Build a client with a per-request `timeout`.
    ///
    /// * `base_url` - e.g. `http://localhost:8000`; a trailing slash is ignored.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the model to answer `question`, possibly proposing a statement.
    ///
    /// Sends `POST /generate-sql`.
    pub async fn generate_sql(
        &self,
        question: &str,
        db_type: &str,
        db_schema: &str,
    ) -> Result<GenerateSqlResponse, ProxyError> {
        let body = GenerateSqlRequest {
            question,
            db_type,
            db_schema,
        };
        self.post("/generate-sql", Some(&body)).await
    }

    /// Point the proxy at a project's database. Sends `POST /connect-db`.
    pub async fn connect_db(
        &self,
        db_type: &str,
        connection_string: &str,
    ) -> Result<ConnectDbResponse, ProxyError> {
        let body = ConnectDbRequest {
            db_type,
            connection_string,
        };
        self.post("/connect-db", Some(&body)).await
    }

    /// Drop the proxy's current connection. Sends `POST /disconnect-db`.
    pub async fn disconnect_db(&self) -> Result<DisconnectDbResponse, ProxyError> {
        self.post::<(), _>("/disconnect-db", None).await
    }

    /// Run (or dry-run) a statement. Sends `POST /execute-sql`.
    pub async fn execute_sql(
        &self,
        query: &str,
        dry_run: bool,
    ) -> Result<ExecutionResult, ProxyError> {
        let body = ExecuteSqlRequest { query, dry_run };
        self.post("/execute-sql", Some(&body)).await
    }

    /// Explain a statement without running it. Sends `POST /validate-sql`.
    pub async fn validate_sql(&self, query: &str) -> Result<ValidationResult, ProxyError> {
        let body = ValidateSqlRequest { query };
        self.post("/validate-sql", Some(&body)).await
    }

    /// Current connection details. Sends `GET /db-info`.
    pub async fn db_info(&self) -> Result<ConnectionInfo, ProxyError> {
        let response = self
            .client
            .get(format!("{}/db-info", self.base_url))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    // ---- private helpers ----

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<T, ProxyError> {
        let mut request = self.client.post(format!("{}{endpoint}", self.base_url));
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        Self::parse_response(response).await
    }

    /// Turn a non-success status into [`ProxyError::Api`] or
    /// [`ProxyError::Status`], otherwise decode the JSON body.
    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ProxyError> {
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let detail = serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .and_then(|body| body.detail);
            tracing::debug!(status = status.as_u16(), ?detail, "Proxy returned an error");
            return Err(match detail {
                Some(detail) => ProxyError::Api {
                    status: status.as_u16(),
                    detail,
                },
                None => ProxyError::Status(status.as_u16()),
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| ProxyError::Decode(e.to_string()))
    }
}

impl SqlExecutor for ProxyClient {
    async fn execute(&self, query: &str, dry_run: bool) -> Result<ExecutionResult, BackendError> {
        self.execute_sql(query, dry_run)
            .await
            .map_err(|e| BackendError::Failed(e.to_string()))
    }

    async fn validate(&self, query: &str) -> Result<ValidationResult, BackendError> {
        self.validate_sql(query)
            .await
            .map_err(|e| BackendError::Failed(e.to_string()))
    }
}
