//! Request and response bodies for the proxy's JSON API.
//!
//! Execution and validation results reuse the core types so they flow into
//! the audit log unchanged.

use serde::{Deserialize, Serialize};

pub use dbpilot_core::execution::{ExecutionResult, ValidationResult};

#[derive(Debug, Clone, Serialize)]
pub struct GenerateSqlRequest<'a> {
    pub question: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    pub db_type: &'a str,
    #[serde(skip_serializing_if = "is_empty")]
    pub db_schema: &'a str,
}

/// Assistant output. `query` is empty when no statement was proposed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GenerateSqlResponse {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectDbRequest<'a> {
    pub db_type: &'a str,
    pub connection_string: &'a str,
}

/// Where the proxy is (or was) connected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    #[serde(default, rename = "type")]
    pub db_type: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub connected: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectDbResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub connection_info: ConnectionInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisconnectDbResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub previous_connection: ConnectionInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecuteSqlRequest<'a> {
    pub query: &'a str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidateSqlRequest<'a> {
    pub query: &'a str,
}

fn is_empty(value: &&str) -> bool {
    value.is_empty()
}

/// Body of a non-success proxy response.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: Option<String>,
}
