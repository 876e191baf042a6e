use std::sync::Arc;

use dbpilot_db::PgGateStore;
use dbpilot_proxy::ProxyClient;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: dbpilot_db::DbPool,
    /// Server configuration (JWT secret, timeouts, password policy).
    pub config: Arc<ServerConfig>,
    /// Client for the external SQL proxy.
    pub proxy: Arc<ProxyClient>,
    /// Policy reads and audit appends for the execution coordinator.
    pub gate_store: PgGateStore,
}

impl AppState {
    /// Assemble state from a pool, configuration, and proxy client.
    pub fn new(pool: dbpilot_db::DbPool, config: ServerConfig, proxy: ProxyClient) -> Self {
        Self {
            gate_store: PgGateStore::new(pool.clone()),
            pool,
            config: Arc::new(config),
            proxy: Arc::new(proxy),
        }
    }
}
