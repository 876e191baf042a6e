use std::time::Duration;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `60`).
    pub request_timeout_secs: u64,
    /// Base URL of the SQL proxy (default: `http://localhost:8000`).
    pub proxy_url: String,
    /// HTTP client timeout for proxy calls in seconds (default: `30`).
    pub proxy_timeout_secs: u64,
    /// Bound on a single delegated execution in seconds (default: `30`).
    pub execution_timeout_secs: u64,
    /// Minimum signup password length (default: `8`).
    pub password_min_length: usize,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                    |
    /// |--------------------------|----------------------------|
    /// | `HOST`                   | `0.0.0.0`                  |
    /// | `PORT`                   | `8080`                     |
    /// | `CORS_ORIGINS`           | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`   | `60`                       |
    /// | `PROXY_SERVER_URL`       | `http://localhost:8000`    |
    /// | `PROXY_TIMEOUT_SECS`     | `30`                       |
    /// | `EXECUTION_TIMEOUT_SECS` | `30`                       |
    /// | `PASSWORD_MIN_LENGTH`    | `8`                        |
    ///
    /// # Panics
    ///
    /// Panics on unparsable values, when `JWT_SECRET` is missing, and when
    /// `EXECUTION_TIMEOUT_SECS` is not below `REQUEST_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let proxy_url =
            std::env::var("PROXY_SERVER_URL").unwrap_or_else(|_| "http://localhost:8000".into());

        let proxy_timeout_secs: u64 = std::env::var("PROXY_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("PROXY_TIMEOUT_SECS must be a valid u64");

        let execution_timeout_secs: u64 = std::env::var("EXECUTION_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("EXECUTION_TIMEOUT_SECS must be a valid u64");
        assert_execution_fits_request(execution_timeout_secs, request_timeout_secs);

        let password_min_length: usize = std::env::var("PASSWORD_MIN_LENGTH")
            .unwrap_or_else(|_| "8".into())
            .parse()
            .expect("PASSWORD_MIN_LENGTH must be a valid usize");

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            proxy_url,
            proxy_timeout_secs,
            execution_timeout_secs,
            password_min_length,
            jwt,
        }
    }

    pub fn proxy_timeout(&self) -> Duration {
        Duration::from_secs(self.proxy_timeout_secs)
    }

    pub fn execution_timeout(&self) -> Duration {
        Duration::from_secs(self.execution_timeout_secs)
    }
}

/// A delegated execution must resolve before the request timeout layer drops
/// the handler.
fn assert_execution_fits_request(execution_timeout_secs: u64, request_timeout_secs: u64) {
    assert!(
        execution_timeout_secs < request_timeout_secs,
        "EXECUTION_TIMEOUT_SECS ({execution_timeout_secs}) must be less than \
         REQUEST_TIMEOUT_SECS ({request_timeout_secs})"
    );
}
