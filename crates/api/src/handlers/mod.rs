//! Request handlers.
//!
//! Each submodule provides async handler functions for one resource. Handlers
//! take the principal from [`AuthUser`](crate::middleware::auth::AuthUser),
//! delegate to repositories in `dbpilot_db` or to the SQL proxy, and map
//! errors via [`AppError`](crate::error::AppError).

pub mod auth;
pub mod chat;
pub mod dashboard;
pub mod database;
pub mod project;
