//! Row types and DTOs, one module per table.

pub mod dashboard;
pub mod message;
pub mod permission;
pub mod project;
pub mod query_log;
pub mod user;
