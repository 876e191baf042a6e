//! HTTP client for the external SQL proxy.
//!
//! The proxy owns the live connection to each project's target database and
//! the language model that turns questions into SQL. This crate only speaks
//! its JSON API; it never opens a database connection itself.

pub mod client;
pub mod types;

pub use client::{ProxyClient, ProxyError};
