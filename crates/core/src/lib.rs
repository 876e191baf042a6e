//! Domain core for the database assistant backend.
//!
//! Holds the SQL classifier, the per-project permission gate, the audit
//! record builder, and the execution coordinator that sequences them. The
//! coordinator talks to storage and to the execution proxy only through the
//! traits in [`coordinator`], so the crate does no I/O of its own.

pub mod audit;
pub mod chat;
pub mod classifier;
pub mod coordinator;
pub mod error;
pub mod execution;
pub mod pagination;
pub mod permission;
pub mod project;
pub mod types;
