//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod dashboard_repo;
pub mod message_repo;
pub mod permission_repo;
pub mod project_repo;
pub mod query_log_repo;
pub mod user_repo;

pub use dashboard_repo::DashboardRepo;
pub use message_repo::MessageRepo;
pub use permission_repo::PermissionRepo;
pub use project_repo::ProjectRepo;
pub use query_log_repo::QueryLogRepo;
pub use user_repo::UserRepo;
