//! Limit/offset clamping for paginated listings.

/// Default page size for query log listings.
pub const DEFAULT_PAGE_LIMIT: i64 = 50;

/// Largest page a caller may request.
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Number of recent queries shown in a project summary.
pub const RECENT_QUERY_COUNT: i64 = 10;

/// Clamp a user-provided limit to `1..=max`, falling back to `default`.
pub fn clamp_limit(limit: Option<i64>, default: i64, max: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, max)
}

/// Clamp a user-provided offset to non-negative.
pub fn clamp_offset(offset: Option<i64>) -> i64 {
    offset.unwrap_or(0).max(0)
}
