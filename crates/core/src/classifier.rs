//! Keyword-prefix SQL classification.
//!
//! [`classify`] maps raw SQL text to a [`QueryType`] by looking at the first
//! keyword after comments and surrounding whitespace are removed. This is not
//! a parser: only the leading statement is inspected, so
//! `SELECT 1; DROP TABLE x;` classifies as [`QueryType::Select`].

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::permission::Permission;

/// `-- ...` up to (not including) the end of the line.
static LINE_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"--[^\n]*").expect("valid regex"));

/// `/* ... */`, non-greedy, spanning newlines.
static BLOCK_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\*[\s\S]*?\*/").expect("valid regex"));

/// Leading keywords that mark a schema-altering statement.
pub const DDL_KEYWORDS: &[&str] = &["CREATE", "DROP", "ALTER", "TRUNCATE", "RENAME", "COMMENT"];

/// Leading keywords that mark a read. `WITH` admits common table expressions.
pub const READ_KEYWORDS: &[&str] = &["SELECT", "WITH"];

/// Effective operation class of a SQL statement.
///
/// Always derived from the query text; never stored on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    Ddl,
    Other,
}

impl QueryType {
    /// The persisted string form (`"SELECT"`, `"DDL"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Ddl => "DDL",
            Self::Other => "OTHER",
        }
    }

    /// Human-readable label shown next to proposed queries.
    pub fn description(self) -> &'static str {
        match self {
            Self::Select => "Data retrieval (SELECT)",
            Self::Insert => "Data insertion (INSERT)",
            Self::Update => "Data modification (UPDATE)",
            Self::Delete => "Data deletion (DELETE)",
            Self::Ddl => "Schema modification (DDL)",
            Self::Other => "Other operation",
        }
    }

    /// The policy flag governing this class, or `None` for [`QueryType::Other`].
    pub fn required_permission(self) -> Option<Permission> {
        match self {
            Self::Ddl => Some(Permission::Ddl),
            Self::Insert | Self::Update => Some(Permission::Write),
            Self::Select => Some(Permission::Read),
            Self::Delete => Some(Permission::Delete),
            Self::Other => None,
        }
    }

    pub fn is_read(self) -> bool {
        self == Self::Select
    }

    pub fn is_write(self) -> bool {
        matches!(self, Self::Insert | Self::Update)
    }

    pub fn is_delete(self) -> bool {
        self == Self::Delete
    }

    pub fn is_ddl(self) -> bool {
        self == Self::Ddl
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remove `--` line comments and `/* */` block comments, then trim.
///
/// Line comments are stripped first, matching how the classifier has always
/// behaved: a `--` inside a block comment truncates that line.
pub fn strip_comments(query: &str) -> String {
    let without_line = LINE_COMMENT_RE.replace_all(query, "");
    let without_block = BLOCK_COMMENT_RE.replace_all(&without_line, "");
    without_block.trim().to_string()
}

/// Classify raw SQL text by its leading keyword.
///
/// DDL keywords win over everything else. Empty input, or input made only of
/// comments, is [`QueryType::Other`]. The original text is never modified;
/// uppercasing happens on a private copy.
pub fn classify(raw_query: &str) -> QueryType {
    let cleaned = strip_comments(raw_query).to_uppercase();

    if is_ddl(&cleaned) {
        return QueryType::Ddl;
    }
    if READ_KEYWORDS.iter().any(|kw| cleaned.starts_with(kw)) {
        return QueryType::Select;
    }
    if cleaned.starts_with("INSERT") {
        return QueryType::Insert;
    }
    if cleaned.starts_with("UPDATE") {
        return QueryType::Update;
    }
    if cleaned.starts_with("DELETE") {
        return QueryType::Delete;
    }

    QueryType::Other
}

fn is_ddl(cleaned_upper: &str) -> bool {
    DDL_KEYWORDS.iter().any(|kw| cleaned_upper.starts_with(kw))
}
