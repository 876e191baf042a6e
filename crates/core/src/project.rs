//! Project-level validation: supported database engines and required fields.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum length of a project name.
pub const MAX_PROJECT_NAME_LEN: usize = 255;

/// Database engines the execution proxy can reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    Mysql,
    Postgresql,
}

impl DatabaseType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mysql => "mysql",
            Self::Postgresql => "postgresql",
        }
    }
}

impl fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DatabaseType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mysql" => Ok(Self::Mysql),
            "postgresql" => Ok(Self::Postgresql),
            _ => Err(CoreError::Validation(
                "Database type must be 'mysql' or 'postgresql'".into(),
            )),
        }
    }
}

/// Validate the fields required to create a project.
pub fn validate_new_project(
    name: &str,
    database_type: &str,
    connection_string: &str,
) -> Result<DatabaseType, CoreError> {
    if name.trim().is_empty() || database_type.is_empty() || connection_string.trim().is_empty() {
        return Err(CoreError::Validation(
            "Name, database type, and connection string are required".into(),
        ));
    }
    validate_name(name)?;
    database_type.parse()
}

/// Validate a project name on update. Empty means "unchanged" and is accepted.
pub fn validate_name(name: &str) -> Result<(), CoreError> {
    if name.chars().count() > MAX_PROJECT_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Project name must be at most {MAX_PROJECT_NAME_LEN} characters"
        )));
    }
    Ok(())
}
