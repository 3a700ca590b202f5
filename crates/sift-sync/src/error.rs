//! Error types for configuration loading and saved filters.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a table configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse failure.
    #[error("invalid YAML table config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON parse failure.
    #[error("invalid JSON table config: {0}")]
    Json(#[from] serde_json::Error),

    /// The file extension names no known format.
    #[error("unsupported config format: {0} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(PathBuf),

    /// A standalone parameter would overwrite the compiled query.
    #[error("field '{field}' uses standalone parameter '{key}', which is the table's query key")]
    QueryKeyConflict { key: String, field: String },

    /// The table identifier is empty.
    #[error("table config has an empty table_id")]
    EmptyTableId,
}

/// A field-level problem with a save-filter form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name is required")]
    EmptyName,

    #[error("name must be at most {max} characters")]
    NameTooLong { max: usize },

    #[error("a saved filter named '{0}' already exists")]
    DuplicateName(String),
}

impl ValidationError {
    /// Form field the error belongs to.
    pub fn field(&self) -> &'static str {
        "name"
    }
}

/// Errors raised when saving a filter set.
#[derive(Debug, Error)]
pub enum SaveError {
    /// The form did not pass validation; nothing was saved.
    #[error("invalid saved filter: {}", join_messages(.0))]
    Invalid(Vec<ValidationError>),

    /// The backing store refused the write.
    #[error("saved filter store failed: {0}")]
    Store(String),
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
