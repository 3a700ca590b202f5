//! Table configuration files.
//!
//! A table config names the table, optionally overrides the navigation key
//! its compiled query is stored under, and lists its filterable fields:
//!
//! ```yaml
//! table_id: transactions
//! query_key: tx
//! fields:
//!   - id: status
//!     label: Status
//!     variant: select
//!   - id: account
//!     label: Account
//!     variant: text
//!     standaloneParam: account
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sift_query::FieldRegistry;

use crate::error::ConfigError;

/// Static description of one table's filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Stable table identifier. Saved filters are scoped by it.
    pub table_id: String,
    /// Navigation key of the compiled query. Defaults to `table_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_key: Option<String>,
    /// Filterable fields, in display order.
    pub fields: FieldRegistry,
}

impl TableConfig {
    pub fn new(table_id: impl Into<String>, fields: FieldRegistry) -> Self {
        TableConfig {
            table_id: table_id.into(),
            query_key: None,
            fields,
        }
    }

    pub fn with_query_key(mut self, key: impl Into<String>) -> Self {
        self.query_key = Some(key.into());
        self
    }

    /// Navigation key of the compiled query.
    pub fn query_key(&self) -> &str {
        self.query_key.as_deref().unwrap_or(&self.table_id)
    }

    /// The field registry, ready to share between views.
    pub fn registry(&self) -> Arc<FieldRegistry> {
        Arc::new(self.fields.clone())
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: TableConfig = serde_yaml::from_str(yaml)?;
        config.checked()
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: TableConfig = serde_json::from_str(json)?;
        config.checked()
    }

    /// Loads a `.yaml`, `.yml` or `.json` file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let parse: fn(&str) -> Result<Self, ConfigError> = match extension.as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml_str,
            Some("json") => Self::from_json_str,
            _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        };
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loading table config");
        parse(&text)
    }

    fn checked(self) -> Result<Self, ConfigError> {
        if self.table_id.trim().is_empty() {
            return Err(ConfigError::EmptyTableId);
        }
        let key = self.query_key();
        if let Some((field, _)) = self.fields.standalone_params().find(|(_, param)| *param == key) {
            return Err(ConfigError::QueryKeyConflict {
                key: key.to_string(),
                field: field.to_string(),
            });
        }
        Ok(self)
    }
}
