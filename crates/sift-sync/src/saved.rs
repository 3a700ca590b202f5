//! Saved filter sets.
//!
//! A saved filter is a named snapshot of a table's navigation query string.
//! Storage is external; [`SavedFilterStore`] is the seam, and
//! [`InMemorySavedFilters`] the in-process implementation.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::{SaveError, ValidationError};

/// Longest accepted saved filter name, in characters.
pub const MAX_NAME_LEN: usize = 100;

/// A named query string scoped to a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedFilter {
    pub name: String,
    pub search_params: String,
    pub table_id: String,
}

impl SavedFilter {
    pub fn new(
        name: impl Into<String>,
        search_params: impl Into<String>,
        table_id: impl Into<String>,
    ) -> Self {
        SavedFilter {
            name: name.into(),
            search_params: search_params.into(),
            table_id: table_id.into(),
        }
    }
}

/// Key-value collaborator holding saved filters.
pub trait SavedFilterStore {
    /// Saved filters of a table, in save order.
    fn list(&self, table_id: &str) -> Vec<SavedFilter>;

    fn get_by_name(&self, name: &str) -> Option<SavedFilter>;

    fn name_exists(&self, name: &str) -> bool {
        self.get_by_name(name).is_some()
    }

    /// Stores a filter set. Saving an existing name overwrites it.
    fn save(
        &self,
        name: &str,
        search_params: &str,
        table_id: &str,
    ) -> Result<SavedFilter, SaveError>;
}

/// In-memory saved filter store, one per table scope.
#[derive(Debug, Default)]
pub struct InMemorySavedFilters {
    entries: RwLock<Vec<SavedFilter>>,
}

impl InMemorySavedFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filters(filters: impl IntoIterator<Item = SavedFilter>) -> Self {
        InMemorySavedFilters {
            entries: RwLock::new(filters.into_iter().collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SavedFilterStore for InMemorySavedFilters {
    fn list(&self, table_id: &str) -> Vec<SavedFilter> {
        self.entries
            .read()
            .map(|entries| {
                entries
                    .iter()
                    .filter(|f| f.table_id == table_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn get_by_name(&self, name: &str) -> Option<SavedFilter> {
        self.entries
            .read()
            .ok()?
            .iter()
            .find(|f| f.name == name)
            .cloned()
    }

    fn save(
        &self,
        name: &str,
        search_params: &str,
        table_id: &str,
    ) -> Result<SavedFilter, SaveError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| SaveError::Store(e.to_string()))?;
        let filter = SavedFilter::new(name, search_params, table_id);
        match entries.iter_mut().find(|f| f.name == name) {
            Some(existing) => *existing = filter.clone(),
            None => entries.push(filter.clone()),
        }
        Ok(filter)
    }
}

/// The "save current filters" form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveFilterForm {
    pub name: String,
}

impl SaveFilterForm {
    pub fn new(name: impl Into<String>) -> Self {
        SaveFilterForm { name: name.into() }
    }

    /// Checks the form against `store` and returns the trimmed name.
    ///
    /// All problems are reported together.
    pub fn validate(&self, store: &dyn SavedFilterStore) -> Result<String, Vec<ValidationError>> {
        let name = self.name.trim();
        let mut errors = Vec::new();
        if name.is_empty() {
            errors.push(ValidationError::EmptyName);
        } else {
            if name.chars().count() > MAX_NAME_LEN {
                errors.push(ValidationError::NameTooLong { max: MAX_NAME_LEN });
            }
            if store.name_exists(name) {
                errors.push(ValidationError::DuplicateName(name.to_string()));
            }
        }
        if errors.is_empty() {
            Ok(name.to_string())
        } else {
            Err(errors)
        }
    }

    /// Validates, then saves `search_params` under the form's name.
    pub fn submit(
        &self,
        store: &dyn SavedFilterStore,
        search_params: &str,
        table_id: &str,
    ) -> Result<SavedFilter, SaveError> {
        let name = self.validate(store).map_err(SaveError::Invalid)?;
        store.save(&name, search_params, table_id)
    }
}
