//! Filter state store: the ordered list of active filters of one table view.

use std::sync::Arc;

use sift_query::{
    ConfigurableFilter, FieldRegistry, FilterError, FilterValue, InstanceId, JoinOperator,
    Operator,
};

/// Changes to apply to an existing filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterUpdate {
    pub operator: Option<Operator>,
    pub value: Option<FilterValue>,
}

impl FilterUpdate {
    pub fn operator(operator: Operator) -> Self {
        FilterUpdate {
            operator: Some(operator),
            value: None,
        }
    }

    pub fn value(value: impl Into<FilterValue>) -> Self {
        FilterUpdate {
            operator: None,
            value: Some(value.into()),
        }
    }

    pub fn with_value(mut self, value: impl Into<FilterValue>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Active filters, their join operator and a revision counter.
///
/// Mutations that change nothing leave the revision alone.
#[derive(Debug, Clone)]
pub struct FilterStore {
    registry: Arc<FieldRegistry>,
    filters: Vec<ConfigurableFilter>,
    join: JoinOperator,
    revision: u64,
}

impl FilterStore {
    /// Creates an empty store joined with `and`.
    pub fn new(registry: Arc<FieldRegistry>) -> Self {
        FilterStore {
            registry,
            filters: Vec::new(),
            join: JoinOperator::And,
            revision: 0,
        }
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn shared_registry(&self) -> Arc<FieldRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn filters(&self) -> &[ConfigurableFilter] {
        &self.filters
    }

    pub fn join(&self) -> JoinOperator {
        self.join
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn get(&self, id: InstanceId) -> Option<&ConfigurableFilter> {
        self.filters.iter().find(|f| f.instance_id == id)
    }

    /// First filter on `field_id`.
    pub fn find_by_field(&self, field_id: &str) -> Option<&ConfigurableFilter> {
        self.filters.iter().find(|f| f.field_id == field_id)
    }

    /// Adds a filter checked against the registry.
    pub fn add(
        &mut self,
        field_id: &str,
        operator: Option<Operator>,
        value: impl Into<FilterValue>,
    ) -> Result<InstanceId, FilterError> {
        let filter = ConfigurableFilter::new(&self.registry, field_id, operator, value)?;
        Ok(self.push(filter))
    }

    /// Appends an already-built filter.
    pub fn push(&mut self, filter: ConfigurableFilter) -> InstanceId {
        let id = filter.instance_id;
        self.filters.push(filter);
        self.bump();
        id
    }

    /// Changes the operator and/or value of a filter.
    ///
    /// Returns `false` when the filter already had those settings.
    pub fn update(&mut self, id: InstanceId, update: FilterUpdate) -> Result<bool, FilterError> {
        let index = self.index_of(id)?;
        let updated = self.filters[index].updated(&self.registry, update.operator, update.value)?;
        if updated.same_condition(&self.filters[index]) {
            return Ok(false);
        }
        self.filters[index] = updated;
        self.bump();
        Ok(true)
    }

    /// Removes a filter and returns it.
    pub fn remove(&mut self, id: InstanceId) -> Result<ConfigurableFilter, FilterError> {
        let index = self.index_of(id)?;
        let removed = self.filters.remove(index);
        self.bump();
        Ok(removed)
    }

    /// Sets the join operator. Returns `false` when unchanged.
    pub fn set_join(&mut self, join: JoinOperator) -> bool {
        if self.join == join {
            return false;
        }
        self.join = join;
        self.bump();
        true
    }

    /// Clears every filter and resets the join to `and`.
    pub fn reset(&mut self) -> bool {
        self.replace(Vec::new(), JoinOperator::And)
    }

    /// Replaces the whole state, as hydration does.
    pub fn replace(&mut self, filters: Vec<ConfigurableFilter>, join: JoinOperator) -> bool {
        let unchanged = self.join == join
            && self.filters.len() == filters.len()
            && self
                .filters
                .iter()
                .zip(&filters)
                .all(|(a, b)| a.same_condition(b));
        self.filters = filters;
        self.join = join;
        if unchanged {
            return false;
        }
        self.bump();
        true
    }

    fn index_of(&self, id: InstanceId) -> Result<usize, FilterError> {
        self.filters
            .iter()
            .position(|f| f.instance_id == id)
            .ok_or(FilterError::UnknownInstance(id.get()))
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_query::{FilterFieldConfig, Variant};

    fn store() -> FilterStore {
        let registry = FieldRegistry::new()
            .field("status", FilterFieldConfig::new("Status", Variant::Select))
            .field("amount", FilterFieldConfig::new("Amount", Variant::Number));
        FilterStore::new(Arc::new(registry))
    }

    #[test]
    fn add_update_remove() {
        let mut store = store();
        let id = store.add("amount", Some(Operator::Gt), "5").unwrap();
        assert_eq!(store.revision(), 1);
        assert_eq!(store.find_by_field("amount").map(|f| f.instance_id), Some(id));

        assert!(store.update(id, FilterUpdate::value("6")).unwrap());
        assert!(!store.update(id, FilterUpdate::value("6")).unwrap());
        assert_eq!(store.revision(), 2);

        let removed = store.remove(id).unwrap();
        assert_eq!(removed.value, FilterValue::text("6"));
        assert!(store.is_empty());
        assert_eq!(store.remove(id).unwrap_err(), FilterError::UnknownInstance(id.get()));
    }

    #[test]
    fn switching_to_between_needs_a_list() {
        let mut store = store();
        let id = store.add("amount", None, "5").unwrap();
        assert!(matches!(
            store.update(id, FilterUpdate::operator(Operator::IsBetween)),
            Err(FilterError::ValueShape { .. })
        ));
        assert!(store
            .update(
                id,
                FilterUpdate::operator(Operator::IsBetween)
                    .with_value(FilterValue::list(["1", "9"])),
            )
            .unwrap());
    }

    #[test]
    fn invalid_additions_are_rejected() {
        let mut store = store();
        assert!(store.add("nope", None, "x").is_err());
        assert!(store.add("status", Some(Operator::Gt), "x").is_err());
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn join_and_reset() {
        let mut store = store();
        assert!(!store.set_join(JoinOperator::And));
        assert!(store.set_join(JoinOperator::Or));
        store.add("status", None, "a").unwrap();
        assert!(store.reset());
        assert_eq!(store.join(), JoinOperator::And);
        assert!(!store.reset());
    }

    #[test]
    fn replace_with_same_conditions_is_no_change() {
        let mut store = store();
        store.add("status", None, "a").unwrap();
        let copy: Vec<_> = store
            .filters()
            .iter()
            .map(|f| {
                ConfigurableFilter::unchecked(
                    f.field_id.clone(),
                    f.variant,
                    f.operator,
                    f.value.clone(),
                )
            })
            .collect();
        let before = store.revision();
        assert!(!store.replace(copy, JoinOperator::And));
        assert_eq!(store.revision(), before);
    }
}
