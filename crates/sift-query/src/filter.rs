//! Live filter instances.
//!
//! A [`ConfigurableFilter`] is one condition a user has added to a table:
//! a field, an operator and a value. Filters built with
//! [`ConfigurableFilter::new`] are checked against the field registry; the
//! decompiler builds its best-effort filters with
//! [`ConfigurableFilter::unchecked`].

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::FilterError;
use crate::op::Operator;
use crate::registry::{FieldRegistry, FilterFieldConfig};
use crate::value::FilterValue;
use crate::variant::Variant;

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// UI identity of a filter instance. Unique within the process, never serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Allocates a fresh id.
    pub fn next() -> Self {
        InstanceId(NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One active filter condition.
///
/// Content equality ([`same_condition`](Self::same_condition)) ignores the
/// instance id.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurableFilter {
    /// Registry field this filter applies to.
    pub field_id: String,
    /// Variant the filter was built for.
    pub variant: Variant,
    /// Comparison operator.
    pub operator: Operator,
    /// User-supplied value.
    pub value: FilterValue,
    /// UI identity.
    pub instance_id: InstanceId,
}

impl ConfigurableFilter {
    /// Builds a filter checked against `registry`.
    ///
    /// `operator` defaults to the field's default operator.
    pub fn new(
        registry: &FieldRegistry,
        field_id: &str,
        operator: Option<Operator>,
        value: impl Into<FilterValue>,
    ) -> Result<Self, FilterError> {
        let config = registry
            .get(field_id)
            .ok_or_else(|| FilterError::UnknownField(field_id.to_string()))?;
        let operator = operator.unwrap_or_else(|| config.default_operator());
        let value = value.into();
        check(field_id, config, operator, &value)?;
        Ok(ConfigurableFilter::unchecked(
            field_id,
            config.variant,
            operator,
            value,
        ))
    }

    /// Builds a filter without consulting a registry.
    pub fn unchecked(
        field_id: impl Into<String>,
        variant: Variant,
        operator: Operator,
        value: impl Into<FilterValue>,
    ) -> Self {
        ConfigurableFilter {
            field_id: field_id.into(),
            variant,
            operator,
            value: value.into(),
            instance_id: InstanceId::next(),
        }
    }

    /// Returns a copy with a new operator and/or value, checked against `registry`.
    pub fn updated(
        &self,
        registry: &FieldRegistry,
        operator: Option<Operator>,
        value: Option<FilterValue>,
    ) -> Result<Self, FilterError> {
        let config = registry
            .get(&self.field_id)
            .ok_or_else(|| FilterError::UnknownField(self.field_id.clone()))?;
        let operator = operator.unwrap_or(self.operator);
        let value = value.unwrap_or_else(|| self.value.clone());
        check(&self.field_id, config, operator, &value)?;
        Ok(ConfigurableFilter {
            field_id: self.field_id.clone(),
            variant: config.variant,
            operator,
            value,
            instance_id: self.instance_id,
        })
    }

    /// Returns `true` if both filters express the same condition.
    pub fn same_condition(&self, other: &ConfigurableFilter) -> bool {
        self.field_id == other.field_id
            && self.variant == other.variant
            && self.operator == other.operator
            && self.value == other.value
    }
}

/// Returns the value shape `variant` expects under `operator`, or `None`
/// when any shape is accepted.
pub fn expected_shape(variant: Variant, operator: Operator) -> Option<&'static str> {
    if operator.is_presence() {
        None
    } else if variant.is_keyed() {
        Some("pair")
    } else if variant.is_multi() || (operator.is_range() && variant != Variant::DateRange) {
        Some("list")
    } else {
        Some("text")
    }
}

fn check(
    field_id: &str,
    config: &FilterFieldConfig,
    operator: Operator,
    value: &FilterValue,
) -> Result<(), FilterError> {
    if !config.allows(operator) {
        return Err(FilterError::OperatorNotAllowed {
            field: field_id.to_string(),
            variant: config.variant,
            operator,
        });
    }
    match expected_shape(config.variant, operator) {
        Some(expected) if expected != value.shape() => Err(FilterError::ValueShape {
            field: field_id.to_string(),
            expected,
            actual: value.shape(),
        }),
        _ => Ok(()),
    }
}
