//! Field registry: static per-table filter metadata.
//!
//! A [`FieldRegistry`] maps field identifiers to their [`FilterFieldConfig`].
//! It is built once per table identity and never re-derived afterwards; share
//! it behind an `Arc` rather than rebuilding it.
//!
//! # Example
//!
//! ```
//! use sift_query::{FieldRegistry, FilterFieldConfig, Operator, Variant};
//!
//! let registry = FieldRegistry::new()
//!     .field("status", FilterFieldConfig::new("Status", Variant::Select))
//!     .field(
//!         "amount",
//!         FilterFieldConfig::new("Amount", Variant::Number)
//!             .operators([Operator::Gte, Operator::Lte]),
//!     )
//!     .field(
//!         "account",
//!         FilterFieldConfig::new("Account", Variant::Text).standalone("account"),
//!     )
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(registry.len(), 3);
//! assert!(registry.is_standalone("account"));
//! ```

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::op::Operator;
use crate::variant::Variant;

/// One selectable option of a `select` or `multiSelect` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        SelectOption {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Filter metadata for a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterFieldConfig {
    /// Display label.
    pub label: String,
    /// Data-type category.
    pub variant: Variant,
    /// Override of the variant's default operator set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operators: Option<Vec<Operator>>,
    /// Options for select variants.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    /// Slider lower bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Slider upper bound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Slider step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    /// When set, the field is persisted as its own navigation parameter
    /// instead of folding into the compiled query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standalone_param: Option<String>,
}

impl FilterFieldConfig {
    /// Creates a config with the variant's default operators.
    pub fn new(label: impl Into<String>, variant: Variant) -> Self {
        FilterFieldConfig {
            label: label.into(),
            variant,
            operators: None,
            options: Vec::new(),
            min: None,
            max: None,
            step: None,
            standalone_param: None,
        }
    }

    /// Overrides the operator set.
    pub fn operators<I>(mut self, operators: I) -> Self
    where
        I: IntoIterator<Item = Operator>,
    {
        self.operators = Some(operators.into_iter().collect());
        self
    }

    /// Adds a select option.
    pub fn option(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.options.push(SelectOption::new(value, label));
        self
    }

    /// Sets slider bounds.
    pub fn bounds(mut self, min: f64, max: f64, step: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self.step = Some(step);
        self
    }

    /// Promotes the field to a standalone navigation parameter.
    pub fn standalone(mut self, param: impl Into<String>) -> Self {
        self.standalone_param = Some(param.into());
        self
    }

    /// Returns the operator set in effect: the override if present, else the
    /// variant's defaults.
    pub fn resolved_operators(&self) -> &[Operator] {
        match &self.operators {
            Some(ops) if !ops.is_empty() => ops,
            _ => self.variant.default_operators(),
        }
    }

    /// Returns the operator new filters on this field start with.
    pub fn default_operator(&self) -> Operator {
        self.resolved_operators()[0]
    }

    /// Returns `true` if `op` is in the resolved operator set.
    pub fn allows(&self, op: Operator) -> bool {
        self.resolved_operators().contains(&op)
    }

    fn validate(&self, id: &str) -> Result<(), RegistryError> {
        if matches!(&self.operators, Some(ops) if ops.is_empty()) {
            return Err(RegistryError::EmptyOperators(id.to_string()));
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(RegistryError::InvalidBounds {
                    field: id.to_string(),
                    reason: format!("min {min} is greater than max {max}"),
                });
            }
        }
        if let Some(step) = self.step {
            if step <= 0.0 || !step.is_finite() {
                return Err(RegistryError::InvalidBounds {
                    field: id.to_string(),
                    reason: format!("step must be positive, got {step}"),
                });
            }
        }
        Ok(())
    }
}

/// Registry entry as it appears in configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub id: String,
    #[serde(flatten)]
    pub config: FilterFieldConfig,
}

/// Ordered, immutable mapping from field id to [`FilterFieldConfig`].
///
/// Serialized as a list of entries (`{id, label, variant, ...}`) so that
/// declaration order survives every configuration format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FieldEntry>", into = "Vec<FieldEntry>")]
pub struct FieldRegistry {
    fields: Vec<(String, FilterFieldConfig)>,
}

impl FieldRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        FieldRegistry::default()
    }

    /// Adds (or replaces) a field. Call [`build`](Self::build) to validate.
    pub fn field(mut self, id: impl Into<String>, config: FilterFieldConfig) -> Self {
        let id = id.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == id) {
            Some(slot) => slot.1 = config,
            None => self.fields.push((id, config)),
        }
        self
    }

    /// Validates the registry and returns it.
    pub fn build(self) -> Result<Self, RegistryError> {
        self.validate()?;
        Ok(self)
    }

    /// Parses a YAML list of field entries.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, RegistryError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parses a JSON list of field entries.
    pub fn from_json_str(json: &str) -> Result<Self, RegistryError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Checks every entry and the uniqueness of standalone parameters.
    pub fn validate(&self) -> Result<(), RegistryError> {
        for (id, config) in &self.fields {
            config.validate(id)?;
        }
        let mut seen: Vec<(&str, &str)> = Vec::new();
        for (id, param) in self.standalone_params() {
            if let Some((_, first)) = seen.iter().find(|(p, _)| *p == param) {
                return Err(RegistryError::DuplicateStandaloneParam {
                    param: param.to_string(),
                    first: first.to_string(),
                    second: id.to_string(),
                });
            }
            seen.push((param, id));
        }
        Ok(())
    }

    /// Looks up a field.
    pub fn get(&self, id: &str) -> Option<&FilterFieldConfig> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(_, config)| config)
    }

    /// Returns `true` if the field exists.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Iterates fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterFieldConfig)> {
        self.fields.iter().map(|(id, config)| (id.as_str(), config))
    }

    /// Iterates `(field id, parameter name)` for every standalone field.
    pub fn standalone_params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.iter().filter_map(|(id, config)| {
            config
                .standalone_param
                .as_deref()
                .map(|param| (id, param))
        })
    }

    /// Returns the standalone parameter of a field, if it has one.
    pub fn standalone_param(&self, id: &str) -> Option<&str> {
        self.get(id)?.standalone_param.as_deref()
    }

    /// Returns `true` if the field is persisted as a standalone parameter.
    pub fn is_standalone(&self, id: &str) -> bool {
        self.standalone_param(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl TryFrom<Vec<FieldEntry>> for FieldRegistry {
    type Error = RegistryError;

    fn try_from(entries: Vec<FieldEntry>) -> Result<Self, Self::Error> {
        entries
            .into_iter()
            .fold(FieldRegistry::new(), |registry, entry| {
                registry.field(entry.id, entry.config)
            })
            .build()
    }
}

impl From<FieldRegistry> for Vec<FieldEntry> {
    fn from(registry: FieldRegistry) -> Self {
        registry
            .fields
            .into_iter()
            .map(|(id, config)| FieldEntry { id, config })
            .collect()
    }
}
