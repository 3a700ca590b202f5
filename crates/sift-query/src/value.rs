//! Filter values and query scalars.
//!
//! [`FilterValue`] is what a user typed into a filter widget. [`Scalar`] is
//! what ends up on the right-hand side of a query document entry.

use serde::{Deserialize, Serialize};

use crate::variant::Variant;

/// The value held by a live filter.
///
/// The shape depends on the field's variant and the filter's operator:
/// pairs for `metadata` and `balanceByAsset`, lists for `isBetween` and
/// `multiSelect`, text for everything else.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Plain text.
    Text(String),
    /// Ordered list of texts.
    List(Vec<String>),
    /// Keyed value, e.g. a metadata key or an asset code.
    Pair { key: String, value: String },
}

impl FilterValue {
    /// Creates a text value.
    pub fn text(s: impl Into<String>) -> Self {
        FilterValue::Text(s.into())
    }

    /// Creates a list value.
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FilterValue::List(items.into_iter().map(Into::into).collect())
    }

    /// Creates a keyed value.
    pub fn pair(key: impl Into<String>, value: impl Into<String>) -> Self {
        FilterValue::Pair {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Returns the shape name, used in error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            FilterValue::Text(_) => "text",
            FilterValue::List(_) => "list",
            FilterValue::Pair { .. } => "pair",
        }
    }

    /// Extracts the text, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FilterValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Extracts the items, if this is a list value.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FilterValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns `true` if the value carries no user input.
    pub fn is_blank(&self) -> bool {
        match self {
            FilterValue::Text(s) => s.is_empty(),
            FilterValue::List(items) => items.iter().all(String::is_empty),
            FilterValue::Pair { key, value } => key.is_empty() && value.is_empty(),
        }
    }

    /// Renders the value as a bare navigation parameter.
    ///
    /// Lists are comma-joined and pairs are written as `key:value`.
    pub fn to_param(&self) -> String {
        match self {
            FilterValue::Text(s) => s.clone(),
            FilterValue::List(items) => items.join(","),
            FilterValue::Pair { key, value } => format!("{key}:{value}"),
        }
    }

    /// Reads a bare navigation parameter back into the shape `variant` expects.
    pub fn from_param(variant: Variant, raw: &str) -> Self {
        if variant.is_multi() {
            return FilterValue::list(raw.split(',').filter(|s| !s.is_empty()));
        }
        if variant.is_keyed() {
            if let Some((key, value)) = raw.split_once(':') {
                return FilterValue::pair(key, value);
            }
        }
        FilterValue::text(raw)
    }
}

impl Default for FilterValue {
    fn default() -> Self {
        FilterValue::Text(String::new())
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Text(s)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(items: Vec<String>) -> Self {
        FilterValue::List(items)
    }
}

/// Right-hand side of a query document entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

/// 2^53: above this not every integer has an exact `f64` form.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

impl Scalar {
    /// Builds a number scalar. Integral values within the exact `f64` range
    /// become integers. Non-finite floats have no JSON form and become null.
    pub fn float(n: f64) -> Self {
        if n.fract() == 0.0 && n.abs() < MAX_EXACT_INTEGER {
            return Scalar::Number((n as i64).into());
        }
        serde_json::Number::from_f64(n)
            .map(Scalar::Number)
            .unwrap_or(Scalar::Null)
    }

    /// Converts a JSON value. Arrays and objects are not scalars.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => Some(Scalar::Null),
            serde_json::Value::Bool(b) => Some(Scalar::Bool(*b)),
            serde_json::Value::Number(n) => Some(Scalar::Number(n.clone())),
            serde_json::Value::String(s) => Some(Scalar::String(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }

    /// JavaScript-style truthiness, used to read `$exists` entries.
    pub fn is_truthy(&self) -> bool {
        match self {
            Scalar::Null => false,
            Scalar::Bool(b) => *b,
            Scalar::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Scalar::String(s) => !s.is_empty(),
        }
    }

    /// Renders the scalar as filter text.
    pub fn to_text(&self) -> String {
        match self {
            Scalar::Null => String::new(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Number(n) => n.to_string(),
            Scalar::String(s) => s.clone(),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Number(n.into())
    }
}
