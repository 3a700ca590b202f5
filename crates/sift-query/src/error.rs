//! Error types for the sift-query crate.

use thiserror::Error;

use crate::op::Operator;
use crate::variant::Variant;

/// Errors raised while reading a query document.
///
/// Reading is tolerant: only text that is not JSON at all, or JSON whose top
/// level is not an object, is rejected.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The input is not valid JSON.
    #[error("invalid query JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The top-level JSON value is not an object.
    #[error("query document must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Errors raised when constructing or mutating a filter instance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// The field is not present in the registry.
    #[error("unknown filter field '{0}'")]
    UnknownField(String),

    /// The operator is not part of the field's resolved operator set.
    #[error("operator '{operator}' is not allowed for field '{field}' ({variant})")]
    OperatorNotAllowed {
        field: String,
        variant: Variant,
        operator: Operator,
    },

    /// The value's shape does not fit the field's variant and operator.
    #[error("field '{field}' expects a {expected} value, got {actual}")]
    ValueShape {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// No active filter carries this instance id.
    #[error("no active filter with instance id {0}")]
    UnknownInstance(u64),
}

/// Errors raised while building or loading a field registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// YAML configuration could not be parsed.
    #[error("invalid registry YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON configuration could not be parsed.
    #[error("invalid registry JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// An operator override was given but is empty.
    #[error("field '{0}' declares an empty operator list")]
    EmptyOperators(String),

    /// Slider bounds are inconsistent.
    #[error("field '{field}' has invalid slider bounds: {reason}")]
    InvalidBounds { field: String, reason: String },

    /// Two fields claim the same standalone navigation parameter.
    #[error("standalone parameter '{param}' is used by both '{first}' and '{second}'")]
    DuplicateStandaloneParam {
        param: String,
        first: String,
        second: String,
    },
}

/// Result type for query reading.
pub type Result<T> = std::result::Result<T, QueryError>;
