//! Filter operators and the join combinator.
//!
//! The [`Operator`] enum names every comparison a filter can carry. Which
//! operators a field accepts is decided by its [`Variant`](crate::Variant)
//! or by an explicit override in its registry entry.

use serde::{Deserialize, Serialize};

/// Comparison operator of a single filter.
///
/// Operators serialize in camelCase (`isNotEmpty`, `gte`, ...). Names that
/// are not recognized deserialize to [`Operator::Unknown`] instead of
/// failing, and compile to plain equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    /// Equal.
    Eq,
    /// Not equal.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Field is missing or empty.
    IsEmpty,
    /// Field is present.
    IsNotEmpty,
    /// Inclusive range over a two-element value.
    IsBetween,
    /// Operator name this crate does not know.
    #[serde(other)]
    Unknown,
}

impl Operator {
    /// All known operators, in display order.
    pub const ALL: [Operator; 9] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Lt,
        Operator::Lte,
        Operator::Gt,
        Operator::Gte,
        Operator::IsEmpty,
        Operator::IsNotEmpty,
        Operator::IsBetween,
    ];

    /// Returns `true` for the four ordering comparisons.
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte
        )
    }

    /// Returns `true` if the operator ignores the filter value.
    pub fn is_presence(self) -> bool {
        matches!(self, Operator::IsEmpty | Operator::IsNotEmpty)
    }

    /// Returns `true` if the operator expects a two-element value.
    pub fn is_range(self) -> bool {
        matches!(self, Operator::IsBetween)
    }

    /// Returns the wire name of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::IsEmpty => "isEmpty",
            Operator::IsNotEmpty => "isNotEmpty",
            Operator::IsBetween => "isBetween",
            Operator::Unknown => "unknown",
        }
    }

    /// Parses a wire name. Unrecognized names yield [`Operator::Unknown`].
    pub fn parse(name: &str) -> Operator {
        Operator::ALL
            .into_iter()
            .find(|op| op.as_str() == name)
            .unwrap_or(Operator::Unknown)
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Combinator applied across all compiled filters of one table view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinOperator {
    /// Every filter must match.
    #[default]
    And,
    /// At least one filter must match.
    Or,
}

impl JoinOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinOperator::And => "and",
            JoinOperator::Or => "or",
        }
    }
}

impl std::fmt::Display for JoinOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for JoinOperator {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "and" => Ok(JoinOperator::And),
            "or" => Ok(JoinOperator::Or),
            other => Err(format!("unknown join operator '{other}'")),
        }
    }
}
