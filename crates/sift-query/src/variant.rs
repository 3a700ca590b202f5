//! Data-type categories of filter fields.

use serde::{Deserialize, Serialize};

use crate::op::Operator;

/// The data-type category of a filter field.
///
/// A variant decides the default operator set and the shape of the value a
/// filter on that field carries.
///
/// | Variant | Default operators | Value |
/// |---------|-------------------|-------|
/// | `text`, `select` | `eq ne isEmpty isNotEmpty` | text |
/// | `number` | `eq ne gt gte lt lte isBetween isEmpty isNotEmpty` | text, list for `isBetween` |
/// | `boolean` | `eq ne` | `"true"` / `"false"` |
/// | `date` | `eq gt gte lt lte isBetween` | text, list for `isBetween` |
/// | `dateRange` | `isBetween` | JSON `{from,to}` text |
/// | `multiSelect` | `eq ne` | list |
/// | `metadata` | `eq` | key/value pair |
/// | `balanceByAsset` | `eq ne gt gte lt lte` | key/value pair |
/// | `slider` | `eq gt gte lt lte isBetween` | text, list for `isBetween` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Variant {
    Text,
    Number,
    Boolean,
    Date,
    DateRange,
    Select,
    MultiSelect,
    Metadata,
    BalanceByAsset,
    Slider,
    /// Variant name this crate does not know; compiles to equality.
    #[serde(other)]
    Unknown,
}

impl Variant {
    /// Returns the variant's default operator set. The first entry is the
    /// default operator for new filters.
    pub fn default_operators(self) -> &'static [Operator] {
        use Operator::*;
        match self {
            Variant::Text | Variant::Select => &[Eq, Ne, IsEmpty, IsNotEmpty],
            Variant::Number => &[Eq, Ne, Gt, Gte, Lt, Lte, IsBetween, IsEmpty, IsNotEmpty],
            Variant::Boolean => &[Eq, Ne],
            Variant::Date => &[Eq, Gt, Gte, Lt, Lte, IsBetween],
            Variant::DateRange => &[IsBetween],
            Variant::MultiSelect => &[Eq, Ne],
            Variant::Metadata => &[Eq],
            Variant::BalanceByAsset => &[Eq, Ne, Gt, Gte, Lt, Lte],
            Variant::Slider => &[Eq, Gt, Gte, Lt, Lte, IsBetween],
            Variant::Unknown => &[Eq],
        }
    }

    /// Returns the default operator for new filters of this variant.
    pub fn default_operator(self) -> Operator {
        self.default_operators()[0]
    }

    /// Returns `true` if values of this variant are `{key, value}` pairs.
    pub fn is_keyed(self) -> bool {
        matches!(self, Variant::Metadata | Variant::BalanceByAsset)
    }

    /// Returns `true` if values of this variant are lists regardless of operator.
    pub fn is_multi(self) -> bool {
        matches!(self, Variant::MultiSelect)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Text => "text",
            Variant::Number => "number",
            Variant::Boolean => "boolean",
            Variant::Date => "date",
            Variant::DateRange => "dateRange",
            Variant::Select => "select",
            Variant::MultiSelect => "multiSelect",
            Variant::Metadata => "metadata",
            Variant::BalanceByAsset => "balanceByAsset",
            Variant::Slider => "slider",
            Variant::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
