//! Query decompiler: a best-effort inverse of [`compile`](crate::compile).
//!
//! Decompilation is deliberately partial. It recovers enough to repopulate a
//! filter list from a deep link, not the exact filters that produced the
//! document:
//!
//! - `$match` entries become `text` / `eq` filters
//! - `$lt`, `$lte`, `$gt`, `$gte`, `$ne` entries become `number` filters
//! - `$exists` entries become `text` / `isNotEmpty` (or `isEmpty` when falsy)
//! - `$and` / `$or` children are flattened; the join is `or` if any `$or`
//!   appears, else `and`
//! - `$not` is unwrapped and its negation dropped
//!
//! Nothing here fails. Malformed input yields an empty list.

use crate::document::QueryDocument;
use crate::filter::ConfigurableFilter;
use crate::op::{JoinOperator, Operator};
use crate::value::{FilterValue, Scalar};
use crate::variant::Variant;

/// Filters and join operator recovered from a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decompiled {
    pub filters: Vec<ConfigurableFilter>,
    pub join: JoinOperator,
}

impl Decompiled {
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// Recovers the filters of a document.
pub fn decompile(doc: &QueryDocument) -> Vec<ConfigurableFilter> {
    let mut filters = Vec::new();
    collect(doc, &mut filters);
    filters
}

/// Recovers the filters of a document together with its join operator.
pub fn decompile_with_join(doc: &QueryDocument) -> Decompiled {
    Decompiled {
        filters: decompile(doc),
        join: if doc.contains_or() {
            JoinOperator::Or
        } else {
            JoinOperator::And
        },
    }
}

/// Parses and decompiles JSON text. Empty or malformed text yields nothing.
pub fn decompile_str(text: &str) -> Decompiled {
    if text.trim().is_empty() {
        return Decompiled::default();
    }
    match QueryDocument::parse(text) {
        Ok(doc) => decompile_with_join(&doc),
        Err(err) => {
            tracing::warn!(
                error = %err,
                "could not read persisted query, starting without filters"
            );
            Decompiled::default()
        }
    }
}

fn collect(doc: &QueryDocument, out: &mut Vec<ConfigurableFilter>) {
    match doc {
        QueryDocument::Empty => {}
        QueryDocument::Match(fields) => out.extend(
            fields
                .iter()
                .map(|(field, value)| leaf(field, Variant::Text, Operator::Eq, value)),
        ),
        QueryDocument::Compare(op, fields) => out.extend(
            fields
                .iter()
                .map(|(field, value)| leaf(field, Variant::Number, op.operator(), value)),
        ),
        QueryDocument::Exists(fields) => out.extend(fields.iter().map(|(field, value)| {
            let op = if value.is_truthy() {
                Operator::IsNotEmpty
            } else {
                Operator::IsEmpty
            };
            ConfigurableFilter::unchecked(field.as_str(), Variant::Text, op, FilterValue::default())
        })),
        QueryDocument::Not(inner) => collect(inner, out),
        QueryDocument::And(children) | QueryDocument::Or(children) => {
            for child in children {
                collect(child, out);
            }
        }
    }
}

fn leaf(field: &str, variant: Variant, op: Operator, value: &Scalar) -> ConfigurableFilter {
    ConfigurableFilter::unchecked(field, variant, op, value.to_text())
}
