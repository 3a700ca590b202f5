//! Query compiler: active filters to a [`QueryDocument`].
//!
//! Each filter compiles to one fragment following the operator table below,
//! unless its variant overrides it:
//!
//! | Operator | Fragment |
//! |----------|----------|
//! | `eq` | `{$match: {f: v}}` |
//! | `ne` | `{$not: {$match: {f: v}}}` |
//! | `lt` `lte` `gt` `gte` | `{$lt: {f: v}}`, ... |
//! | `isEmpty` | `{$not: {$exists: {f: true}}}` |
//! | `isNotEmpty` | `{$exists: {f: true}}` |
//! | `isBetween` | `{$and: [{$gte: {f: v0}}, {$lte: {f: v1}}]}`, `eq` unless two values |
//!
//! Fragments are combined with the join operator: none gives `{}`, one is
//! returned as is, more are wrapped in `$and` / `$or`. Fields promoted to a
//! standalone parameter never reach the document.
//!
//! Compilation is total. Anything the compiler does not understand (unknown
//! operators, unknown variants, values of the wrong shape) degrades to
//! equality instead of failing.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::document::{Comparison, QueryDocument};
use crate::filter::ConfigurableFilter;
use crate::op::{JoinOperator, Operator};
use crate::registry::FieldRegistry;
use crate::value::{FilterValue, Scalar};
use crate::variant::Variant;

/// Compiles the non-standalone filters into one document.
///
/// # Example
///
/// ```
/// use sift_query::{compile, ConfigurableFilter, FieldRegistry, FilterFieldConfig,
///                  JoinOperator, Operator, Variant};
///
/// let registry = FieldRegistry::new()
///     .field("status", FilterFieldConfig::new("Status", Variant::Text))
///     .field("amount", FilterFieldConfig::new("Amount", Variant::Number));
///
/// let filters = vec![
///     ConfigurableFilter::new(&registry, "status", Some(Operator::Eq), "active").unwrap(),
///     ConfigurableFilter::new(&registry, "amount", Some(Operator::Gte), "100").unwrap(),
/// ];
///
/// let doc = compile(&registry, &filters, JoinOperator::And);
/// assert_eq!(
///     doc.to_json_string(),
///     r#"{"$and":[{"$match":{"status":"active"}},{"$gte":{"amount":"100"}}]}"#
/// );
/// ```
pub fn compile(
    registry: &FieldRegistry,
    filters: &[ConfigurableFilter],
    join: JoinOperator,
) -> QueryDocument {
    let fragments = filters
        .iter()
        .filter(|filter| !registry.is_standalone(&filter.field_id))
        .filter_map(compile_filter)
        .collect();
    combine(fragments, join)
}

/// Compiles and renders as JSON text, or `""` when nothing constrains the query.
pub fn compile_to_string(
    registry: &FieldRegistry,
    filters: &[ConfigurableFilter],
    join: JoinOperator,
) -> String {
    let doc = compile(registry, filters, join);
    if doc.is_empty() {
        String::new()
    } else {
        doc.to_json_string()
    }
}

/// Combines fragments under the join operator.
pub fn combine(mut fragments: Vec<QueryDocument>, join: JoinOperator) -> QueryDocument {
    match fragments.len() {
        0 => QueryDocument::Empty,
        1 => fragments.swap_remove(0),
        _ => match join {
            JoinOperator::And => QueryDocument::And(fragments),
            JoinOperator::Or => QueryDocument::Or(fragments),
        },
    }
}

/// Compiles a single filter.
///
/// Returns `None` when the filter carries nothing to constrain on: an empty
/// multi-select, or a date range that is malformed or has neither bound.
pub fn compile_filter(filter: &ConfigurableFilter) -> Option<QueryDocument> {
    let field = filter.field_id.as_str();
    let op = filter.operator;
    if op == Operator::Unknown || filter.variant == Variant::Unknown {
        return Some(QueryDocument::matching(field, plain(&filter.value)));
    }

    match (filter.variant, &filter.value) {
        (Variant::Boolean, value) => Some(by_operator(field, op, value, boolean)),
        (Variant::Metadata, FilterValue::Pair { key, value }) => Some(QueryDocument::matching(
            format!("metadata[{key}]"),
            value.as_str(),
        )),
        (Variant::BalanceByAsset, FilterValue::Pair { key, value }) => {
            Some(balance(key, value, op))
        }
        (Variant::DateRange, value) => date_range(field, value),
        (Variant::MultiSelect, value) if !op.is_presence() => multi_select(field, op, value),
        (_, value) => Some(by_operator(field, op, value, text)),
    }
}

fn text(raw: &str) -> Scalar {
    Scalar::String(raw.to_string())
}

fn boolean(raw: &str) -> Scalar {
    match raw {
        "true" => Scalar::Bool(true),
        "false" => Scalar::Bool(false),
        other => Scalar::String(other.to_string()),
    }
}

fn plain(value: &FilterValue) -> Scalar {
    match value {
        FilterValue::Pair { value, .. } => Scalar::String(value.clone()),
        other => Scalar::String(other.to_param()),
    }
}

fn by_operator(
    field: &str,
    op: Operator,
    value: &FilterValue,
    to_scalar: fn(&str) -> Scalar,
) -> QueryDocument {
    if op == Operator::IsBetween {
        if let Some([low, high]) = value.as_list() {
            return QueryDocument::And(vec![
                QueryDocument::compare(Comparison::Gte, field, to_scalar(low)),
                QueryDocument::compare(Comparison::Lte, field, to_scalar(high)),
            ]);
        }
        return by_scalar(field.to_string(), Operator::Eq, to_scalar(&value.to_param()));
    }
    let raw = match value {
        FilterValue::Pair { value, .. } => value.clone(),
        other => other.to_param(),
    };
    by_scalar(field.to_string(), op, to_scalar(&raw))
}

fn by_scalar(field: String, op: Operator, scalar: Scalar) -> QueryDocument {
    if let Some(cmp) = Comparison::from_operator(op) {
        return QueryDocument::Compare(cmp, vec![(field, scalar)]);
    }
    match op {
        Operator::Ne => QueryDocument::negate(QueryDocument::Match(vec![(field, scalar)])),
        Operator::IsEmpty => QueryDocument::negate(QueryDocument::exists(field)),
        Operator::IsNotEmpty => QueryDocument::exists(field),
        _ => QueryDocument::Match(vec![(field, scalar)]),
    }
}

fn balance(asset: &str, raw: &str, op: Operator) -> QueryDocument {
    let field = format!("balance[{asset}]");
    if op.is_presence() {
        return by_scalar(field, op, Scalar::Null);
    }
    match raw.trim().parse::<f64>() {
        Ok(amount) if amount.is_finite() => by_scalar(field, op, Scalar::float(amount)),
        _ => {
            tracing::warn!(
                asset,
                value = raw,
                "balance filter value is not a number, matching it as text"
            );
            QueryDocument::matching(field, raw)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct DateRange {
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
}

fn date_range(field: &str, value: &FilterValue) -> Option<QueryDocument> {
    let raw = value.to_param();
    let range: DateRange = match serde_json::from_str(&raw) {
        Ok(range) => range,
        Err(err) => {
            tracing::warn!(field, error = %err, "malformed date range, ignoring filter");
            return None;
        }
    };

    let mut bounds = Vec::with_capacity(2);
    if let Some(from) = range.from.filter(|s| !s.is_empty()) {
        bounds.push(QueryDocument::compare(Comparison::Gte, field, from));
    }
    if let Some(to) = range.to.filter(|s| !s.is_empty()) {
        bounds.push(QueryDocument::compare(
            Comparison::Lte,
            field,
            end_of_day(&to),
        ));
    }
    if bounds.is_empty() {
        tracing::warn!(field, "date range has no bounds, ignoring filter");
        return None;
    }
    Some(combine(bounds, JoinOperator::And))
}

/// Moves a timestamp or bare date to 23:59:59.999 UTC of its calendar day.
///
/// Input that is neither RFC 3339 nor `YYYY-MM-DD` is returned unchanged.
///
/// ```
/// assert_eq!(
///     sift_query::end_of_day("2024-01-02T00:00:00Z"),
///     "2024-01-02T23:59:59.999Z"
/// );
/// ```
pub fn end_of_day(raw: &str) -> String {
    let day = DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"));
    match day.ok().and_then(|d| d.and_hms_milli_opt(23, 59, 59, 999)) {
        Some(end) => end.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        None => {
            tracing::warn!(value = raw, "unrecognized date in range, leaving it as is");
            raw.to_string()
        }
    }
}

fn multi_select(field: &str, op: Operator, value: &FilterValue) -> Option<QueryDocument> {
    let selected: Vec<&str> = match value {
        FilterValue::List(items) => items.iter().map(String::as_str).collect(),
        FilterValue::Text(s) => vec![s.as_str()],
        FilterValue::Pair { value, .. } => vec![value.as_str()],
    };
    let matches: Vec<QueryDocument> = selected
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(|s| QueryDocument::matching(field, s))
        .collect();
    if matches.is_empty() {
        return None;
    }
    let any = combine(matches, JoinOperator::Or);
    Some(match op {
        Operator::Ne => QueryDocument::negate(any),
        _ => any,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FilterFieldConfig;
    use serde_json::json;

    fn filter(
        field: &str,
        variant: Variant,
        op: Operator,
        value: impl Into<FilterValue>,
    ) -> ConfigurableFilter {
        ConfigurableFilter::unchecked(field, variant, op, value)
    }

    fn fragment(f: &ConfigurableFilter) -> serde_json::Value {
        compile_filter(f).unwrap().to_json()
    }

    #[test]
    fn operator_table() {
        let f = |op| filter("name", Variant::Text, op, "x");
        assert_eq!(fragment(&f(Operator::Eq)), json!({"$match": {"name": "x"}}));
        assert_eq!(
            fragment(&f(Operator::Ne)),
            json!({"$not": {"$match": {"name": "x"}}})
        );
        assert_eq!(fragment(&f(Operator::Lt)), json!({"$lt": {"name": "x"}}));
        assert_eq!(fragment(&f(Operator::Lte)), json!({"$lte": {"name": "x"}}));
        assert_eq!(fragment(&f(Operator::Gt)), json!({"$gt": {"name": "x"}}));
        assert_eq!(fragment(&f(Operator::Gte)), json!({"$gte": {"name": "x"}}));
        assert_eq!(
            fragment(&f(Operator::IsEmpty)),
            json!({"$not": {"$exists": {"name": true}}})
        );
        assert_eq!(
            fragment(&f(Operator::IsNotEmpty)),
            json!({"$exists": {"name": true}})
        );
    }

    #[test]
    fn is_between_with_two_values() {
        let f = filter(
            "amount",
            Variant::Number,
            Operator::IsBetween,
            FilterValue::list(["10", "20"]),
        );
        assert_eq!(
            fragment(&f),
            json!({"$and": [{"$gte": {"amount": "10"}}, {"$lte": {"amount": "20"}}]})
        );
    }

    #[test]
    fn is_between_falls_back_to_eq() {
        let f = filter("amount", Variant::Number, Operator::IsBetween, "10");
        assert_eq!(fragment(&f), json!({"$match": {"amount": "10"}}));

        let f = filter(
            "amount",
            Variant::Number,
            Operator::IsBetween,
            FilterValue::list(["10"]),
        );
        assert_eq!(fragment(&f), json!({"$match": {"amount": "10"}}));
    }

    #[test]
    fn boolean_coercion() {
        let f = filter("active", Variant::Boolean, Operator::Eq, "true");
        assert_eq!(fragment(&f), json!({"$match": {"active": true}}));
        let f = filter("active", Variant::Boolean, Operator::Ne, "false");
        assert_eq!(fragment(&f), json!({"$not": {"$match": {"active": false}}}));
        let f = filter("active", Variant::Boolean, Operator::Eq, "maybe");
        assert_eq!(fragment(&f), json!({"$match": {"active": "maybe"}}));
    }

    #[test]
    fn metadata_uses_bracketed_field() {
        let f = filter(
            "metadata",
            Variant::Metadata,
            Operator::Eq,
            FilterValue::pair("tier", "gold"),
        );
        assert_eq!(fragment(&f), json!({"$match": {"metadata[tier]": "gold"}}));
    }

    #[test]
    fn balance_is_numeric() {
        let f = filter(
            "balance",
            Variant::BalanceByAsset,
            Operator::Gte,
            FilterValue::pair("USD", "250"),
        );
        assert_eq!(fragment(&f), json!({"$gte": {"balance[USD]": 250}}));

        let f = filter(
            "balance",
            Variant::BalanceByAsset,
            Operator::Ne,
            FilterValue::pair("EUR", "0.5"),
        );
        assert_eq!(
            fragment(&f),
            json!({"$not": {"$match": {"balance[EUR]": 0.5}}})
        );
    }

    #[test]
    fn balance_presence_ignores_amount() {
        let f = |op| filter("balance", Variant::BalanceByAsset, op, FilterValue::pair("USD", ""));
        assert_eq!(
            fragment(&f(Operator::IsNotEmpty)),
            json!({"$exists": {"balance[USD]": true}})
        );
        assert_eq!(
            fragment(&f(Operator::IsEmpty)),
            json!({"$not": {"$exists": {"balance[USD]": true}}})
        );
    }

    #[test]
    fn balance_falls_back_to_text() {
        let f = filter(
            "balance",
            Variant::BalanceByAsset,
            Operator::Eq,
            FilterValue::pair("USD", "not-a-number"),
        );
        assert_eq!(
            fragment(&f),
            json!({"$match": {"balance[USD]": "not-a-number"}})
        );

        let f = filter(
            "balance",
            Variant::BalanceByAsset,
            Operator::Lt,
            FilterValue::pair("USD", "lots"),
        );
        assert_eq!(fragment(&f), json!({"$match": {"balance[USD]": "lots"}}));
    }

    #[test]
    fn date_range_normalizes_upper_bound() {
        let f = filter(
            "created",
            Variant::DateRange,
            Operator::IsBetween,
            r#"{"from":"2024-01-01T00:00:00Z","to":"2024-01-02T00:00:00Z"}"#,
        );
        assert_eq!(
            fragment(&f),
            json!({"$and": [
                {"$gte": {"created": "2024-01-01T00:00:00Z"}},
                {"$lte": {"created": "2024-01-02T23:59:59.999Z"}}
            ]})
        );
    }

    #[test]
    fn date_range_partial_and_malformed() {
        let f = filter(
            "created",
            Variant::DateRange,
            Operator::IsBetween,
            r#"{"from":"2024-03-01"}"#,
        );
        assert_eq!(fragment(&f), json!({"$gte": {"created": "2024-03-01"}}));

        let f = filter(
            "created",
            Variant::DateRange,
            Operator::IsBetween,
            r#"{"to":"2024-03-05"}"#,
        );
        assert_eq!(
            fragment(&f),
            json!({"$lte": {"created": "2024-03-05T23:59:59.999Z"}})
        );

        let f = filter("created", Variant::DateRange, Operator::IsBetween, "{oops");
        assert!(compile_filter(&f).is_none());

        let f = filter("created", Variant::DateRange, Operator::IsBetween, "{}");
        assert!(compile_filter(&f).is_none());
    }

    #[test]
    fn end_of_day_handles_offsets_and_dates() {
        assert_eq!(end_of_day("2024-06-30"), "2024-06-30T23:59:59.999Z");
        assert_eq!(
            end_of_day("2024-01-02T03:00:00+05:00"),
            "2024-01-01T23:59:59.999Z"
        );
        assert_eq!(end_of_day("yesterday"), "yesterday");
    }

    #[test]
    fn multi_select_expands_to_or() {
        let f = filter(
            "tags",
            Variant::MultiSelect,
            Operator::Eq,
            FilterValue::list(["a", "b"]),
        );
        assert_eq!(
            fragment(&f),
            json!({"$or": [{"$match": {"tags": "a"}}, {"$match": {"tags": "b"}}]})
        );

        let f = filter(
            "tags",
            Variant::MultiSelect,
            Operator::Ne,
            FilterValue::list(["a"]),
        );
        assert_eq!(fragment(&f), json!({"$not": {"$match": {"tags": "a"}}}));

        let f = filter(
            "tags",
            Variant::MultiSelect,
            Operator::Eq,
            FilterValue::list(Vec::<String>::new()),
        );
        assert!(compile_filter(&f).is_none());
    }

    #[test]
    fn unknown_operator_and_variant_fall_back_to_match() {
        let f = filter("name", Variant::Text, Operator::Unknown, "x");
        assert_eq!(fragment(&f), json!({"$match": {"name": "x"}}));
        let f = filter("name", Variant::Unknown, Operator::Gt, "x");
        assert_eq!(fragment(&f), json!({"$match": {"name": "x"}}));
    }

    #[test]
    fn wrong_shape_on_keyed_variant_uses_operator_table() {
        let f = filter("metadata[tier]", Variant::Metadata, Operator::Eq, "gold");
        assert_eq!(fragment(&f), json!({"$match": {"metadata[tier]": "gold"}}));
    }

    #[test]
    fn composition() {
        let registry = FieldRegistry::new();
        let a = filter("a", Variant::Text, Operator::Eq, "1");
        let b = filter("b", Variant::Text, Operator::Eq, "2");

        assert_eq!(compile(&registry, &[], JoinOperator::And), QueryDocument::Empty);
        assert_eq!(
            compile(&registry, &[a.clone()], JoinOperator::Or).to_json(),
            json!({"$match": {"a": "1"}})
        );
        assert_eq!(
            compile(&registry, &[a.clone(), b.clone()], JoinOperator::Or).to_json(),
            json!({"$or": [{"$match": {"a": "1"}}, {"$match": {"b": "2"}}]})
        );
        assert_eq!(
            compile(&registry, &[a, b], JoinOperator::And).to_json(),
            json!({"$and": [{"$match": {"a": "1"}}, {"$match": {"b": "2"}}]})
        );
    }

    #[test]
    fn standalone_fields_are_excluded() {
        let registry = FieldRegistry::new()
            .field("status", FilterFieldConfig::new("Status", Variant::Text))
            .field(
                "account",
                FilterFieldConfig::new("Account", Variant::Text).standalone("account"),
            );
        let filters = vec![
            ConfigurableFilter::new(&registry, "status", None, "active").unwrap(),
            ConfigurableFilter::new(&registry, "account", None, "acc_1").unwrap(),
        ];
        assert_eq!(
            compile(&registry, &filters, JoinOperator::And).to_json(),
            json!({"$match": {"status": "active"}})
        );

        assert_eq!(compile_to_string(&registry, &filters[1..], JoinOperator::And), "");
    }
}
