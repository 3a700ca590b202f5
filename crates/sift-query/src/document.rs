//! The recursive query document sent to the listing API.
//!
//! On the wire a document is a JSON object keyed by operators:
//!
//! ```text
//! {"$match":  {field: scalar, ...}}
//! {"$lt" | "$lte" | "$gt" | "$gte": {field: scalar, ...}}
//! {"$exists": {field: scalar, ...}}
//! {"$not":    <document>}
//! {"$and" | "$or": [<document>, ...]}
//! {}                                  -- matches everything
//! ```
//!
//! [`QueryDocument`] models this as a sum type so that only well-formed
//! documents can be built. Reading ([`QueryDocument::parse`]) is tolerant:
//! unknown keys are dropped and an object with several operator keys reads
//! as an implicit `$and` of them.

use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as Json};

use crate::error::{QueryError, Result};
use crate::op::Operator;
use crate::value::Scalar;

/// Ordered `(field name, scalar)` entries of a leaf node.
pub type Fields = Vec<(String, Scalar)>;

/// Ordering comparison of a `Compare` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Lt,
    Lte,
    Gt,
    Gte,
    /// Accepted when reading documents; never produced by the compiler,
    /// which writes inequality as `$not` + `$match`.
    Ne,
}

impl Comparison {
    /// Returns the wire key.
    pub fn key(self) -> &'static str {
        match self {
            Comparison::Lt => "$lt",
            Comparison::Lte => "$lte",
            Comparison::Gt => "$gt",
            Comparison::Gte => "$gte",
            Comparison::Ne => "$ne",
        }
    }

    /// Parses a wire key.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "$lt" => Some(Comparison::Lt),
            "$lte" => Some(Comparison::Lte),
            "$gt" => Some(Comparison::Gt),
            "$gte" => Some(Comparison::Gte),
            "$ne" => Some(Comparison::Ne),
            _ => None,
        }
    }

    /// Maps an ordering operator to its comparison.
    pub fn from_operator(op: Operator) -> Option<Self> {
        match op {
            Operator::Lt => Some(Comparison::Lt),
            Operator::Lte => Some(Comparison::Lte),
            Operator::Gt => Some(Comparison::Gt),
            Operator::Gte => Some(Comparison::Gte),
            _ => None,
        }
    }

    /// Maps back to the filter operator.
    pub fn operator(self) -> Operator {
        match self {
            Comparison::Lt => Operator::Lt,
            Comparison::Lte => Operator::Lte,
            Comparison::Gt => Operator::Gt,
            Comparison::Gte => Operator::Gte,
            Comparison::Ne => Operator::Ne,
        }
    }
}

/// A query document.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum QueryDocument {
    /// `{}`: no constraint.
    #[default]
    Empty,
    /// `$match`: equality on every entry.
    Match(Fields),
    /// `$not`: negation of the inner document.
    Not(Box<QueryDocument>),
    /// `$lt`, `$lte`, `$gt`, `$gte` (and `$ne` when reading).
    Compare(Comparison, Fields),
    /// `$exists`: presence of every entry's field.
    Exists(Fields),
    /// `$and`: conjunction.
    And(Vec<QueryDocument>),
    /// `$or`: disjunction.
    Or(Vec<QueryDocument>),
}

impl QueryDocument {
    /// `{"$match": {field: value}}`
    pub fn matching(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        QueryDocument::Match(vec![(field.into(), value.into())])
    }

    /// `{"$lt" | ...: {field: value}}`
    pub fn compare(op: Comparison, field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        QueryDocument::Compare(op, vec![(field.into(), value.into())])
    }

    /// `{"$exists": {field: true}}`
    pub fn exists(field: impl Into<String>) -> Self {
        QueryDocument::Exists(vec![(field.into(), Scalar::Bool(true))])
    }

    /// `{"$not": inner}`
    pub fn negate(inner: QueryDocument) -> Self {
        QueryDocument::Not(Box::new(inner))
    }

    /// Returns `true` for `{}`.
    pub fn is_empty(&self) -> bool {
        matches!(self, QueryDocument::Empty)
    }

    /// Returns `true` if an `$or` node appears anywhere in the document.
    pub fn contains_or(&self) -> bool {
        match self {
            QueryDocument::Or(_) => true,
            QueryDocument::And(children) => children.iter().any(QueryDocument::contains_or),
            QueryDocument::Not(inner) => inner.contains_or(),
            _ => false,
        }
    }

    /// Parses JSON text.
    pub fn parse(text: &str) -> Result<Self> {
        let json: Json = serde_json::from_str(text)?;
        QueryDocument::from_json(&json)
    }

    /// Reads a JSON value. Only a non-object top level is rejected.
    pub fn from_json(json: &Json) -> Result<Self> {
        match json {
            Json::Object(map) => Ok(QueryDocument::from_object(map)),
            other => Err(QueryError::NotAnObject(json_kind(other))),
        }
    }

    fn from_object(map: &Map<String, Json>) -> Self {
        let mut nodes: Vec<QueryDocument> = map
            .iter()
            .filter_map(|(key, value)| QueryDocument::from_entry(key, value))
            .collect();
        match nodes.len() {
            0 => QueryDocument::Empty,
            1 => nodes.swap_remove(0),
            _ => QueryDocument::And(nodes),
        }
    }

    fn from_entry(key: &str, value: &Json) -> Option<Self> {
        match key {
            "$match" => read_fields(value).map(QueryDocument::Match),
            "$exists" => read_fields(value).map(QueryDocument::Exists),
            "$not" => value
                .as_object()
                .map(|inner| QueryDocument::negate(QueryDocument::from_object(inner))),
            "$and" => value.as_array().map(|items| QueryDocument::And(read_children(items))),
            "$or" => value.as_array().map(|items| QueryDocument::Or(read_children(items))),
            other => match Comparison::from_key(other) {
                Some(op) => read_fields(value).map(|fields| QueryDocument::Compare(op, fields)),
                None => {
                    tracing::debug!(key = other, "ignoring unknown query key");
                    None
                }
            },
        }
    }

    /// Converts to a JSON value.
    pub fn to_json(&self) -> Json {
        match self {
            QueryDocument::Empty => Json::Object(Map::new()),
            QueryDocument::Match(fields) => single("$match", fields_json(fields)),
            QueryDocument::Not(inner) => single("$not", inner.to_json()),
            QueryDocument::Compare(op, fields) => single(op.key(), fields_json(fields)),
            QueryDocument::Exists(fields) => single("$exists", fields_json(fields)),
            QueryDocument::And(children) => single(
                "$and",
                Json::Array(children.iter().map(QueryDocument::to_json).collect()),
            ),
            QueryDocument::Or(children) => single(
                "$or",
                Json::Array(children.iter().map(QueryDocument::to_json).collect()),
            ),
        }
    }

    /// Compact JSON text.
    pub fn to_json_string(&self) -> String {
        self.to_json().to_string()
    }
}

impl std::fmt::Display for QueryDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for QueryDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            QueryDocument::Empty => serializer.serialize_map(Some(0))?.end(),
            QueryDocument::Match(fields) => entry(serializer, "$match", &FieldMap(fields)),
            QueryDocument::Not(inner) => entry(serializer, "$not", inner.as_ref()),
            QueryDocument::Compare(op, fields) => entry(serializer, op.key(), &FieldMap(fields)),
            QueryDocument::Exists(fields) => entry(serializer, "$exists", &FieldMap(fields)),
            QueryDocument::And(children) => entry(serializer, "$and", children),
            QueryDocument::Or(children) => entry(serializer, "$or", children),
        }
    }
}

impl<'de> Deserialize<'de> for QueryDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let json = Json::deserialize(deserializer)?;
        QueryDocument::from_json(&json).map_err(serde::de::Error::custom)
    }
}

struct FieldMap<'a>(&'a [(String, Scalar)]);

impl Serialize for FieldMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (field, value) in self.0 {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

fn entry<S, V>(serializer: S, key: &str, value: &V) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize + ?Sized,
{
    let mut map = serializer.serialize_map(Some(1))?;
    map.serialize_entry(key, value)?;
    map.end()
}

fn single(key: &str, value: Json) -> Json {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Json::Object(map)
}

fn fields_json(fields: &[(String, Scalar)]) -> Json {
    Json::Object(
        fields
            .iter()
            .map(|(field, value)| (field.clone(), scalar_json(value)))
            .collect(),
    )
}

fn scalar_json(value: &Scalar) -> Json {
    match value {
        Scalar::Null => Json::Null,
        Scalar::Bool(b) => Json::Bool(*b),
        Scalar::Number(n) => Json::Number(n.clone()),
        Scalar::String(s) => Json::String(s.clone()),
    }
}

fn read_fields(value: &Json) -> Option<Fields> {
    let map = value.as_object()?;
    Some(
        map.iter()
            .filter_map(|(field, v)| Scalar::from_json(v).map(|s| (field.clone(), s)))
            .collect(),
    )
}

fn read_children(items: &[Json]) -> Vec<QueryDocument> {
    items
        .iter()
        .filter_map(Json::as_object)
        .map(QueryDocument::from_object)
        .collect()
}

fn json_kind(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_is_empty_object() {
        assert_eq!(QueryDocument::Empty.to_json_string(), "{}");
        assert_eq!(serde_json::to_string(&QueryDocument::Empty).unwrap(), "{}");
    }

    #[test]
    fn serializes_wire_keys() {
        let doc = QueryDocument::And(vec![
            QueryDocument::matching("status", "active"),
            QueryDocument::compare(Comparison::Gte, "amount", "100"),
            QueryDocument::negate(QueryDocument::exists("note")),
        ]);
        let expected = json!({"$and": [
            {"$match": {"status": "active"}},
            {"$gte": {"amount": "100"}},
            {"$not": {"$exists": {"note": true}}}
        ]});
        assert_eq!(doc.to_json(), expected);
        assert_eq!(serde_json::to_value(&doc).unwrap(), expected);
    }

    #[test]
    fn parses_nested_documents() {
        let doc = QueryDocument::parse(
            r#"{"$or":[{"$match":{"a":"1"}},{"$not":{"$lt":{"b":2}}}]}"#,
        )
        .unwrap();
        assert_eq!(
            doc,
            QueryDocument::Or(vec![
                QueryDocument::matching("a", "1"),
                QueryDocument::negate(QueryDocument::compare(Comparison::Lt, "b", 2i64)),
            ])
        );
        assert!(doc.contains_or());
    }

    #[test]
    fn multiple_keys_read_as_and() {
        let doc = QueryDocument::parse(r#"{"$match":{"a":"1"},"$exists":{"b":true}}"#).unwrap();
        assert!(matches!(doc, QueryDocument::And(ref nodes) if nodes.len() == 2));
    }

    #[test]
    fn tolerates_unknown_and_malformed_entries() {
        let doc =
            QueryDocument::parse(r#"{"$regex":{"a":"x"},"$and":[1,"two",{"$match":{"c":"3"}}]}"#)
                .unwrap();
        assert_eq!(
            doc,
            QueryDocument::And(vec![QueryDocument::matching("c", "3")])
        );

        assert_eq!(
            QueryDocument::parse(r#"{"$match":"oops"}"#).unwrap(),
            QueryDocument::Empty
        );
    }

    #[test]
    fn rejects_non_objects() {
        assert!(matches!(
            QueryDocument::parse("[1,2]"),
            Err(QueryError::NotAnObject("an array"))
        ));
        assert!(matches!(
            QueryDocument::parse("{not json"),
            Err(QueryError::InvalidJson(_))
        ));
    }

    #[test]
    fn reads_ne_comparison() {
        let doc = QueryDocument::parse(r#"{"$ne":{"a":"1"}}"#).unwrap();
        assert_eq!(doc, QueryDocument::compare(Comparison::Ne, "a", "1"));
    }

    #[test]
    fn deserialize_through_serde() {
        let doc: QueryDocument = serde_json::from_str(r#"{"$gt":{"n":5}}"#).unwrap();
        assert_eq!(doc, QueryDocument::compare(Comparison::Gt, "n", 5i64));
    }
}
