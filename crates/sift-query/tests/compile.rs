//! End-to-end compiler and decompiler behavior.

use serde_json::json;
use sift_query::{
    compile, compile_to_string, decompile_str, ConfigurableFilter, FieldRegistry,
    FilterFieldConfig, FilterValue, JoinOperator, Operator, Variant,
};

fn registry() -> FieldRegistry {
    FieldRegistry::new()
        .field("status", FilterFieldConfig::new("Status", Variant::Text))
        .field("amount", FilterFieldConfig::new("Amount", Variant::Number))
        .field("active", FilterFieldConfig::new("Active", Variant::Boolean))
        .field("createdAt", FilterFieldConfig::new("Created", Variant::DateRange))
        .field("tags", FilterFieldConfig::new("Tags", Variant::MultiSelect))
        .field("metadata", FilterFieldConfig::new("Metadata", Variant::Metadata))
        .field(
            "balance",
            FilterFieldConfig::new("Balance", Variant::BalanceByAsset),
        )
        .field(
            "account",
            FilterFieldConfig::new("Account", Variant::Select).standalone("account"),
        )
        .build()
        .unwrap()
}

fn add(
    reg: &FieldRegistry,
    field: &str,
    op: Option<Operator>,
    value: impl Into<FilterValue>,
) -> ConfigurableFilter {
    ConfigurableFilter::new(reg, field, op, value).unwrap()
}

#[test]
fn status_and_amount() {
    let reg = registry();
    let filters = vec![
        add(&reg, "status", Some(Operator::Eq), "active"),
        add(&reg, "amount", Some(Operator::Gte), "100"),
    ];
    assert_eq!(
        compile_to_string(&reg, &filters, JoinOperator::And),
        r#"{"$and":[{"$match":{"status":"active"}},{"$gte":{"amount":"100"}}]}"#
    );
}

#[test]
fn join_wraps_only_multiple_fragments() {
    let reg = registry();
    let one = vec![add(&reg, "status", None, "x")];
    let two = vec![
        add(&reg, "status", None, "x"),
        add(&reg, "amount", Some(Operator::Lt), "3"),
    ];

    for join in [JoinOperator::And, JoinOperator::Or] {
        assert!(compile(&reg, &[], join).is_empty());
        assert_eq!(compile_to_string(&reg, &[], join), "");
        assert_eq!(
            compile(&reg, &one, join).to_json(),
            json!({"$match": {"status": "x"}})
        );
    }
    assert_eq!(
        compile(&reg, &two, JoinOperator::Or).to_json(),
        json!({"$or": [{"$match": {"status": "x"}}, {"$lt": {"amount": "3"}}]})
    );
    assert_eq!(
        compile(&reg, &two, JoinOperator::And).to_json(),
        json!({"$and": [{"$match": {"status": "x"}}, {"$lt": {"amount": "3"}}]})
    );
}

#[test]
fn standalone_fields_stay_out_of_the_document() {
    let reg = registry();
    let filters = vec![
        add(&reg, "account", None, "acc_1"),
        add(&reg, "status", None, "x"),
    ];
    assert_eq!(
        compile(&reg, &filters, JoinOperator::And).to_json(),
        json!({"$match": {"status": "x"}})
    );
    assert_eq!(
        compile_to_string(&reg, &filters[..1], JoinOperator::And),
        ""
    );
}

#[test]
fn date_range_upper_bound_is_end_of_day() {
    let reg = registry();
    let filters = vec![add(
        &reg,
        "createdAt",
        None,
        r#"{"from":"2024-01-01T00:00:00Z","to":"2024-01-02T00:00:00Z"}"#,
    )];
    assert_eq!(
        compile(&reg, &filters, JoinOperator::And).to_json(),
        json!({"$and": [
            {"$gte": {"createdAt": "2024-01-01T00:00:00Z"}},
            {"$lte": {"createdAt": "2024-01-02T23:59:59.999Z"}}
        ]})
    );
}

#[test]
fn balance_falls_back_to_text_match() {
    let reg = registry();
    let filters = vec![add(
        &reg,
        "balance",
        Some(Operator::Gt),
        FilterValue::pair("USD", "not-a-number"),
    )];
    assert_eq!(
        compile(&reg, &filters, JoinOperator::And).to_json(),
        json!({"$match": {"balance[USD]": "not-a-number"}})
    );

    let numeric = vec![add(
        &reg,
        "balance",
        Some(Operator::Gt),
        FilterValue::pair("USD", "1.5"),
    )];
    assert_eq!(
        compile(&reg, &numeric, JoinOperator::And).to_json(),
        json!({"$gt": {"balance[USD]": 1.5}})
    );

    let whole = vec![add(&reg, "balance", Some(Operator::Gt), FilterValue::pair("USD", "250"))];
    assert_eq!(
        compile_to_string(&reg, &whole, JoinOperator::And),
        r#"{"$gt":{"balance[USD]":250}}"#
    );
}

#[test]
fn multi_select_and_boolean() {
    let reg = registry();
    let filters = vec![
        add(&reg, "tags", Some(Operator::Ne), FilterValue::list(["a", "b"])),
        add(&reg, "active", None, "true"),
    ];
    assert_eq!(
        compile(&reg, &filters, JoinOperator::And).to_json(),
        json!({"$and": [
            {"$not": {"$or": [{"$match": {"tags": "a"}}, {"$match": {"tags": "b"}}]}},
            {"$match": {"active": true}}
        ]})
    );
}

#[test]
fn decompile_recovers_shape_of_compiled_document() {
    let reg = registry();
    let filters = vec![
        add(&reg, "status", None, "active"),
        add(&reg, "amount", Some(Operator::Lte), "9"),
        add(&reg, "metadata", None, FilterValue::pair("region", "eu")),
    ];
    let text = compile_to_string(&reg, &filters, JoinOperator::Or);
    let back = decompile_str(&text);

    assert_eq!(back.join, JoinOperator::Or);
    let fields: Vec<&str> = back.filters.iter().map(|f| f.field_id.as_str()).collect();
    assert_eq!(fields, ["status", "amount", "metadata[region]"]);
    assert_eq!(back.filters[1].operator, Operator::Lte);
    assert_eq!(back.filters[1].variant, Variant::Number);
}

#[test]
fn registry_from_yaml_drives_compilation() {
    let yaml = r#"
- id: status
  label: Status
  variant: select
  options:
    - { value: settled, label: Settled }
- id: amount
  label: Amount
  variant: slider
  min: 0
  max: 1000
  step: 10
"#;
    let reg = FieldRegistry::from_yaml_str(yaml).unwrap();
    let filters = vec![add(
        &reg,
        "amount",
        Some(Operator::IsBetween),
        FilterValue::list(["10", "20"]),
    )];
    assert_eq!(
        compile(&reg, &filters, JoinOperator::And).to_json(),
        json!({"$and": [{"$gte": {"amount": "10"}}, {"$lte": {"amount": "20"}}]})
    );
}
