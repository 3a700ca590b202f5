//! Integration tests for the sift command line.

use std::io::Write;

use clap::Parser;
use sift::cli::{parse_filter, run, Cli};
use sift::{FieldRegistry, FilterFieldConfig, FilterValue, Operator, Variant};
use tempfile::NamedTempFile;

const CONFIG: &str = r#"
table_id: transactions
query_key: tx
fields:
  - { id: status, label: Status, variant: select }
  - { id: amount, label: Amount, variant: number }
  - { id: metadata, label: Metadata, variant: metadata }
  - { id: account, label: Account, variant: text, standaloneParam: account }
"#;

fn config_file() -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();
    file
}

fn sift(args: &[&str]) -> anyhow::Result<String> {
    let cli = Cli::try_parse_from(std::iter::once("sift").chain(args.iter().copied()))?;
    let mut out = Vec::new();
    run(cli, &mut out)?;
    Ok(String::from_utf8(out)?)
}

#[test]
fn compile_prints_document_and_params() {
    let config = config_file();
    let path = config.path().to_str().unwrap();
    let out = sift(&[
        "compile",
        "--config",
        path,
        "--base",
        "page=2",
        "status:eq:active",
        "amount:gte:100",
        "account::acc_1",
    ])
    .unwrap();

    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines[0],
        r#"{"$and":[{"$match":{"status":"active"}},{"$gte":{"amount":"100"}}]}"#
    );
    assert!(lines[1].starts_with("page=2&tx="));
    assert!(lines[1].ends_with("&account=acc_1"));
}

#[test]
fn compile_without_filters_prints_empty_document() {
    let config = config_file();
    let out = sift(&["compile", "-c", config.path().to_str().unwrap(), "--join", "or"]).unwrap();
    assert_eq!(out, "{}\n\n");
}

#[test]
fn compile_rejects_bad_filters() {
    let config = config_file();
    let path = config.path().to_str().unwrap();
    assert!(sift(&["compile", "-c", path, "status"]).is_err());
    assert!(sift(&["compile", "-c", path, "nope:eq:x"]).is_err());
    assert!(sift(&["compile", "-c", path, "status:bogus:x"]).is_err());
    assert!(sift(&["compile", "-c", path, "status:gt:x"]).is_err());
    assert!(sift(&["compile", "-c", "/does/not/exist.yaml", "status:eq:x"]).is_err());
}

#[test]
fn decompile_lists_filters() {
    let out = sift(&[
        "decompile",
        r#"{"$or":[{"$match":{"status":"active"}},{"$lt":{"amount":5}}]}"#,
    ])
    .unwrap();
    assert_eq!(
        out,
        "join: or\nstatus\ttext\teq\tactive\namount\tnumber\tlt\t5\n"
    );
}

#[test]
fn decompile_json_output() {
    let out = sift(&["decompile", "--json", r#"{"$exists":{"note":true}}"#]).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(doc["join"], "and");
    assert_eq!(doc["filters"][0]["field"], "note");
    assert_eq!(doc["filters"][0]["operator"], "isNotEmpty");
}

#[test]
fn decompile_garbage_is_empty() {
    assert_eq!(sift(&["decompile", "not json"]).unwrap(), "join: and\n");
}

#[test]
fn hydrate_rebuilds_filters() {
    let config = config_file();
    let out = sift(&[
        "hydrate",
        "-c",
        config.path().to_str().unwrap(),
        "?tx=%7B%22%24match%22%3A%7B%22status%22%3A%22active%22%7D%7D&account=acc_1",
    ])
    .unwrap();
    assert_eq!(
        out,
        "join: and\nstatus\ttext\teq\tactive\naccount\ttext\teq\tacc_1\n"
    );
}

#[test]
fn parse_filter_shapes_values() {
    let registry = FieldRegistry::new()
        .field("amount", FilterFieldConfig::new("Amount", Variant::Number))
        .field("meta", FilterFieldConfig::new("Meta", Variant::Metadata));

    let between = parse_filter(&registry, "amount:isBetween:1,9").unwrap();
    assert_eq!(between.operator, Operator::IsBetween);
    assert_eq!(between.value, FilterValue::list(["1", "9"]));

    let pair = parse_filter(&registry, "meta::region:eu").unwrap();
    assert_eq!(pair.value, FilterValue::pair("region", "eu"));
}
