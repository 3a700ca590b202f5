//! Command-line front end.
//!
//! ```text
//! sift compile  --config table.yaml [--join or] status:eq:active amount:gte:100
//! sift decompile '{"$match":{"status":"active"}}'
//! sift hydrate  --config table.yaml 'tx=...&account=acc_1'
//! ```
//!
//! Filters are written `field:operator:value`. An empty operator picks the
//! field's default; the value keeps any further `:` (so `metadata:eq:region:eu`
//! is a metadata pair), and range operators take comma-separated bounds.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use sift_query::{
    decompile_str, ConfigurableFilter, FieldRegistry, FilterValue, JoinOperator, Operator, Variant,
};
use sift_sync::{MemoryNavigation, NavigationPort, Synchronizer, TableConfig};

#[derive(Debug, Parser)]
#[command(name = "sift", version, about = "Compile table filters to listing queries and back")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compile filters into a query document and navigation parameters
    Compile {
        /// Table configuration file (.yaml, .yml or .json)
        #[arg(short, long)]
        config: PathBuf,
        /// How filters combine
        #[arg(short, long, default_value = "and")]
        join: JoinOperator,
        /// Query string to merge the output into
        #[arg(long, default_value = "")]
        base: String,
        /// Filters as field:operator:value
        filters: Vec<String>,
    },
    /// Recover filters from a query document
    Decompile {
        /// Query document JSON
        document: String,
        /// Print JSON instead of one filter per line
        #[arg(long)]
        json: bool,
    },
    /// Rebuild a table's filters from a navigation query string
    Hydrate {
        /// Table configuration file (.yaml, .yml or .json)
        #[arg(short, long)]
        config: PathBuf,
        /// Query string, with or without the leading '?'
        query: String,
        /// Print JSON instead of one filter per line
        #[arg(long)]
        json: bool,
    },
}

/// Runs a parsed command, writing results to `out`.
pub fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
    match cli.command {
        Command::Compile {
            config,
            join,
            base,
            filters,
        } => compile(&load(&config)?, join, &base, &filters, out),
        Command::Decompile { document, json } => {
            let decompiled = decompile_str(&document);
            print_filters(&decompiled.filters, decompiled.join, json, out)
        }
        Command::Hydrate {
            config,
            query,
            json,
        } => {
            let config = load(&config)?;
            let mut sync = Synchronizer::from_config(&config, MemoryNavigation::new(query));
            sync.hydrate(None);
            print_filters(sync.store().filters(), sync.store().join(), json, out)
        }
    }
}

fn load(path: &Path) -> Result<TableConfig> {
    TableConfig::from_path(path).with_context(|| format!("loading {}", path.display()))
}

fn compile(
    config: &TableConfig,
    join: JoinOperator,
    base: &str,
    specs: &[String],
    out: &mut dyn Write,
) -> Result<()> {
    let registry = config.registry();
    let filters = specs
        .iter()
        .map(|spec| parse_filter(&registry, spec))
        .collect::<Result<Vec<_>>>()?;

    let nav = Rc::new(MemoryNavigation::new(base));
    let mut sync = Synchronizer::from_config(config, Rc::clone(&nav));
    sync.hydrate(None);
    sync.apply(|store| store.replace(filters, join));

    let output = sync.output();
    let document = output.get(config.query_key()).unwrap_or_default();
    writeln!(out, "{}", if document.is_empty() { "{}" } else { document })?;
    writeln!(out, "{}", nav.read())?;
    Ok(())
}

/// Parses `field:operator:value` against a registry.
pub fn parse_filter(registry: &FieldRegistry, spec: &str) -> Result<ConfigurableFilter> {
    let mut parts = spec.splitn(3, ':');
    let (Some(field), Some(op), Some(raw)) = (parts.next(), parts.next(), parts.next()) else {
        bail!("filter '{spec}' is not field:operator:value");
    };
    let config = registry
        .get(field)
        .with_context(|| format!("unknown field '{field}'"))?;
    let operator = match op {
        "" => None,
        name => match Operator::parse(name) {
            Operator::Unknown => bail!("unknown operator '{name}' in '{spec}'"),
            known => Some(known),
        },
    };
    let resolved = operator.unwrap_or_else(|| config.default_operator());
    let value = if resolved.is_range() && config.variant != Variant::DateRange {
        FilterValue::list(raw.split(','))
    } else {
        FilterValue::from_param(config.variant, raw)
    };
    Ok(ConfigurableFilter::new(registry, field, operator, value)?)
}

fn print_filters(
    filters: &[ConfigurableFilter],
    join: JoinOperator,
    as_json: bool,
    out: &mut dyn Write,
) -> Result<()> {
    if as_json {
        let filters: Vec<_> = filters
            .iter()
            .map(|f| {
                json!({
                    "field": f.field_id,
                    "variant": f.variant,
                    "operator": f.operator,
                    "value": f.value,
                })
            })
            .collect();
        let doc = json!({ "join": join, "filters": filters });
        writeln!(out, "{}", serde_json::to_string_pretty(&doc)?)?;
        return Ok(());
    }

    writeln!(out, "join: {join}")?;
    for f in filters {
        writeln!(
            out,
            "{}\t{}\t{}\t{}",
            f.field_id,
            f.variant,
            f.operator,
            f.value.to_param()
        )?;
    }
    Ok(())
}
