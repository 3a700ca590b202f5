//! Sift - configurable table filters for listing APIs.
//!
//! This crate bundles the two halves of sift:
//!
//! - [`query`] (`sift-query`): the field registry, filter values, and the
//!   compiler/decompiler between filters and the `$match`/`$and`/`$or`
//!   query document.
//! - [`sync`] (`sift-sync`): the filter store and its two-way binding to a
//!   navigation query string.
//!
//! The [`cli`] module backs the `sift` binary.

pub mod cli;

pub use sift_query as query;
pub use sift_sync as sync;

pub use sift_query::{
    compile, compile_to_string, decompile, decompile_str, ConfigurableFilter, FieldRegistry,
    FilterFieldConfig, FilterValue, JoinOperator, Operator, QueryDocument, Variant,
};
pub use sift_sync::{
    FilterStore, FilterView, MemoryNavigation, NavigationPort, SavedFilter, SavedFilterStore,
    Synchronizer, TableConfig,
};
