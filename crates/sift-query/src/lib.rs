//! Sift query - typed table filters compiled to a listing-query document.
//!
//! A table declares which of its fields can be filtered in a
//! [`FieldRegistry`]. Users then add [`ConfigurableFilter`]s (a field, an
//! [`Operator`] and a [`FilterValue`]); [`compile`] turns the active filters
//! and a [`JoinOperator`] into a [`QueryDocument`], the recursive
//! `$match` / `$and` / `$or` structure the listing API understands.
//! [`decompile`] goes the other way, on a best-effort basis, so that a
//! document read back from a link can repopulate the filter list.
//!
//! # Quick Start
//!
//! ```rust
//! use sift_query::{compile, decompile_str, ConfigurableFilter, FieldRegistry,
//!                  FilterFieldConfig, FilterValue, JoinOperator, Variant};
//!
//! let registry = FieldRegistry::new()
//!     .field("status", FilterFieldConfig::new("Status", Variant::Select))
//!     .field("metadata", FilterFieldConfig::new("Metadata", Variant::Metadata))
//!     .build()
//!     .unwrap();
//!
//! let filters = vec![
//!     ConfigurableFilter::new(&registry, "status", None, "settled").unwrap(),
//!     ConfigurableFilter::new(&registry, "metadata", None, FilterValue::pair("region", "eu"))
//!         .unwrap(),
//! ];
//!
//! let doc = compile(&registry, &filters, JoinOperator::Or);
//! let json = doc.to_json_string();
//! assert_eq!(
//!     json,
//!     r#"{"$or":[{"$match":{"status":"settled"}},{"$match":{"metadata[region]":"eu"}}]}"#
//! );
//!
//! // Reading it back is lossy: variants and negations are not recovered.
//! let back = decompile_str(&json);
//! assert_eq!(back.join, JoinOperator::Or);
//! assert_eq!(back.filters.len(), 2);
//! ```
//!
//! # Field Variants and Operators
//!
//! | Variant | Operators |
//! |------|-----------|
//! | `text`, `select` | `eq`, `ne`, `isEmpty`, `isNotEmpty` |
//! | `number` | `eq`, `ne`, `gt`, `gte`, `lt`, `lte`, `isBetween`, `isEmpty`, `isNotEmpty` |
//! | `boolean` | `eq`, `ne` |
//! | `date` | `eq`, `gt`, `gte`, `lt`, `lte`, `isBetween` |
//! | `dateRange` | `isBetween` |
//! | `multiSelect` | `eq`, `ne` |
//! | `metadata` | `eq` |
//! | `balanceByAsset` | `eq`, `ne`, `gt`, `gte`, `lt`, `lte` |
//! | `slider` | `eq`, `gt`, `gte`, `lt`, `lte`, `isBetween` |
//!
//! A registry entry may override the set with its own `operators` list.

mod compile;
mod decompile;
mod document;
mod error;
mod filter;
mod op;
mod registry;
mod value;
mod variant;

// Re-export public API
pub use compile::{combine, compile, compile_filter, compile_to_string, end_of_day};
pub use decompile::{decompile, decompile_str, decompile_with_join, Decompiled};
pub use document::{Comparison, Fields, QueryDocument};
pub use error::{FilterError, QueryError, RegistryError, Result};
pub use filter::{expected_shape, ConfigurableFilter, InstanceId};
pub use op::{JoinOperator, Operator};
pub use registry::{FieldEntry, FieldRegistry, FilterFieldConfig, SelectOption};
pub use value::{FilterValue, Scalar};
pub use variant::Variant;
