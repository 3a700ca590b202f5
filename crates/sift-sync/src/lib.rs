//! Two-way sync between a table's filters and the navigation query string.
//!
//! `sift-sync` owns the live filter state of a table view and keeps it
//! reflected in the current location's query string, so that filtered views
//! survive reloads, can be shared as links and follow back/forward
//! navigation.
//!
//! # Quick Start
//!
//! ```
//! use std::rc::Rc;
//! use sift_sync::{FilterView, MemoryNavigation, Synchronizer, TableConfig};
//!
//! let config = TableConfig::from_yaml_str(r#"
//! table_id: transactions
//! query_key: tx
//! fields:
//!   - { id: status, label: Status, variant: select }
//!   - { id: account, label: Account, variant: text, standaloneParam: account }
//! "#).unwrap();
//!
//! let nav = Rc::new(MemoryNavigation::new("page=2"));
//! let view = FilterView::mount(Synchronizer::from_config(&config, Rc::clone(&nav)), None);
//!
//! view.add("status", None, "settled").unwrap();
//! view.add("account", None, "acc_1").unwrap();
//!
//! let params = nav.params();
//! assert_eq!(params.get("page"), Some("2"));
//! assert_eq!(params.get("tx"), Some(r#"{"$match":{"status":"settled"}}"#));
//! assert_eq!(params.get("account"), Some("acc_1"));
//! ```
//!
//! # Architecture
//!
//! ```text
//! FilterView (mounted, listens to navigation)
//! └── Synchronizer (hydrate / outbound / inbound / reset)
//!     ├── FilterStore      active filters + join
//!     └── NavigationPort   read, merge-write, change notifications
//! ```
//!
//! Compilation and decompilation of the consolidated query parameter come
//! from `sift-query`.
//!
//! # Testing
//!
//! [`MemoryNavigation`] records every write and tracks live listeners, so
//! tests can assert write discipline directly.

mod config;
mod error;
pub mod navigation;
mod params;
mod saved;
mod store;
mod sync;
mod view;

pub use config::TableConfig;
pub use error::{ConfigError, SaveError, ValidationError};
pub use navigation::{ChangeListener, MemoryNavigation, NavigationPort, Subscription};
pub use params::{ParamPatch, QueryParams};
pub use saved::{InMemorySavedFilters, SaveFilterForm, SavedFilter, SavedFilterStore, MAX_NAME_LEN};
pub use store::{FilterStore, FilterUpdate};
pub use sync::{fingerprint, Emission, SyncState, Synchronizer};
pub use view::FilterView;
