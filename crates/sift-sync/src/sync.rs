//! Navigation synchronizer.
//!
//! Keeps a [`FilterStore`] and the navigation query string consistent in
//! both directions:
//!
//! - **Hydration** fills the store from navigation (or from a saved filter)
//!   once per mount.
//! - **Outbound** runs after every store mutation and writes the compiled
//!   query plus every standalone parameter, at most once per logical change.
//! - **Inbound** runs on external navigation changes and reconciles the
//!   standalone parameters only.
//!
//! Two guards keep writes from looping back: a fingerprint of the last
//! committed output, and the navigation snapshot taken after our own write.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use sift_query::{
    compile_to_string, decompile_str, ConfigurableFilter, FieldRegistry, FilterValue,
};

use crate::config::TableConfig;
use crate::navigation::NavigationPort;
use crate::params::{ParamPatch, QueryParams};
use crate::saved::SavedFilter;
use crate::store::{FilterStore, FilterUpdate};

/// What the synchronizer is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    #[default]
    Idle,
    Hydrating,
    Emitting,
    ReconcilingExternal,
}

/// Outcome of an outbound synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emission {
    /// Navigation was written once.
    Written,
    /// The output matched the last committed fingerprint; nothing to do.
    Unchanged,
    /// Navigation already showed the output; committed without writing.
    Adopted,
}

/// Structural 64-bit fingerprint of an output patch, independent of key order.
pub fn fingerprint(patch: &ParamPatch) -> u64 {
    let mut hasher = DefaultHasher::new();
    patch.sorted().hash(&mut hasher);
    hasher.finish()
}

/// Two-way binding between one table's filter store and navigation.
pub struct Synchronizer<N> {
    port: N,
    store: FilterStore,
    table_id: String,
    query_key: String,
    state: SyncState,
    committed: Option<u64>,
    snapshot: Option<String>,
    hydrated: bool,
}

impl<N: NavigationPort> Synchronizer<N> {
    /// Binds `registry` to `port`, storing the compiled query under `query_key`.
    pub fn new(
        table_id: impl Into<String>,
        query_key: impl Into<String>,
        registry: Arc<FieldRegistry>,
        port: N,
    ) -> Self {
        Synchronizer {
            port,
            store: FilterStore::new(registry),
            table_id: table_id.into(),
            query_key: query_key.into(),
            state: SyncState::Idle,
            committed: None,
            snapshot: None,
            hydrated: false,
        }
    }

    pub fn from_config(config: &TableConfig, port: N) -> Self {
        Synchronizer::new(
            config.table_id.clone(),
            config.query_key(),
            config.registry(),
            port,
        )
    }

    pub fn store(&self) -> &FilterStore {
        &self.store
    }

    pub fn port(&self) -> &N {
        &self.port
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    pub fn query_key(&self) -> &str {
        &self.query_key
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    /// Fills the store from navigation, or from `saved` when given.
    ///
    /// Runs once; later calls return `None`. Hydrating from ambient
    /// navigation writes only when the store cannot reproduce it, e.g. a
    /// document that decompiles lossily or a standalone value that failed
    /// validation. Hydrating from a saved filter merges its parameters into
    /// navigation with a single write.
    pub fn hydrate(&mut self, saved: Option<&SavedFilter>) -> Option<Emission> {
        if self.hydrated {
            tracing::debug!(table = %self.table_id, "already hydrated, ignoring");
            return None;
        }
        self.hydrated = true;
        Some(match saved {
            Some(saved) => self.hydrate_from_saved(saved),
            None => {
                let params = QueryParams::parse(&self.port.read());
                self.state = SyncState::Hydrating;
                self.populate(&params);
                self.state = SyncState::Idle;
                self.sync_outbound()
            }
        })
    }

    /// Replaces the store with a saved filter while mounted.
    pub fn load_saved(&mut self, saved: &SavedFilter) -> Emission {
        self.hydrated = true;
        self.hydrate_from_saved(saved)
    }

    /// Applies a store mutation, then synchronizes outbound.
    pub fn apply<R>(&mut self, mutate: impl FnOnce(&mut FilterStore) -> R) -> (R, Emission) {
        let result = mutate(&mut self.store);
        (result, self.sync_outbound())
    }

    /// Writes the current output to navigation unless it is already there.
    pub fn sync_outbound(&mut self) -> Emission {
        let patch = self.output();
        let print = fingerprint(&patch);
        if self.committed == Some(print) {
            return Emission::Unchanged;
        }
        self.emit(patch, print)
    }

    /// Reacts to a navigation change the synchronizer did not make.
    ///
    /// Returns `None` when the change was ignored or did not touch the
    /// store.
    pub fn handle_external_change(&mut self) -> Option<Emission> {
        if self.state != SyncState::Idle {
            tracing::debug!(state = ?self.state, "navigation change during sync, ignoring");
            return None;
        }
        let current = self.port.read();
        if self.snapshot.as_deref() == Some(current.as_str()) {
            return None;
        }
        let params = QueryParams::parse(&current);
        self.snapshot = Some(current);

        self.state = SyncState::ReconcilingExternal;
        let changed = self.reconcile_standalone(&params);
        self.state = SyncState::Idle;

        if !changed {
            return None;
        }
        Some(self.sync_outbound())
    }

    /// Clears every filter and every parameter this table owns.
    ///
    /// Skips the fingerprint check but still avoids writing when navigation
    /// is already clear.
    pub fn reset(&mut self) -> Emission {
        self.store.reset();
        let patch: ParamPatch = self.own_keys().into_iter().map(|key| (key, "")).collect();
        let print = fingerprint(&patch);
        self.emit(patch, print)
    }

    /// Output map: compiled query plus every standalone parameter.
    pub fn output(&self) -> ParamPatch {
        let registry = self.store.registry();
        let mut patch = ParamPatch::new();
        patch.set(
            self.query_key.as_str(),
            compile_to_string(registry, self.store.filters(), self.store.join()),
        );
        for (field_id, param) in registry.standalone_params() {
            let value = self
                .store
                .find_by_field(field_id)
                .map(|f| f.value.to_param())
                .unwrap_or_default();
            patch.set(param, value);
        }
        patch
    }

    fn own_keys(&self) -> Vec<String> {
        std::iter::once(self.query_key.clone())
            .chain(
                self.store
                    .registry()
                    .standalone_params()
                    .map(|(_, param)| param.to_string()),
            )
            .collect()
    }

    fn hydrate_from_saved(&mut self, saved: &SavedFilter) -> Emission {
        let params = QueryParams::parse(&saved.search_params);
        self.state = SyncState::Hydrating;
        self.populate(&params);

        let mut patch: ParamPatch = params.iter().collect();
        for key in self.own_keys() {
            if !params.contains(&key) {
                patch.set(key, "");
            }
        }
        self.state = SyncState::Idle;

        tracing::debug!(table = %self.table_id, name = %saved.name, "loading saved filter");
        let emission = self.write_patch(&patch);
        self.commit(fingerprint(&self.output()));
        emission
    }

    /// Decompiles the query key and synthesizes standalone filters.
    fn populate(&mut self, params: &QueryParams) {
        let decompiled = decompile_str(params.value(&self.query_key));
        let mut filters = decompiled.filters;
        let registry = self.store.registry();
        for (field_id, param) in registry.standalone_params() {
            let raw = params.value(param);
            if raw.is_empty() {
                continue;
            }
            if let Some(filter) = standalone_filter(registry, field_id, raw) {
                filters.push(filter);
            }
        }
        tracing::debug!(
            table = %self.table_id,
            filters = filters.len(),
            join = %decompiled.join,
            "hydrated filter store"
        );
        self.store.replace(filters, decompiled.join);
    }

    fn reconcile_standalone(&mut self, params: &QueryParams) -> bool {
        let registry = self.store.shared_registry();
        let mut changed = false;
        for (field_id, param) in registry.standalone_params() {
            let raw = params.value(param);
            let existing = self
                .store
                .find_by_field(field_id)
                .map(|f| (f.instance_id, f.value.clone()));

            match existing {
                Some((id, _)) if raw.is_empty() => {
                    changed |= self.store.remove(id).is_ok();
                }
                Some((id, value)) => {
                    let variant = registry.get(field_id).map(|c| c.variant);
                    let incoming = match variant {
                        Some(variant) => FilterValue::from_param(variant, raw),
                        None => continue,
                    };
                    if incoming == value {
                        continue;
                    }
                    match self.store.update(id, FilterUpdate::value(incoming)) {
                        Ok(updated) => changed |= updated,
                        Err(err) => {
                            tracing::warn!(
                                field = field_id,
                                error = %err,
                                "ignoring navigation value"
                            )
                        }
                    }
                }
                None if raw.is_empty() => {}
                None => {
                    if let Some(filter) = standalone_filter(&registry, field_id, raw) {
                        self.store.push(filter);
                        changed = true;
                    }
                }
            }
        }
        changed
    }

    fn emit(&mut self, patch: ParamPatch, print: u64) -> Emission {
        self.state = SyncState::Emitting;
        let emission = self.write_patch(&patch);
        self.state = SyncState::Idle;
        self.commit(print);
        emission
    }

    fn write_patch(&mut self, patch: &ParamPatch) -> Emission {
        let current = QueryParams::parse(&self.port.read());
        if patch.is_applied_to(&current) {
            tracing::debug!(table = %self.table_id, "navigation already up to date");
            return Emission::Adopted;
        }
        let previous = self.state;
        self.state = SyncState::Emitting;
        tracing::debug!(table = %self.table_id, keys = patch.len(), "writing navigation");
        self.port.write(patch);
        self.state = previous;
        Emission::Written
    }

    fn commit(&mut self, print: u64) {
        self.committed = Some(print);
        self.snapshot = Some(self.port.read());
    }
}

impl<N> std::fmt::Debug for Synchronizer<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synchronizer")
            .field("table_id", &self.table_id)
            .field("query_key", &self.query_key)
            .field("state", &self.state)
            .field("filters", &self.store.len())
            .field("hydrated", &self.hydrated)
            .finish()
    }
}

fn standalone_filter(
    registry: &FieldRegistry,
    field_id: &str,
    raw: &str,
) -> Option<ConfigurableFilter> {
    let config = registry.get(field_id)?;
    let value = FilterValue::from_param(config.variant, raw);
    match ConfigurableFilter::new(registry, field_id, None, value) {
        Ok(filter) => Some(filter),
        Err(err) => {
            tracing::warn!(field = field_id, error = %err, "ignoring navigation value");
            None
        }
    }
}
