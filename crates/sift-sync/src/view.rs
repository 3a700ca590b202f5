//! Mounted filter view.
//!
//! A [`FilterView`] is the lifetime of one table's filter UI: it hydrates the
//! synchronizer on mount, listens for navigation changes while mounted, and
//! stops listening on [`unmount`](FilterView::unmount) or drop.
//!
//! Our own writes notify listeners synchronously, while the synchronizer is
//! still borrowed. Such notifications are deferred and drained once the
//! current operation completes, where the snapshot check discards them.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use sift_query::{ConfigurableFilter, FilterError, FilterValue, InstanceId, JoinOperator, Operator};

use crate::error::SaveError;
use crate::navigation::{NavigationPort, Subscription};
use crate::saved::{SaveFilterForm, SavedFilter, SavedFilterStore};
use crate::store::{FilterStore, FilterUpdate};
use crate::sync::{Emission, SyncState, Synchronizer};

struct Shared<N> {
    sync: RefCell<Synchronizer<N>>,
    pending: Cell<bool>,
    last_external: Cell<Option<Emission>>,
}

impl<N: NavigationPort> Shared<N> {
    fn on_navigation(&self) {
        match self.sync.try_borrow_mut() {
            Ok(mut sync) => {
                let outcome = sync.handle_external_change();
                drop(sync);
                if outcome.is_some() {
                    self.last_external.set(outcome);
                }
                self.drain();
            }
            Err(_) => self.pending.set(true),
        }
    }

    fn drain(&self) {
        while self.pending.replace(false) {
            let Ok(mut sync) = self.sync.try_borrow_mut() else {
                self.pending.set(true);
                return;
            };
            let outcome = sync.handle_external_change();
            drop(sync);
            if outcome.is_some() {
                self.last_external.set(outcome);
            }
        }
    }

    fn with_sync<R>(&self, f: impl FnOnce(&mut Synchronizer<N>) -> R) -> R {
        let result = f(&mut self.sync.borrow_mut());
        self.drain();
        result
    }
}

/// A mounted table filter view.
pub struct FilterView<N: NavigationPort + 'static> {
    shared: Rc<Shared<N>>,
    subscription: Option<Subscription>,
}

impl<N: NavigationPort + 'static> FilterView<N> {
    /// Hydrates `sync` (from `saved` when given) and starts listening.
    pub fn mount(sync: Synchronizer<N>, saved: Option<&SavedFilter>) -> Self {
        let shared = Rc::new(Shared {
            sync: RefCell::new(sync),
            pending: Cell::new(false),
            last_external: Cell::new(None),
        });
        shared.with_sync(|sync| sync.hydrate(saved));

        let weak: Weak<Shared<N>> = Rc::downgrade(&shared);
        let subscription = shared.sync.borrow().port().on_external_change(Rc::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.on_navigation();
            }
        }));

        FilterView {
            shared,
            subscription: Some(subscription),
        }
    }

    /// Stops listening to navigation. The filter state is discarded.
    pub fn unmount(mut self) {
        self.subscription.take();
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    /// Adds a filter and synchronizes.
    pub fn add(
        &self,
        field_id: &str,
        operator: Option<Operator>,
        value: impl Into<FilterValue>,
    ) -> Result<(InstanceId, Emission), FilterError> {
        let value = value.into();
        let (id, emission) = self
            .shared
            .with_sync(|sync| sync.apply(|store| store.add(field_id, operator, value)));
        Ok((id?, emission))
    }

    pub fn update(&self, id: InstanceId, update: FilterUpdate) -> Result<Emission, FilterError> {
        let (result, emission) = self
            .shared
            .with_sync(|sync| sync.apply(|store| store.update(id, update)));
        result.map(|_| emission)
    }

    pub fn remove(&self, id: InstanceId) -> Result<Emission, FilterError> {
        let (result, emission) = self
            .shared
            .with_sync(|sync| sync.apply(|store| store.remove(id)));
        result.map(|_| emission)
    }

    pub fn set_join(&self, join: JoinOperator) -> Emission {
        self.shared
            .with_sync(|sync| sync.apply(|store| store.set_join(join)))
            .1
    }

    /// Clears every filter and the table's navigation parameters.
    pub fn reset(&self) -> Emission {
        self.shared.with_sync(|sync| sync.reset())
    }

    /// Replaces the filters with a saved filter set.
    pub fn load_saved(&self, saved: &SavedFilter) -> Emission {
        self.shared.with_sync(|sync| sync.load_saved(saved))
    }

    /// Validates `form` and saves the current navigation query string.
    pub fn save_as(
        &self,
        store: &dyn SavedFilterStore,
        form: &SaveFilterForm,
    ) -> Result<SavedFilter, SaveError> {
        let sync = self.shared.sync.borrow();
        form.submit(store, &sync.port().read(), sync.table_id())
    }

    /// Snapshot of the active filters.
    pub fn filters(&self) -> Vec<ConfigurableFilter> {
        self.shared.sync.borrow().store().filters().to_vec()
    }

    pub fn join(&self) -> JoinOperator {
        self.shared.sync.borrow().store().join()
    }

    pub fn state(&self) -> SyncState {
        self.shared.sync.borrow().state()
    }

    /// Reads the store.
    pub fn with_store<R>(&self, f: impl FnOnce(&FilterStore) -> R) -> R {
        f(self.shared.sync.borrow().store())
    }

    /// Outcome of the last external change that touched the store.
    pub fn last_external(&self) -> Option<Emission> {
        self.shared.last_external.get()
    }
}

impl<N: NavigationPort + 'static> std::fmt::Debug for FilterView<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterView")
            .field("sync", &self.shared.sync)
            .field("mounted", &self.is_mounted())
            .finish()
    }
}
