//! Abstraction over the host's navigation state.
//!
//! The synchronizer never touches a browser history or a router directly.
//! It reads and writes the current query string through a
//! [`NavigationPort`], and learns about back/forward or programmatic
//! navigation through [`NavigationPort::on_external_change`].
//!
//! [`MemoryNavigation`] keeps everything in memory; it is what the tests and
//! the CLI use.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::params::{ParamPatch, QueryParams};

/// Callback invoked after navigation state changed.
pub type ChangeListener = Rc<dyn Fn()>;

/// Read/write access to the current location's query string.
pub trait NavigationPort {
    /// Returns the current query string.
    fn read(&self) -> String;

    /// Merges `patch` into the current query string without a reload, then
    /// notifies listeners.
    fn write(&self, patch: &ParamPatch);

    /// Registers a listener for navigation changes. Dropping the returned
    /// [`Subscription`] deregisters it.
    fn on_external_change(&self, listener: ChangeListener) -> Subscription;
}

impl<T: NavigationPort + ?Sized> NavigationPort for Rc<T> {
    fn read(&self) -> String {
        (**self).read()
    }

    fn write(&self, patch: &ParamPatch) {
        (**self).write(patch)
    }

    fn on_external_change(&self, listener: ChangeListener) -> Subscription {
        (**self).on_external_change(listener)
    }
}

/// Keeps a listener registered until dropped.
#[must_use = "dropping a Subscription deregisters its listener"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Creates a subscription that runs `cancel` when dropped.
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Subscription {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to deregister.
    pub fn detached() -> Self {
        Subscription { cancel: None }
    }

    /// Deregisters now.
    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

type Listeners = RefCell<Vec<(u64, ChangeListener)>>;

/// In-memory navigation with a history stack.
///
/// `write` replaces the current entry (like a history replace), `navigate`
/// pushes a new one, `back`/`forward` move through the stack. Every change
/// notifies listeners.
pub struct MemoryNavigation {
    history: RefCell<Vec<String>>,
    index: Cell<usize>,
    listeners: Rc<Listeners>,
    next_listener: Cell<u64>,
    writes: Cell<usize>,
}

impl MemoryNavigation {
    /// Starts at `query` with no other history.
    pub fn new(query: impl Into<String>) -> Self {
        MemoryNavigation {
            history: RefCell::new(vec![normalize(query.into())]),
            index: Cell::new(0),
            listeners: Rc::new(RefCell::new(Vec::new())),
            next_listener: Cell::new(0),
            writes: Cell::new(0),
        }
    }

    /// Pushes a new history entry, dropping any forward entries.
    pub fn navigate(&self, query: impl Into<String>) {
        {
            let mut history = self.history.borrow_mut();
            history.truncate(self.index.get() + 1);
            history.push(normalize(query.into()));
            self.index.set(history.len() - 1);
        }
        self.notify();
    }

    /// Moves back one entry. Returns `false` at the start of history.
    pub fn back(&self) -> bool {
        let index = self.index.get();
        if index == 0 {
            return false;
        }
        self.index.set(index - 1);
        self.notify();
        true
    }

    /// Moves forward one entry. Returns `false` at the end of history.
    pub fn forward(&self) -> bool {
        let index = self.index.get();
        if index + 1 >= self.history.borrow().len() {
            return false;
        }
        self.index.set(index + 1);
        self.notify();
        true
    }

    /// Current entry, parsed.
    pub fn params(&self) -> QueryParams {
        QueryParams::parse(&self.read())
    }

    /// Number of `write` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    /// Number of live listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn history_len(&self) -> usize {
        self.history.borrow().len()
    }

    fn notify(&self) {
        // Listeners may subscribe or drop subscriptions while being called.
        let listeners: Vec<ChangeListener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener();
        }
    }
}

impl Default for MemoryNavigation {
    fn default() -> Self {
        MemoryNavigation::new("")
    }
}

impl std::fmt::Debug for MemoryNavigation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryNavigation")
            .field("current", &self.read())
            .field("history", &self.history.borrow().len())
            .field("listeners", &self.listener_count())
            .field("writes", &self.writes.get())
            .finish()
    }
}

impl NavigationPort for MemoryNavigation {
    fn read(&self) -> String {
        self.history
            .borrow()
            .get(self.index.get())
            .cloned()
            .unwrap_or_default()
    }

    fn write(&self, patch: &ParamPatch) {
        let mut params = self.params();
        params.apply(patch);
        {
            let mut history = self.history.borrow_mut();
            let index = self.index.get();
            if let Some(entry) = history.get_mut(index) {
                *entry = params.to_query_string();
            }
        }
        self.writes.set(self.writes.get() + 1);
        self.notify();
    }

    fn on_external_change(&self, listener: ChangeListener) -> Subscription {
        let id = self.next_listener.get();
        self.next_listener.set(id + 1);
        self.listeners.borrow_mut().push((id, listener));

        let listeners: Weak<Listeners> = Rc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.borrow_mut().retain(|(existing, _)| *existing != id);
            }
        })
    }
}

fn normalize(query: String) -> String {
    match query.strip_prefix('?') {
        Some(rest) => rest.to_string(),
        None => query,
    }
}
