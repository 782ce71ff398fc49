// src/engine/router.rs

//! Watch handle -> rule table routing.

use std::collections::HashMap;
use std::fmt;
use std::ptr;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tracing::trace;

use crate::engine::table::RuleTable;
use crate::types::{WatchEvent, WatchHandle};

/// Maps every live watch handle to the table that owns it.
///
/// The router never keeps a table alive: entries are `Weak`, and tables add
/// and remove their own handles as they load and dispose.
#[derive(Default)]
pub struct EventRouter {
    tables: Mutex<HashMap<WatchHandle, Weak<RuleTable>>>,
}

impl fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRouter")
            .field("handles", &self.len())
            .finish()
    }
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<WatchHandle, Weak<RuleTable>>> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn register(&self, handle: WatchHandle, table: &Arc<RuleTable>) {
        self.lock().insert(handle, Arc::downgrade(table));
    }

    /// Returns whether the handle was known.
    pub fn unregister(&self, handle: WatchHandle) -> bool {
        self.lock().remove(&handle).is_some()
    }

    /// Drop every handle owned by `table`; returns how many were removed.
    pub fn unregister_all(&self, table: &RuleTable) -> usize {
        let mut tables = self.lock();
        let before = tables.len();
        tables.retain(|_, owner| !ptr::eq(owner.as_ptr(), table));
        before - tables.len()
    }

    pub fn find_table(&self, handle: WatchHandle) -> Option<Arc<RuleTable>> {
        self.lock().get(&handle).and_then(Weak::upgrade)
    }

    /// Hand `event` to the owning table.
    ///
    /// Unknown handles and tables that are already gone are ignored; both can
    /// only happen when delivery races with disposal. Returns whether a table
    /// received the event.
    pub fn dispatch(&self, event: &WatchEvent) -> bool {
        // Lookup releases the lock before the table runs.
        let Some(table) = self.find_table(event.handle) else {
            trace!(handle = %event.handle, "event for unknown watch dropped");
            return false;
        };
        table.on_event(event);
        true
    }

    pub fn contains(&self, handle: WatchHandle) -> bool {
        self.lock().contains_key(&handle)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
