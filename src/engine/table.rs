// src/engine/table.rs

//! Per-user rule table.
//!
//! A table owns the rules of one user and one watch per rule. When one of
//! its watches fires it:
//!
//! 1. re-checks that the user may access the rule's path (silently dropping
//!    the event otherwise),
//! 2. expands the command template,
//! 3. disables the watch if the rule is no-loop,
//! 4. spawns the command as the user and hands the child to the process
//!    registry, which re-enables a no-loop watch once the child is reaped.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error, info, warn};

use crate::access::AccessChecker;
use crate::config::{Rule, RuleSource};
use crate::engine::router::EventRouter;
use crate::errors::Result;
use crate::exec::{
    CompletionCallback, ExpandContext, ProcessRegistry, Spawner, prepare_command,
};
use crate::types::{EventMask, WatchEvent, WatchHandle};
use crate::watch::NotificationService;

/// Collaborators shared by every table of one daemon.
#[derive(Debug, Clone)]
pub struct TableContext {
    pub notifier: Arc<dyn NotificationService>,
    pub router: Arc<EventRouter>,
    pub processes: Arc<ProcessRegistry>,
    pub access: AccessChecker,
    pub spawner: Arc<dyn Spawner>,
}

/// Lifecycle of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    Unloaded,
    Loaded,
    Disposed,
}

#[derive(Debug)]
struct TableInner {
    state: TableState,
    rules: Vec<Arc<Rule>>,
    bindings: BTreeMap<WatchHandle, Arc<Rule>>,
}

pub struct RuleTable {
    user: String,
    ctx: TableContext,
    inner: Mutex<TableInner>,
}

impl fmt::Debug for RuleTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("RuleTable")
            .field("user", &self.user)
            .field("state", &inner.state)
            .field("rules", &inner.rules.len())
            .field("watches", &inner.bindings.len())
            .finish()
    }
}

impl RuleTable {
    pub fn new(user: impl Into<String>, ctx: TableContext) -> Arc<Self> {
        Arc::new(Self {
            user: user.into(),
            ctx,
            inner: Mutex::new(TableInner {
                state: TableState::Unloaded,
                rules: Vec::new(),
                bindings: BTreeMap::new(),
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, TableInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn state(&self) -> TableState {
        self.lock().state
    }

    pub fn rules(&self) -> Vec<Arc<Rule>> {
        self.lock().rules.clone()
    }

    pub fn watch_handles(&self) -> Vec<WatchHandle> {
        self.lock().bindings.keys().copied().collect()
    }

    /// The rule bound to `handle`, if this table owns it.
    pub fn find_rule(&self, handle: WatchHandle) -> Option<Arc<Rule>> {
        self.lock().bindings.get(&handle).cloned()
    }

    /// Read the user's rules and create one watch per rule.
    ///
    /// A rule whose watch cannot be created is logged and stays unwatched.
    /// A loaded table is disposed first. Only a failing rule source is an
    /// error, and it leaves the table untouched. Returns the number of live
    /// watches.
    pub fn load(self: &Arc<Self>, source: &dyn RuleSource) -> Result<usize> {
        let rules = source.load_rules(&self.user)?;

        if self.state() == TableState::Loaded {
            self.dispose();
        }

        let rules: Vec<Arc<Rule>> = rules.into_iter().map(Arc::new).collect();
        let mut inner = self.lock();
        inner.bindings.clear();

        for rule in &rules {
            // Permissions may change later, so this only warns.
            let no_follow = rule.mask.contains(EventMask::DONT_FOLLOW);
            if !self.ctx.access.may_access(&rule.path, &self.user, no_follow) {
                warn!(
                    user = %self.user,
                    path = ?rule.path,
                    "access denied; events will be discarded silently"
                );
            }

            match self.ctx.notifier.register_watch(&rule.path, rule.mask) {
                Ok(handle) => {
                    inner.bindings.insert(handle, Arc::clone(rule));
                    self.ctx.router.register(handle, self);
                    debug!(user = %self.user, %handle, path = ?rule.path, "rule watched");
                }
                Err(err) => {
                    error!(
                        user = %self.user,
                        path = ?rule.path,
                        error = %err,
                        "cannot create watch"
                    );
                }
            }
        }

        inner.rules = rules;
        inner.state = TableState::Loaded;
        let watched = inner.bindings.len();

        info!(
            user = %self.user,
            rules = inner.rules.len(),
            watches = watched,
            "rule table loaded"
        );
        Ok(watched)
    }

    /// Remove every watch of this table, keeping the rules.
    ///
    /// Safe to call repeatedly; also run on drop.
    pub fn dispose(&self) {
        let bindings = {
            let mut inner = self.lock();
            if inner.state == TableState::Loaded {
                inner.state = TableState::Disposed;
            }
            std::mem::take(&mut inner.bindings)
        };

        if bindings.is_empty() {
            return;
        }

        for handle in bindings.keys() {
            self.ctx.router.unregister(*handle);
            if let Err(err) = self.ctx.notifier.unregister_watch(*handle) {
                debug!(user = %self.user, %handle, error = %err, "watch already gone");
            }
        }

        debug!(user = %self.user, watches = bindings.len(), "rule table disposed");
    }

    /// React to an event on one of this table's watches.
    pub fn on_event(&self, event: &WatchEvent) {
        let Some(rule) = self.find_rule(event.handle) else {
            return;
        };

        // Denied events are not logged: the log must not reveal that a
        // restricted path changed.
        let no_follow = rule.mask.contains(EventMask::DONT_FOLLOW)
            || event.mask.contains(EventMask::DONT_FOLLOW);
        if !self.ctx.access.may_access(&rule.path, &self.user, no_follow) {
            return;
        }

        // `$&` and `$%` render event types only.
        let ctx = ExpandContext {
            watch_path: &rule.path,
            name: &event.name,
            mask: event.mask.difference(EventMask::DONT_FOLLOW),
        };
        let command = match prepare_command(&rule.command, &ctx) {
            Ok(command) => command,
            Err(err) => {
                error!(
                    user = %self.user,
                    path = ?rule.path,
                    error = %err,
                    "cannot prepare command arguments"
                );
                return;
            }
        };

        info!(user = %self.user, cmd = %command.line, "CMD");

        let handle = event.handle;
        if rule.no_loop {
            self.ctx.notifier.set_watch_enabled(handle, false);
        }

        match self.ctx.spawner.spawn(&self.user, &command.argv) {
            Ok(pid) => {
                let on_completion: Option<CompletionCallback> = if rule.no_loop {
                    let notifier = Arc::clone(&self.ctx.notifier);
                    Some(Box::new(move || notifier.set_watch_enabled(handle, true)))
                } else {
                    None
                };
                self.ctx.processes.track(pid, on_completion);
            }
            Err(err) => {
                // No child will ever be reaped to do it.
                if rule.no_loop {
                    self.ctx.notifier.set_watch_enabled(handle, true);
                }
                error!(user = %self.user, error = %err, "cannot exec process");
            }
        }
    }
}

impl Drop for RuleTable {
    fn drop(&mut self) {
        self.dispose();
    }
}
