// src/engine/runtime.rs

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::RuleSource;
use crate::errors::Result;
use crate::types::WatchEvent;

use super::table::{RuleTable, TableContext};

const MIN_REAP_INTERVAL: Duration = Duration::from_millis(10);

/// Owns the rule tables of every user and drives event delivery and reaping.
///
/// Event handling and reaping share one task, so a table's `on_event` always
/// runs to completion before the next event or reap is processed.
pub struct Daemon {
    ctx: TableContext,
    source: Arc<dyn RuleSource>,
    tables: BTreeMap<String, Arc<RuleTable>>,
    reap_interval: Duration,
}

impl fmt::Debug for Daemon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Daemon")
            .field("users", &self.tables.keys().collect::<Vec<_>>())
            .field("reap_interval", &self.reap_interval)
            .finish_non_exhaustive()
    }
}

impl Daemon {
    pub fn new(ctx: TableContext, source: Arc<dyn RuleSource>, reap_interval: Duration) -> Self {
        Self {
            ctx,
            source,
            tables: BTreeMap::new(),
            reap_interval: reap_interval.max(MIN_REAP_INTERVAL),
        }
    }

    /// Load (or reload) the table of `user`. Returns the number of watches.
    ///
    /// There is never more than one table per user: an existing table is
    /// reloaded in place.
    pub fn load_user(&mut self, user: &str) -> Result<usize> {
        let table = match self.tables.get(user) {
            Some(table) => Arc::clone(table),
            None => RuleTable::new(user, self.ctx.clone()),
        };
        let watched = table.load(self.source.as_ref())?;
        self.tables.insert(user.to_string(), table);
        Ok(watched)
    }

    /// Dispose and forget the table of `user`.
    pub fn unload_user(&mut self, user: &str) -> bool {
        match self.tables.remove(user) {
            Some(table) => {
                table.dispose();
                true
            }
            None => false,
        }
    }

    pub fn table(&self, user: &str) -> Option<Arc<RuleTable>> {
        self.tables.get(user).cloned()
    }

    pub fn users(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(|s| s.as_str())
    }

    /// Route one event and collect any children that finished meanwhile.
    pub fn handle_event(&self, event: &WatchEvent) {
        debug!(handle = %event.handle, name = %event.name, mask = %event.mask, "event received");
        self.ctx.router.dispatch(event);
        self.ctx.processes.reap_completed();
    }

    /// Main event loop.
    ///
    /// - Consumes `WatchEvent`s from `events` and routes them.
    /// - Reaps finished children every `reap_interval`.
    /// - Stops when `shutdown` resolves or the event channel closes, then
    ///   disposes every table.
    pub async fn run<F>(mut self, mut events: mpsc::UnboundedReceiver<WatchEvent>, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!(tables = self.tables.len(), "watchcron runtime started");

        tokio::pin!(shutdown);
        let mut reap_tick = tokio::time::interval(self.reap_interval);
        reap_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                maybe_event = events.recv() => match maybe_event {
                    Some(event) => self.handle_event(&event),
                    None => {
                        info!("event channel closed; exiting");
                        break;
                    }
                },
                _ = reap_tick.tick() => {
                    let reaped = self.ctx.processes.reap_completed();
                    if reaped > 0 {
                        debug!(reaped, "children reaped");
                    }
                }
                _ = &mut shutdown => {
                    info!("shutdown requested");
                    break;
                }
            }
        }

        self.shutdown();
        info!("runtime exiting");
        Ok(())
    }

    /// Dispose every table and do a last reap. Children still running are
    /// left alone.
    pub fn shutdown(&mut self) {
        for (_, table) in std::mem::take(&mut self.tables) {
            table.dispose();
        }
        self.ctx.processes.reap_completed();
        if !self.ctx.processes.is_empty() {
            info!(running = self.ctx.processes.len(), "leaving running children behind");
        }
    }
}
