// src/watch/watcher.rs

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::{Result, WatchcronError};
use crate::types::{EventMask, WatchEvent, WatchHandle};
use crate::watch::NotificationService;
use crate::watch::translate::{event_bits, match_watch};

#[derive(Debug, Clone)]
struct WatchEntry {
    path: PathBuf,
    mask: EventMask,
    enabled: bool,
}

/// Registered watches, shared with the `notify` callback thread.
#[derive(Debug, Default)]
struct WatchTable {
    entries: HashMap<WatchHandle, WatchEntry>,
    // Several handles may watch the same path; the backend only once.
    path_refs: HashMap<PathBuf, usize>,
}

impl WatchTable {
    fn route(&self, event: &Event) -> Vec<WatchEvent> {
        let mut out = Vec::new();
        for (index, path) in event.paths.iter().enumerate() {
            let bits = event_bits(&event.kind, index);
            if bits.is_empty() {
                continue;
            }
            for (handle, entry) in self.entries.iter().filter(|(_, e)| e.enabled) {
                if let Some((name, mask)) = match_watch(&entry.path, entry.mask, path, bits) {
                    out.push(WatchEvent {
                        handle: *handle,
                        name,
                        mask,
                    });
                }
            }
        }
        out
    }
}

fn lock_table(table: &Mutex<WatchTable>) -> MutexGuard<'_, WatchTable> {
    table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Notification service backed by the `notify` crate.
///
/// Every path is watched non-recursively. Events for disabled watches are
/// dropped before they reach the channel.
pub struct NotifyService {
    watcher: Mutex<RecommendedWatcher>,
    table: Arc<Mutex<WatchTable>>,
    next_id: AtomicU64,
}

impl fmt::Debug for NotifyService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifyService")
            .field("watches", &lock_table(&self.table).entries.len())
            .finish_non_exhaustive()
    }
}

impl NotifyService {
    /// Create the service and the channel its decoded events arrive on.
    pub fn new() -> Result<(Self, mpsc::UnboundedReceiver<WatchEvent>)> {
        let (event_tx, event_rx) = mpsc::unbounded_channel::<WatchEvent>();
        let table = Arc::new(Mutex::new(WatchTable::default()));

        // Closure called synchronously by notify whenever an event arrives.
        let watcher = RecommendedWatcher::new(
            {
                let table = Arc::clone(&table);
                move |res: notify::Result<Event>| match res {
                    Ok(event) => {
                        let routed = lock_table(&table).route(&event);
                        for ev in routed {
                            if event_tx.send(ev).is_err() {
                                debug!("event receiver dropped; discarding notification");
                                return;
                            }
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "file watch error");
                    }
                }
            },
            Config::default(),
        )
        .map_err(|e| WatchcronError::Other(e.into()))?;

        info!("notification service started");

        Ok((
            Self {
                watcher: Mutex::new(watcher),
                table,
                next_id: AtomicU64::new(1),
            },
            event_rx,
        ))
    }

    fn watcher(&self) -> MutexGuard<'_, RecommendedWatcher> {
        self.watcher.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl NotificationService for NotifyService {
    fn register_watch(&self, path: &Path, mask: EventMask) -> Result<WatchHandle> {
        let failed = |reason: String| WatchcronError::WatchFailed {
            path: path.to_path_buf(),
            reason,
        };

        if mask.intersection(EventMask::ALL_EVENTS).is_empty() {
            return Err(failed("no event types requested".to_string()));
        }
        std::fs::symlink_metadata(path).map_err(|e| failed(e.to_string()))?;

        // Never call into the backend with the table locked; the callback
        // thread takes that lock.
        let mut watcher = self.watcher();
        let refs = lock_table(&self.table)
            .path_refs
            .get(path)
            .copied()
            .unwrap_or(0);
        if refs == 0 {
            watcher
                .watch(path, RecursiveMode::NonRecursive)
                .map_err(|e| failed(e.to_string()))?;
        }

        let handle = WatchHandle::from_raw(self.next_id.fetch_add(1, Ordering::Relaxed));
        {
            let mut table = lock_table(&self.table);
            table.path_refs.insert(path.to_path_buf(), refs + 1);
            table.entries.insert(
                handle,
                WatchEntry {
                    path: path.to_path_buf(),
                    mask,
                    enabled: true,
                },
            );
        }

        debug!(%handle, ?path, %mask, "watch registered");
        Ok(handle)
    }

    fn unregister_watch(&self, handle: WatchHandle) -> Result<()> {
        let mut watcher = self.watcher();
        let (entry, last) = {
            let mut table = lock_table(&self.table);
            let entry = table
                .entries
                .remove(&handle)
                .ok_or(WatchcronError::WatchNotFound(handle.as_raw()))?;
            let remaining = table
                .path_refs
                .get(&entry.path)
                .copied()
                .unwrap_or(1)
                .saturating_sub(1);
            if remaining == 0 {
                table.path_refs.remove(&entry.path);
            } else {
                table.path_refs.insert(entry.path.clone(), remaining);
            }
            (entry, remaining == 0)
        };

        if last {
            // The path may already be gone, in which case the backend has
            // dropped the watch on its own.
            if let Err(err) = watcher.unwatch(&entry.path) {
                debug!(%handle, path = ?entry.path, error = %err, "unwatch failed");
            }
        }

        debug!(%handle, path = ?entry.path, "watch removed");
        Ok(())
    }

    fn set_watch_enabled(&self, handle: WatchHandle, enabled: bool) {
        if let Some(entry) = lock_table(&self.table).entries.get_mut(&handle) {
            entry.enabled = enabled;
            debug!(%handle, enabled, "watch state changed");
        }
    }

    fn is_watch_enabled(&self, handle: WatchHandle) -> Option<bool> {
        lock_table(&self.table).entries.get(&handle).map(|e| e.enabled)
    }
}
