use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use watchcron::errors::{Result, WatchcronError};
use watchcron::watch::NotificationService;
use watchcron::{EventMask, WatchEvent, WatchHandle};

use crate::journal::{Journal, Op};

#[derive(Debug, Clone)]
struct MockWatch {
    path: PathBuf,
    mask: EventMask,
    enabled: bool,
}

/// Notification service that never touches the kernel.
///
/// Registration succeeds for every path except those passed to
/// [`MockNotifier::fail_on`]; all calls are recorded in the journal.
#[derive(Debug)]
pub struct MockNotifier {
    journal: Journal,
    watches: Mutex<HashMap<WatchHandle, MockWatch>>,
    failing: Mutex<HashSet<PathBuf>>,
    next_id: AtomicU64,
}

impl MockNotifier {
    pub fn new(journal: Journal) -> Arc<Self> {
        Arc::new(Self {
            journal,
            watches: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            next_id: AtomicU64::new(100),
        })
    }

    /// Make registration of `path` fail from now on.
    pub fn fail_on(&self, path: impl AsRef<Path>) {
        self.failing.lock().unwrap().insert(path.as_ref().to_path_buf());
    }

    pub fn handle_for(&self, path: impl AsRef<Path>) -> Option<WatchHandle> {
        let path = path.as_ref();
        self.watches
            .lock()
            .unwrap()
            .iter()
            .find(|(_, w)| w.path == path)
            .map(|(h, _)| *h)
    }

    pub fn is_registered(&self, handle: WatchHandle) -> bool {
        self.watches.lock().unwrap().contains_key(&handle)
    }

    pub fn active_count(&self) -> usize {
        self.watches.lock().unwrap().len()
    }

    pub fn mask_of(&self, handle: WatchHandle) -> Option<EventMask> {
        self.watches.lock().unwrap().get(&handle).map(|w| w.mask)
    }

    /// Build the event the kernel would report for `handle`.
    pub fn event(&self, handle: WatchHandle, name: &str, mask: EventMask) -> WatchEvent {
        WatchEvent {
            handle,
            name: name.to_string(),
            mask,
        }
    }
}

impl NotificationService for MockNotifier {
    fn register_watch(&self, path: &Path, mask: EventMask) -> Result<WatchHandle> {
        if self.failing.lock().unwrap().contains(path) {
            return Err(WatchcronError::WatchFailed {
                path: path.to_path_buf(),
                reason: "refused by mock".to_string(),
            });
        }

        let handle = WatchHandle::from_raw(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.watches.lock().unwrap().insert(
            handle,
            MockWatch {
                path: path.to_path_buf(),
                mask,
                enabled: true,
            },
        );
        self.journal.push(Op::Registered(handle, path.to_path_buf()));
        Ok(handle)
    }

    fn unregister_watch(&self, handle: WatchHandle) -> Result<()> {
        self.watches
            .lock()
            .unwrap()
            .remove(&handle)
            .ok_or(WatchcronError::WatchNotFound(handle.as_raw()))?;
        self.journal.push(Op::Unregistered(handle));
        Ok(())
    }

    fn set_watch_enabled(&self, handle: WatchHandle, enabled: bool) {
        if let Some(w) = self.watches.lock().unwrap().get_mut(&handle) {
            w.enabled = enabled;
            self.journal.push(Op::Enabled(handle, enabled));
        }
    }

    fn is_watch_enabled(&self, handle: WatchHandle) -> Option<bool> {
        self.watches.lock().unwrap().get(&handle).map(|w| w.enabled)
    }
}
