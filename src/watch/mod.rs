// src/watch/mod.rs

//! Filesystem notification service.
//!
//! This module is responsible for:
//! - Registering and releasing per-path watches, each identified by a
//!   [`WatchHandle`].
//! - Enabling and disabling individual watches (used by no-loop rules).
//! - Turning raw `notify` events into [`WatchEvent`]s with inotify-style
//!   event bits ([`translate`]).
//!
//! It does **not** know about users or rules; the event router maps handles
//! back to the rule table that owns them.

use std::fmt::Debug;
use std::path::Path;

use crate::errors::Result;
use crate::types::{EventMask, WatchHandle};

pub mod translate;
pub mod watcher;

pub use watcher::NotifyService;

/// Contract between rule tables and whatever delivers filesystem events.
pub trait NotificationService: Send + Sync + Debug {
    /// Start watching `path` for the events in `mask`.
    fn register_watch(&self, path: &Path, mask: EventMask) -> Result<WatchHandle>;

    /// Stop watching and release `handle`.
    fn unregister_watch(&self, handle: WatchHandle) -> Result<()>;

    /// Suspend or resume delivery for `handle`. Unknown handles are ignored.
    fn set_watch_enabled(&self, handle: WatchHandle, enabled: bool);

    /// `None` if the handle is not registered.
    fn is_watch_enabled(&self, handle: WatchHandle) -> Option<bool>;
}
