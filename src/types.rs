// src/types.rs

//! Types shared between the watch layer, the rule tables and the executor.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use crate::errors::WatchcronError;

bitflags! {
    /// Event type bits, using the Linux inotify values so that `$&` renders
    /// the integers users already know from `inotify(7)`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct EventMask: u32 {
        const ACCESS = 0x0000_0001;
        const MODIFY = 0x0000_0002;
        const ATTRIB = 0x0000_0004;
        const CLOSE_WRITE = 0x0000_0008;
        const CLOSE_NOWRITE = 0x0000_0010;
        const OPEN = 0x0000_0020;
        const MOVED_FROM = 0x0000_0040;
        const MOVED_TO = 0x0000_0080;
        const CREATE = 0x0000_0100;
        const DELETE = 0x0000_0200;
        const DELETE_SELF = 0x0000_0400;
        const MOVE_SELF = 0x0000_0800;
        /// Do not dereference a terminal symlink (stat vs lstat).
        const DONT_FOLLOW = 0x0200_0000;
        /// The subject of the event is a directory.
        const ISDIR = 0x4000_0000;

        const CLOSE = Self::CLOSE_WRITE.bits() | Self::CLOSE_NOWRITE.bits();
        const MOVE = Self::MOVED_FROM.bits() | Self::MOVED_TO.bits();
        const ALL_EVENTS = Self::ACCESS.bits()
            | Self::MODIFY.bits()
            | Self::ATTRIB.bits()
            | Self::CLOSE_WRITE.bits()
            | Self::CLOSE_NOWRITE.bits()
            | Self::OPEN.bits()
            | Self::MOVED_FROM.bits()
            | Self::MOVED_TO.bits()
            | Self::CREATE.bits()
            | Self::DELETE.bits()
            | Self::DELETE_SELF.bits()
            | Self::MOVE_SELF.bits();
    }
}

/// Single-bit names in rendering order.
const SINGLE_NAMES: &[(&str, EventMask)] = &[
    ("IN_ACCESS", EventMask::ACCESS),
    ("IN_MODIFY", EventMask::MODIFY),
    ("IN_ATTRIB", EventMask::ATTRIB),
    ("IN_CLOSE_WRITE", EventMask::CLOSE_WRITE),
    ("IN_CLOSE_NOWRITE", EventMask::CLOSE_NOWRITE),
    ("IN_OPEN", EventMask::OPEN),
    ("IN_MOVED_FROM", EventMask::MOVED_FROM),
    ("IN_MOVED_TO", EventMask::MOVED_TO),
    ("IN_CREATE", EventMask::CREATE),
    ("IN_DELETE", EventMask::DELETE),
    ("IN_DELETE_SELF", EventMask::DELETE_SELF),
    ("IN_MOVE_SELF", EventMask::MOVE_SELF),
    ("IN_DONT_FOLLOW", EventMask::DONT_FOLLOW),
    ("IN_ISDIR", EventMask::ISDIR),
];

const COMPOSITE_NAMES: &[(&str, EventMask)] = &[
    ("IN_CLOSE", EventMask::CLOSE),
    ("IN_MOVE", EventMask::MOVE),
    ("IN_ALL_EVENTS", EventMask::ALL_EVENTS),
];

impl EventMask {
    /// Symbolic names of the set bits, joined with `,`.
    pub fn symbolic(&self) -> String {
        SINGLE_NAMES
            .iter()
            .filter(|(_, bit)| self.contains(*bit))
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for EventMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbolic())
    }
}

/// Parses one event name, e.g. `IN_CLOSE_WRITE`, `close_write` or `IN_MOVE`.
impl FromStr for EventMask {
    type Err = WatchcronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        let name = if upper.starts_with("IN_") {
            upper
        } else {
            format!("IN_{upper}")
        };

        SINGLE_NAMES
            .iter()
            .chain(COMPOSITE_NAMES.iter())
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, mask)| *mask)
            .ok_or_else(|| WatchcronError::UnknownEvent(s.trim().to_string()))
    }
}

/// Opaque identifier of one registered watch.
///
/// Issued by the notification service; a handle identifies exactly one rule
/// in exactly one rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchHandle(u64);

impl WatchHandle {
    pub fn from_raw(raw: u64) -> Self {
        WatchHandle(raw)
    }

    pub fn as_raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wd#{}", self.0)
    }
}

/// A decoded notification, as delivered to the event router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub handle: WatchHandle,
    /// File name relative to the watched path; empty when the event concerns
    /// the watched path itself.
    pub name: String,
    pub mask: EventMask,
}
