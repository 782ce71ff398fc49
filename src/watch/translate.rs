// src/watch/translate.rs

//! Mapping `notify` event kinds onto inotify-style event bits.

use std::borrow::Cow;
use std::path::Path;

use notify::event::{
    AccessKind, AccessMode, CreateKind, EventKind, ModifyKind, RemoveKind, RenameMode,
};
use tracing::debug;

use crate::types::EventMask;

/// Bits for the `index`-th path of an event of the given kind.
///
/// `index` only matters for renames reported as one event with both paths
/// (`[from, to]`).
pub fn event_bits(kind: &EventKind, index: usize) -> EventMask {
    match kind {
        EventKind::Create(CreateKind::Folder) => EventMask::CREATE | EventMask::ISDIR,
        EventKind::Create(_) => EventMask::CREATE,

        EventKind::Modify(ModifyKind::Metadata(_)) => EventMask::ATTRIB,
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => EventMask::MOVED_FROM,
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => EventMask::MOVED_TO,
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            if index == 0 {
                EventMask::MOVED_FROM
            } else {
                EventMask::MOVED_TO
            }
        }
        EventKind::Modify(ModifyKind::Name(_)) => EventMask::MOVE,
        EventKind::Modify(_) => EventMask::MODIFY,

        EventKind::Remove(RemoveKind::Folder) => EventMask::DELETE | EventMask::ISDIR,
        EventKind::Remove(_) => EventMask::DELETE,

        EventKind::Access(AccessKind::Open(_)) => EventMask::OPEN,
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => EventMask::CLOSE_WRITE,
        EventKind::Access(AccessKind::Close(_)) => EventMask::CLOSE_NOWRITE,
        EventKind::Access(_) => EventMask::ACCESS,

        EventKind::Any | EventKind::Other => EventMask::empty(),
    }
}

/// Rewrite bits for an event on the watched path itself.
fn self_bits(bits: EventMask) -> EventMask {
    let mut out = bits;
    if bits.contains(EventMask::DELETE) {
        out.remove(EventMask::DELETE);
        out.insert(EventMask::DELETE_SELF);
    }
    if bits.intersects(EventMask::MOVE) {
        out.remove(EventMask::MOVE);
        out.insert(EventMask::MOVE_SELF);
    }
    out
}

/// Decide whether an event on `event_path` is reported to a watch on
/// `watch_path` registered with `watch_mask`.
///
/// Returns the reported name (empty for the watched path itself) and the
/// delivered bits: the requested event bits that occurred, plus `IN_ISDIR`
/// when it occurred. Registration flags such as `IN_DONT_FOLLOW` are never
/// delivered.
pub fn match_watch(
    watch_path: &Path,
    watch_mask: EventMask,
    event_path: &Path,
    bits: EventMask,
) -> Option<(String, EventMask)> {
    let (name, bits) = if event_path == watch_path {
        (String::new(), self_bits(bits))
    } else if event_path.parent() == Some(watch_path) {
        let raw = event_path.file_name()?;
        let name = raw.to_string_lossy();
        if let Cow::Owned(_) = name {
            debug!(name = ?raw, "file name is not valid UTF-8; replaced lossily");
        }
        (name.into_owned(), bits)
    } else {
        return None;
    };

    let selected = bits & watch_mask & EventMask::ALL_EVENTS;
    if selected.is_empty() {
        return None;
    }

    Some((name, selected | (bits & EventMask::ISDIR)))
}
