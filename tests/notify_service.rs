// tests/notify_service.rs

use std::fs;
use std::path::Path;
use std::time::Duration;

use notify::event::{AccessKind, AccessMode, CreateKind, EventKind, ModifyKind, RemoveKind, RenameMode};
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;
use watchcron::errors::WatchcronError;
use watchcron::exec::{expand, ExpandContext};
use watchcron::watch::translate::{event_bits, match_watch};
use watchcron::watch::{NotificationService, NotifyService};
use watchcron::{EventMask, WatchEvent, WatchHandle};
use watchcron_test_utils::init_tracing;

/// Next event for `handle`, skipping unrelated ones.
async fn next_for(
    rx: &mut UnboundedReceiver<WatchEvent>,
    handle: WatchHandle,
    within: Duration,
) -> Option<WatchEvent> {
    tokio::time::timeout(within, async {
        while let Some(ev) = rx.recv().await {
            if ev.handle == handle {
                return Some(ev);
            }
        }
        None
    })
    .await
    .ok()
    .flatten()
}

#[tokio::test]
async fn create_in_watched_directory_is_delivered() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let (service, mut rx) = NotifyService::new().unwrap();

    let handle = service.register_watch(tmp.path(), EventMask::CREATE).unwrap();
    assert_eq!(service.is_watch_enabled(handle), Some(true));

    fs::write(tmp.path().join("new.txt"), b"x").unwrap();

    let ev = next_for(&mut rx, handle, Duration::from_secs(5))
        .await
        .expect("create event");
    assert_eq!(ev.name, "new.txt");
    assert!(ev.mask.contains(EventMask::CREATE));
    assert!(!ev.mask.contains(EventMask::ISDIR));
}

#[tokio::test]
async fn disabled_watch_stays_silent_until_re_enabled() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let (service, mut rx) = NotifyService::new().unwrap();

    let handle = service.register_watch(tmp.path(), EventMask::CREATE).unwrap();
    service.set_watch_enabled(handle, false);
    assert_eq!(service.is_watch_enabled(handle), Some(false));

    fs::write(tmp.path().join("quiet.txt"), b"x").unwrap();
    assert!(next_for(&mut rx, handle, Duration::from_millis(500)).await.is_none());

    service.set_watch_enabled(handle, true);
    fs::write(tmp.path().join("loud.txt"), b"x").unwrap();
    let ev = next_for(&mut rx, handle, Duration::from_secs(5))
        .await
        .expect("event after re-enable");
    assert_eq!(ev.name, "loud.txt");
}

#[tokio::test]
async fn two_watches_on_one_path_are_independent() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let (service, mut rx) = NotifyService::new().unwrap();

    let first = service.register_watch(tmp.path(), EventMask::CREATE).unwrap();
    let second = service.register_watch(tmp.path(), EventMask::CREATE).unwrap();
    assert_ne!(first, second);

    service.unregister_watch(first).unwrap();
    assert_eq!(service.is_watch_enabled(first), None);

    fs::write(tmp.path().join("f"), b"x").unwrap();
    let ev = next_for(&mut rx, second, Duration::from_secs(5))
        .await
        .expect("remaining watch still fires");
    assert_eq!(ev.name, "f");
}

#[test]
fn registration_errors() {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    let (service, _rx) = NotifyService::new().unwrap();

    let missing = tmp.path().join("missing");
    assert!(matches!(
        service.register_watch(&missing, EventMask::CREATE),
        Err(WatchcronError::WatchFailed { path, .. }) if path == missing
    ));
    assert!(matches!(
        service.register_watch(tmp.path(), EventMask::DONT_FOLLOW),
        Err(WatchcronError::WatchFailed { .. })
    ));

    let unknown = WatchHandle::from_raw(424_242);
    assert!(matches!(
        service.unregister_watch(unknown),
        Err(WatchcronError::WatchNotFound(424_242))
    ));
    // Ignored, not an error.
    service.set_watch_enabled(unknown, false);
    assert_eq!(service.is_watch_enabled(unknown), None);

    let handle = service.register_watch(tmp.path(), EventMask::ALL_EVENTS).unwrap();
    service.unregister_watch(handle).unwrap();
    assert!(service.unregister_watch(handle).is_err());
}

#[test]
fn notify_kinds_map_to_event_bits() {
    assert_eq!(
        event_bits(&EventKind::Create(CreateKind::File), 0),
        EventMask::CREATE
    );
    assert_eq!(
        event_bits(&EventKind::Create(CreateKind::Folder), 0),
        EventMask::CREATE | EventMask::ISDIR
    );
    assert_eq!(
        event_bits(&EventKind::Remove(RemoveKind::Folder), 0),
        EventMask::DELETE | EventMask::ISDIR
    );
    assert_eq!(
        event_bits(&EventKind::Access(AccessKind::Close(AccessMode::Write)), 0),
        EventMask::CLOSE_WRITE
    );
    assert_eq!(
        event_bits(&EventKind::Access(AccessKind::Close(AccessMode::Read)), 0),
        EventMask::CLOSE_NOWRITE
    );

    let rename = EventKind::Modify(ModifyKind::Name(RenameMode::Both));
    assert_eq!(event_bits(&rename, 0), EventMask::MOVED_FROM);
    assert_eq!(event_bits(&rename, 1), EventMask::MOVED_TO);
    assert!(event_bits(&EventKind::Other, 0).is_empty());
}

#[test]
fn match_watch_reports_children_by_name() {
    let dir = Path::new("/srv/in");

    let (name, mask) = match_watch(
        dir,
        EventMask::CREATE,
        Path::new("/srv/in/a.txt"),
        EventMask::CREATE,
    )
    .unwrap();
    assert_eq!(name, "a.txt");
    assert_eq!(mask, EventMask::CREATE);

    // Grandchildren and siblings are not reported.
    assert!(match_watch(dir, EventMask::CREATE, Path::new("/srv/in/sub/a"), EventMask::CREATE).is_none());
    assert!(match_watch(dir, EventMask::CREATE, Path::new("/srv/other"), EventMask::CREATE).is_none());
    // Unrequested bits are filtered out.
    assert!(match_watch(dir, EventMask::DELETE, Path::new("/srv/in/a"), EventMask::CREATE).is_none());
}

#[test]
fn match_watch_reports_isdir_but_not_registration_flags() {
    let dir = Path::new("/srv/in");

    let (_, mask) = match_watch(
        dir,
        EventMask::CREATE | EventMask::DONT_FOLLOW,
        Path::new("/srv/in/sub"),
        EventMask::CREATE | EventMask::ISDIR,
    )
    .unwrap();
    assert_eq!(mask, EventMask::CREATE | EventMask::ISDIR);
}

#[test]
fn delivered_mask_renders_like_the_kernel_value() {
    let inbox = Path::new("/srv/inbox");
    let (name, mask) = match_watch(
        inbox,
        EventMask::CLOSE_WRITE | EventMask::DONT_FOLLOW,
        Path::new("/srv/inbox/f"),
        EventMask::CLOSE_WRITE,
    )
    .unwrap();

    let ctx = ExpandContext {
        watch_path: inbox,
        name: &name,
        mask,
    };
    assert_eq!(expand("$& $% $#", &ctx), "8 IN_CLOSE_WRITE f");
}

#[test]
fn events_on_the_watched_path_itself_become_self_events() {
    let file = Path::new("/srv/in/config");

    let (name, mask) = match_watch(
        file,
        EventMask::DELETE_SELF | EventMask::MODIFY,
        file,
        EventMask::DELETE,
    )
    .unwrap();
    assert_eq!(name, "");
    assert_eq!(mask, EventMask::DELETE_SELF);

    let (_, mask) = match_watch(file, EventMask::MOVE_SELF, file, EventMask::MOVED_FROM).unwrap();
    assert_eq!(mask, EventMask::MOVE_SELF);

    let (_, mask) = match_watch(file, EventMask::MODIFY, file, EventMask::MODIFY).unwrap();
    assert_eq!(mask, EventMask::MODIFY);
}
