pub mod builders;
pub mod fake_spawner;
pub mod journal;
pub mod log_capture;
pub mod mock_notifier;

use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

pub use builders::{RuleBuilder, StaticRuleSource};
pub use fake_spawner::FakeSpawner;
pub use journal::{Journal, Op};
pub use log_capture::LogCapture;
pub use mock_notifier::MockNotifier;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Name and ids of the user running the tests.
pub fn current_user() -> (String, u32, u32) {
    let uid = nix::unistd::getuid();
    let gid = nix::unistd::getgid();
    let name = nix::unistd::User::from_uid(uid)
        .ok()
        .flatten()
        .map(|u| u.name)
        .unwrap_or_else(|| format!("uid{}", uid.as_raw()));
    (name, uid.as_raw(), gid.as_raw())
}

/// Poll `cond` every 20ms for up to 5 seconds.
pub fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..250 {
        if cond() {
            return true;
        }
        std::thread::sleep(std::time::Duration::from_millis(20));
    }
    cond()
}
