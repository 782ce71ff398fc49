#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use watchcron::access::AccessChecker;
use watchcron::accounts::mock::MockAccounts;
use watchcron::engine::{EventRouter, RuleTable, TableContext};
use watchcron::exec::{ProcessRegistry, Spawner};
use watchcron_test_utils::{current_user, FakeSpawner, Journal, MockNotifier};

pub use watchcron_test_utils::init_tracing;

/// A table context wired to mocks, plus handles on every mock.
pub struct Harness {
    pub user: String,
    pub journal: Journal,
    pub notifier: Arc<MockNotifier>,
    pub accounts: MockAccounts,
    pub router: Arc<EventRouter>,
    pub processes: Arc<ProcessRegistry>,
    pub ctx: TableContext,
}

impl Harness {
    pub fn new() -> Self {
        let journal = Journal::new();
        Self::with_spawner(journal.clone(), Arc::new(FakeSpawner::new(journal)))
    }

    pub fn with_failing_spawner() -> Self {
        let journal = Journal::new();
        Self::with_spawner(journal.clone(), Arc::new(FakeSpawner::failing(journal)))
    }

    fn with_spawner(journal: Journal, spawner: Arc<dyn Spawner>) -> Self {
        init_tracing();

        let (user, uid, gid) = current_user();
        let accounts = MockAccounts::new();
        accounts.add_user(&user, uid, gid);

        let notifier = MockNotifier::new(journal.clone());
        let router = Arc::new(EventRouter::new());
        let processes = Arc::new(ProcessRegistry::new());

        let ctx = TableContext {
            notifier: notifier.clone(),
            router: Arc::clone(&router),
            processes: Arc::clone(&processes),
            access: AccessChecker::new(Arc::new(accounts.clone())),
            spawner,
        };

        Self {
            user,
            journal,
            notifier,
            accounts,
            router,
            processes,
            ctx,
        }
    }

    pub fn table(&self) -> Arc<RuleTable> {
        RuleTable::new(self.user.clone(), self.ctx.clone())
    }

    pub fn table_for(&self, user: &str) -> Arc<RuleTable> {
        RuleTable::new(user, self.ctx.clone())
    }
}

/// Create `name` inside `dir` with the given permission bits.
pub fn file_with_mode(dir: &Path, name: &str, mode: u32) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"data").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
    path
}

/// Create directory `name` inside `dir` with the given permission bits.
pub fn dir_with_mode(dir: &Path, name: &str, mode: u32) -> PathBuf {
    let path = dir.join(name);
    fs::create_dir(&path).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
    path
}
