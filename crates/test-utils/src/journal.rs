use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use watchcron::WatchHandle;

/// One observable side effect of the core on its collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Registered(WatchHandle, PathBuf),
    Unregistered(WatchHandle),
    Enabled(WatchHandle, bool),
    Spawned { user: String, argv: Vec<String> },
}

/// Ordered log shared between the mock notifier and the fake spawner, so
/// tests can assert on the relative order of their calls.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    ops: Arc<Mutex<Vec<Op>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, op: Op) {
        self.ops.lock().unwrap().push(op);
    }

    pub fn ops(&self) -> Vec<Op> {
        self.ops.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.ops.lock().unwrap().clear();
    }

    pub fn spawns(&self) -> Vec<(String, Vec<String>)> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::Spawned { user, argv } => Some((user, argv)),
                _ => None,
            })
            .collect()
    }

    /// Position of the first op equal to `op`.
    pub fn position(&self, op: &Op) -> Option<usize> {
        self.ops().iter().position(|o| o == op)
    }
}
