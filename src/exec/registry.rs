// src/exec/registry.rs

//! Bookkeeping for spawned children that have not been reaped yet.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use nix::errno::Errno;
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;
use tracing::{debug, warn};

/// Invoked exactly once, when the owning child has been reaped.
pub type CompletionCallback = Box<dyn FnOnce() + Send + 'static>;

struct SpawnedProcess {
    pid: Pid,
    on_completion: Option<CompletionCallback>,
}

/// Set of in-flight children.
///
/// [`ProcessRegistry::reap_completed`] is the only place exit statuses are
/// collected, so it has to be called regularly or finished children stay
/// zombies.
#[derive(Default)]
pub struct ProcessRegistry {
    procs: Mutex<Vec<SpawnedProcess>>,
}

impl fmt::Debug for ProcessRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessRegistry")
            .field("pids", &self.pids())
            .finish()
    }
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SpawnedProcess>> {
        self.procs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start tracking a freshly spawned child.
    pub fn track(&self, pid: Pid, on_completion: Option<CompletionCallback>) {
        debug!(pid = pid.as_raw(), callback = on_completion.is_some(), "tracking child");
        self.lock().push(SpawnedProcess { pid, on_completion });
    }

    /// Collect every child that has terminated, without blocking.
    ///
    /// Terminated children are removed and their callbacks run; callbacks run
    /// after the internal lock is released. Returns how many were reaped.
    pub fn reap_completed(&self) -> usize {
        let finished: Vec<SpawnedProcess> = {
            let mut procs = self.lock();
            let mut finished = Vec::new();
            let mut i = 0;
            while i < procs.len() {
                if has_terminated(procs[i].pid) {
                    finished.push(procs.remove(i));
                } else {
                    i += 1;
                }
            }
            finished
        };

        let count = finished.len();
        for proc in finished {
            debug!(pid = proc.pid.as_raw(), "child reaped");
            if let Some(callback) = proc.on_completion {
                callback();
            }
        }
        count
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn pids(&self) -> Vec<Pid> {
        self.lock().iter().map(|p| p.pid).collect()
    }
}

fn has_terminated(pid: Pid) -> bool {
    match waitpid(pid, Some(WaitPidFlag::WNOHANG)) {
        Ok(WaitStatus::Exited(_, code)) => {
            debug!(pid = pid.as_raw(), exit_code = code, "child exited");
            true
        }
        Ok(WaitStatus::Signaled(_, signal, _)) => {
            debug!(pid = pid.as_raw(), ?signal, "child killed by signal");
            true
        }
        Ok(_) => false,
        Err(Errno::ECHILD) => {
            // Nothing left to collect for this pid.
            debug!(pid = pid.as_raw(), "child already collected");
            true
        }
        Err(Errno::EINTR) => false,
        Err(err) => {
            warn!(pid = pid.as_raw(), error = %err, "waitpid failed");
            false
        }
    }
}
