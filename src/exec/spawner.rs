// src/exec/spawner.rs

//! Pluggable process spawn primitive.
//!
//! Rule tables talk to a [`Spawner`] instead of `std::process::Command`
//! directly. Production code uses [`CredentialSpawner`], which switches the
//! child to the rule owner's gid/uid before exec; tests can provide their own
//! implementation that just records what would have been run.

use std::fmt::Debug;
use std::io;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use std::sync::Arc;

use nix::unistd::Pid;
use thiserror::Error;
use tracing::debug;

use crate::accounts::{Accounts, SystemAccounts};

#[derive(Error, Debug)]
pub enum SpawnError {
    #[error("unknown user '{0}'")]
    UnknownUser(String),

    #[error("empty argument vector")]
    NoProgram,

    #[error("cannot exec '{program}' as user '{user}': {source}")]
    Exec {
        program: String,
        user: String,
        #[source]
        source: io::Error,
    },
}

/// Starts a child process on behalf of `user` and returns its pid.
///
/// Implementations must not wait for the child: it is handed to the
/// process registry, which reaps it later.
pub trait Spawner: Send + Sync + Debug {
    fn spawn(&self, user: &str, argv: &[String]) -> Result<Pid, SpawnError>;
}

/// Real spawner used in production.
///
/// The standard library performs `setgroups`/`setgid`/`setuid` in the forked
/// child before `execvp`, and reports any failure of those steps (or of the
/// exec itself) back to us as an error. User code therefore never runs with
/// the daemon's identity.
#[derive(Debug, Clone)]
pub struct CredentialSpawner {
    accounts: Arc<dyn Accounts>,
}

impl Default for CredentialSpawner {
    fn default() -> Self {
        Self::new(Arc::new(SystemAccounts))
    }
}

impl CredentialSpawner {
    pub fn new(accounts: Arc<dyn Accounts>) -> Self {
        Self { accounts }
    }
}

impl Spawner for CredentialSpawner {
    fn spawn(&self, user: &str, argv: &[String]) -> Result<Pid, SpawnError> {
        let entry = self
            .accounts
            .user_by_name(user)
            .ok_or_else(|| SpawnError::UnknownUser(user.to_string()))?;
        let (program, args) = argv.split_first().ok_or(SpawnError::NoProgram)?;

        let child = Command::new(program)
            .args(args)
            .gid(entry.gid)
            .uid(entry.uid)
            .env("HOME", &entry.home)
            .env("USER", &entry.name)
            .env("LOGNAME", &entry.name)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SpawnError::Exec {
                program: program.clone(),
                user: user.to_string(),
                source,
            })?;

        let pid = Pid::from_raw(child.id() as i32);
        debug!(user = %user, pid = pid.as_raw(), uid = entry.uid, gid = entry.gid, "child spawned");

        // Dropping `Child` neither kills nor waits; the registry owns it now.
        drop(child);
        Ok(pid)
    }
}
