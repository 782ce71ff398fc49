// src/accounts/mod.rs

//! User and group database access.
//!
//! The access checker and the spawner only ever see the [`Accounts`] trait,
//! so tests can run against [`mock::MockAccounts`] instead of `/etc/passwd`.

use std::fmt::Debug;
use std::path::PathBuf;

use nix::unistd::{Gid, Group, User};
use tracing::debug;

pub mod mock;

/// The parts of a passwd entry the daemon needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserEntry {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
    pub home: PathBuf,
}

/// Abstract user/group database.
pub trait Accounts: Send + Sync + Debug {
    /// Look up a user by login name. `None` if unknown or the lookup failed.
    fn user_by_name(&self, name: &str) -> Option<UserEntry>;

    /// Member names listed for the group `gid`. `None` if the group is unknown.
    fn group_members(&self, gid: u32) -> Option<Vec<String>>;
}

/// Implementation backed by the system databases (`getpwnam`, `getgrgid`).
#[derive(Debug, Clone, Default)]
pub struct SystemAccounts;

impl Accounts for SystemAccounts {
    fn user_by_name(&self, name: &str) -> Option<UserEntry> {
        match User::from_name(name) {
            Ok(Some(user)) => Some(UserEntry {
                name: user.name,
                uid: user.uid.as_raw(),
                gid: user.gid.as_raw(),
                home: user.dir,
            }),
            Ok(None) => None,
            Err(err) => {
                debug!(user = %name, error = %err, "passwd lookup failed");
                None
            }
        }
    }

    fn group_members(&self, gid: u32) -> Option<Vec<String>> {
        match Group::from_gid(Gid::from_raw(gid)) {
            Ok(Some(group)) => Some(group.mem),
            Ok(None) => None,
            Err(err) => {
                debug!(gid, error = %err, "group lookup failed");
                None
            }
        }
    }
}
