// src/access.rs

//! Permission check performed on behalf of a target user.
//!
//! The daemon runs privileged, so the kernel would let it see everything.
//! Before a rule fires we re-derive the classic owner/group/other decision for
//! the rule's *user* instead, and drop the event if that user could not have
//! touched the path at all.
//!
//! Any of the three rwx bits in a matching class is enough. Classes are
//! tried in the order other, group, owner.

use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::Path;
use std::sync::Arc;

use crate::accounts::{Accounts, SystemAccounts};

const OTHER_RWX: u32 = 0o007;
const GROUP_RWX: u32 = 0o070;
const OWNER_RWX: u32 = 0o700;

#[derive(Debug, Clone)]
pub struct AccessChecker {
    accounts: Arc<dyn Accounts>,
}

impl Default for AccessChecker {
    fn default() -> Self {
        Self::new(Arc::new(SystemAccounts))
    }
}

impl AccessChecker {
    pub fn new(accounts: Arc<dyn Accounts>) -> Self {
        Self { accounts }
    }

    /// Would `user` be granted any access to `path`?
    ///
    /// `no_follow` selects `lstat` over `stat` for a terminal symlink. Returns
    /// false when the metadata cannot be read. An unknown user can still pass
    /// through the "other" bits or an explicit group membership.
    pub fn may_access(&self, path: &Path, user: &str, no_follow: bool) -> bool {
        let meta = if no_follow {
            fs::symlink_metadata(path)
        } else {
            fs::metadata(path)
        };
        let meta = match meta {
            Ok(m) => m,
            Err(_) => return false,
        };

        let mode = meta.mode();

        if mode & OTHER_RWX != 0 {
            return true;
        }

        let entry = self.accounts.user_by_name(user);

        if mode & GROUP_RWX != 0 {
            if entry.as_ref().is_some_and(|u| u.gid == meta.gid()) {
                return true;
            }

            let listed = self
                .accounts
                .group_members(meta.gid())
                .is_some_and(|members| members.iter().any(|m| m == user));
            if listed {
                return true;
            }
        }

        if mode & OWNER_RWX != 0 && entry.as_ref().is_some_and(|u| u.uid == meta.uid()) {
            return true;
        }

        false
    }
}
