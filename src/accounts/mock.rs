// src/accounts/mock.rs

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::{Accounts, UserEntry};

/// In-memory user/group database.
#[derive(Debug, Clone, Default)]
pub struct MockAccounts {
    users: Arc<Mutex<HashMap<String, UserEntry>>>,
    groups: Arc<Mutex<HashMap<u32, Vec<String>>>>,
}

impl MockAccounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, name: &str, uid: u32, gid: u32) {
        let entry = UserEntry {
            name: name.to_string(),
            uid,
            gid,
            home: PathBuf::from(format!("/home/{name}")),
        };
        self.users.lock().unwrap().insert(name.to_string(), entry);
    }

    /// Create the group if needed and list `members` in it.
    pub fn add_group(&self, gid: u32, members: &[&str]) {
        let mut groups = self.groups.lock().unwrap();
        let entry = groups.entry(gid).or_default();
        for member in members {
            if !entry.iter().any(|m| m == member) {
                entry.push(member.to_string());
            }
        }
    }
}

impl Accounts for MockAccounts {
    fn user_by_name(&self, name: &str) -> Option<UserEntry> {
        self.users.lock().unwrap().get(name).cloned()
    }

    fn group_members(&self, gid: u32) -> Option<Vec<String>> {
        self.groups.lock().unwrap().get(&gid).cloned()
    }
}
