// src/config/loader.rs

use std::fmt::Debug;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{RawRuleFile, Rule, RuleSet};
use crate::errors::Result;

/// File extension of per-user rule tables.
pub const TABLE_EXTENSION: &str = "toml";

/// Where rule tables come from.
pub trait RuleSource: Send + Sync + Debug {
    /// Ordered rules defined for `user`. No table means no rules.
    fn load_rules(&self, user: &str) -> Result<Vec<Rule>>;
}

/// Load a rule table and return the raw `RawRuleFile`.
///
/// This only performs TOML deserialization; use [`load_and_validate`] for the
/// checked form.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawRuleFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let table: RawRuleFile = toml::from_str(&contents)?;

    Ok(table)
}

/// Load a rule table from path and validate every rule.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<RuleSet> {
    let raw = load_from_path(&path)?;
    let rules = RuleSet::try_from(raw)?;
    Ok(rules)
}

/// Rule tables stored as `<dir>/<user>.toml`.
#[derive(Debug, Clone)]
pub struct TomlRuleSource {
    dir: PathBuf,
}

impl TomlRuleSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn table_path(&self, user: &str) -> PathBuf {
        self.dir.join(format!("{user}.{TABLE_EXTENSION}"))
    }

    /// Names of all users that have a table file, sorted.
    pub fn users(&self) -> Result<Vec<String>> {
        let mut users = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(TABLE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                users.push(stem.to_string());
            }
        }
        users.sort();
        Ok(users)
    }
}

impl RuleSource for TomlRuleSource {
    fn load_rules(&self, user: &str) -> Result<Vec<Rule>> {
        let path = self.table_path(user);
        match load_and_validate(&path) {
            Ok(rules) => Ok(rules.into_rules()),
            Err(crate::errors::WatchcronError::IoError(err)) if err.kind() == ErrorKind::NotFound => {
                debug!(user = %user, ?path, "no rule table");
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }
}
