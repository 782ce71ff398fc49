// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::types::EventMask;

/// A per-user rule table as read from `<table-dir>/<user>.toml`.
///
/// ```toml
/// [[rule]]
/// path = "/srv/inbox"
/// events = ["IN_CLOSE_WRITE", "IN_MOVED_TO"]
/// command = "/usr/local/bin/ingest $@/$#"
/// no_loop = true
/// ```
///
/// This is the unvalidated form; use [`RuleSet::try_from`] (or the loader)
/// to get rules the daemon can act on.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawRuleFile {
    #[serde(default)]
    pub rule: Vec<RawRule>,
}

/// One `[[rule]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawRule {
    /// Absolute path to watch (file or directory).
    pub path: PathBuf,

    /// Event names, e.g. `"IN_CREATE"` or `"close_write"`.
    ///
    /// `"IN_NO_LOOP"` is accepted here as an alias for `no_loop = true`.
    pub events: Vec<String>,

    /// Command template; see [`crate::exec::expand`].
    pub command: String,

    /// Suspend this rule's watch while its own command is running.
    #[serde(default)]
    pub no_loop: bool,
}

/// A validated rule. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub path: PathBuf,
    pub mask: EventMask,
    pub command: String,
    pub no_loop: bool,
}

impl Rule {
    pub fn new(
        path: impl Into<PathBuf>,
        mask: EventMask,
        command: impl Into<String>,
        no_loop: bool,
    ) -> Self {
        Self {
            path: path.into(),
            mask,
            command: command.into(),
            no_loop,
        }
    }
}

/// Validated, ordered rules of one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub(crate) fn new_unchecked(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn into_rules(self) -> Vec<Rule> {
        self.rules
    }
}
