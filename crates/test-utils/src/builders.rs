#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use watchcron::config::RuleSource;
use watchcron::errors::{Result, WatchcronError};
use watchcron::{EventMask, Rule};

/// Builder for `Rule` to simplify test setup.
pub struct RuleBuilder {
    rule: Rule,
}

impl RuleBuilder {
    pub fn new(path: impl AsRef<Path>, command: &str) -> Self {
        Self {
            rule: Rule::new(path.as_ref(), EventMask::CLOSE_WRITE, command, false),
        }
    }

    pub fn mask(mut self, mask: EventMask) -> Self {
        self.rule.mask = mask;
        self
    }

    pub fn no_loop(mut self, val: bool) -> Self {
        self.rule.no_loop = val;
        self
    }

    pub fn build(self) -> Rule {
        self.rule
    }
}

/// Rule source backed by a map, with switchable failure.
#[derive(Debug, Clone, Default)]
pub struct StaticRuleSource {
    tables: Arc<Mutex<HashMap<String, Vec<Rule>>>>,
    broken: Arc<Mutex<bool>>,
}

impl StaticRuleSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(self, user: &str, rules: Vec<Rule>) -> Self {
        self.set_table(user, rules);
        self
    }

    pub fn set_table(&self, user: &str, rules: Vec<Rule>) {
        self.tables.lock().unwrap().insert(user.to_string(), rules);
    }

    /// Make every subsequent load fail.
    pub fn break_source(&self) {
        *self.broken.lock().unwrap() = true;
    }
}

impl RuleSource for StaticRuleSource {
    fn load_rules(&self, user: &str) -> Result<Vec<Rule>> {
        if *self.broken.lock().unwrap() {
            return Err(WatchcronError::ConfigError(format!(
                "table of '{user}' is unreadable"
            )));
        }
        Ok(self
            .tables
            .lock()
            .unwrap()
            .get(user)
            .cloned()
            .unwrap_or_default())
    }
}
