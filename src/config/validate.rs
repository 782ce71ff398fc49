// src/config/validate.rs

use crate::config::model::{RawRule, RawRuleFile, Rule, RuleSet};
use crate::errors::{Result, WatchcronError};
use crate::types::EventMask;

/// Pseudo event name that only sets the no-loop flag.
const NO_LOOP_NAME: &str = "IN_NO_LOOP";

impl TryFrom<RawRuleFile> for RuleSet {
    type Error = crate::errors::WatchcronError;

    fn try_from(raw: RawRuleFile) -> std::result::Result<Self, Self::Error> {
        let rules = raw
            .rule
            .into_iter()
            .enumerate()
            .map(|(index, rule)| validate_rule(index, rule))
            .collect::<Result<Vec<_>>>()?;
        Ok(RuleSet::new_unchecked(rules))
    }
}

fn validate_rule(index: usize, raw: RawRule) -> Result<Rule> {
    if !raw.path.is_absolute() {
        return Err(WatchcronError::ConfigError(format!(
            "rule #{}: path {:?} must be absolute",
            index + 1,
            raw.path
        )));
    }

    if raw.command.trim().is_empty() {
        return Err(WatchcronError::ConfigError(format!(
            "rule #{} ({:?}): command must not be empty",
            index + 1,
            raw.path
        )));
    }

    let (mask, no_loop_alias) = parse_events(&raw.events)?;
    if mask.intersection(EventMask::ALL_EVENTS).is_empty() {
        return Err(WatchcronError::ConfigError(format!(
            "rule #{} ({:?}): at least one event type is required",
            index + 1,
            raw.path
        )));
    }

    Ok(Rule {
        path: raw.path,
        mask,
        command: raw.command,
        no_loop: raw.no_loop || no_loop_alias,
    })
}

/// Fold event names into a mask; reports whether `IN_NO_LOOP` was listed.
fn parse_events(names: &[String]) -> Result<(EventMask, bool)> {
    let mut mask = EventMask::empty();
    let mut no_loop = false;

    for name in names {
        let upper = name.trim().to_uppercase();
        if upper == NO_LOOP_NAME || upper == "NO_LOOP" {
            no_loop = true;
            continue;
        }
        mask |= name.parse::<EventMask>()?;
    }

    Ok((mask, no_loop))
}
