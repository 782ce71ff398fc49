// src/config/mod.rs

//! Per-user rule tables: TOML model, validation and the `RuleSource` used by
//! rule tables to (re)load their rules.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{RuleSource, TomlRuleSource, load_and_validate, load_from_path};
pub use model::{RawRule, RawRuleFile, Rule, RuleSet};
