// src/engine/mod.rs

//! Event routing and per-user rule evaluation.
//!
//! - [`router`] maps watch handles to the table that owns them.
//! - [`table`] holds one user's rules and turns events into spawned commands.
//! - [`runtime`] is the async shell that feeds events in, reaps children and
//!   handles shutdown.

pub mod router;
pub mod runtime;
pub mod table;

pub use router::EventRouter;
pub use runtime::Daemon;
pub use table::{RuleTable, TableContext, TableState};
