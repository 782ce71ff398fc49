// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`expand`] turns a rule's command template plus an event into an
//!   argument vector.
//! - [`tokenize`] splits an expanded command line into words.
//! - [`spawner`] provides the `Spawner` trait and the credential-dropping
//!   `CredentialSpawner` used in production.
//! - [`registry`] tracks spawned children until they are reaped and runs their
//!   completion callbacks.

pub mod expand;
pub mod registry;
pub mod spawner;
pub mod tokenize;

pub use expand::{ExpandContext, ExpandError, PreparedCommand, expand, prepare_command};
pub use registry::{CompletionCallback, ProcessRegistry};
pub use spawner::{CredentialSpawner, SpawnError, Spawner};
pub use tokenize::tokenize;
