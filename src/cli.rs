// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Default directory holding one `<user>.toml` rule table per user.
pub const DEFAULT_TABLE_DIR: &str = "/etc/watchcron.d";

/// Command-line arguments for `watchcron`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "watchcron",
    version,
    about = "Run commands as their owning user when watched files change.",
    long_about = None
)]
pub struct CliArgs {
    /// Directory containing per-user rule tables (`<user>.toml`).
    #[arg(long, value_name = "DIR", default_value = DEFAULT_TABLE_DIR)]
    pub table_dir: PathBuf,

    /// Only load the tables of these users (repeatable).
    ///
    /// If omitted, every table found in `--table-dir` is loaded.
    #[arg(long = "user", value_name = "NAME")]
    pub users: Vec<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `WATCHCRON_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// How often finished children are reaped, in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    pub reap_interval_ms: u64,

    /// Load + validate the tables and print them, but don't watch anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
