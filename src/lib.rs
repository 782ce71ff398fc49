// src/lib.rs

pub mod access;
pub mod accounts;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;
pub mod watch;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use crate::access::AccessChecker;
use crate::accounts::{Accounts, SystemAccounts};
use crate::cli::CliArgs;
use crate::config::{RuleSource, TomlRuleSource};
use crate::engine::{Daemon, EventRouter, TableContext};
use crate::exec::{CredentialSpawner, ProcessRegistry};
use crate::watch::NotifyService;

pub use crate::config::Rule;
pub use crate::types::{EventMask, WatchEvent, WatchHandle};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - rule table discovery and loading
/// - the notification service
/// - router, process registry, access checker and spawner
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let source = Arc::new(TomlRuleSource::new(&args.table_dir));

    let users = if args.users.is_empty() {
        source
            .users()
            .with_context(|| format!("listing rule tables in {:?}", args.table_dir))?
    } else {
        args.users.clone()
    };

    if args.dry_run {
        print_dry_run(&source, &users)?;
        return Ok(());
    }

    let (notifier, events) = NotifyService::new()?;
    let accounts: Arc<dyn Accounts> = Arc::new(SystemAccounts);

    let ctx = TableContext {
        notifier: Arc::new(notifier),
        router: Arc::new(EventRouter::new()),
        processes: Arc::new(ProcessRegistry::new()),
        access: AccessChecker::new(Arc::clone(&accounts)),
        spawner: Arc::new(CredentialSpawner::new(Arc::clone(&accounts))),
    };

    let mut daemon = Daemon::new(
        ctx,
        source,
        Duration::from_millis(args.reap_interval_ms),
    );

    for user in &users {
        if accounts.user_by_name(user).is_none() {
            warn!(user = %user, "table belongs to an unknown user; its commands will not run");
        }
        // One broken table must not keep the other users from running.
        if let Err(err) = daemon.load_user(user) {
            error!(user = %user, error = %err, "cannot load rule table");
        }
    }

    info!(users = ?users, "rule tables loaded");

    // Ctrl-C → graceful shutdown.
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    daemon.run(events, shutdown).await?;
    Ok(())
}

/// Simple dry-run output: print every user's rules.
fn print_dry_run(source: &TomlRuleSource, users: &[String]) -> Result<()> {
    println!("watchcron dry-run");
    println!("  table_dir = {:?}", source.dir());
    println!();

    for user in users {
        let rules = source
            .load_rules(user)
            .with_context(|| format!("loading rule table of user '{user}'"))?;

        println!("user {user} ({} rules):", rules.len());
        for rule in &rules {
            println!("  - {}", rule.path.display());
            println!("      events: {}", rule.mask);
            println!("      command: {}", rule.command);
            if rule.no_loop {
                println!("      no_loop: true");
            }
        }
    }

    debug!("dry-run complete (no watching)");
    Ok(())
}
