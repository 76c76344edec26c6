//! Administrative command handlers.
//!
//! These commands read a snapshot file offline, so they never touch a running server.

use crate::config::Config;
use crate::services::expiry;
use crate::store::LinkStore;
use crate::util::short_url;
use anyhow::{Context, Result};
use chrono::Utc;
use clap::Subcommand;
use std::path::PathBuf;
use tracing::info;

/// Administrative commands available via CLI.
#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// Show link and click totals
    Stats {
        /// Snapshot file (defaults to SNAPSHOT_PATH)
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },

    /// List links with their click history
    List {
        /// Snapshot file (defaults to SNAPSHOT_PATH)
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Print only links that have not expired
        #[arg(long, default_value_t = false)]
        active: bool,
    },
}

/// Run an administrative command with the given configuration.
pub fn run(config: Config, admin_command: AdminCommands) -> Result<()> {
    match admin_command {
        AdminCommands::Stats { snapshot } => stats(&config, snapshot),
        AdminCommands::List { snapshot, active } => list(&config, snapshot, active),
    }
}

fn open_snapshot(config: &Config, snapshot: Option<PathBuf>) -> Result<LinkStore> {
    let path = snapshot
        .or_else(|| config.snapshot.path.clone())
        .context("No snapshot given; pass --snapshot or set SNAPSHOT_PATH")?;

    info!("Reading snapshot {}", path.display());
    LinkStore::load_snapshot(&path)
        .with_context(|| format!("Failed to load snapshot {}", path.display()))
}

/// Display statistics.
fn stats(config: &Config, snapshot: Option<PathBuf>) -> Result<()> {
    let store = open_snapshot(config, snapshot)?;
    let stats = store.stats(Utc::now());

    println!("\n=== snaplink Statistics ===");
    println!("Total links:     {}", stats.total_links);
    println!("Total clicks:    {}", stats.total_clicks);
    println!("Active links:    {}", stats.active_links);
    println!("Expired links:   {}", stats.expired_links);
    println!();

    Ok(())
}

/// Print every link followed by its clicks.
fn list(config: &Config, snapshot: Option<PathBuf>, active_only: bool) -> Result<()> {
    let store = open_snapshot(config, snapshot)?;
    let now = Utc::now();

    for record in store.list_all() {
        let expired = expiry::is_expired(&record, now);
        if active_only && expired {
            continue;
        }

        println!("Original:   {}", record.long_url);
        println!(
            "Short:      {}",
            short_url(&config.server.base_url, &record.short_code)
        );
        if expired {
            println!("Expires in: expired");
        } else {
            println!(
                "Expires in: {} min",
                expiry::minutes_remaining(&record, now)
            );
        }
        println!("Clicks:     {}", record.clicks.len());
        for click in &record.clicks {
            println!(
                "  {} | {} | {}",
                click.timestamp.to_rfc3339(),
                click.source,
                click.location
            );
        }
        println!();
    }

    Ok(())
}
