// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keeper - tiered backup scheduler and retention engine.
//!
//! This is the binary entry point.

mod backup;
mod pid;
mod scheduler;
mod shutdown;
mod status;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use keeper_core::Tier;
use keeper_cron::RunStatus;
use tracing::error;

/// Keeper - tiered backup scheduler and retention engine.
#[derive(Parser, Debug)]
#[command(name = "keeper", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the daily tier once.
    Daily,
    /// Run the weekly tier once.
    Weekly,
    /// Run the monthly tier once.
    Monthly,
    /// Back up a single unit on demand.
    Backup {
        /// Registered unit name.
        unit: String,
        /// Also copy the artifacts into this tier.
        #[arg(long)]
        tier: Option<Tier>,
    },
    /// Apply retention without taking new backups.
    Prune {
        /// Only prune this tier (default: every tier plus staging).
        #[arg(long)]
        tier: Option<Tier>,
    },
    /// Start the polling scheduler.
    RunScheduler {
        /// Stay attached to the terminal instead of detaching.
        #[arg(long)]
        foreground: bool,
    },
    /// Stop a running scheduler.
    StopScheduler,
    /// Show scheduler state and artifact counts.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
        /// Disable colors.
        #[arg(long)]
        plain: bool,
    },
    /// Print crontab lines equivalent to the configured schedules.
    Crontab,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => keeper_config::load_and_validate_path(path),
        None => keeper_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            keeper_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.scheduler.log_level);

    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Daily => run_tier(&config, Tier::Daily).await,
        Commands::Weekly => run_tier(&config, Tier::Weekly).await,
        Commands::Monthly => run_tier(&config, Tier::Monthly).await,
        Commands::Backup { unit, tier } => backup::run_backup_unit(&config, &unit, tier).await,
        Commands::Prune { tier } => backup::run_prune(&config, tier).await,
        Commands::RunScheduler { foreground } => {
            scheduler::run_scheduler(&config, config_path, foreground).await
        }
        Commands::StopScheduler => scheduler::stop_scheduler(&config),
        Commands::Status { json, plain } => status::run_status(&config, json, plain).await,
        Commands::Crontab => scheduler::print_crontab(&config, config_path),
    };

    if let Err(e) = result {
        error!(error = %e, "command failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Run one tier; any unit failure makes the process exit non-zero.
async fn run_tier(config: &keeper_config::KeeperConfig, tier: Tier) -> Result<(), keeper_core::KeeperError> {
    match backup::run_tier(config, tier).await? {
        RunStatus::Succeeded => Ok(()),
        status => {
            eprintln!("error: {tier} backup finished with status: {status}");
            std::process::exit(1);
        }
    }
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "keeper={log_level},keeper_cron={log_level},keeper_storage={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(true)
        .init();
}
