// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `keeper status` command implementation.
//!
//! Read-only overview: scheduler process state from the pid file, artifact
//! counts per namespace, whether a crontab entry invokes keeper, and last
//! runs from the state checkpoint when one is configured.

use std::io::IsTerminal;

use keeper_config::KeeperConfig;
use keeper_core::{ArtifactStore, KeeperError, Namespace, StateCheckpoint, Tier};
use keeper_cron::Schedules;
use keeper_storage::{FileCheckpoint, FsArtifactStore};
use serde::Serialize;

use crate::pid::PidFile;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub scheduler: SchedulerStatus,
    /// `None` when `crontab -l` could not be run.
    pub crontab_installed: Option<bool>,
    pub backups_dir: String,
    pub units: Vec<String>,
    pub staging_artifacts: usize,
    pub tiers: Vec<TierStatus>,
}

#[derive(Debug, Serialize)]
pub struct SchedulerStatus {
    pub state: String,
    pub pid: Option<u32>,
    pub pid_file: String,
}

#[derive(Debug, Serialize)]
pub struct TierStatus {
    pub tier: Tier,
    pub schedule: String,
    pub retention: usize,
    pub artifacts: usize,
    pub last_run: Option<String>,
}

/// Run the `keeper status` command.
///
/// With `--json`, prints structured JSON for scripting. With `--plain`, or
/// when stdout is not a TTY, colors are disabled.
pub async fn run_status(config: &KeeperConfig, json: bool, plain: bool) -> Result<(), KeeperError> {
    let status = collect_status(config, crontab_installed()).await?;

    if json {
        let out = serde_json::to_string_pretty(&status)
            .map_err(|e| KeeperError::Internal(format!("failed to encode status: {e}")))?;
        println!("{out}");
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print_status(&status, use_color);
    }
    Ok(())
}

/// Gather status without printing it.
pub async fn collect_status(
    config: &KeeperConfig,
    crontab_installed: Option<bool>,
) -> Result<StatusResponse, KeeperError> {
    let pid_file = PidFile::new(&config.scheduler.pid_file);
    let pid_status = pid_file.status()?;

    let store = FsArtifactStore::new(&config.storage.backups_dir);
    let schedules = Schedules::from_config(&config.tiers);

    let state = match &config.scheduler.state_file {
        Some(path) => FileCheckpoint::new(path).load().await.ok().flatten(),
        None => None,
    };

    let mut tiers = Vec::new();
    for schedule in schedules.iter() {
        let artifacts = store
            .list_namespace(Namespace::Tier(schedule.tier))
            .await?
            .len();
        let last_run = state
            .as_ref()
            .filter(|s| s.has_run(schedule.tier))
            .map(|s| s.last_run(schedule.tier).format("%Y-%m-%d %H:%M:%S").to_string());
        tiers.push(TierStatus {
            tier: schedule.tier,
            schedule: schedule.crontab_expression(),
            retention: schedule.retention,
            artifacts,
            last_run,
        });
    }

    Ok(StatusResponse {
        scheduler: SchedulerStatus {
            state: pid_status.label().to_string(),
            pid: pid_status.pid(),
            pid_file: config.scheduler.pid_file.clone(),
        },
        crontab_installed,
        backups_dir: config.storage.backups_dir.clone(),
        units: config.units.iter().map(|u| u.name.clone()).collect(),
        staging_artifacts: store.list_namespace(Namespace::Staging).await?.len(),
        tiers,
    })
}

/// Whether the current user's crontab mentions keeper.
fn crontab_installed() -> Option<bool> {
    let output = std::process::Command::new("crontab").arg("-l").output().ok()?;
    if !output.status.success() {
        // `crontab -l` exits non-zero when the user has no crontab.
        return Some(false);
    }
    Some(crontab_mentions_keeper(&String::from_utf8_lossy(&output.stdout)))
}

fn crontab_mentions_keeper(crontab: &str) -> bool {
    crontab
        .lines()
        .map(str::trim)
        .filter(|l| !l.starts_with('#'))
        .any(|l| l.contains("keeper"))
}

fn print_status(status: &StatusResponse, use_color: bool) {
    use colored::Colorize;

    println!();
    println!("  keeper status");
    println!("  {}", "-".repeat(35));

    let scheduler = &status.scheduler;
    let pid = scheduler
        .pid
        .map(|p| format!(" (pid {p})"))
        .unwrap_or_default();
    match (scheduler.state.as_str(), use_color) {
        ("running", true) => println!("    Scheduler: {} running{pid}", "✓".green()),
        ("running", false) => println!("    Scheduler: [OK] running{pid}"),
        (state, true) => println!("    Scheduler: {} {}{pid}", "✗".red(), state.red()),
        (state, false) => println!("    Scheduler: [--] {state}{pid}"),
    }

    let cron = match status.crontab_installed {
        Some(true) => "installed",
        Some(false) => "not installed",
        None => "unknown",
    };
    println!("    Crontab:   {cron}");
    println!("    Backups:   {}", status.backups_dir);
    println!("    Units:     {}", status.units.join(", "));
    println!();
    println!("    {:<9} {:<12} {:>5} {:>9}  last run", "tier", "schedule", "keep", "artifacts");
    println!("    {:<9} {:<12} {:>5} {:>9}  -", "staging", "-", "-", status.staging_artifacts);
    for tier in &status.tiers {
        println!(
            "    {:<9} {:<12} {:>5} {:>9}  {}",
            tier.tier.to_string(),
            tier.schedule,
            tier.retention,
            tier.artifacts,
            tier.last_run.as_deref().unwrap_or("-")
        );
    }
    println!();
}
