// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot commands: `daily`/`weekly`/`monthly`, `backup <unit>`, and `prune`.

use std::io::IsTerminal;
use std::sync::Arc;

use keeper_config::KeeperConfig;
use keeper_core::{KeeperError, SystemClock, Tier};
use keeper_cron::{BackupEngine, RunStatus, TierReport};
use keeper_storage::{CommandProducer, FsArtifactStore};

/// Build the engine over the configured backups directory and producer.
///
/// The backups directory is created up front so producers can write into it.
pub fn build_engine(config: &KeeperConfig) -> Result<BackupEngine, KeeperError> {
    std::fs::create_dir_all(&config.storage.backups_dir)?;
    BackupEngine::from_config(
        config,
        Arc::new(FsArtifactStore::new(&config.storage.backups_dir)),
        Arc::new(CommandProducer::from_config(&config.producer)),
        Arc::new(SystemClock),
    )
}

/// Run one tier once. Returns the tier's overall status.
pub async fn run_tier(config: &KeeperConfig, tier: Tier) -> Result<RunStatus, KeeperError> {
    let engine = build_engine(config)?;
    let report = engine.run_tier(tier).await;
    print_report(&report, std::io::stdout().is_terminal());
    Ok(report.status())
}

/// Back up a single unit on demand, optionally into a tier.
pub async fn run_backup_unit(
    config: &KeeperConfig,
    unit: &str,
    tier: Option<Tier>,
) -> Result<(), KeeperError> {
    let engine = build_engine(config)?;
    let backup = engine.backup_unit(unit, tier).await?;
    for artifact in backup.staged.iter().chain(&backup.tiered) {
        println!("  {}/{}", artifact.namespace, artifact.file_name());
    }
    println!("{unit}: backed up");
    Ok(())
}

/// Retention-only pass.
pub async fn run_prune(config: &KeeperConfig, tier: Option<Tier>) -> Result<(), KeeperError> {
    let engine = build_engine(config)?;
    let pruned = engine.prune(tier).await?;
    for artifact in &pruned {
        println!("  deleted {}/{}", artifact.namespace, artifact.file_name());
    }
    println!("pruned {} artifact(s)", pruned.len());
    Ok(())
}

fn print_report(report: &TierReport, use_color: bool) {
    let result = &report.result;
    for unit in &result.succeeded {
        if use_color {
            use colored::Colorize;
            println!("  {} {unit}", "✓".green());
        } else {
            println!("  [OK] {unit}");
        }
    }
    for failure in &result.failed {
        if use_color {
            use colored::Colorize;
            println!("  {} {}: {}", "✗".red(), failure.unit, failure.error);
        } else {
            println!("  [FAIL] {}: {}", failure.unit, failure.error);
        }
    }
    println!(
        "{} backup {}: {} succeeded, {} failed, {} pruned",
        result.tier,
        report.status(),
        result.succeeded.len(),
        result.failed.len(),
        report.pruned.len()
    );
}
