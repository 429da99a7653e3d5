// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The backup engine: one entry point per operation the CLI and runner expose.

use std::sync::Arc;

use keeper_config::KeeperConfig;
use keeper_core::{
    Artifact, ArtifactProducer, ArtifactStore, BackupUnit, Clock, KeeperError, Namespace, Tier,
};
use tracing::{info, warn};

use crate::orchestrator::{BackupOrchestrator, RunStatus, TierResult, UnitBackup};
use crate::retention::RetentionEnforcer;
use crate::schedule::Schedules;

/// Outcome of a full tier run: the unit partition plus what retention removed.
#[derive(Debug)]
pub struct TierReport {
    pub result: TierResult,
    pub pruned: Vec<Artifact>,
}

impl TierReport {
    pub fn status(&self) -> RunStatus {
        self.result.status()
    }
}

/// Binds the orchestrator, retention, schedules, and registered units.
pub struct BackupEngine {
    orchestrator: BackupOrchestrator,
    retention: RetentionEnforcer,
    schedules: Schedules,
    units: Vec<BackupUnit>,
    staging_keep: usize,
}

impl BackupEngine {
    pub fn new(
        orchestrator: BackupOrchestrator,
        schedules: Schedules,
        units: Vec<BackupUnit>,
        staging_keep: usize,
    ) -> Self {
        let retention = RetentionEnforcer::new(Arc::clone(orchestrator.store()));
        Self {
            orchestrator,
            retention,
            schedules,
            units,
            staging_keep,
        }
    }

    /// Build an engine from validated configuration and concrete collaborators.
    pub fn from_config(
        config: &KeeperConfig,
        store: Arc<dyn ArtifactStore>,
        producer: Arc<dyn ArtifactProducer>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, KeeperError> {
        if config.units.is_empty() {
            return Err(KeeperError::Config("no units configured".to_string()));
        }
        let units = config
            .units
            .iter()
            .map(|u| BackupUnit::new(u.name.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        let orchestrator =
            BackupOrchestrator::new(store, producer, clock, config.producer.start_dependencies);
        Ok(Self::new(
            orchestrator,
            Schedules::from_config(&config.tiers),
            units,
            config.storage.staging_keep,
        ))
    }

    pub fn schedules(&self) -> &Schedules {
        &self.schedules
    }

    pub fn units(&self) -> &[BackupUnit] {
        &self.units
    }

    /// Back up every unit into `tier`, then apply tier and staging retention.
    ///
    /// Retention problems are logged; they never change the tier's status.
    pub async fn run_tier(&self, tier: Tier) -> TierReport {
        info!(%tier, units = self.units.len(), "starting tier backup");
        let result = self.orchestrator.run_tier(tier, &self.units).await;

        let mut pruned = Vec::new();
        let keep = self.schedules.get(tier).retention;
        for unit in &self.units {
            for (namespace, keep) in [
                (Namespace::Tier(tier), keep),
                (Namespace::Staging, self.staging_keep),
            ] {
                match self
                    .retention
                    .enforce_unit(namespace, unit.name(), keep)
                    .await
                {
                    Ok(deleted) => pruned.extend(deleted),
                    Err(e) => {
                        warn!(%tier, %namespace, unit = unit.name(), error = %e, "retention pass failed")
                    }
                }
            }
        }

        let report = TierReport { result, pruned };
        let status = report.status();
        if status == RunStatus::Succeeded {
            info!(
                %tier,
                %status,
                succeeded = report.result.succeeded.len(),
                pruned = report.pruned.len(),
                "tier backup finished"
            );
        } else {
            warn!(
                %tier,
                %status,
                succeeded = report.result.succeeded.len(),
                failed = ?report.result.failed_units(),
                pruned = report.pruned.len(),
                "tier backup finished with failures"
            );
        }
        report
    }

    /// Back up a single registered unit on demand, then trim its staging area.
    pub async fn backup_unit(
        &self,
        name: &str,
        tier: Option<Tier>,
    ) -> Result<UnitBackup, KeeperError> {
        let unit = self
            .units
            .iter()
            .find(|u| u.name() == name)
            .ok_or_else(|| KeeperError::UnknownUnit(name.to_string()))?;

        let backup = self.orchestrator.backup_unit(unit, tier).await?;

        if let Some(tier) = tier {
            let keep = self.schedules.get(tier).retention;
            self.retention
                .enforce_unit(Namespace::Tier(tier), unit.name(), keep)
                .await?;
        }
        self.retention
            .enforce_unit(Namespace::Staging, unit.name(), self.staging_keep)
            .await?;
        Ok(backup)
    }

    /// Retention-only pass over one tier, or over every tier plus staging.
    pub async fn prune(&self, tier: Option<Tier>) -> Result<Vec<Artifact>, KeeperError> {
        let tiers = match tier {
            Some(tier) => vec![tier],
            None => Tier::ALL.to_vec(),
        };

        let mut pruned = Vec::new();
        for tier in tiers {
            let keep = self.schedules.get(tier).retention;
            for unit in &self.units {
                pruned.extend(
                    self.retention
                        .enforce_unit(Namespace::Tier(tier), unit.name(), keep)
                        .await?,
                );
            }
        }
        if tier.is_none() {
            for unit in &self.units {
                pruned.extend(
                    self.retention
                        .enforce_unit(Namespace::Staging, unit.name(), self.staging_keep)
                        .await?,
                );
            }
        }

        info!(pruned = pruned.len(), "retention pass finished");
        Ok(pruned)
    }
}
