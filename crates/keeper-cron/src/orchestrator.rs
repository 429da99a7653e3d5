// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backup orchestration: produce, verify, and copy into a tier.
//!
//! The orchestrator names both staging artifacts before the producer runs
//! and hands it the exact paths, so verification checks precisely the files
//! this run asked for. Units within a tier run sequentially in registration
//! order; a failing unit is recorded and the loop moves on.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use keeper_core::{
    Artifact, ArtifactProducer, ArtifactStore, BackupUnit, Category, Clock, KeeperError,
    ProduceRequest, Tier,
};
use serde::Serialize;
use strum::Display;
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

/// Per-unit async locks.
///
/// Operations on the same unit are serialized; distinct units never contend.
#[derive(Default)]
pub struct UnitLocks {
    locks: StdMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl UnitLocks {
    pub fn lock_for(&self, unit: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|p| p.into_inner());
        locks.entry(unit.to_string()).or_default().clone()
    }
}

/// Artifacts written by one successful unit backup.
#[derive(Debug, Clone)]
pub struct UnitBackup {
    pub unit: String,
    pub staged: Vec<Artifact>,
    pub tiered: Vec<Artifact>,
}

/// One unit that failed during a tier run.
#[derive(Debug)]
pub struct UnitFailure {
    pub unit: String,
    pub error: KeeperError,
}

/// Overall outcome of a tier run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[strum(serialize = "succeeded")]
    Succeeded,
    #[strum(serialize = "partial failure")]
    PartialFailure,
    #[strum(serialize = "failed")]
    Failed,
}

/// Partition of a tier's units into succeeded and failed, in run order.
#[derive(Debug)]
pub struct TierResult {
    pub tier: Tier,
    pub succeeded: Vec<String>,
    pub failed: Vec<UnitFailure>,
}

impl TierResult {
    pub fn new(tier: Tier) -> Self {
        Self {
            tier,
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn status(&self) -> RunStatus {
        match (self.succeeded.is_empty(), self.failed.is_empty()) {
            (_, true) => RunStatus::Succeeded,
            (false, false) => RunStatus::PartialFailure,
            (true, false) => RunStatus::Failed,
        }
    }

    pub fn failed_units(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.unit.as_str()).collect()
    }
}

/// Drives the producer and copies its output into tier namespaces.
pub struct BackupOrchestrator {
    store: Arc<dyn ArtifactStore>,
    producer: Arc<dyn ArtifactProducer>,
    clock: Arc<dyn Clock>,
    start_dependencies: bool,
    locks: UnitLocks,
}

impl BackupOrchestrator {
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        producer: Arc<dyn ArtifactProducer>,
        clock: Arc<dyn Clock>,
        start_dependencies: bool,
    ) -> Self {
        Self {
            store,
            producer,
            clock,
            start_dependencies,
            locks: UnitLocks::default(),
        }
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    /// Back up one unit into staging and, when `tier` is given, copy both
    /// artifacts into that tier under today's date.
    ///
    /// Succeeds only if every expected artifact exists afterwards. A copy
    /// that lands before a later step fails is left in place.
    #[instrument(skip(self, unit), fields(unit = %unit))]
    pub async fn backup_unit(
        &self,
        unit: &BackupUnit,
        tier: Option<Tier>,
    ) -> Result<UnitBackup, KeeperError> {
        let lock = self.locks.lock_for(unit.name());
        let _guard = lock.lock().await;

        let now = self.clock.now();
        let application = Artifact::staged(unit.name(), Category::Application, now);
        let database = Artifact::staged(unit.name(), Category::Database, now);
        let request = ProduceRequest {
            unit: unit.clone(),
            application_path: self.store.path_for(&application),
            database_path: self.store.path_for(&database),
            application,
            database,
            start_dependencies: self.start_dependencies,
        };

        // Same-second reruns reuse these names; a leftover file must not pass
        // verification in place of the producer's output.
        for stale in [&request.application, &request.database] {
            if self.store.exists(stale).await? {
                warn!(artifact = %stale.file_name(), "removing leftover staging artifact");
                self.store.delete(stale).await?;
            }
        }

        self.producer.produce(&request).await?;

        let staged = vec![request.application, request.database];
        for artifact in &staged {
            self.require(artifact).await?;
        }

        let mut tiered = Vec::new();
        if let Some(tier) = tier {
            for artifact in &staged {
                let copy = Artifact::tiered(unit.name(), tier, artifact.category, now.date());
                self.store.copy(artifact, &copy).await?;
                self.require(&copy).await?;
                tiered.push(copy);
            }
        }

        info!(staged = staged.len(), tiered = tiered.len(), "unit backed up");
        Ok(UnitBackup {
            unit: unit.name().to_string(),
            staged,
            tiered,
        })
    }

    async fn require(&self, artifact: &Artifact) -> Result<(), KeeperError> {
        if self.store.exists(artifact).await? {
            Ok(())
        } else {
            Err(KeeperError::MissingArtifact {
                unit: artifact.unit.clone(),
                category: artifact.category.to_string(),
                path: self.store.path_for(artifact).display().to_string(),
            })
        }
    }

    /// Back up every unit into `tier`, in order, without stopping on failure.
    pub async fn run_tier(&self, tier: Tier, units: &[BackupUnit]) -> TierResult {
        let mut result = TierResult::new(tier);
        for unit in units {
            match self.backup_unit(unit, Some(tier)).await {
                Ok(_) => result.succeeded.push(unit.name().to_string()),
                Err(e) => {
                    error!(%tier, unit = unit.name(), error = %e, "unit backup failed");
                    result.failed.push(UnitFailure {
                        unit: unit.name().to_string(),
                        error: e,
                    });
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use keeper_core::Namespace;
    use keeper_test_utils::{ManualClock, MemoryStore, MockProducer};

    fn units(names: &[&str]) -> Vec<BackupUnit> {
        names.iter().map(|n| BackupUnit::new(*n).unwrap()).collect()
    }

    fn setup() -> (MemoryStore, MockProducer, BackupOrchestrator) {
        let store = MemoryStore::new();
        let producer = MockProducer::new(store.clone());
        let clock = ManualClock::new(
            NaiveDate::from_ymd_opt(2026, 6, 10)
                .unwrap()
                .and_hms_opt(1, 0, 7)
                .unwrap(),
        );
        let orchestrator = BackupOrchestrator::new(
            Arc::new(store.clone()),
            Arc::new(producer.clone()),
            Arc::new(clock),
            true,
        );
        (store, producer, orchestrator)
    }

    #[tokio::test]
    async fn producer_receives_named_paths() {
        let (store, producer, orchestrator) = setup();
        let unit = BackupUnit::new("moodle").unwrap();

        let backup = orchestrator.backup_unit(&unit, None).await.unwrap();

        let calls = producer.calls().await;
        assert_eq!(calls.len(), 1);
        assert!(calls[0].start_dependencies);
        assert_eq!(
            calls[0].application.file_name(),
            "moodle_backup_20260610_010007.tar.gz"
        );
        assert_eq!(calls[0].database_path, store.path_for(&calls[0].database));
        assert!(backup.tiered.is_empty());
        assert_eq!(store.snapshot(Namespace::Staging).len(), 2);
    }

    #[tokio::test]
    async fn tier_copies_keep_staging_and_use_todays_date() {
        let (store, _producer, orchestrator) = setup();
        let unit = BackupUnit::new("rosario").unwrap();

        let backup = orchestrator
            .backup_unit(&unit, Some(Tier::Monthly))
            .await
            .unwrap();

        let names: Vec<String> = backup.tiered.iter().map(|a| a.file_name()).collect();
        assert_eq!(
            names,
            vec![
                "rosario_monthly_application_20260610.tar.gz",
                "rosario_monthly_database_20260610.tar.gz",
            ]
        );
        assert_eq!(store.snapshot(Namespace::Staging).len(), 2);
    }

    #[tokio::test]
    async fn missing_artifact_after_success_fails_the_unit() {
        let (store, producer, orchestrator) = setup();
        producer.omit_category("moodle", Category::Database).await;
        let unit = BackupUnit::new("moodle").unwrap();

        let err = orchestrator
            .backup_unit(&unit, Some(Tier::Daily))
            .await
            .unwrap_err();

        match err {
            KeeperError::MissingArtifact { unit, category, .. } => {
                assert_eq!(unit, "moodle");
                assert_eq!(category, "database");
            }
            other => panic!("expected MissingArtifact, got {other:?}"),
        }
        assert!(store.snapshot(Namespace::Tier(Tier::Daily)).is_empty());
    }

    #[tokio::test]
    async fn leftover_staging_file_does_not_stand_in_for_producer_output() {
        let (store, producer, orchestrator) = setup();
        let unit = BackupUnit::new("moodle").unwrap();
        orchestrator.backup_unit(&unit, None).await.unwrap();

        // Second run within the same second; the producer writes no database dump.
        producer.omit_category("moodle", Category::Database).await;
        let err = orchestrator
            .backup_unit(&unit, Some(Tier::Daily))
            .await
            .unwrap_err();

        assert!(matches!(err, KeeperError::MissingArtifact { .. }));
        assert!(store.snapshot(Namespace::Tier(Tier::Daily)).is_empty());
        let staging = store.snapshot(Namespace::Staging);
        assert_eq!(staging.len(), 1);
        assert_eq!(staging[0].category, Category::Application);
    }

    #[tokio::test]
    async fn partial_copy_is_not_rolled_back() {
        let (store, _producer, orchestrator) = setup();
        let date = NaiveDate::from_ymd_opt(2026, 6, 10).unwrap();
        store.fail_copy_to(&Artifact::tiered("opensis", Tier::Daily, Category::Database, date));
        let unit = BackupUnit::new("opensis").unwrap();

        assert!(orchestrator.backup_unit(&unit, Some(Tier::Daily)).await.is_err());
        let daily = store.snapshot(Namespace::Tier(Tier::Daily));
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].category, Category::Application);
    }

    #[tokio::test]
    async fn failing_unit_does_not_stop_the_tier() {
        let (store, producer, orchestrator) = setup();
        producer.fail_unit("rosario").await;

        let result = orchestrator
            .run_tier(Tier::Daily, &units(&["moodle", "rosario", "opensis"]))
            .await;

        assert_eq!(result.succeeded, vec!["moodle", "opensis"]);
        assert_eq!(result.failed_units(), vec!["rosario"]);
        assert!(matches!(result.failed[0].error, KeeperError::Producer { .. }));
        assert_eq!(result.status(), RunStatus::PartialFailure);
        assert_eq!(
            producer.called_units().await,
            vec!["moodle", "rosario", "opensis"]
        );
        assert_eq!(store.snapshot(Namespace::Tier(Tier::Daily)).len(), 4);
    }

    #[test]
    fn status_reflects_partition() {
        let mut result = TierResult::new(Tier::Weekly);
        assert_eq!(result.status(), RunStatus::Succeeded);
        result.failed.push(UnitFailure {
            unit: "moodle".into(),
            error: KeeperError::Internal("boom".into()),
        });
        assert_eq!(result.status(), RunStatus::Failed);
        result.succeeded.push("rosario".into());
        assert_eq!(result.status(), RunStatus::PartialFailure);
        assert_eq!(RunStatus::PartialFailure.to_string(), "partial failure");
    }

    #[tokio::test]
    async fn same_unit_operations_share_one_lock() {
        let locks = UnitLocks::default();
        let a = locks.lock_for("moodle");
        let b = locks.lock_for("moodle");
        let other = locks.lock_for("rosario");
        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &other));

        let _held = a.lock().await;
        assert!(b.try_lock().is_err());
        assert!(other.try_lock().is_ok());
    }
}
