// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tier scheduling, backup orchestration, and retention for Keeper.
//!
//! [`BackupEngine`] is the entry point for one-shot operations (run a tier,
//! back up a unit, prune); [`SchedulerRunner`] wraps it in a polling loop
//! driven by the tier [`Schedules`].

pub mod engine;
pub mod orchestrator;
pub mod retention;
pub mod runner;
pub mod schedule;

pub use engine::{BackupEngine, TierReport};
pub use orchestrator::{
    BackupOrchestrator, RunStatus, TierResult, UnitBackup, UnitFailure, UnitLocks,
};
pub use retention::{RetentionEnforcer, STAGING_KEEP};
pub use runner::{DEFAULT_POLL_INTERVAL, RunnerState, SchedulerRunner};
pub use schedule::{DayConstraint, Schedules, TierSchedule};
