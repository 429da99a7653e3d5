// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Long-running scheduler loop.
//!
//! Each poll reads the clock once, evaluates daily, weekly and monthly in
//! that order, runs every due tier to completion, and records the poll time
//! as that tier's last run. Cancellation is observed only between polls, so
//! a tier in progress always finishes.

use std::sync::Arc;
use std::time::Duration;

use keeper_core::{Clock, SchedulerState, StateCheckpoint, Tier};
use serde::Serialize;
use strum::Display;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::{BackupEngine, TierReport};

/// Default delay between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RunnerState {
    Running,
    Stopped,
}

/// Polls the schedules and runs due tiers through the engine.
pub struct SchedulerRunner {
    engine: Arc<BackupEngine>,
    clock: Arc<dyn Clock>,
    poll_interval: Duration,
    checkpoint: Option<Arc<dyn StateCheckpoint>>,
    state: SchedulerState,
    runner_state: RunnerState,
}

impl SchedulerRunner {
    pub fn new(engine: Arc<BackupEngine>, clock: Arc<dyn Clock>, poll_interval: Duration) -> Self {
        Self {
            engine,
            clock,
            poll_interval,
            checkpoint: None,
            state: SchedulerState::new(),
            runner_state: RunnerState::Stopped,
        }
    }

    /// Persist last-run timestamps through `checkpoint` after every tier run.
    pub fn with_checkpoint(mut self, checkpoint: Arc<dyn StateCheckpoint>) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    pub fn state(&self) -> &SchedulerState {
        &self.state
    }

    pub fn runner_state(&self) -> RunnerState {
        self.runner_state
    }

    /// Replace in-memory state with the checkpoint's, if one is configured.
    ///
    /// An unreadable checkpoint is logged and the runner starts fresh.
    pub async fn restore(&mut self) {
        let Some(checkpoint) = &self.checkpoint else {
            return;
        };
        match checkpoint.load().await {
            Ok(Some(state)) => {
                for tier in Tier::ALL.into_iter().filter(|t| state.has_run(*t)) {
                    info!(%tier, last_run = %state.last_run(tier), "restored last run");
                }
                self.state = state;
            }
            Ok(None) => debug!("no scheduler checkpoint yet"),
            Err(e) => warn!(error = %e, "failed to load scheduler checkpoint, starting fresh"),
        }
    }

    /// Evaluate every tier once and run those that are due.
    pub async fn poll_once(&mut self) -> Vec<TierReport> {
        let now = self.clock.now();
        let mut reports = Vec::new();

        for tier in Tier::ALL {
            let last_run = self.state.last_run(tier);
            if !self.engine.schedules().is_due(tier, now, last_run) {
                continue;
            }

            info!(%tier, %now, "tier is due");
            reports.push(self.engine.run_tier(tier).await);
            self.state.record(tier, now);

            if let Some(checkpoint) = &self.checkpoint
                && let Err(e) = checkpoint.save(&self.state).await
            {
                warn!(%tier, error = %e, "failed to write scheduler checkpoint");
            }
        }
        reports
    }

    /// Run until `cancel` fires.
    pub async fn run(&mut self, cancel: CancellationToken) {
        self.restore().await;
        self.runner_state = RunnerState::Running;
        info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            units = self.engine.units().len(),
            "scheduler started"
        );

        while !cancel.is_cancelled() {
            self.poll_once().await;

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = cancel.cancelled() => {}
            }
        }

        self.runner_state = RunnerState::Stopped;
        info!("scheduler stopped");
    }
}
