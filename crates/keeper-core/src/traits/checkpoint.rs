// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Optional durable checkpoint for scheduler state.

use async_trait::async_trait;

use crate::error::KeeperError;
use crate::types::SchedulerState;

/// Persists [`SchedulerState`] between runner restarts.
///
/// Without a checkpoint the runner starts from "never run" for every tier.
#[async_trait]
pub trait StateCheckpoint: Send + Sync {
    /// Load the last saved state, or `None` if nothing was saved yet.
    async fn load(&self) -> Result<Option<SchedulerState>, KeeperError>;

    /// Write `state` through to durable storage.
    async fn save(&self, state: &SchedulerState) -> Result<(), KeeperError>;
}
