// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory scheduler state checkpoint.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use keeper_core::{KeeperError, SchedulerState, StateCheckpoint};

/// A checkpoint kept in memory, shared between clones.
#[derive(Clone, Default)]
pub struct MemoryCheckpoint {
    state: Arc<Mutex<Option<SchedulerState>>>,
    saves: Arc<Mutex<usize>>,
}

impl MemoryCheckpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: SchedulerState) -> Self {
        let checkpoint = Self::default();
        *checkpoint.state.lock().unwrap_or_else(|p| p.into_inner()) = Some(state);
        checkpoint
    }

    pub fn stored(&self) -> Option<SchedulerState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[async_trait]
impl StateCheckpoint for MemoryCheckpoint {
    async fn load(&self) -> Result<Option<SchedulerState>, KeeperError> {
        Ok(self.stored())
    }

    async fn save(&self, state: &SchedulerState) -> Result<(), KeeperError> {
        *self.state.lock().unwrap_or_else(|p| p.into_inner()) = Some(state.clone());
        *self.saves.lock().unwrap_or_else(|p| p.into_inner()) += 1;
        Ok(())
    }
}
