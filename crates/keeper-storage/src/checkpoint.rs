// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON file checkpoint for scheduler state.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use keeper_core::{KeeperError, SchedulerState, StateCheckpoint};

/// Stores [`SchedulerState`] as a JSON document.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash mid-write leaves the previous checkpoint intact.
#[derive(Debug, Clone)]
pub struct FileCheckpoint {
    path: PathBuf,
}

impl FileCheckpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StateCheckpoint for FileCheckpoint {
    async fn load(&self) -> Result<Option<SchedulerState>, KeeperError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(KeeperError::storage(e)),
        };
        let state = serde_json::from_slice(&bytes).map_err(KeeperError::storage)?;
        Ok(Some(state))
    }

    async fn save(&self, state: &SchedulerState) -> Result<(), KeeperError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(state).map_err(KeeperError::storage)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use keeper_core::Tier;

    #[tokio::test]
    async fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = FileCheckpoint::new(dir.path().join("state.json"));
        assert!(checkpoint.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_then_load_restores_last_runs() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = FileCheckpoint::new(dir.path().join("nested").join("state.json"));
        let at = NaiveDate::from_ymd_opt(2026, 4, 5)
            .unwrap()
            .and_hms_opt(2, 0, 0)
            .unwrap();
        let mut state = SchedulerState::new();
        state.record(Tier::Weekly, at);

        checkpoint.save(&state).await.unwrap();
        let loaded = checkpoint.load().await.unwrap().expect("state saved");
        assert_eq!(loaded.last_run(Tier::Weekly), at);
        assert!(!loaded.has_run(Tier::Daily));
        assert!(!dir.path().join("nested").join("state.json.tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_checkpoint_is_a_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();
        let checkpoint = FileCheckpoint::new(path);
        assert!(matches!(
            checkpoint.load().await,
            Err(KeeperError::Storage { .. })
        ));
    }
}
