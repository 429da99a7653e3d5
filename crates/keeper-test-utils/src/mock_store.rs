// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory artifact store with failure injection.

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use keeper_core::{Artifact, ArtifactStore, KeeperError, Namespace, sort_newest_first};

#[derive(Default)]
struct Inner {
    files: BTreeSet<String>,
    artifacts: Vec<Artifact>,
    failing_deletes: HashSet<String>,
    failing_copies: HashSet<String>,
}

/// An artifact store held entirely in memory.
///
/// Cloning shares the underlying storage, so a test can keep a handle while
/// the engine owns another.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Place `artifact` in the store as if it had been written.
    pub fn insert(&self, artifact: Artifact) {
        let mut inner = self.lock();
        if inner.files.insert(key(&artifact)) {
            inner.artifacts.push(artifact);
        }
    }

    pub fn contains(&self, artifact: &Artifact) -> bool {
        self.lock().files.contains(&key(artifact))
    }

    /// Every artifact in `namespace`, newest first.
    pub fn snapshot(&self, namespace: Namespace) -> Vec<Artifact> {
        let mut artifacts: Vec<Artifact> = self
            .lock()
            .artifacts
            .iter()
            .filter(|a| a.namespace == namespace)
            .cloned()
            .collect();
        sort_newest_first(&mut artifacts);
        artifacts
    }

    pub fn len(&self) -> usize {
        self.lock().artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every delete of `artifact` fail with an I/O error.
    pub fn fail_delete(&self, artifact: &Artifact) {
        self.lock().failing_deletes.insert(key(artifact));
    }

    /// Make every copy whose destination is `artifact` fail.
    pub fn fail_copy_to(&self, artifact: &Artifact) {
        self.lock().failing_copies.insert(key(artifact));
    }
}

fn key(artifact: &Artifact) -> String {
    format!("{}/{}", artifact.namespace, artifact.file_name())
}

#[async_trait]
impl ArtifactStore for MemoryStore {
    fn path_for(&self, artifact: &Artifact) -> PathBuf {
        PathBuf::from("memory").join(key(artifact))
    }

    async fn list_namespace(&self, namespace: Namespace) -> Result<Vec<Artifact>, KeeperError> {
        Ok(self.snapshot(namespace))
    }

    async fn exists(&self, artifact: &Artifact) -> Result<bool, KeeperError> {
        Ok(self.contains(artifact))
    }

    async fn copy(&self, src: &Artifact, dst: &Artifact) -> Result<(), KeeperError> {
        {
            let inner = self.lock();
            if inner.failing_copies.contains(&key(dst)) {
                return Err(KeeperError::storage(std::io::Error::other(
                    "injected copy failure",
                )));
            }
            if !inner.files.contains(&key(src)) {
                return Err(KeeperError::storage(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("{} not found", src.file_name()),
                )));
            }
        }
        self.insert(dst.clone());
        Ok(())
    }

    async fn delete(&self, artifact: &Artifact) -> Result<(), KeeperError> {
        let mut inner = self.lock();
        let k = key(artifact);
        if inner.failing_deletes.contains(&k) {
            return Err(KeeperError::storage(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "injected delete failure",
            )));
        }
        if inner.files.remove(&k) {
            inner.artifacts.retain(|a| key(a) != k);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use keeper_core::{Category, Tier};

    #[tokio::test]
    async fn clones_share_storage() {
        let store = MemoryStore::new();
        let handle = store.clone();
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let artifact = Artifact::tiered("moodle", Tier::Daily, Category::Application, date);
        store.insert(artifact.clone());
        assert!(handle.exists(&artifact).await.unwrap());
        handle.delete(&artifact).await.unwrap();
        assert!(store.is_empty());
    }
}
