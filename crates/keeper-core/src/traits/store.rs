// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Artifact store trait for the filesystem-like backup area.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::KeeperError;
use crate::types::{Artifact, Category, Namespace};

/// Storage for backup artifacts, organised by namespace.
///
/// Implementations only reason about artifact names; payload bytes are opaque.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Location a producer should write `artifact` to.
    fn path_for(&self, artifact: &Artifact) -> PathBuf;

    /// All artifacts in `namespace`, newest first. Unparseable names are skipped.
    async fn list_namespace(&self, namespace: Namespace) -> Result<Vec<Artifact>, KeeperError>;

    /// Artifacts of one unit and category in `namespace`, newest first.
    async fn list(
        &self,
        namespace: Namespace,
        unit: &str,
        category: Category,
    ) -> Result<Vec<Artifact>, KeeperError> {
        let mut artifacts = self.list_namespace(namespace).await?;
        artifacts.retain(|a| a.unit == unit && a.category == category);
        Ok(artifacts)
    }

    async fn exists(&self, artifact: &Artifact) -> Result<bool, KeeperError>;

    /// Duplicate `src` as `dst`, overwriting an existing `dst`.
    async fn copy(&self, src: &Artifact, dst: &Artifact) -> Result<(), KeeperError>;

    /// Remove `artifact`. Deleting an already-missing artifact succeeds.
    async fn delete(&self, artifact: &Artifact) -> Result<(), KeeperError>;
}
