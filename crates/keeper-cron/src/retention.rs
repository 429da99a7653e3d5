// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Count-based retention over one namespace, unit, and category.
//!
//! Keeps the newest `keep` artifacts by name-derived timestamp and deletes
//! the rest without confirmation. A failed delete is logged and skipped so
//! one stuck file never blocks pruning of the others.

use std::sync::Arc;

use keeper_core::{Artifact, ArtifactStore, Category, KeeperError, Namespace};
use tracing::{debug, info, warn};

/// Staging artifacts kept per unit and category unless configured otherwise.
pub const STAGING_KEEP: usize = 2;

/// Applies keep-N retention through an [`ArtifactStore`].
#[derive(Clone)]
pub struct RetentionEnforcer {
    store: Arc<dyn ArtifactStore>,
}

impl RetentionEnforcer {
    pub fn new(store: Arc<dyn ArtifactStore>) -> Self {
        Self { store }
    }

    /// Trim `namespace` down to the newest `keep` artifacts of `unit` and `category`.
    ///
    /// Returns the artifacts actually deleted. Only a failure to list the
    /// namespace is an error; individual delete failures are logged at WARN.
    pub async fn enforce(
        &self,
        namespace: Namespace,
        unit: &str,
        category: Category,
        keep: usize,
    ) -> Result<Vec<Artifact>, KeeperError> {
        let artifacts = self.store.list(namespace, unit, category).await?;
        if artifacts.len() <= keep {
            debug!(%namespace, unit, %category, count = artifacts.len(), keep, "nothing to prune");
            return Ok(Vec::new());
        }

        let mut deleted = Vec::new();
        for artifact in artifacts.into_iter().skip(keep) {
            match self.store.delete(&artifact).await {
                Ok(()) => {
                    info!(%namespace, artifact = %artifact.file_name(), "pruned artifact");
                    deleted.push(artifact);
                }
                Err(e) => {
                    let err = KeeperError::Retention {
                        artifact: artifact.file_name(),
                        source: Box::new(e),
                    };
                    warn!(%namespace, unit, error = %err, "retention delete failed, continuing");
                }
            }
        }
        Ok(deleted)
    }

    /// Apply [`enforce`](Self::enforce) to both categories of `unit`.
    pub async fn enforce_unit(
        &self,
        namespace: Namespace,
        unit: &str,
        keep: usize,
    ) -> Result<Vec<Artifact>, KeeperError> {
        let mut deleted = Vec::new();
        for category in Category::ALL {
            deleted.extend(self.enforce(namespace, unit, category, keep).await?);
        }
        Ok(deleted)
    }
}
