// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Artifact producer trait: the external collaborator that actually backs up a unit.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::KeeperError;
use crate::types::{Artifact, BackupUnit};

/// Everything a producer needs to back up one unit into staging.
///
/// The caller names both artifacts before invoking the producer, so the
/// produced files are attributed directly instead of guessed afterwards.
#[derive(Debug, Clone)]
pub struct ProduceRequest {
    pub unit: BackupUnit,
    pub application: Artifact,
    pub application_path: PathBuf,
    pub database: Artifact,
    pub database_path: PathBuf,
    /// Start the unit's runtime dependencies (e.g. its database) if they are down.
    pub start_dependencies: bool,
}

/// Backs up a unit's application data and database into the staging area.
#[async_trait]
pub trait ArtifactProducer: Send + Sync {
    /// Produce both artifacts named in `request`.
    ///
    /// Returns [`KeeperError::Producer`] when the producer fails. Waiting is
    /// unbounded; a hung producer blocks the caller.
    async fn produce(&self, request: &ProduceRequest) -> Result<(), KeeperError>;
}
