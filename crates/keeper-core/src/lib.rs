// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Keeper backup engine.
//!
//! This crate provides the error type, domain types, and collaborator traits
//! shared by the scheduler, the storage backends, and the CLI. Concrete
//! collaborators (filesystem store, command producer) implement the traits
//! defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::KeeperError;
pub use types::{
    Artifact, BackupUnit, Category, Namespace, SchedulerState, Tier, never_run,
    sort_newest_first, validate_unit_name,
};

pub use traits::{
    ArtifactProducer, ArtifactStore, Clock, ProduceRequest, StateCheckpoint, SystemClock,
};
