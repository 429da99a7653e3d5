// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concrete collaborators for the Keeper backup engine.
//!
//! Provides the filesystem-backed artifact store, the external command
//! producer, and the JSON scheduler-state checkpoint.

pub mod checkpoint;
pub mod fs_store;
pub mod producer;

pub use checkpoint::FileCheckpoint;
pub use fs_store::FsArtifactStore;
pub use producer::CommandProducer;
