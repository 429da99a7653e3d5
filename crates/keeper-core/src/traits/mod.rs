// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! The engine only talks to the outside world through these seams. Async
//! traits use `#[async_trait]` for dynamic dispatch compatibility.

pub mod checkpoint;
pub mod clock;
pub mod producer;
pub mod store;

pub use checkpoint::StateCheckpoint;
pub use clock::{Clock, SystemClock};
pub use producer::{ArtifactProducer, ProduceRequest};
pub use store::ArtifactStore;
