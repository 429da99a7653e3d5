// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles for the Keeper backup engine.
//!
//! Provides an in-memory artifact store, a scriptable producer that writes
//! into it, a manually advanced clock, and an in-memory state checkpoint.

pub mod mock_checkpoint;
pub mod mock_clock;
pub mod mock_producer;
pub mod mock_store;

pub use mock_checkpoint::MemoryCheckpoint;
pub use mock_clock::ManualClock;
pub use mock_producer::MockProducer;
pub use mock_store::MemoryStore;
