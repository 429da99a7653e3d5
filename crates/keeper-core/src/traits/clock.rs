// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wall-clock source used for trigger windows and artifact timestamps.

use chrono::{Local, NaiveDateTime};

/// Supplies the current local wall-clock time.
///
/// Trigger windows are expressed in local hours, so the clock hands out
/// naive local timestamps rather than UTC instants.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The system's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
