// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

use std::fmt::Debug;
use std::time::Instant;

/// The time source used to schedule delayed tasks.
///
/// Tests substitute a manually advanced clock.
pub trait Clock: Send + Sync + Debug {
    /// The current instant.
    fn now(&self) -> Instant;
}

/// The system's monotonic clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
