// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tessel_core::app::Clock;
use tessel_core::core::{FontDescriptor, FontMetrics, TextExtents};

/// Font metrics where every character has the same advance.
///
/// Makes text sizes predictable: `"abc"` is three times as wide as `"a"`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedMetrics {
    /// Advance of every character.
    pub char_width: f64,
    /// Height of one line.
    pub line_height: f64,
    /// Distance from the top of a line to its baseline.
    pub baseline: f64,
}

impl Default for FixedMetrics {
    fn default() -> Self {
        Self {
            char_width: 8.,
            line_height: 16.,
            baseline: 12.,
        }
    }
}

impl FontMetrics for FixedMetrics {
    fn measure(&self, text: &str, _font: &FontDescriptor) -> TextExtents {
        TextExtents {
            width: text.chars().count() as f64 * self.char_width,
            line_height: self.line_height,
            baseline: self.baseline,
        }
    }
}

/// A [`Clock`] that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    /// A clock stopped at the current instant.
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    /// A shareable clock, ready to be passed to [`AppOptions`](tessel_core::app::AppOptions).
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Move the clock forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) += duration;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
