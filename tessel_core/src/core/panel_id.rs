// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::field::DisplayValue;

/// A unique identifier for a single panel.
///
/// Ids are allocated from a process-wide counter and never reused,
/// so a stale id can be safely tested for existence with
/// [`PanelTree::contains`](crate::core::PanelTree::contains).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PanelId(pub(crate) NonZeroU64);

impl PanelId {
    /// Allocate a new, unique `PanelId`.
    pub fn next() -> Self {
        static PANEL_ID_COUNTER: AtomicU64 = AtomicU64::new(1);
        let id = PANEL_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        // The counter starts at 1 and would need 2^64 allocations to wrap.
        Self(NonZeroU64::new(id).unwrap_or(NonZeroU64::MIN))
    }

    /// The raw value of this id.
    pub fn to_raw(self) -> u64 {
        self.0.get()
    }

    /// A serialized representation of the `PanelId` for debugging purposes.
    pub fn trace(self) -> DisplayValue<Self> {
        tracing::field::display(self)
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
