// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

use hashbrown::HashMap;
use kurbo::Size;

use crate::core::{PanelId, PanelTree, Sizes};

/// The inputs that change a [`PanelTree::sizes`] result within one layout pass.
///
/// The hint is keyed by its bit pattern; we don't expect `NaN`s here,
/// and even if there are, the cache only lives for one pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct SizesInputs {
    id: PanelId,
    width: u64,
    height: u64,
}

impl SizesInputs {
    fn new(id: PanelId, hint: Size) -> Self {
        Self {
            id,
            width: hint.width.to_bits(),
            height: hint.height.to_bits(),
        }
    }
}

/// Contains a mapping of (child, hint) pairs to sizes.
///
/// Cleared at the start of every layout call, so that the minimum and preferred
/// passes share child measurements without leaking state between calls.
#[derive(Clone, Debug, Default)]
pub(crate) struct SizesCache {
    entries: HashMap<SizesInputs, Sizes>,
}

impl SizesCache {
    /// Creates a new, empty cache.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The sizes of `id` for `hint`, asking the tree on a miss.
    pub(crate) fn sizes(&mut self, tree: &mut PanelTree, id: PanelId, hint: Size) -> Sizes {
        let inputs = SizesInputs::new(id, hint);
        if let Some(sizes) = self.entries.get(&inputs) {
            return *sizes;
        }
        let sizes = tree.sizes(id, hint);
        self.entries.insert(inputs, sizes);
        sizes
    }

    /// Clears the cache.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}
