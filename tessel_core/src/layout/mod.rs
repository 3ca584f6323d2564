// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

//! Layout strategies.
//!
//! A [`Layout`] is installed on a panel with [`PanelTree::set_layout`] and is
//! responsible for that panel's direct children: it reports the sizes the
//! arrangement needs and assigns each child a frame.

mod flex;
mod sizes_cache;

use kurbo::Size;

use crate::core::{PanelId, PanelTree, Sizes};

pub use flex::{Alignment, FlexLayout, FlexLayoutData};

pub(crate) use sizes_cache::SizesCache;

/// A pluggable strategy that sizes and positions the children of a panel.
///
/// Implementations only keep scratch state for the duration of a single call;
/// repeated calls for the same tree and hint must give the same result.
pub trait Layout: 'static {
    /// The minimum, preferred and maximum size of `target` for `hint`.
    ///
    /// `hint` is in the target's local coordinates and includes its border insets;
    /// a zero axis means unconstrained.
    fn layout_sizes(&mut self, tree: &mut PanelTree, target: PanelId, hint: Size) -> Sizes;

    /// Assign frames to the children of `target`, using its current content rectangle.
    fn perform_layout(&mut self, tree: &mut PanelTree, target: PanelId);
}
