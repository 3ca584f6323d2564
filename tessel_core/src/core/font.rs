// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

/// Describes the font a piece of text should be measured and drawn with.
#[derive(Clone, Debug, PartialEq)]
pub struct FontDescriptor {
    /// Family name, e.g. `"sans-serif"`.
    pub family: Arc<str>,
    /// Size in logical pixels.
    pub size: f64,
}

impl FontDescriptor {
    /// A font of `family` at `size`.
    pub fn new(family: impl Into<Arc<str>>, size: f64) -> Self {
        Self {
            family: family.into(),
            size,
        }
    }
}

impl Default for FontDescriptor {
    fn default() -> Self {
        Self::new("sans-serif", 13.)
    }
}

/// Extents of a single line of text.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextExtents {
    /// Advance width of the run.
    pub width: f64,
    /// Height of one line, including leading.
    pub line_height: f64,
    /// Distance from the top of the line to the baseline.
    pub baseline: f64,
}

/// The font collaborator used by sizers.
///
/// Every `Sizes()` call that involves text bottoms out here.
pub trait FontMetrics {
    /// Measure `text` as a single unwrapped line.
    fn measure(&self, text: &str, font: &FontDescriptor) -> TextExtents;
}
