// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

use tessel_core::core::{FontDescriptor, FontMetrics, TextExtents};

/// [`FontMetrics`] estimated from the font size alone.
///
/// Good enough to lay out Latin text before a real shaper is plugged in:
/// every character advances by `advance` times the font size.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EstimatedMetrics {
    /// Average advance, as a fraction of the font size.
    pub advance: f64,
    /// Line height, as a fraction of the font size.
    pub line_height: f64,
    /// Ascent, as a fraction of the font size.
    pub ascent: f64,
}

impl Default for EstimatedMetrics {
    fn default() -> Self {
        Self {
            advance: 0.55,
            line_height: 1.25,
            ascent: 0.95,
        }
    }
}

impl FontMetrics for EstimatedMetrics {
    fn measure(&self, text: &str, font: &FontDescriptor) -> TextExtents {
        let chars = text.chars().filter(|c| !c.is_control()).count();
        TextExtents {
            width: (chars as f64 * self.advance * font.size).round(),
            line_height: (self.line_height * font.size).round(),
            baseline: (self.ascent * font.size).round(),
        }
    }
}
