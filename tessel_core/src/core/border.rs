// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

use kurbo::{Insets, Rect};
use peniko::Brush;

use crate::core::Canvas;

/// A panel decoration that reserves space around the panel's content and draws into it.
///
/// The insets are subtracted from the panel's bounds to produce its content rectangle,
/// and layouts add them back when reporting sizes.
pub trait Border {
    /// Space reserved on each side.
    fn insets(&self) -> Insets;

    /// Draw the border inside `rect`, which is the panel's full local bounds.
    fn draw(&self, canvas: &mut dyn Canvas, rect: Rect);
}

/// A border that only reserves space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EmptyBorder(pub Insets);

impl EmptyBorder {
    /// The same amount of space on every side.
    pub fn uniform(amount: f64) -> Self {
        Self(Insets::uniform(amount))
    }
}

impl Border for EmptyBorder {
    fn insets(&self) -> Insets {
        self.0
    }

    fn draw(&self, _canvas: &mut dyn Canvas, _rect: Rect) {}
}

/// A solid line drawn along the edges of the panel.
#[derive(Clone, Debug, PartialEq)]
pub struct LineBorder {
    /// Line thickness on each side.
    pub insets: Insets,
    /// The ink the line is filled with.
    pub ink: Brush,
}

impl LineBorder {
    /// A line of `width` on every side.
    pub fn new(ink: impl Into<Brush>, width: f64) -> Self {
        Self {
            insets: Insets::uniform(width),
            ink: ink.into(),
        }
    }
}

impl Border for LineBorder {
    fn insets(&self) -> Insets {
        self.insets
    }

    fn draw(&self, canvas: &mut dyn Canvas, rect: Rect) {
        let Insets { x0, y0, x1, y1 } = self.insets;
        let edges = [
            Rect::new(rect.x0, rect.y0, rect.x1, rect.y0 + y0),
            Rect::new(rect.x0, rect.y1 - y1, rect.x1, rect.y1),
            Rect::new(rect.x0, rect.y0 + y0, rect.x0 + x0, rect.y1 - y1),
            Rect::new(rect.x1 - x1, rect.y0 + y0, rect.x1, rect.y1 - y1),
        ];
        for edge in edges {
            if edge.width() > 0. && edge.height() > 0. {
                canvas.fill_rect(edge, &self.ink);
            }
        }
    }
}

/// Two borders nested inside each other.
pub struct CompoundBorder {
    outer: Box<dyn Border>,
    inner: Box<dyn Border>,
}

impl std::fmt::Debug for CompoundBorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompoundBorder")
            .field("outer", &self.outer.insets())
            .field("inner", &self.inner.insets())
            .finish()
    }
}

impl CompoundBorder {
    /// Draw `inner` inside the space left by `outer`.
    pub fn new(outer: impl Border + 'static, inner: impl Border + 'static) -> Self {
        Self {
            outer: Box::new(outer),
            inner: Box::new(inner),
        }
    }
}

impl Border for CompoundBorder {
    fn insets(&self) -> Insets {
        let outer = self.outer.insets();
        let inner = self.inner.insets();
        Insets::new(
            outer.x0 + inner.x0,
            outer.y0 + inner.y0,
            outer.x1 + inner.x1,
            outer.y1 + inner.y1,
        )
    }

    fn draw(&self, canvas: &mut dyn Canvas, rect: Rect) {
        self.outer.draw(canvas, rect);
        self.inner.draw(canvas, rect - self.outer.insets());
    }
}
