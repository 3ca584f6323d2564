// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

use kurbo::{Affine, BezPath, Point, Rect, Shape, Vec2};
use peniko::Brush;
use smallvec::SmallVec;
use tessel_core::core::{Canvas, FontDescriptor};

/// A drawing operation, with geometry converted to window coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    /// The bounding box of a filled path.
    Fill {
        /// Bounds of the path.
        rect: Rect,
        /// The ink used.
        ink: Brush,
    },
    /// The bounding box of a stroked path.
    Stroke {
        /// Bounds of the path.
        rect: Rect,
        /// Line width before scaling.
        width: f64,
        /// The ink used.
        ink: Brush,
    },
    /// A run of text.
    Text {
        /// The text drawn.
        text: String,
        /// Start of the baseline.
        baseline: Point,
    },
    /// A clip was applied.
    Clip(Rect),
}

/// A [`Canvas`] that records what's drawn instead of rasterizing it.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    ops: Vec<DrawOp>,
    transform: Affine,
    stack: SmallVec<[Affine; 16]>,
}

impl RecordingCanvas {
    /// An empty recording.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation, in order.
    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// The bounds of every fill, in order.
    pub fn fills(&self) -> Vec<Rect> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Fill { rect, .. } => Some(*rect),
                _ => None,
            })
            .collect()
    }

    /// Every text run drawn, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// `true` if every [`save`](Canvas::save) was matched by a [`restore`](Canvas::restore).
    pub fn is_balanced(&self) -> bool {
        self.stack.is_empty()
    }
}

impl Canvas for RecordingCanvas {
    fn save(&mut self) {
        self.stack.push(self.transform);
    }

    fn restore(&mut self) {
        match self.stack.pop() {
            Some(transform) => self.transform = transform,
            None => panic!("restore without matching save"),
        }
    }

    fn clip_rect(&mut self, rect: Rect) {
        self.ops.push(DrawOp::Clip(self.transform.transform_rect_bbox(rect)));
    }

    fn translate(&mut self, offset: Vec2) {
        self.transform *= Affine::translate(offset);
    }

    fn scale(&mut self, scale: f64) {
        self.transform *= Affine::scale(scale);
    }

    fn fill_path(&mut self, path: &BezPath, ink: &Brush) {
        let rect = self.transform.transform_rect_bbox(path.bounding_box());
        self.ops.push(DrawOp::Fill {
            rect,
            ink: ink.clone(),
        });
    }

    fn stroke_path(&mut self, path: &BezPath, width: f64, ink: &Brush) {
        let rect = self.transform.transform_rect_bbox(path.bounding_box());
        self.ops.push(DrawOp::Stroke {
            rect,
            width,
            ink: ink.clone(),
        });
    }

    fn draw_text(&mut self, text: &str, _font: &FontDescriptor, baseline: Point, _ink: &Brush) {
        self.ops.push(DrawOp::Text {
            text: text.to_string(),
            baseline: self.transform * baseline,
        });
    }
}

#[cfg(test)]
mod tests {
    use peniko::color::palette;

    use super::*;

    #[test]
    fn fills_are_recorded_in_window_coordinates() {
        let mut canvas = RecordingCanvas::new();
        let ink = Brush::from(palette::css::RED);
        canvas.save();
        canvas.translate(Vec2::new(10., 20.));
        canvas.scale(2.);
        canvas.fill_rect(Rect::new(0., 0., 5., 5.), &ink);
        canvas.restore();
        canvas.fill_rect(Rect::new(0., 0., 1., 1.), &ink);

        assert_eq!(
            canvas.fills(),
            vec![Rect::new(10., 20., 20., 30.), Rect::new(0., 0., 1., 1.)]
        );
        assert!(canvas.is_balanced());
    }
}
