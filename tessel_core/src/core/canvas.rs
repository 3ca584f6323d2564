// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

use kurbo::{Affine, BezPath, Join, Point, Rect, Shape, Stroke, Vec2};
use peniko::{Brush, Fill, FontData};
use vello::Scene;

use crate::core::FontDescriptor;

/// The drawing surface panels paint onto.
///
/// This is the rendering collaborator: the panel tree only ever saves and restores
/// state, clips, transforms, and asks for filled or stroked shapes and text runs.
/// [`SceneCanvas`] implements it on top of Vello; tests use a recording canvas.
pub trait Canvas {
    /// Push a copy of the current transform and clip.
    fn save(&mut self);
    /// Pop the state pushed by the matching [`save`](Self::save).
    fn restore(&mut self);
    /// Intersect the clip with `rect`, in current coordinates.
    fn clip_rect(&mut self, rect: Rect);
    /// Move the origin by `offset`.
    fn translate(&mut self, offset: Vec2);
    /// Scale the coordinate system uniformly.
    fn scale(&mut self, scale: f64);
    /// Fill `path` with `ink`.
    fn fill_path(&mut self, path: &BezPath, ink: &Brush);
    /// Stroke `path` with a line of `width` using `ink`.
    fn stroke_path(&mut self, path: &BezPath, width: f64, ink: &Brush);
    /// Draw `text` in `font` with its baseline starting at `baseline`.
    fn draw_text(&mut self, text: &str, font: &FontDescriptor, baseline: Point, ink: &Brush);

    /// Fill `rect` with `ink`.
    fn fill_rect(&mut self, rect: Rect, ink: &Brush) {
        self.fill_path(&rect.to_path(0.1), ink);
    }

    /// Stroke the outline of `rect` with a line of `width` using `ink`.
    fn stroke_rect(&mut self, rect: Rect, width: f64, ink: &Brush) {
        self.stroke_path(&rect.to_path(0.1), width, ink);
    }
}

/// A run of positioned glyphs ready to be drawn.
#[derive(Clone, Debug)]
pub struct GlyphRun {
    /// The font the glyph ids refer to.
    pub font: FontData,
    /// Font size in logical pixels.
    pub font_size: f32,
    /// Glyphs, positioned relative to the start of the baseline.
    pub glyphs: Vec<vello::Glyph>,
}

/// Shapes text into glyph runs for [`SceneCanvas`].
///
/// Shaping belongs to the font collaborator, so the canvas only knows how to
/// ask for it.
pub trait TextShaper {
    /// Shape `text` in `font`, or `None` if no suitable font is available.
    fn shape(&self, text: &str, font: &FontDescriptor) -> Option<GlyphRun>;
}

#[derive(Clone, Copy, Debug)]
struct CanvasState {
    transform: Affine,
    layers: usize,
}

/// A [`Canvas`] that records into a Vello [`Scene`].
///
/// Clips become clip layers; text needs a [`TextShaper`] and is skipped otherwise.
pub struct SceneCanvas<'a> {
    scene: &'a mut Scene,
    shaper: Option<&'a dyn TextShaper>,
    current: CanvasState,
    stack: Vec<CanvasState>,
}

impl std::fmt::Debug for SceneCanvas<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneCanvas")
            .field("has_shaper", &self.shaper.is_some())
            .field("current", &self.current)
            .field("depth", &self.stack.len())
            .finish_non_exhaustive()
    }
}

impl<'a> SceneCanvas<'a> {
    /// Draw into `scene`, starting from an identity transform.
    pub fn new(scene: &'a mut Scene) -> Self {
        Self {
            scene,
            shaper: None,
            current: CanvasState {
                transform: Affine::IDENTITY,
                layers: 0,
            },
            stack: Vec::new(),
        }
    }

    /// Builder-style method to start from a base transform, e.g. the window scale factor.
    pub fn with_transform(mut self, transform: Affine) -> Self {
        self.current.transform = transform;
        self
    }

    /// Builder-style method for setting the text shaper.
    pub fn with_shaper(mut self, shaper: &'a dyn TextShaper) -> Self {
        self.shaper = Some(shaper);
        self
    }

    fn pop_layers(&mut self, count: usize) {
        for _ in 0..count {
            self.scene.pop_layer();
        }
    }
}

impl Drop for SceneCanvas<'_> {
    fn drop(&mut self) {
        // Unbalanced saves would otherwise leave clip layers open in the scene.
        let mut open = self.current.layers;
        for state in &self.stack {
            open += state.layers;
        }
        self.pop_layers(open);
    }
}

impl Canvas for SceneCanvas<'_> {
    fn save(&mut self) {
        self.stack.push(self.current);
        self.current.layers = 0;
    }

    fn restore(&mut self) {
        let Some(previous) = self.stack.pop() else {
            debug_panic!("SceneCanvas::restore called without a matching save");
            return;
        };
        self.pop_layers(self.current.layers);
        self.current = previous;
    }

    fn clip_rect(&mut self, rect: Rect) {
        self.scene
            .push_clip_layer(Fill::NonZero, self.current.transform, &rect);
        self.current.layers += 1;
    }

    fn translate(&mut self, offset: Vec2) {
        self.current.transform *= Affine::translate(offset);
    }

    fn scale(&mut self, scale: f64) {
        self.current.transform *= Affine::scale(scale);
    }

    fn fill_path(&mut self, path: &BezPath, ink: &Brush) {
        self.scene
            .fill(Fill::NonZero, self.current.transform, ink, None, path);
    }

    fn stroke_path(&mut self, path: &BezPath, width: f64, ink: &Brush) {
        // Using Join::Miter avoids rounding corners of wide borders.
        let style = Stroke {
            width,
            join: Join::Miter,
            ..Default::default()
        };
        self.scene
            .stroke(&style, self.current.transform, ink, None, path);
    }

    fn draw_text(&mut self, text: &str, font: &FontDescriptor, baseline: Point, ink: &Brush) {
        let Some(shaper) = self.shaper else {
            tracing::trace!("No text shaper installed, skipping text run");
            return;
        };
        let Some(run) = shaper.shape(text, font) else {
            tracing::debug!(family = %font.family, "No font available for text run");
            return;
        };
        self.scene
            .draw_glyphs(&run.font)
            .font_size(run.font_size)
            .transform(self.current.transform * Affine::translate(baseline.to_vec2()))
            .brush(ink)
            .draw(Fill::NonZero, run.glyphs.into_iter());
    }
}
