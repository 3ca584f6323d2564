// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

//! A widget displaying non-editable text.

use std::cell::RefCell;
use std::rc::Rc;

use kurbo::{Point, Rect, Size};
use peniko::Brush;
use peniko::color::palette;

use crate::core::{
    Canvas, DrawCtx, FontDescriptor, FontMetrics, PanelId, PanelTree, Sizes, Widget, max_size,
};

struct LabelText {
    text: String,
    font: FontDescriptor,
    ink: Brush,
    metrics: Rc<dyn FontMetrics>,
}

impl LabelText {
    fn width_of(&self, text: &str) -> f64 {
        self.metrics.measure(text, &self.font).width
    }

    /// Break the text into lines no wider than `width`, or only at newlines if `width` is zero.
    ///
    /// Words wider than `width` get a line of their own.
    fn lines(&self, width: f64) -> Vec<String> {
        let mut lines = Vec::new();
        for paragraph in self.text.split('\n') {
            if width <= 0. || self.width_of(paragraph) <= width {
                lines.push(paragraph.to_string());
                continue;
            }
            let mut line = String::new();
            for word in paragraph.split_whitespace() {
                if line.is_empty() {
                    line.push_str(word);
                    continue;
                }
                let candidate = format!("{line} {word}");
                if self.width_of(&candidate) <= width {
                    line = candidate;
                } else {
                    lines.push(std::mem::replace(&mut line, word.to_string()));
                }
            }
            lines.push(line);
        }
        lines
    }

    fn sizes(&self, hint: Size) -> Sizes {
        let extents = self.metrics.measure("", &self.font);
        let line_height = extents.line_height;
        let lines = self.lines(hint.width);
        let widest_line = lines
            .iter()
            .map(|line| self.width_of(line))
            .fold(0., f64::max);
        let widest_word = self
            .text
            .split_whitespace()
            .map(|word| self.width_of(word))
            .fold(0., f64::max);
        let pref = Size::new(widest_line, line_height * lines.len() as f64);
        let min = Size::new(widest_word, line_height);
        Sizes::new(min, pref, max_size()).normalized()
    }
}

/// A single- or multi-line piece of text.
///
/// The text is measured through the [`FontMetrics`] collaborator, and wraps at
/// word boundaries when the layout offers less width than the text needs.
///
/// ```
/// # use std::rc::Rc;
/// # use tessel_core::core::{FontDescriptor, FontMetrics, PanelTree, TextExtents};
/// # use tessel_core::widgets::Label;
/// struct Monospace;
///
/// impl FontMetrics for Monospace {
///     fn measure(&self, text: &str, font: &FontDescriptor) -> TextExtents {
///         TextExtents {
///             width: text.chars().count() as f64 * font.size * 0.5,
///             line_height: font.size * 1.2,
///             baseline: font.size,
///         }
///     }
/// }
///
/// let mut tree = PanelTree::new();
/// let label = Label::new("Hello", Rc::new(Monospace)).create(&mut tree);
/// tree.pack(label);
/// assert!(tree.frame_rect(label).width() > 0.);
/// ```
pub struct Label {
    text: Rc<RefCell<LabelText>>,
}

impl std::fmt::Debug for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = self.text.borrow();
        f.debug_struct("Label")
            .field("text", &text.text)
            .field("font", &text.font)
            .finish_non_exhaustive()
    }
}

// --- MARK: BUILDERS
impl Label {
    /// A label in the default font, drawn in black.
    pub fn new(text: impl Into<String>, metrics: Rc<dyn FontMetrics>) -> Self {
        Self {
            text: Rc::new(RefCell::new(LabelText {
                text: text.into(),
                font: FontDescriptor::default(),
                ink: palette::css::BLACK.into(),
                metrics,
            })),
        }
    }

    /// Builder-style method for setting the font.
    pub fn with_font(self, font: FontDescriptor) -> Self {
        self.text.borrow_mut().font = font;
        self
    }

    /// Builder-style method for setting the text ink.
    pub fn with_ink(self, ink: impl Into<Brush>) -> Self {
        self.text.borrow_mut().ink = ink.into();
        self
    }

    /// Add the label to `tree` as a detached panel with a text-measuring sizer.
    pub fn create(self, tree: &mut PanelTree) -> PanelId {
        let text = self.text.clone();
        let id = tree.create(self);
        tree.set_sizer(id, Some(Rc::new(move |hint: Size| text.borrow().sizes(hint))));
        id
    }
}

// --- MARK: WIDGETMUT
impl Label {
    /// The current text.
    pub fn text(&self) -> String {
        self.text.borrow().text.clone()
    }

    /// Replace the text of the label `id` and request a new layout.
    pub fn set_text(tree: &mut PanelTree, id: PanelId, text: impl Into<String>) {
        let Some(label) = tree.widget_mut::<Self>(id) else {
            debug_panic!("Panel {id} is not a label");
            return;
        };
        label.text.borrow_mut().text = text.into();
        tree.mark_for_layout(id);
    }
}

// --- MARK: IMPL WIDGET
impl Widget for Label {
    fn draw(&mut self, ctx: &mut DrawCtx<'_>, canvas: &mut dyn Canvas, _dirty: Rect) {
        let text = self.text.borrow();
        let bounds = ctx.content_rect();
        let extents = text.metrics.measure("", &text.font);
        for (index, line) in text.lines(bounds.width()).iter().enumerate() {
            let y = bounds.y0 + extents.line_height * index as f64 + extents.baseline;
            canvas.draw_text(line, &text.font, Point::new(bounds.x0, y), &text.ink);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TextExtents;

    /// Every character is 10 wide, lines are 20 high.
    struct Fixed;

    impl FontMetrics for Fixed {
        fn measure(&self, text: &str, _font: &FontDescriptor) -> TextExtents {
            TextExtents {
                width: text.chars().count() as f64 * 10.,
                line_height: 20.,
                baseline: 15.,
            }
        }
    }

    #[test]
    fn unconstrained_label_is_one_line() {
        let mut tree = PanelTree::new();
        let label = Label::new("hello world", Rc::new(Fixed)).create(&mut tree);
        let sizes = tree.sizes(label, Size::ZERO);
        assert_eq!(sizes.pref, Size::new(110., 20.));
        assert_eq!(sizes.min, Size::new(50., 20.));
    }

    #[test]
    fn narrow_hint_wraps_words() {
        let mut tree = PanelTree::new();
        let label = Label::new("aaa bbb ccc", Rc::new(Fixed)).create(&mut tree);
        let sizes = tree.sizes(label, Size::new(75., 0.));
        assert_eq!(sizes.pref, Size::new(70., 40.));

        let sizes = tree.sizes(label, Size::new(30., 0.));
        assert_eq!(sizes.pref, Size::new(30., 60.));
    }

    #[test]
    fn set_text_marks_for_layout() {
        let mut tree = PanelTree::new();
        let label = Label::new("a", Rc::new(Fixed)).create(&mut tree);
        tree.validate_layout(label);
        assert!(!tree.needs_layout(label));

        Label::set_text(&mut tree, label, "abc");
        assert!(tree.needs_layout(label));
        assert_eq!(tree.preferred_size(label), Size::new(30., 20.));
        assert_eq!(tree.widget::<Label>(label).map(Label::text).as_deref(), Some("abc"));
    }
}
