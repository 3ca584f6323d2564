// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

//! A button widget.

use std::rc::Rc;
use std::time::Duration;

use kurbo::{Insets, Point, Rect, Size};
use peniko::Brush;
use peniko::color::palette;
use tracing::trace;

use crate::core::{
    Canvas, DrawCtx, EventCtx, FontDescriptor, FontMetrics, Handled, Key, KeyEvent, MouseEvent,
    NamedKey, PanelId, PanelTree, PointerButton, Sizes, UpdateCtx, Widget, max_size,
};

/// How long a button stays highlighted after a click.
pub const CLICK_FLASH: Duration = Duration::from_millis(100);

const PADDING: Insets = Insets::uniform_xy(8., 4.);

type ClickHandler = Box<dyn FnMut(&mut EventCtx<'_>)>;

/// A push button with a text caption.
///
/// A click is a press and release of the primary button over the button,
/// or Enter or Space while it has focus. The click handler runs right away and
/// the button flashes for [`CLICK_FLASH`] through a delayed task, so
/// the rest of the UI keeps responding during the animation.
pub struct Button {
    caption: String,
    font: FontDescriptor,
    metrics: Rc<dyn FontMetrics>,
    on_click: Option<ClickHandler>,
    pressed: bool,
    flashing: bool,
    // Bumped on every click; only the latest click's task ends the flash.
    flash_sequence: u64,
}

impl std::fmt::Debug for Button {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Button")
            .field("caption", &self.caption)
            .field("pressed", &self.pressed)
            .field("flashing", &self.flashing)
            .finish_non_exhaustive()
    }
}

// --- MARK: BUILDERS
impl Button {
    /// A button showing `caption`.
    pub fn new(caption: impl Into<String>, metrics: Rc<dyn FontMetrics>) -> Self {
        Self {
            caption: caption.into(),
            font: FontDescriptor::default(),
            metrics,
            on_click: None,
            pressed: false,
            flashing: false,
            flash_sequence: 0,
        }
    }

    /// Builder-style method for setting the click handler.
    pub fn with_on_click(mut self, f: impl FnMut(&mut EventCtx<'_>) + 'static) -> Self {
        self.on_click = Some(Box::new(f));
        self
    }

    /// Builder-style method for setting the font.
    pub fn with_font(mut self, font: FontDescriptor) -> Self {
        self.font = font;
        self
    }

    /// Add the button to `tree` as a detached, focusable panel.
    pub fn create(self, tree: &mut PanelTree) -> PanelId {
        let metrics = self.metrics.clone();
        let caption = self.caption.clone();
        let font = self.font.clone();
        let id = tree.create(self);
        tree.set_focusable(id, true);
        tree.set_sizer(
            id,
            Some(Rc::new(move |_hint: Size| {
                let extents = metrics.measure(&caption, &font);
                let size = Size::new(
                    extents.width + PADDING.x_value(),
                    extents.line_height + PADDING.y_value(),
                );
                Sizes::new(size, size, max_size())
            })),
        );
        id
    }
}

// --- MARK: WIDGETMUT
impl Button {
    /// `true` while the click flash is showing.
    pub fn is_flashing(&self) -> bool {
        self.flashing
    }

    /// `true` while the primary button is held after pressing this button.
    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    fn click(&mut self, ctx: &mut EventCtx<'_>) {
        trace!(id = ctx.id().trace(), "button clicked");
        self.flashing = true;
        self.flash_sequence += 1;
        let sequence = self.flash_sequence;
        ctx.request_redraw();
        let window = ctx.window_id();
        let id = ctx.id();
        ctx.invoke_task_after(
            move |app| {
                let Some(window) = app.window_mut(window) else {
                    return;
                };
                let tree = window.tree_mut();
                if !tree.contains(id) {
                    return;
                }
                if let Some(button) = tree.widget_mut::<Self>(id) {
                    if button.flash_sequence != sequence {
                        return;
                    }
                    button.flashing = false;
                }
                tree.mark_for_redraw(id);
            },
            CLICK_FLASH,
        );
        if let Some(on_click) = self.on_click.as_mut() {
            on_click(ctx);
        }
    }
}

// --- MARK: IMPL WIDGET
impl Widget for Button {
    fn draw(&mut self, ctx: &mut DrawCtx<'_>, canvas: &mut dyn Canvas, _dirty: Rect) {
        let bounds = ctx.local_bounds();
        let background: Brush = if self.pressed || self.flashing {
            palette::css::DARK_GRAY.into()
        } else if ctx.is_enabled() {
            palette::css::LIGHT_GRAY.into()
        } else {
            palette::css::GAINSBORO.into()
        };
        canvas.fill_rect(bounds, &background);
        let outline: Brush = if ctx.has_focus() {
            palette::css::DODGER_BLUE.into()
        } else {
            palette::css::GRAY.into()
        };
        canvas.stroke_rect(bounds.inset(-0.5), 1., &outline);

        let extents = self.metrics.measure(&self.caption, &self.font);
        let origin = Point::new(
            (bounds.width() - extents.width) / 2.,
            (bounds.height() - extents.line_height) / 2. + extents.baseline,
        );
        canvas.draw_text(&self.caption, &self.font, origin, &Brush::from(palette::css::BLACK));
    }

    fn on_mouse_down(&mut self, ctx: &mut EventCtx<'_>, event: &MouseEvent) -> Handled {
        if event.button != PointerButton::Primary {
            return Handled::No;
        }
        self.pressed = true;
        ctx.request_focus();
        ctx.request_redraw();
        Handled::Yes
    }

    fn on_mouse_up(&mut self, ctx: &mut EventCtx<'_>, event: &MouseEvent) -> Handled {
        if !self.pressed {
            return Handled::No;
        }
        self.pressed = false;
        ctx.request_redraw();
        if ctx.local_bounds().contains(event.position) {
            self.click(ctx);
        }
        Handled::Yes
    }

    fn on_key_down(&mut self, ctx: &mut EventCtx<'_>, event: &KeyEvent) -> Handled {
        let activates = event.key == Key::Named(NamedKey::Enter)
            || matches!(&event.key, Key::Character(c) if c == " ");
        if activates && event.modifiers.is_empty() {
            self.click(ctx);
            Handled::Yes
        } else {
            Handled::No
        }
    }

    fn on_gained_focus(&mut self, ctx: &mut UpdateCtx<'_>) {
        ctx.request_redraw();
    }

    fn on_lost_focus(&mut self, ctx: &mut UpdateCtx<'_>) {
        ctx.request_redraw();
    }
}
