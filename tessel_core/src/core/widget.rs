// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

use std::any::Any;
use std::path::PathBuf;

use kurbo::{Point, Rect};

use crate::core::{
    Canvas, CursorIcon, DragData, DrawCtx, EventCtx, Handled, KeyEvent, MouseEvent, PanelId,
    Tooltip, UpdateCtx, WheelEvent,
};

/// The behavior attached to a panel.
///
/// A panel's geometry, flags, border, sizer and layout live in the
/// [`PanelTree`](crate::core::PanelTree); the widget supplies everything that
/// varies per panel type: drawing, input handling and notifications.
/// Every method has a default that does nothing (or declines the event),
/// so widgets only implement the hooks they care about.
///
/// Input hooks returning [`Handled`] take part in bubbling: the window calls them on
/// the target panel and then on each ancestor until one returns `Handled::Yes`.
/// Positions passed to hooks are in the panel's local coordinates.
///
/// All hooks run on the UI thread behind a recovery boundary; a panic inside one
/// is reported and the event loop carries on.
#[allow(unused_variables, reason = "Default implementations don't use their parameters")]
pub trait Widget: Any {
    /// Paint the panel's own content. Children are drawn afterwards, on top.
    fn draw(&mut self, ctx: &mut DrawCtx<'_>, canvas: &mut dyn Canvas, dirty: Rect) {}

    /// Paint over the children and the border.
    fn draw_over(&mut self, ctx: &mut DrawCtx<'_>, canvas: &mut dyn Canvas, dirty: Rect) {}

    /// A mouse button was pressed over this panel or one of its descendants.
    ///
    /// The panel that handles this receives the following drag and up events directly.
    fn on_mouse_down(&mut self, ctx: &mut EventCtx<'_>, event: &MouseEvent) -> Handled {
        Handled::No
    }

    /// The pointer moved while a button this panel handled is held.
    fn on_mouse_drag(&mut self, ctx: &mut EventCtx<'_>, event: &MouseEvent) -> Handled {
        Handled::No
    }

    /// A button this panel handled was released.
    fn on_mouse_up(&mut self, ctx: &mut EventCtx<'_>, event: &MouseEvent) -> Handled {
        Handled::No
    }

    /// The pointer moved over this panel with no button held.
    fn on_mouse_move(&mut self, ctx: &mut EventCtx<'_>, event: &MouseEvent) -> Handled {
        Handled::No
    }

    /// The pointer started hovering this panel.
    fn on_mouse_enter(&mut self, ctx: &mut EventCtx<'_>, event: &MouseEvent) {}

    /// The pointer stopped hovering this panel.
    fn on_mouse_exit(&mut self, ctx: &mut EventCtx<'_>) {}

    /// The wheel scrolled over this panel.
    fn on_mouse_wheel(&mut self, ctx: &mut EventCtx<'_>, event: &WheelEvent) -> Handled {
        Handled::No
    }

    /// A key was pressed while this panel or one of its descendants had focus.
    fn on_key_down(&mut self, ctx: &mut EventCtx<'_>, event: &KeyEvent) -> Handled {
        Handled::No
    }

    /// A key was released.
    fn on_key_up(&mut self, ctx: &mut EventCtx<'_>, event: &KeyEvent) -> Handled {
        Handled::No
    }

    /// A character was typed.
    fn on_rune(&mut self, ctx: &mut EventCtx<'_>, ch: char) -> Handled {
        Handled::No
    }

    /// Files were dropped onto this panel.
    fn on_file_drop(&mut self, ctx: &mut EventCtx<'_>, paths: &[PathBuf]) -> Handled {
        Handled::No
    }

    /// A data drag is over this panel. Return `true` to accept the payload.
    fn on_data_drag_over(&mut self, ctx: &mut EventCtx<'_>, position: Point, data: &DragData) -> bool {
        false
    }

    /// A data drag this panel accepted moved elsewhere.
    fn on_data_drag_exit(&mut self, ctx: &mut EventCtx<'_>) {}

    /// A data drag this panel accepted was dropped on it.
    fn on_data_drag_drop(&mut self, ctx: &mut EventCtx<'_>, position: Point, data: &DragData) {}

    /// This panel received keyboard focus.
    fn on_gained_focus(&mut self, ctx: &mut UpdateCtx<'_>) {}

    /// This panel lost keyboard focus.
    fn on_lost_focus(&mut self, ctx: &mut UpdateCtx<'_>) {}

    /// Focus moved into, out of, or within this panel's descendants.
    fn on_focus_changed_in_hierarchy(
        &mut self,
        ctx: &mut UpdateCtx<'_>,
        from: Option<PanelId>,
        to: Option<PanelId>,
    ) {
    }

    /// This panel was added to, moved within, or removed from a parent.
    ///
    /// Runs after the tree has been updated.
    fn on_parent_changed(&mut self, ctx: &mut UpdateCtx<'_>) {}

    /// This panel's frame rectangle changed.
    fn on_frame_change(&mut self, ctx: &mut UpdateCtx<'_>) {}

    /// The frame rectangle of one of this panel's descendants changed.
    fn on_frame_change_in_descendant(&mut self, ctx: &mut UpdateCtx<'_>, descendant: PanelId) {}

    /// The tooltip to show for `position`.
    ///
    /// `avoid` starts as this panel's bounds in root coordinates; the tooltip is placed so
    /// it doesn't cover it. The default returns the tooltip assigned to the panel.
    fn update_tooltip(
        &mut self,
        ctx: &mut UpdateCtx<'_>,
        position: Point,
        avoid: &mut Rect,
    ) -> Option<Tooltip> {
        ctx.assigned_tooltip()
    }

    /// The cursor to show over `position`, or `None` to defer to the parent.
    fn cursor(&mut self, ctx: &mut UpdateCtx<'_>, position: Point) -> Option<CursorIcon> {
        None
    }

    /// Get the (abridged) type name of the widget, for debugging purposes.
    fn short_type_name(&self) -> &'static str {
        let name = std::any::type_name::<Self>();
        name.split('<')
            .next()
            .unwrap_or(name)
            .split("::")
            .last()
            .unwrap_or(name)
    }
}
