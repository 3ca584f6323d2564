// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

//! A general-purpose panel whose behavior is supplied as closures.

use std::path::PathBuf;

use kurbo::{Point, Rect};
use peniko::Brush;

use crate::core::{
    Canvas, CursorIcon, DragData, DrawCtx, EventCtx, Handled, KeyEvent, MouseEvent, PanelId,
    Tooltip, UpdateCtx, WheelEvent, Widget,
};

type DrawHook = Box<dyn FnMut(&mut DrawCtx<'_>, &mut dyn Canvas, Rect)>;
type MouseHook = Box<dyn FnMut(&mut EventCtx<'_>, &MouseEvent) -> Handled>;
type EnterHook = Box<dyn FnMut(&mut EventCtx<'_>, &MouseEvent)>;
type ExitHook = Box<dyn FnMut(&mut EventCtx<'_>)>;
type WheelHook = Box<dyn FnMut(&mut EventCtx<'_>, &WheelEvent) -> Handled>;
type KeyHook = Box<dyn FnMut(&mut EventCtx<'_>, &KeyEvent) -> Handled>;
type RuneHook = Box<dyn FnMut(&mut EventCtx<'_>, char) -> Handled>;
type FileDropHook = Box<dyn FnMut(&mut EventCtx<'_>, &[PathBuf]) -> Handled>;
type DragOverHook = Box<dyn FnMut(&mut EventCtx<'_>, Point, &DragData) -> bool>;
type DropHook = Box<dyn FnMut(&mut EventCtx<'_>, Point, &DragData)>;
type UpdateHook = Box<dyn FnMut(&mut UpdateCtx<'_>)>;
type FocusHierarchyHook = Box<dyn FnMut(&mut UpdateCtx<'_>, Option<PanelId>, Option<PanelId>)>;
type DescendantHook = Box<dyn FnMut(&mut UpdateCtx<'_>, PanelId)>;
type TooltipHook = Box<dyn FnMut(&mut UpdateCtx<'_>, Point, &mut Rect) -> Option<Tooltip>>;
type CursorHook = Box<dyn FnMut(&mut UpdateCtx<'_>, Point) -> Option<CursorIcon>>;

/// A panel that delegates each [`Widget`] hook to an optional closure.
///
/// This is the building block for containers and one-off widgets that don't
/// warrant their own type. Unset hooks behave like the trait defaults.
///
/// ```
/// use tessel_core::core::{Handled, PanelTree};
/// use tessel_core::widgets::Panel;
///
/// let mut tree = PanelTree::new();
/// let panel = tree.create(
///     Panel::new().with_mouse_down(|ctx, _event| {
///         ctx.request_focus();
///         Handled::Yes
///     }),
/// );
/// assert!(tree.contains(panel));
/// ```
#[derive(Default)]
pub struct Panel {
    background: Option<Brush>,
    draw: Option<DrawHook>,
    draw_over: Option<DrawHook>,
    mouse_down: Option<MouseHook>,
    mouse_drag: Option<MouseHook>,
    mouse_up: Option<MouseHook>,
    mouse_move: Option<MouseHook>,
    mouse_enter: Option<EnterHook>,
    mouse_exit: Option<ExitHook>,
    mouse_wheel: Option<WheelHook>,
    key_down: Option<KeyHook>,
    key_up: Option<KeyHook>,
    rune: Option<RuneHook>,
    file_drop: Option<FileDropHook>,
    data_drag_over: Option<DragOverHook>,
    data_drag_exit: Option<ExitHook>,
    data_drag_drop: Option<DropHook>,
    gained_focus: Option<UpdateHook>,
    lost_focus: Option<UpdateHook>,
    focus_changed_in_hierarchy: Option<FocusHierarchyHook>,
    parent_changed: Option<UpdateHook>,
    frame_change: Option<UpdateHook>,
    frame_change_in_descendant: Option<DescendantHook>,
    update_tooltip: Option<TooltipHook>,
    cursor: Option<CursorHook>,
}

impl std::fmt::Debug for Panel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Panel")
            .field("background", &self.background)
            .finish_non_exhaustive()
    }
}

// --- MARK: BUILDERS
impl Panel {
    /// A panel with no behavior.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style method to fill the panel's bounds before anything else is drawn.
    pub fn with_background(mut self, ink: impl Into<Brush>) -> Self {
        self.background = Some(ink.into());
        self
    }

    /// Builder-style method for the draw hook.
    pub fn with_draw(
        mut self,
        f: impl FnMut(&mut DrawCtx<'_>, &mut dyn Canvas, Rect) + 'static,
    ) -> Self {
        self.draw = Some(Box::new(f));
        self
    }

    /// Builder-style method for the hook drawn over children and border.
    pub fn with_draw_over(
        mut self,
        f: impl FnMut(&mut DrawCtx<'_>, &mut dyn Canvas, Rect) + 'static,
    ) -> Self {
        self.draw_over = Some(Box::new(f));
        self
    }

    /// Builder-style method for the mouse-down hook.
    pub fn with_mouse_down(
        mut self,
        f: impl FnMut(&mut EventCtx<'_>, &MouseEvent) -> Handled + 'static,
    ) -> Self {
        self.mouse_down = Some(Box::new(f));
        self
    }

    /// Builder-style method for the mouse-drag hook.
    pub fn with_mouse_drag(
        mut self,
        f: impl FnMut(&mut EventCtx<'_>, &MouseEvent) -> Handled + 'static,
    ) -> Self {
        self.mouse_drag = Some(Box::new(f));
        self
    }

    /// Builder-style method for the mouse-up hook.
    pub fn with_mouse_up(
        mut self,
        f: impl FnMut(&mut EventCtx<'_>, &MouseEvent) -> Handled + 'static,
    ) -> Self {
        self.mouse_up = Some(Box::new(f));
        self
    }

    /// Builder-style method for the mouse-move hook.
    pub fn with_mouse_move(
        mut self,
        f: impl FnMut(&mut EventCtx<'_>, &MouseEvent) -> Handled + 'static,
    ) -> Self {
        self.mouse_move = Some(Box::new(f));
        self
    }

    /// Builder-style method for the mouse-enter hook.
    pub fn with_mouse_enter(mut self, f: impl FnMut(&mut EventCtx<'_>, &MouseEvent) + 'static) -> Self {
        self.mouse_enter = Some(Box::new(f));
        self
    }

    /// Builder-style method for the mouse-exit hook.
    pub fn with_mouse_exit(mut self, f: impl FnMut(&mut EventCtx<'_>) + 'static) -> Self {
        self.mouse_exit = Some(Box::new(f));
        self
    }

    /// Builder-style method for the wheel hook.
    pub fn with_mouse_wheel(
        mut self,
        f: impl FnMut(&mut EventCtx<'_>, &WheelEvent) -> Handled + 'static,
    ) -> Self {
        self.mouse_wheel = Some(Box::new(f));
        self
    }

    /// Builder-style method for the key-down hook.
    pub fn with_key_down(
        mut self,
        f: impl FnMut(&mut EventCtx<'_>, &KeyEvent) -> Handled + 'static,
    ) -> Self {
        self.key_down = Some(Box::new(f));
        self
    }

    /// Builder-style method for the key-up hook.
    pub fn with_key_up(
        mut self,
        f: impl FnMut(&mut EventCtx<'_>, &KeyEvent) -> Handled + 'static,
    ) -> Self {
        self.key_up = Some(Box::new(f));
        self
    }

    /// Builder-style method for the character input hook.
    pub fn with_rune(mut self, f: impl FnMut(&mut EventCtx<'_>, char) -> Handled + 'static) -> Self {
        self.rune = Some(Box::new(f));
        self
    }

    /// Builder-style method for the file drop hook.
    pub fn with_file_drop(
        mut self,
        f: impl FnMut(&mut EventCtx<'_>, &[PathBuf]) -> Handled + 'static,
    ) -> Self {
        self.file_drop = Some(Box::new(f));
        self
    }

    /// Builder-style method for the hook deciding whether a dragged payload is accepted.
    pub fn with_data_drag_over(
        mut self,
        f: impl FnMut(&mut EventCtx<'_>, Point, &DragData) -> bool + 'static,
    ) -> Self {
        self.data_drag_over = Some(Box::new(f));
        self
    }

    /// Builder-style method for the hook run when an accepted drag leaves.
    pub fn with_data_drag_exit(mut self, f: impl FnMut(&mut EventCtx<'_>) + 'static) -> Self {
        self.data_drag_exit = Some(Box::new(f));
        self
    }

    /// Builder-style method for the drop hook.
    pub fn with_data_drag_drop(
        mut self,
        f: impl FnMut(&mut EventCtx<'_>, Point, &DragData) + 'static,
    ) -> Self {
        self.data_drag_drop = Some(Box::new(f));
        self
    }

    /// Builder-style method for the gained-focus hook.
    pub fn with_gained_focus(mut self, f: impl FnMut(&mut UpdateCtx<'_>) + 'static) -> Self {
        self.gained_focus = Some(Box::new(f));
        self
    }

    /// Builder-style method for the lost-focus hook.
    pub fn with_lost_focus(mut self, f: impl FnMut(&mut UpdateCtx<'_>) + 'static) -> Self {
        self.lost_focus = Some(Box::new(f));
        self
    }

    /// Builder-style method for the hook run when focus moves among descendants.
    pub fn with_focus_changed_in_hierarchy(
        mut self,
        f: impl FnMut(&mut UpdateCtx<'_>, Option<PanelId>, Option<PanelId>) + 'static,
    ) -> Self {
        self.focus_changed_in_hierarchy = Some(Box::new(f));
        self
    }

    /// Builder-style method for the parent-changed hook.
    pub fn with_parent_changed(mut self, f: impl FnMut(&mut UpdateCtx<'_>) + 'static) -> Self {
        self.parent_changed = Some(Box::new(f));
        self
    }

    /// Builder-style method for the frame-change hook.
    pub fn with_frame_change(mut self, f: impl FnMut(&mut UpdateCtx<'_>) + 'static) -> Self {
        self.frame_change = Some(Box::new(f));
        self
    }

    /// Builder-style method for the hook run when a descendant's frame changes.
    pub fn with_frame_change_in_descendant(
        mut self,
        f: impl FnMut(&mut UpdateCtx<'_>, PanelId) + 'static,
    ) -> Self {
        self.frame_change_in_descendant = Some(Box::new(f));
        self
    }

    /// Builder-style method for the tooltip hook.
    ///
    /// Without one, the tooltip assigned in the tree is used.
    pub fn with_update_tooltip(
        mut self,
        f: impl FnMut(&mut UpdateCtx<'_>, Point, &mut Rect) -> Option<Tooltip> + 'static,
    ) -> Self {
        self.update_tooltip = Some(Box::new(f));
        self
    }

    /// Builder-style method for the cursor hook.
    pub fn with_cursor(
        mut self,
        f: impl FnMut(&mut UpdateCtx<'_>, Point) -> Option<CursorIcon> + 'static,
    ) -> Self {
        self.cursor = Some(Box::new(f));
        self
    }

    /// Builder-style method for a fixed cursor over the whole panel.
    pub fn with_fixed_cursor(self, cursor: CursorIcon) -> Self {
        self.with_cursor(move |_, _| Some(cursor))
    }
}

// --- MARK: IMPL WIDGET
impl Widget for Panel {
    fn draw(&mut self, ctx: &mut DrawCtx<'_>, canvas: &mut dyn Canvas, dirty: Rect) {
        if let Some(ink) = &self.background {
            canvas.fill_rect(ctx.local_bounds(), ink);
        }
        if let Some(f) = self.draw.as_mut() {
            f(ctx, canvas, dirty);
        }
    }

    fn draw_over(&mut self, ctx: &mut DrawCtx<'_>, canvas: &mut dyn Canvas, dirty: Rect) {
        if let Some(f) = self.draw_over.as_mut() {
            f(ctx, canvas, dirty);
        }
    }

    fn on_mouse_down(&mut self, ctx: &mut EventCtx<'_>, event: &MouseEvent) -> Handled {
        self.mouse_down.as_mut().map_or(Handled::No, |f| f(ctx, event))
    }

    fn on_mouse_drag(&mut self, ctx: &mut EventCtx<'_>, event: &MouseEvent) -> Handled {
        self.mouse_drag.as_mut().map_or(Handled::No, |f| f(ctx, event))
    }

    fn on_mouse_up(&mut self, ctx: &mut EventCtx<'_>, event: &MouseEvent) -> Handled {
        self.mouse_up.as_mut().map_or(Handled::No, |f| f(ctx, event))
    }

    fn on_mouse_move(&mut self, ctx: &mut EventCtx<'_>, event: &MouseEvent) -> Handled {
        self.mouse_move.as_mut().map_or(Handled::No, |f| f(ctx, event))
    }

    fn on_mouse_enter(&mut self, ctx: &mut EventCtx<'_>, event: &MouseEvent) {
        if let Some(f) = self.mouse_enter.as_mut() {
            f(ctx, event);
        }
    }

    fn on_mouse_exit(&mut self, ctx: &mut EventCtx<'_>) {
        if let Some(f) = self.mouse_exit.as_mut() {
            f(ctx);
        }
    }

    fn on_mouse_wheel(&mut self, ctx: &mut EventCtx<'_>, event: &WheelEvent) -> Handled {
        self.mouse_wheel.as_mut().map_or(Handled::No, |f| f(ctx, event))
    }

    fn on_key_down(&mut self, ctx: &mut EventCtx<'_>, event: &KeyEvent) -> Handled {
        self.key_down.as_mut().map_or(Handled::No, |f| f(ctx, event))
    }

    fn on_key_up(&mut self, ctx: &mut EventCtx<'_>, event: &KeyEvent) -> Handled {
        self.key_up.as_mut().map_or(Handled::No, |f| f(ctx, event))
    }

    fn on_rune(&mut self, ctx: &mut EventCtx<'_>, ch: char) -> Handled {
        self.rune.as_mut().map_or(Handled::No, |f| f(ctx, ch))
    }

    fn on_file_drop(&mut self, ctx: &mut EventCtx<'_>, paths: &[PathBuf]) -> Handled {
        self.file_drop.as_mut().map_or(Handled::No, |f| f(ctx, paths))
    }

    fn on_data_drag_over(&mut self, ctx: &mut EventCtx<'_>, position: Point, data: &DragData) -> bool {
        self.data_drag_over
            .as_mut()
            .is_some_and(|f| f(ctx, position, data))
    }

    fn on_data_drag_exit(&mut self, ctx: &mut EventCtx<'_>) {
        if let Some(f) = self.data_drag_exit.as_mut() {
            f(ctx);
        }
    }

    fn on_data_drag_drop(&mut self, ctx: &mut EventCtx<'_>, position: Point, data: &DragData) {
        if let Some(f) = self.data_drag_drop.as_mut() {
            f(ctx, position, data);
        }
    }

    fn on_gained_focus(&mut self, ctx: &mut UpdateCtx<'_>) {
        if let Some(f) = self.gained_focus.as_mut() {
            f(ctx);
        }
    }

    fn on_lost_focus(&mut self, ctx: &mut UpdateCtx<'_>) {
        if let Some(f) = self.lost_focus.as_mut() {
            f(ctx);
        }
    }

    fn on_focus_changed_in_hierarchy(
        &mut self,
        ctx: &mut UpdateCtx<'_>,
        from: Option<PanelId>,
        to: Option<PanelId>,
    ) {
        if let Some(f) = self.focus_changed_in_hierarchy.as_mut() {
            f(ctx, from, to);
        }
    }

    fn on_parent_changed(&mut self, ctx: &mut UpdateCtx<'_>) {
        if let Some(f) = self.parent_changed.as_mut() {
            f(ctx);
        }
    }

    fn on_frame_change(&mut self, ctx: &mut UpdateCtx<'_>) {
        if let Some(f) = self.frame_change.as_mut() {
            f(ctx);
        }
    }

    fn on_frame_change_in_descendant(&mut self, ctx: &mut UpdateCtx<'_>, descendant: PanelId) {
        if let Some(f) = self.frame_change_in_descendant.as_mut() {
            f(ctx, descendant);
        }
    }

    fn update_tooltip(
        &mut self,
        ctx: &mut UpdateCtx<'_>,
        position: Point,
        avoid: &mut Rect,
    ) -> Option<Tooltip> {
        match self.update_tooltip.as_mut() {
            Some(f) => f(ctx, position, avoid),
            None => ctx.assigned_tooltip(),
        }
    }

    fn cursor(&mut self, ctx: &mut UpdateCtx<'_>, position: Point) -> Option<CursorIcon> {
        self.cursor.as_mut().and_then(|f| f(ctx, position))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::core::PanelTree;

    #[test]
    fn parent_changed_hook_runs_after_attach() {
        let mut tree = PanelTree::new();
        let seen = Rc::new(Cell::new(None));
        let sink = seen.clone();
        let parent = tree.create(Panel::new());
        let child = tree.create(Panel::new().with_parent_changed(move |ctx| {
            sink.set(ctx.tree().parent(ctx.id()));
        }));

        tree.add_child(parent, child);
        assert_eq!(seen.get(), Some(parent));

        tree.remove_from_parent(child);
        assert_eq!(seen.get(), None);
    }

    #[test]
    fn assigned_tooltip_is_the_default() {
        let mut tree = PanelTree::new();
        let tip = tree.create(Panel::new());
        let panel = tree.create(Panel::new());
        tree.set_tooltip(panel, Some(Tooltip::new(tip)));

        let mut avoid = Rect::ZERO;
        let tooltip = tree
            .with_widget(panel, "update_tooltip", |widget, tree| {
                widget.update_tooltip(&mut UpdateCtx::new(tree, panel), Point::ORIGIN, &mut avoid)
            })
            .flatten();
        assert_eq!(tooltip, Some(Tooltip::new(tip)));
    }
}
