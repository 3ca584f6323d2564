// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

//! A wrapper widget that records each hook called on it.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::rc::Rc;

use cursor_icon::CursorIcon;
use kurbo::{Point, Rect};
use tessel_core::core::{
    Canvas, DragData, DrawCtx, EventCtx, Handled, KeyEvent, MouseEvent, PanelId, Tooltip,
    UpdateCtx, WheelEvent, Widget,
};

/// A wrapper widget that records each time one of its hooks is called.
///
/// Its intent is to let you observe the hooks called on a widget in a test.
///
/// ```
/// use assert_matches::assert_matches;
/// use tessel_core::core::PanelTree;
/// use tessel_core::widgets::Panel;
/// use tessel_testing::{Record, Recording, TestWidgetExt};
///
/// let recording = Recording::default();
/// let mut tree = PanelTree::new();
/// let parent = tree.create(Panel::new());
/// let child = tree.create(Panel::new().record(&recording));
/// tree.add_child(parent, child);
///
/// assert_matches!(recording.next(), Some(Record::ParentChanged));
/// ```
pub struct Recorder<W> {
    recording: Recording,
    child: W,
}

impl<W> std::fmt::Debug for Recorder<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("recording", &self.recording)
            .finish_non_exhaustive()
    }
}

/// A recording of widget hook calls.
///
/// Internally stores a queue of [`Records`](Record).
#[derive(Debug, Clone, Default)]
pub struct Recording(Rc<RefCell<VecDeque<Record>>>);

/// A recording of a hook call on a widget.
///
/// Positions are in the panel's local coordinates, as the hook received them.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Draw.
    Draw,
    /// Draw over children.
    DrawOver,
    /// Mouse down.
    MouseDown(MouseEvent),
    /// Mouse drag.
    MouseDrag(MouseEvent),
    /// Mouse up.
    MouseUp(MouseEvent),
    /// Mouse move.
    MouseMove(MouseEvent),
    /// Mouse enter.
    MouseEnter(MouseEvent),
    /// Mouse exit.
    MouseExit,
    /// Mouse wheel.
    MouseWheel(WheelEvent),
    /// Key down.
    KeyDown(KeyEvent),
    /// Key up.
    KeyUp(KeyEvent),
    /// Typed character.
    Rune(char),
    /// Files dropped.
    FileDrop(Vec<PathBuf>),
    /// Data dragged over the panel.
    DataDragOver(Point),
    /// Data drag left the panel.
    DataDragExit,
    /// Data dropped on the panel.
    DataDragDrop(Point),
    /// Gained focus.
    GainedFocus,
    /// Lost focus.
    LostFocus,
    /// Focus moved within the hierarchy.
    FocusChangedInHierarchy(Option<PanelId>, Option<PanelId>),
    /// Parent changed.
    ParentChanged,
    /// Frame changed.
    FrameChange,
    /// A descendant's frame changed.
    FrameChangeInDescendant(PanelId),
}

impl Recording {
    /// True if no events have been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// The number of events in the recording.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Clear recorded events.
    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    /// Returns the next event in the recording, if one exists.
    ///
    /// This consumes the event.
    pub fn next(&self) -> Option<Record> {
        self.0.borrow_mut().pop_front()
    }

    /// Returns a vec of events drained from the recording.
    pub fn drain(&self) -> Vec<Record> {
        self.0.borrow_mut().drain(..).collect()
    }

    fn push(&self, event: Record) {
        self.0.borrow_mut().push_back(event);
    }
}

impl<W: Widget> Recorder<W> {
    /// Wrap `child` in a Recorder that records all hook calls.
    pub fn new(child: W, recording: &Recording) -> Self {
        Self {
            child,
            recording: recording.clone(),
        }
    }

    /// The wrapped widget.
    pub fn inner(&self) -> &W {
        &self.child
    }

    /// The wrapped widget, mutably.
    pub fn inner_mut(&mut self) -> &mut W {
        &mut self.child
    }
}

// Tooltip and cursor queries happen on every hover and aren't recorded.
impl<W: Widget> Widget for Recorder<W> {
    fn draw(&mut self, ctx: &mut DrawCtx<'_>, canvas: &mut dyn Canvas, dirty: Rect) {
        self.recording.push(Record::Draw);
        self.child.draw(ctx, canvas, dirty);
    }

    fn draw_over(&mut self, ctx: &mut DrawCtx<'_>, canvas: &mut dyn Canvas, dirty: Rect) {
        self.recording.push(Record::DrawOver);
        self.child.draw_over(ctx, canvas, dirty);
    }

    fn on_mouse_down(&mut self, ctx: &mut EventCtx<'_>, event: &MouseEvent) -> Handled {
        self.recording.push(Record::MouseDown(*event));
        self.child.on_mouse_down(ctx, event)
    }

    fn on_mouse_drag(&mut self, ctx: &mut EventCtx<'_>, event: &MouseEvent) -> Handled {
        self.recording.push(Record::MouseDrag(*event));
        self.child.on_mouse_drag(ctx, event)
    }

    fn on_mouse_up(&mut self, ctx: &mut EventCtx<'_>, event: &MouseEvent) -> Handled {
        self.recording.push(Record::MouseUp(*event));
        self.child.on_mouse_up(ctx, event)
    }

    fn on_mouse_move(&mut self, ctx: &mut EventCtx<'_>, event: &MouseEvent) -> Handled {
        self.recording.push(Record::MouseMove(*event));
        self.child.on_mouse_move(ctx, event)
    }

    fn on_mouse_enter(&mut self, ctx: &mut EventCtx<'_>, event: &MouseEvent) {
        self.recording.push(Record::MouseEnter(*event));
        self.child.on_mouse_enter(ctx, event);
    }

    fn on_mouse_exit(&mut self, ctx: &mut EventCtx<'_>) {
        self.recording.push(Record::MouseExit);
        self.child.on_mouse_exit(ctx);
    }

    fn on_mouse_wheel(&mut self, ctx: &mut EventCtx<'_>, event: &WheelEvent) -> Handled {
        self.recording.push(Record::MouseWheel(*event));
        self.child.on_mouse_wheel(ctx, event)
    }

    fn on_key_down(&mut self, ctx: &mut EventCtx<'_>, event: &KeyEvent) -> Handled {
        self.recording.push(Record::KeyDown(event.clone()));
        self.child.on_key_down(ctx, event)
    }

    fn on_key_up(&mut self, ctx: &mut EventCtx<'_>, event: &KeyEvent) -> Handled {
        self.recording.push(Record::KeyUp(event.clone()));
        self.child.on_key_up(ctx, event)
    }

    fn on_rune(&mut self, ctx: &mut EventCtx<'_>, ch: char) -> Handled {
        self.recording.push(Record::Rune(ch));
        self.child.on_rune(ctx, ch)
    }

    fn on_file_drop(&mut self, ctx: &mut EventCtx<'_>, paths: &[PathBuf]) -> Handled {
        self.recording.push(Record::FileDrop(paths.to_vec()));
        self.child.on_file_drop(ctx, paths)
    }

    fn on_data_drag_over(
        &mut self,
        ctx: &mut EventCtx<'_>,
        position: Point,
        data: &DragData,
    ) -> bool {
        self.recording.push(Record::DataDragOver(position));
        self.child.on_data_drag_over(ctx, position, data)
    }

    fn on_data_drag_exit(&mut self, ctx: &mut EventCtx<'_>) {
        self.recording.push(Record::DataDragExit);
        self.child.on_data_drag_exit(ctx);
    }

    fn on_data_drag_drop(&mut self, ctx: &mut EventCtx<'_>, position: Point, data: &DragData) {
        self.recording.push(Record::DataDragDrop(position));
        self.child.on_data_drag_drop(ctx, position, data);
    }

    fn on_gained_focus(&mut self, ctx: &mut UpdateCtx<'_>) {
        self.recording.push(Record::GainedFocus);
        self.child.on_gained_focus(ctx);
    }

    fn on_lost_focus(&mut self, ctx: &mut UpdateCtx<'_>) {
        self.recording.push(Record::LostFocus);
        self.child.on_lost_focus(ctx);
    }

    fn on_focus_changed_in_hierarchy(
        &mut self,
        ctx: &mut UpdateCtx<'_>,
        from: Option<PanelId>,
        to: Option<PanelId>,
    ) {
        self.recording
            .push(Record::FocusChangedInHierarchy(from, to));
        self.child.on_focus_changed_in_hierarchy(ctx, from, to);
    }

    fn on_parent_changed(&mut self, ctx: &mut UpdateCtx<'_>) {
        self.recording.push(Record::ParentChanged);
        self.child.on_parent_changed(ctx);
    }

    fn on_frame_change(&mut self, ctx: &mut UpdateCtx<'_>) {
        self.recording.push(Record::FrameChange);
        self.child.on_frame_change(ctx);
    }

    fn on_frame_change_in_descendant(&mut self, ctx: &mut UpdateCtx<'_>, descendant: PanelId) {
        self.recording
            .push(Record::FrameChangeInDescendant(descendant));
        self.child.on_frame_change_in_descendant(ctx, descendant);
    }

    fn update_tooltip(
        &mut self,
        ctx: &mut UpdateCtx<'_>,
        position: Point,
        avoid: &mut Rect,
    ) -> Option<Tooltip> {
        self.child.update_tooltip(ctx, position, avoid)
    }

    fn cursor(&mut self, ctx: &mut UpdateCtx<'_>, position: Point) -> Option<CursorIcon> {
        self.child.cursor(ctx, position)
    }

    fn short_type_name(&self) -> &'static str {
        self.child.short_type_name()
    }
}
