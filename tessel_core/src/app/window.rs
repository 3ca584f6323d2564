// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use std::time::{Duration, Instant};

use cursor_icon::CursorIcon;
use kurbo::{Point, Rect, Size};
use smallvec::SmallVec;
use tracing::{debug, debug_span, trace, trace_span};

use crate::app::{AppOptions, NativeWindow, Recovery, TaskQueue, WindowId, WindowOptions};
use crate::core::{
    Canvas, DragData, EventCtx, Handled, InputEvent, KeyEvent, Modifiers, MouseEvent, PanelId,
    PanelTree, Sizes, Tooltip, UpdateCtx, WheelEvent, Widget, WindowRequests, max_size,
};
use crate::layout::{FlexLayout, Layout};
use crate::widgets::Panel;

/// A window-level hook that sees every event first.
///
/// Returning `true` suppresses all further routing. Popup menus use this to
/// capture input while they are open.
pub type PreHook = Box<dyn FnMut(&mut Window, &InputEvent) -> bool>;

/// A window-level hook that runs before an event is routed to panels.
///
/// Returning [`Handled::Yes`] stops routing.
pub type EventHook = Box<dyn FnMut(&mut Window, &InputEvent) -> Handled>;

/// Gap between a tooltip and the rectangle it avoids.
const TOOLTIP_GAP: f64 = 2.;

struct DragState {
    data: DragData,
    /// The panel that last accepted the payload.
    target: Option<PanelId>,
    /// Pointer position in window coordinates.
    position: Point,
}

#[derive(Debug, Default)]
struct TooltipState {
    /// The tooltip that is showing, or waiting to be shown.
    current: Option<Tooltip>,
    /// Region the tooltip must not cover, in window coordinates.
    avoid: Rect,
    shown: bool,
    /// Bumped whenever `current` is cleared, so stale delayed shows become no-ops.
    sequence: u64,
    last_shown_at: Option<Instant>,
}

#[derive(Clone, Copy, Debug)]
struct TooltipTimings {
    delay: Duration,
    dismissal: Duration,
    recent_window: Duration,
}

/// Lays out the menu bar above the content panel. Shown tooltips are left alone.
struct RootLayout {
    menu_bar: Option<PanelId>,
    content: PanelId,
}

impl Layout for RootLayout {
    fn layout_sizes(&mut self, tree: &mut PanelTree, target: PanelId, hint: Size) -> Sizes {
        let content = tree.sizes(self.content, hint);
        let Some(menu_bar) = self.menu_bar else {
            return content.grow(tree.insets(target));
        };
        let menu = tree.sizes(menu_bar, Size::new(hint.width, 0.)).pref;
        let stack = |size: Size| {
            Size::new(size.width.max(menu.width), size.height + menu.height)
        };
        Sizes::new(stack(content.min), stack(content.pref), max_size()).grow(tree.insets(target))
    }

    fn perform_layout(&mut self, tree: &mut PanelTree, target: PanelId) {
        let bounds = tree.content_rect(target);
        let mut y = bounds.y0;
        if let Some(menu_bar) = self.menu_bar {
            let height = tree.sizes(menu_bar, Size::new(bounds.width(), 0.)).pref.height;
            tree.set_frame_rect(menu_bar, Rect::new(bounds.x0, y, bounds.x1, y + height));
            y += height;
        }
        tree.set_frame_rect(self.content, Rect::new(bounds.x0, y, bounds.x1, bounds.y1.max(y)));
    }
}

/// A top-level window and the unit of event dispatch.
///
/// A window owns a [`PanelTree`] whose root holds an optional menu bar, the
/// content panel and, while one is showing, a tooltip panel in front of everything.
/// Raw input from the native layer enters through [`dispatch`](Self::dispatch):
///
/// - Mouse downs hit-test and bubble from the panel under the pointer to its
///   ancestors until one handles it. That panel receives the drag and up events
///   that follow, wherever the pointer goes.
/// - Pointer moves with no button held re-hit-test every time and fire enter and exit
///   hooks when the hovered panel changes.
/// - Keys bubble from the focused panel. An unhandled Tab (or Shift+Tab) moves focus.
/// - While a [data drag](Self::start_data_drag) is active, moves look for a drop
///   target and the button release drops the payload on it.
///
/// Disabled panels are skipped while bubbling.
pub struct Window {
    id: WindowId,
    options: WindowOptions,
    native: Box<dyn NativeWindow>,
    tree: PanelTree,
    root: PanelId,
    content: PanelId,
    menu_bar: Option<PanelId>,
    tasks: TaskQueue,
    timings: TooltipTimings,

    pre_hook: Option<PreHook>,
    event_hook: Option<EventHook>,
    requests: WindowRequests,

    last_mouse_over: Option<PanelId>,
    last_mouse_down: Option<PanelId>,
    last_key_down: Option<PanelId>,
    mouse_position: Point,
    button_down: bool,
    drag: Option<DragState>,
    tooltip: TooltipState,
    cursor: CursorIcon,

    needs_redraw: bool,
    redraw_requested: bool,
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("title", &self.options.title)
            .field("tree", &self.tree)
            .field("root", &self.root)
            .field("content", &self.content)
            .field("menu_bar", &self.menu_bar)
            .field("tooltip", &self.tooltip)
            .field("dragging", &self.drag.is_some())
            .finish_non_exhaustive()
    }
}

// --- MARK: CREATE
impl Window {
    pub(crate) fn new(
        id: WindowId,
        options: WindowOptions,
        native: Box<dyn NativeWindow>,
        tasks: TaskQueue,
        recovery: Recovery,
        app_options: &AppOptions,
    ) -> Self {
        let mut tree = PanelTree::with_recovery(recovery);
        let root = tree.create(Panel::new());
        let content = tree.create(Panel::new());
        tree.set_layout(content, Some(Box::new(FlexLayout::new())));
        tree.add_child(root, content);
        tree.set_layout(
            root,
            Some(Box::new(RootLayout {
                menu_bar: None,
                content,
            })),
        );
        let size = native.content_rect().size();
        tree.set_frame_rect(root, Rect::from_origin_size(Point::ORIGIN, size));

        Self {
            id,
            options,
            native,
            tree,
            root,
            content,
            menu_bar: None,
            tasks,
            timings: TooltipTimings {
                delay: app_options.tooltip_delay,
                dismissal: app_options.tooltip_dismissal,
                recent_window: app_options.tooltip_recent_window,
            },
            pre_hook: None,
            event_hook: None,
            requests: WindowRequests::default(),
            last_mouse_over: None,
            last_mouse_down: None,
            last_key_down: None,
            mouse_position: Point::ORIGIN,
            button_down: false,
            drag: None,
            tooltip: TooltipState::default(),
            cursor: CursorIcon::Default,
            needs_redraw: true,
            redraw_requested: false,
        }
    }

    /// Detach the content, drop any transient state and close the native window.
    ///
    /// Called by [`App::dispose_window`](crate::app::App::dispose_window).
    pub(crate) fn dispose(&mut self) {
        self.clear_tooltip();
        self.drag = None;
        self.last_mouse_over = None;
        self.last_mouse_down = None;
        self.last_key_down = None;
        self.set_focus(None);
        self.tree.remove_all_children(self.root);
        self.native.close();
    }
}

// --- MARK: GETTERS
impl Window {
    /// The id of this window.
    pub fn id(&self) -> WindowId {
        self.id
    }

    /// The options the window was created with. The title tracks [`set_title`](Self::set_title).
    pub fn options(&self) -> &WindowOptions {
        &self.options
    }

    /// The panel tree of this window.
    pub fn tree(&self) -> &PanelTree {
        &self.tree
    }

    /// The panel tree of this window, mutably.
    pub fn tree_mut(&mut self) -> &mut PanelTree {
        &mut self.tree
    }

    /// The root panel, which holds the menu bar, the content and the tooltip.
    pub fn root(&self) -> PanelId {
        self.root
    }

    /// The content panel.
    pub fn content(&self) -> PanelId {
        self.content
    }

    /// The menu bar panel, if any.
    pub fn menu_bar(&self) -> Option<PanelId> {
        self.menu_bar
    }

    /// The native window.
    pub fn native(&self) -> &dyn NativeWindow {
        self.native.as_ref()
    }

    /// The native window, mutably.
    pub fn native_mut(&mut self) -> &mut dyn NativeWindow {
        self.native.as_mut()
    }

    /// The task queue of the application.
    pub fn tasks(&self) -> &TaskQueue {
        &self.tasks
    }

    /// The panel with keyboard focus.
    pub fn focus(&self) -> Option<PanelId> {
        self.tree.focus()
    }

    /// The tooltip panel currently on screen.
    pub fn shown_tooltip(&self) -> Option<PanelId> {
        self.tooltip
            .current
            .filter(|_| self.tooltip.shown)
            .map(|tooltip| tooltip.panel)
    }

    /// `true` while a data drag is in progress.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// The panel that last accepted the payload of the current data drag.
    pub fn drag_target(&self) -> Option<PanelId> {
        self.drag.as_ref().and_then(|drag| drag.target)
    }

    /// The panel the pointer was last seen over.
    pub fn hovered(&self) -> Option<PanelId> {
        self.last_mouse_over
    }

    /// The cursor last sent to the native window.
    pub fn cursor(&self) -> CursorIcon {
        self.cursor
    }

    /// `true` if the window must be redrawn.
    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }
}

// --- MARK: SETUP
impl Window {
    /// Replace the content panel.
    ///
    /// The old content is detached but stays in the tree.
    pub fn set_content(&mut self, content: PanelId) {
        if !self.tree.contains(content) {
            debug_panic!("Content panel {content} is not in the window's tree");
            return;
        }
        if content == self.content {
            return;
        }
        self.tree.remove_from_parent(self.content);
        self.content = content;
        self.tree.add_child(self.root, content);
        self.install_root_layout();
        self.forget_stale_targets();
    }

    /// Install, replace or remove the menu bar.
    pub fn set_menu_bar(&mut self, menu_bar: Option<PanelId>) {
        if let Some(old) = self.menu_bar.take() {
            self.tree.remove_child(self.root, old);
        }
        if let Some(panel) = menu_bar {
            if !self.tree.contains(panel) {
                debug_panic!("Menu bar panel {panel} is not in the window's tree");
            } else {
                let index = self.tree.index_of_child(self.root, self.content).unwrap_or(0);
                self.tree.add_child_at_index(self.root, panel, index);
                self.menu_bar = Some(panel);
            }
        }
        self.install_root_layout();
        self.forget_stale_targets();
    }

    fn install_root_layout(&mut self) {
        self.tree.set_layout(
            self.root,
            Some(Box::new(RootLayout {
                menu_bar: self.menu_bar,
                content: self.content,
            })),
        );
        self.tree.mark_for_layout(self.root);
    }

    // Drops references to panels that are no longer under the root.
    /// `true` if `id` is the root or one of its descendants.
    fn is_attached(&self, id: PanelId) -> bool {
        self.tree.contains(id) && (id == self.root || self.tree.is_ancestor_of(self.root, id))
    }

    /// `true` if `id` may keep keyboard focus: attached, focusable and not inside a hidden panel.
    fn can_hold_focus(&self, id: PanelId) -> bool {
        self.is_attached(id)
            && self.tree.is_focusable(id)
            && !self.tree.ancestors(id).any(|ancestor| self.tree.is_hidden(ancestor))
    }

    /// Drop focus and pointer targets that left the window or can no longer take input.
    ///
    /// Panels can be detached, hidden or disabled through [`tree_mut`](Self::tree_mut)
    /// at any time, so this runs before every dispatch.
    fn forget_stale_targets(&mut self) {
        if self.tree.focus().is_some_and(|id| !self.can_hold_focus(id)) {
            self.set_focus(None);
        }
        if self.last_mouse_over.is_some_and(|id| !self.is_attached(id)) {
            self.last_mouse_over = None;
        }
        if self.last_mouse_down.is_some_and(|id| !self.is_attached(id)) {
            self.last_mouse_down = None;
        }
        if self.last_key_down.is_some_and(|id| !self.is_attached(id)) {
            self.last_key_down = None;
        }
    }

    /// Install the hook that sees every event before anything else.
    pub fn set_pre_hook(&mut self, hook: Option<PreHook>) {
        self.pre_hook = hook;
    }

    /// Install the hook that runs before events are routed to panels.
    pub fn set_event_hook(&mut self, hook: Option<EventHook>) {
        self.event_hook = hook;
    }

    /// Change the title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.options.title = title.into();
        self.native.set_title(&self.options.title);
    }

    /// Make the window visible and lay it out.
    pub fn show(&mut self) {
        self.native.set_visible(true);
        self.validate_layout();
        self.needs_redraw = true;
        self.flush_redraw();
    }

    /// Hide the window.
    pub fn hide(&mut self) {
        self.clear_tooltip();
        self.native.set_visible(false);
        self.redraw_requested = false;
    }

    /// `true` if the native window is visible.
    pub fn is_visible(&self) -> bool {
        self.native.is_visible()
    }

    /// Resize the native window to the root panel's preferred size.
    pub fn pack(&mut self) {
        let size = self.tree.preferred_size(self.root);
        let rect = self.native.content_rect();
        self.native
            .set_content_rect(Rect::from_origin_size(rect.origin(), size));
        self.resized();
    }

    /// The native window changed size. Called by the driver.
    pub fn resized(&mut self) {
        self.tree.mark_for_layout(self.root);
        self.validate_layout();
        self.needs_redraw = true;
        self.flush_redraw();
    }
}

// --- MARK: LAYOUT & DRAW
impl Window {
    /// Match the root to the native content size and run pending layouts.
    pub fn validate_layout(&mut self) {
        let size = self.native.content_rect().size();
        self.tree
            .set_frame_rect(self.root, Rect::from_origin_size(Point::ORIGIN, size));
        self.tree.validate_layout(self.root);
    }

    /// Paint the whole window, then the drag preview if a data drag is active.
    ///
    /// Called by the driver when the native window asks for a repaint.
    pub fn draw(&mut self, canvas: &mut dyn Canvas) {
        let _span = debug_span!("draw", window = %self.id).entered();
        self.validate_layout();
        let bounds = Rect::from_origin_size(Point::ORIGIN, self.tree.frame_rect(self.root).size());
        self.tree.draw(self.root, canvas, bounds);
        if let Some(drag) = &self.drag
            && let (Some(drawable), Some(ink)) = (&drag.data.drawable, &drag.data.ink)
        {
            let origin = drag.position + drag.data.offset;
            let rect = Rect::from_origin_size(origin, drawable.logical_size());
            drawable.draw_in_rect(canvas, rect, ink);
        }
        self.tree.take_redraw_request();
        self.needs_redraw = false;
        self.redraw_requested = false;
    }

    /// Mark the window for a full repaint.
    pub fn request_redraw(&mut self) {
        self.needs_redraw = true;
    }

    /// Forward a pending redraw to the native window if it's visible.
    ///
    /// Multiple requests before the next [`draw`](Self::draw) are coalesced.
    pub(crate) fn flush_redraw(&mut self) {
        if self.tree.take_redraw_request() {
            self.needs_redraw = true;
        }
        if self.needs_redraw && !self.redraw_requested && self.native.is_visible() {
            self.native.request_redraw();
            self.redraw_requested = true;
        }
    }
}

// --- MARK: DISPATCH
impl Window {
    /// Route a raw input event.
    ///
    /// The pre-hook runs first, then the event hook, then routing proper.
    /// Focus, drag and redraw requests made by panels are applied afterwards.
    pub fn dispatch(&mut self, event: InputEvent) -> Handled {
        let span = if event.is_very_frequent() {
            trace_span!("dispatch", window = %self.id, event = event.short_name())
        } else {
            debug_span!("dispatch", window = %self.id, event = event.short_name())
        };
        let _span = span.enter();

        self.forget_stale_targets();
        let handled = self.dispatch_inner(&event);
        self.apply_requests();
        self.flush_redraw();
        handled
    }

    fn dispatch_inner(&mut self, event: &InputEvent) -> Handled {
        if let Some(mut hook) = self.pre_hook.take() {
            let recovery = self.tree.recovery().clone();
            let suppressed = recovery.run("pre_hook", || hook(self, event));
            if self.pre_hook.is_none() {
                self.pre_hook = Some(hook);
            }
            if suppressed == Some(true) {
                trace!("event suppressed by pre-hook");
                return Handled::Yes;
            }
        }
        if let Some(mut hook) = self.event_hook.take() {
            let recovery = self.tree.recovery().clone();
            let handled = recovery.run("event_hook", || hook(self, event));
            if self.event_hook.is_none() {
                self.event_hook = Some(hook);
            }
            if handled == Some(Handled::Yes) {
                return Handled::Yes;
            }
        }
        self.route(event)
    }

    fn route(&mut self, event: &InputEvent) -> Handled {
        match event {
            InputEvent::MouseDown(event) => self.mouse_down(event),
            InputEvent::MouseUp(event) => self.mouse_up(event),
            InputEvent::MouseMove(event) => self.mouse_move(event),
            InputEvent::MouseEnter(event) => {
                self.mouse_position = event.position;
                self.hover(event)
            }
            InputEvent::MouseExit => {
                self.mouse_exit();
                Handled::No
            }
            InputEvent::MouseWheel(event) => self.mouse_wheel(event),
            InputEvent::KeyDown(event) => self.key_down(event),
            InputEvent::KeyUp(event) => self.key_up(event),
            InputEvent::Rune(ch) => self.rune(*ch),
            InputEvent::FileDrop(paths) => self.file_drop(paths),
        }
    }

    fn apply_requests(&mut self) {
        let requests = std::mem::take(&mut self.requests);
        if let Some(focus) = requests.focus {
            self.set_focus(focus);
        }
        if let Some(data) = requests.drag {
            self.start_data_drag(data);
        }
        if requests.redraw {
            self.needs_redraw = true;
        }
    }

    /// The deepest panel under `point`, in window coordinates.
    ///
    /// A shown tooltip is never hit. Returns the root if nothing else is under the point.
    pub fn panel_at(&self, point: Point) -> PanelId {
        let tooltip = self.shown_tooltip();
        for &child in self.tree.children(self.root) {
            if Some(child) == tooltip || self.tree.is_hidden(child) {
                continue;
            }
            let frame = self.tree.frame_rect(child);
            if frame.contains(point) {
                let local = ((point - frame.origin()) / self.tree.scale(child)).to_point();
                return self.tree.panel_at(child, local);
            }
        }
        self.root
    }

    /// Run `f` with the widget of `id` and an [`EventCtx`] for it.
    fn with_event_ctx<R>(
        &mut self,
        id: PanelId,
        target: PanelId,
        callback: &'static str,
        f: impl FnOnce(&mut dyn Widget, &mut EventCtx<'_>) -> R,
    ) -> Option<R> {
        let Self {
            id: window,
            tree,
            requests,
            tasks,
            ..
        } = self;
        let window = *window;
        tree.with_widget(id, callback, |widget, tree| {
            let mut ctx = EventCtx::new(tree, id, target, window, requests, tasks);
            f(widget, &mut ctx)
        })
    }

    /// Call `f` on `start` and then its ancestors until one returns [`Handled::Yes`].
    ///
    /// Returns the panel that handled the event.
    fn bubble(
        &mut self,
        start: PanelId,
        callback: &'static str,
        mut f: impl FnMut(&mut dyn Widget, &mut EventCtx<'_>) -> Handled,
    ) -> Option<PanelId> {
        let chain: SmallVec<[PanelId; 16]> = std::iter::once(start)
            .chain(self.tree.ancestors(start))
            .collect();
        for id in chain {
            if !self.tree.contains(id) || !self.tree.is_enabled(id) {
                continue;
            }
            let handled = self.with_event_ctx(id, start, callback, |widget, ctx| f(widget, ctx));
            if handled == Some(Handled::Yes) {
                trace!(id = id.trace(), callback, "handled");
                return Some(id);
            }
        }
        None
    }

    fn local_mouse_event(tree: &PanelTree, id: PanelId, event: &MouseEvent) -> MouseEvent {
        event.at(tree.point_from_root(id, event.position))
    }
}

// --- MARK: MOUSE
impl Window {
    fn mouse_down(&mut self, event: &MouseEvent) -> Handled {
        self.mouse_position = event.position;
        self.button_down = true;
        self.clear_tooltip();
        let target = self.panel_at(event.position);
        let handler = self.bubble(target, "on_mouse_down", |widget, ctx| {
            let local = Self::local_mouse_event(ctx.tree(), ctx.id(), event);
            widget.on_mouse_down(ctx, &local)
        });
        debug!(target = target.trace(), handled = handler.is_some(), "mouse down");
        self.last_mouse_down = handler;
        handler.is_some().into()
    }

    fn mouse_up(&mut self, event: &MouseEvent) -> Handled {
        self.mouse_position = event.position;
        self.button_down = false;
        if let Some(drag) = self.drag.take() {
            self.last_mouse_down = None;
            self.drop_data(drag, event.position);
            self.track_mouse_over(event);
            return Handled::Yes;
        }
        let handled = match self.last_mouse_down.take() {
            Some(target) if self.tree.contains(target) => self
                .with_event_ctx(target, target, "on_mouse_up", |widget, ctx| {
                    let local = Self::local_mouse_event(ctx.tree(), ctx.id(), event);
                    widget.on_mouse_up(ctx, &local)
                })
                .unwrap_or(Handled::No),
            _ => Handled::No,
        };
        self.track_mouse_over(event);
        handled
    }

    fn mouse_move(&mut self, event: &MouseEvent) -> Handled {
        self.mouse_position = event.position;
        if self.drag.is_some() {
            self.drag_over(event.position);
            return Handled::Yes;
        }
        if self.button_down {
            return match self.last_mouse_down {
                Some(target) if self.tree.contains(target) => self
                    .with_event_ctx(target, target, "on_mouse_drag", |widget, ctx| {
                        let local = Self::local_mouse_event(ctx.tree(), ctx.id(), event);
                        widget.on_mouse_drag(ctx, &local)
                    })
                    .unwrap_or(Handled::No),
                _ => Handled::No,
            };
        }
        self.hover(event)
    }

    fn hover(&mut self, event: &MouseEvent) -> Handled {
        let hit = self.track_mouse_over(event);
        let handled = self
            .bubble(hit, "on_mouse_move", |widget, ctx| {
                let local = Self::local_mouse_event(ctx.tree(), ctx.id(), event);
                widget.on_mouse_move(ctx, &local)
            })
            .is_some();
        self.update_cursor(hit, event.position);
        self.update_tooltip(hit, event.position);
        handled.into()
    }

    // Fires enter and exit hooks if the panel under the pointer changed.
    fn track_mouse_over(&mut self, event: &MouseEvent) -> PanelId {
        let hit = self.panel_at(event.position);
        if self.last_mouse_over == Some(hit) {
            return hit;
        }
        if let Some(old) = self.last_mouse_over.take()
            && self.tree.contains(old)
        {
            self.with_event_ctx(old, old, "on_mouse_exit", |widget, ctx| {
                widget.on_mouse_exit(ctx);
            });
        }
        self.with_event_ctx(hit, hit, "on_mouse_enter", |widget, ctx| {
            let local = Self::local_mouse_event(ctx.tree(), ctx.id(), event);
            widget.on_mouse_enter(ctx, &local);
        });
        self.last_mouse_over = Some(hit);
        hit
    }

    fn mouse_exit(&mut self) {
        self.clear_tooltip();
        if let Some(old) = self.last_mouse_over.take()
            && self.tree.contains(old)
        {
            self.with_event_ctx(old, old, "on_mouse_exit", |widget, ctx| {
                widget.on_mouse_exit(ctx);
            });
        }
        if let Some(drag) = self.drag.as_mut()
            && let Some(target) = drag.target.take()
        {
            self.exit_drag_target(target);
        }
    }

    fn mouse_wheel(&mut self, event: &WheelEvent) -> Handled {
        self.mouse_position = event.position;
        let target = self.panel_at(event.position);
        self.bubble(target, "on_mouse_wheel", |widget, ctx| {
            let local = WheelEvent {
                position: ctx.tree().point_from_root(ctx.id(), event.position),
                ..*event
            };
            widget.on_mouse_wheel(ctx, &local)
        })
        .is_some()
        .into()
    }

    fn file_drop(&mut self, paths: &[PathBuf]) -> Handled {
        let target = self.panel_at(self.mouse_position);
        self.bubble(target, "on_file_drop", |widget, ctx| {
            widget.on_file_drop(ctx, paths)
        })
        .is_some()
        .into()
    }

    fn update_cursor(&mut self, hit: PanelId, position: Point) {
        let chain: SmallVec<[PanelId; 16]> =
            std::iter::once(hit).chain(self.tree.ancestors(hit)).collect();
        let mut cursor = CursorIcon::Default;
        for id in chain {
            let local = self.tree.point_from_root(id, position);
            let found = self
                .tree
                .with_widget(id, "cursor", |widget, tree| {
                    widget.cursor(&mut UpdateCtx::new(tree, id), local)
                })
                .flatten();
            if let Some(found) = found {
                cursor = found;
                break;
            }
        }
        if cursor != self.cursor {
            self.cursor = cursor;
            self.native.set_cursor(cursor);
        }
    }
}

// --- MARK: KEYBOARD
impl Window {
    // Where keyboard input starts bubbling from.
    fn key_target(&self) -> PanelId {
        self.tree
            .focus()
            .filter(|&id| self.can_hold_focus(id))
            .unwrap_or(self.content)
    }

    fn key_down(&mut self, event: &KeyEvent) -> Handled {
        let start = self.key_target();
        self.last_key_down = Some(start);
        let handler = self.bubble(start, "on_key_down", |widget, ctx| {
            widget.on_key_down(ctx, event)
        });
        if handler.is_some() {
            return Handled::Yes;
        }
        if event.is_focus_traversal() {
            if event.modifiers.contains(Modifiers::SHIFT) {
                self.focus_previous();
            } else {
                self.focus_next();
            }
            return Handled::Yes;
        }
        Handled::No
    }

    fn key_up(&mut self, event: &KeyEvent) -> Handled {
        let start = self
            .last_key_down
            .take()
            .filter(|&id| self.tree.contains(id))
            .unwrap_or_else(|| self.key_target());
        self.bubble(start, "on_key_up", |widget, ctx| widget.on_key_up(ctx, event))
            .is_some()
            .into()
    }

    fn rune(&mut self, ch: char) -> Handled {
        let start = self.key_target();
        self.bubble(start, "on_rune", |widget, ctx| widget.on_rune(ctx, ch))
            .is_some()
            .into()
    }
}

// --- MARK: FOCUS
impl Window {
    /// Move keyboard focus to `target`.
    ///
    /// If `target` can't take focus itself, its first focusable descendant gets it;
    /// if there is none, focus is cleared. Does nothing if that panel already has focus.
    ///
    /// The old panel's lost-focus hook runs first, then the new panel's gained-focus
    /// hook, then the focus-changed-in-hierarchy hook of every ancestor of either,
    /// each ancestor once.
    pub fn set_focus(&mut self, target: Option<PanelId>) {
        let target = target.and_then(|id| {
            if self.tree.contains(id) {
                self.tree.first_focusable(id)
            } else {
                debug_panic!("Can't focus panel {id}: it is not in the window's tree");
                None
            }
        });
        let old = self.tree.focus().filter(|&id| self.tree.contains(id));
        if old == target {
            return;
        }
        debug!(from = ?old, to = ?target, "focus change");

        if let Some(old) = old {
            self.tree.with_widget(old, "on_lost_focus", |widget, tree| {
                widget.on_lost_focus(&mut UpdateCtx::new(tree, old));
            });
        }
        self.tree.set_focus_pointer(target);
        if let Some(new) = target {
            self.tree.with_widget(new, "on_gained_focus", |widget, tree| {
                widget.on_gained_focus(&mut UpdateCtx::new(tree, new));
            });
        }

        let mut notified: SmallVec<[PanelId; 32]> = SmallVec::new();
        for id in old.into_iter().chain(target) {
            for ancestor in self.tree.ancestors(id) {
                if !notified.contains(&ancestor) {
                    notified.push(ancestor);
                }
            }
        }
        for ancestor in notified {
            self.tree
                .with_widget(ancestor, "on_focus_changed_in_hierarchy", |widget, tree| {
                    widget.on_focus_changed_in_hierarchy(
                        &mut UpdateCtx::new(tree, ancestor),
                        old,
                        target,
                    );
                });
        }
        self.needs_redraw = true;
    }

    /// Give focus to the next focusable panel of the content, wrapping around.
    pub fn focus_next(&mut self) {
        self.move_focus(true);
    }

    /// Give focus to the previous focusable panel of the content, wrapping around.
    pub fn focus_previous(&mut self) {
        self.move_focus(false);
    }

    fn move_focus(&mut self, forward: bool) {
        self.forget_stale_targets();
        let focusables = self.tree.focusables(self.content);
        let len = focusables.len();
        if len == 0 {
            return;
        }
        // With nothing focused, start from the content panel, which precedes
        // all its descendants in pre-order.
        let current = self.tree.focus().unwrap_or(self.content);
        let next = match focusables.iter().position(|&id| id == current) {
            Some(index) if forward => (index + 1) % len,
            Some(index) => (index + len - 1) % len,
            None if forward => 0,
            None => len - 1,
        };
        self.set_focus(Some(focusables[next]));
    }
}

// --- MARK: DRAG & DROP
impl Window {
    /// Start dragging `data` from the current pointer position.
    ///
    /// Returns `false`, and does nothing, unless the payload is
    /// [valid](DragData::is_valid).
    pub fn start_data_drag(&mut self, data: DragData) -> bool {
        if !data.is_valid() {
            debug!(?data, "ignoring drag with incomplete payload");
            return false;
        }
        debug!(?data, "data drag started");
        self.clear_tooltip();
        self.drag = Some(DragState {
            data,
            target: None,
            position: self.mouse_position,
        });
        self.needs_redraw = true;
        true
    }

    fn drag_over(&mut self, position: Point) {
        let Some(mut drag) = self.drag.take() else {
            return;
        };
        drag.position = position;
        let hit = self.panel_at(position);
        let chain: SmallVec<[PanelId; 16]> =
            std::iter::once(hit).chain(self.tree.ancestors(hit)).collect();
        let mut accepted = None;
        for id in chain {
            if !self.tree.is_enabled(id) {
                continue;
            }
            let accepts = self
                .with_event_ctx(id, hit, "on_data_drag_over", |widget, ctx| {
                    let local = ctx.tree().point_from_root(ctx.id(), position);
                    widget.on_data_drag_over(ctx, local, &drag.data)
                })
                .unwrap_or(false);
            if accepts {
                accepted = Some(id);
                break;
            }
        }
        if accepted != drag.target {
            if let Some(old) = drag.target {
                self.exit_drag_target(old);
            }
            trace!(target = ?accepted, "drag target changed");
            drag.target = accepted;
        }
        self.drag = Some(drag);
        self.needs_redraw = true;
    }

    fn exit_drag_target(&mut self, target: PanelId) {
        if self.tree.contains(target) {
            self.with_event_ctx(target, target, "on_data_drag_exit", |widget, ctx| {
                widget.on_data_drag_exit(ctx);
            });
        }
    }

    fn drop_data(&mut self, drag: DragState, position: Point) {
        match drag.target {
            Some(target) if self.tree.contains(target) => {
                debug!(target = target.trace(), "data dropped");
                self.with_event_ctx(target, target, "on_data_drag_drop", |widget, ctx| {
                    let local = ctx.tree().point_from_root(ctx.id(), position);
                    widget.on_data_drag_drop(ctx, local, &drag.data);
                });
            }
            _ => debug!("data drag ended without a target"),
        }
        self.needs_redraw = true;
    }
}

// --- MARK: TOOLTIPS
impl Window {
    fn update_tooltip(&mut self, hit: PanelId, position: Point) {
        let chain: SmallVec<[PanelId; 16]> =
            std::iter::once(hit).chain(self.tree.ancestors(hit)).collect();
        let mut resolved = None;
        for id in chain {
            let local = self.tree.point_from_root(id, position);
            let mut avoid = self.tree.rect_to_root(id, self.tree.local_bounds(id));
            let tooltip = self
                .tree
                .with_widget(id, "update_tooltip", |widget, tree| {
                    widget.update_tooltip(&mut UpdateCtx::new(tree, id), local, &mut avoid)
                })
                .flatten();
            if let Some(tooltip) = tooltip {
                resolved = Some((tooltip, avoid));
                break;
            }
        }

        let current = self.tooltip.current.map(|tooltip| tooltip.panel);
        if resolved.map(|(tooltip, _)| tooltip.panel) == current {
            return;
        }
        self.clear_tooltip();
        let Some((tooltip, avoid)) = resolved else {
            return;
        };
        if !self.tree.contains(tooltip.panel) {
            debug_panic!("Tooltip panel {} is not in the window's tree", tooltip.panel);
            return;
        }

        self.tooltip.current = Some(tooltip);
        self.tooltip.avoid = avoid;
        let now = self.tasks.now();
        let shown_recently = self.tooltip.last_shown_at.is_some_and(|at| {
            now.saturating_duration_since(at) <= self.timings.recent_window
        });
        let delay = if tooltip.immediate || shown_recently {
            Duration::ZERO
        } else {
            self.timings.delay
        };
        let window = self.id;
        let sequence = self.tooltip.sequence;
        trace!(panel = tooltip.panel.trace(), sequence, ?delay, "tooltip scheduled");
        self.tasks.invoke_after(
            move |app| {
                if let Some(window) = app.window_mut(window) {
                    window.show_tooltip(sequence);
                }
            },
            delay,
        );
    }

    /// Hide the tooltip, or cancel one waiting to be shown.
    pub fn clear_tooltip(&mut self) {
        self.tooltip.sequence += 1;
        let current = self.tooltip.current.take();
        if std::mem::take(&mut self.tooltip.shown)
            && let Some(tooltip) = current
        {
            self.tree.remove_child(self.root, tooltip.panel);
            self.tooltip.last_shown_at = Some(self.tasks.now());
            self.needs_redraw = true;
        }
    }

    /// Show the pending tooltip if nothing replaced it since it was scheduled.
    fn show_tooltip(&mut self, sequence: u64) {
        if sequence != self.tooltip.sequence || self.tooltip.shown {
            trace!(sequence, current = self.tooltip.sequence, "stale tooltip discarded");
            return;
        }
        let Some(tooltip) = self.tooltip.current else {
            return;
        };
        if !self.tree.contains(tooltip.panel) {
            self.tooltip.current = None;
            return;
        }
        let size = self.tree.preferred_size(tooltip.panel);
        let bounds = self.tree.local_bounds(self.root);
        let rect = place_tooltip(size, self.tooltip.avoid, self.mouse_position, bounds);
        self.tree.add_child_at_index(self.root, tooltip.panel, 0);
        self.tree.set_frame_rect(tooltip.panel, rect);
        self.tree.validate_layout(tooltip.panel);
        self.tooltip.shown = true;
        self.tooltip.last_shown_at = Some(self.tasks.now());
        self.needs_redraw = true;
        debug!(panel = tooltip.panel.trace(), ?rect, "tooltip shown");

        let window = self.id;
        self.tasks.invoke_after(
            move |app| {
                if let Some(window) = app.window_mut(window) {
                    window.dismiss_tooltip(sequence);
                }
            },
            self.timings.dismissal,
        );
    }

    fn dismiss_tooltip(&mut self, sequence: u64) {
        if sequence == self.tooltip.sequence && self.tooltip.shown {
            self.clear_tooltip();
        }
    }
}

/// Put a tooltip of `size` below `avoid`, or above it if there's no room below,
/// starting at the pointer's x and kept within `bounds`.
fn place_tooltip(size: Size, avoid: Rect, pointer: Point, bounds: Rect) -> Rect {
    let mut y = avoid.y1 + TOOLTIP_GAP;
    if y + size.height > bounds.y1 {
        let above = avoid.y0 - TOOLTIP_GAP - size.height;
        y = if above >= bounds.y0 { above } else { bounds.y1 - size.height };
    }
    let x = pointer.x.min(bounds.x1 - size.width).max(bounds.x0);
    let y = y.max(bounds.y0);
    Rect::from_origin_size((x, y), size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tooltip_goes_below_then_above() {
        let bounds = Rect::new(0., 0., 200., 100.);
        let size = Size::new(50., 20.);

        let below = place_tooltip(size, Rect::new(10., 10., 60., 30.), Point::new(20., 20.), bounds);
        assert_eq!(below, Rect::new(20., 32., 70., 52.));

        let above = place_tooltip(size, Rect::new(10., 70., 60., 90.), Point::new(20., 80.), bounds);
        assert_eq!(above, Rect::new(20., 48., 70., 68.));
    }

    #[test]
    fn tooltip_stays_inside_the_window() {
        let bounds = Rect::new(0., 0., 100., 100.);
        let rect = place_tooltip(
            Size::new(50., 20.),
            Rect::new(0., 0., 100., 100.),
            Point::new(90., 50.),
            bounds,
        );
        assert_eq!(rect, Rect::new(50., 80., 100., 100.));
    }
}
