// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

//! The context types that are passed into various widget methods.

use std::time::Duration;

use kurbo::{Rect, Size};

use crate::app::{App, TaskQueue, WindowId};
use crate::core::{DragData, PanelId, PanelTree, Tooltip};

/// Requests made by widgets during event handling.
///
/// The window applies them once the callback has returned, so that
/// focus and drag state never change under a running callback.
#[derive(Debug, Default)]
pub(crate) struct WindowRequests {
    /// `Some(None)` clears the focus.
    pub(crate) focus: Option<Option<PanelId>>,
    pub(crate) drag: Option<DragData>,
    pub(crate) redraw: bool,
}

// Methods shared by every context type.
macro_rules! impl_context_method {
    ($SomeCtx:tt) => {
        impl $SomeCtx<'_> {
            /// The id of the panel this callback runs for.
            pub fn id(&self) -> PanelId {
                self.id
            }

            /// The panel tree, read-only.
            pub fn tree(&self) -> &PanelTree {
                self.tree
            }

            /// The size of this panel's frame, in parent coordinates.
            pub fn size(&self) -> Size {
                self.tree.frame_rect(self.id).size()
            }

            /// This panel's bounds in its own coordinates.
            pub fn local_bounds(&self) -> Rect {
                self.tree.local_bounds(self.id)
            }

            /// This panel's bounds minus its border insets.
            pub fn content_rect(&self) -> Rect {
                self.tree.content_rect(self.id)
            }

            /// `true` if this panel has keyboard focus.
            pub fn has_focus(&self) -> bool {
                self.tree.focus() == Some(self.id)
            }

            /// `true` if this panel is enabled.
            pub fn is_enabled(&self) -> bool {
                self.tree.is_enabled(self.id)
            }
        }
    };
}

/// A context provided to input event hooks.
///
/// Besides the tree, it gives access to the window's task queue and collects
/// focus, drag and redraw requests that the window applies after the hook returns.
pub struct EventCtx<'a> {
    pub(crate) tree: &'a mut PanelTree,
    pub(crate) id: PanelId,
    pub(crate) target: PanelId,
    pub(crate) window: WindowId,
    pub(crate) requests: &'a mut WindowRequests,
    pub(crate) tasks: &'a TaskQueue,
}

/// A context provided to lifecycle and focus notifications.
pub struct UpdateCtx<'a> {
    pub(crate) tree: &'a mut PanelTree,
    pub(crate) id: PanelId,
}

/// A context provided to drawing hooks.
pub struct DrawCtx<'a> {
    pub(crate) tree: &'a PanelTree,
    pub(crate) id: PanelId,
}

impl_context_method!(EventCtx);
impl_context_method!(UpdateCtx);
impl_context_method!(DrawCtx);

impl std::fmt::Debug for EventCtx<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventCtx")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for UpdateCtx<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateCtx")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for DrawCtx<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawCtx")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

// --- MARK: EVENT CTX
impl<'a> EventCtx<'a> {
    pub(crate) fn new(
        tree: &'a mut PanelTree,
        id: PanelId,
        target: PanelId,
        window: WindowId,
        requests: &'a mut WindowRequests,
        tasks: &'a TaskQueue,
    ) -> Self {
        Self {
            tree,
            id,
            target,
            window,
            requests,
            tasks,
        }
    }

    /// The panel the event was originally targeted at.
    ///
    /// This differs from [`id`](Self::id) while the event bubbles through ancestors.
    pub fn target(&self) -> PanelId {
        self.target
    }

    /// The window the event was dispatched in.
    pub fn window_id(&self) -> WindowId {
        self.window
    }

    /// The panel tree, mutably.
    pub fn tree_mut(&mut self) -> &mut PanelTree {
        self.tree
    }

    /// Give keyboard focus to this panel once the hook returns.
    pub fn request_focus(&mut self) {
        self.requests.focus = Some(Some(self.id));
    }

    /// Give keyboard focus to `id` once the hook returns.
    pub fn request_focus_for(&mut self, id: PanelId) {
        self.requests.focus = Some(Some(id));
    }

    /// Clear the keyboard focus once the hook returns.
    pub fn clear_focus(&mut self) {
        self.requests.focus = Some(None);
    }

    /// Start a data drag once the hook returns.
    ///
    /// The drag is silently ignored if the payload isn't [valid](DragData::is_valid).
    pub fn start_data_drag(&mut self, data: DragData) {
        self.requests.drag = Some(data);
    }

    /// Repaint the window.
    pub fn request_redraw(&mut self) {
        self.requests.redraw = true;
    }

    /// Mark this panel and its ancestors as needing layout.
    pub fn request_layout(&mut self) {
        self.tree.mark_for_layout(self.id);
        self.requests.redraw = true;
    }

    /// The task queue of the application.
    pub fn tasks(&self) -> &TaskQueue {
        self.tasks
    }

    /// Run `task` on the UI thread during a later tick.
    pub fn invoke_task(&self, task: impl FnOnce(&mut App) + Send + 'static) {
        self.tasks.invoke(task);
    }

    /// Run `task` on the UI thread once `delay` has elapsed.
    pub fn invoke_task_after(&self, task: impl FnOnce(&mut App) + Send + 'static, delay: Duration) {
        self.tasks.invoke_after(task, delay);
    }
}

// --- MARK: UPDATE CTX
impl<'a> UpdateCtx<'a> {
    pub(crate) fn new(tree: &'a mut PanelTree, id: PanelId) -> Self {
        Self { tree, id }
    }

    /// The panel tree, mutably.
    pub fn tree_mut(&mut self) -> &mut PanelTree {
        self.tree
    }

    /// The tooltip assigned to this panel with [`PanelTree::set_tooltip`].
    pub fn assigned_tooltip(&self) -> Option<Tooltip> {
        self.tree.tooltip(self.id)
    }

    /// Repaint the window this panel belongs to.
    pub fn request_redraw(&mut self) {
        self.tree.mark_for_redraw(self.id);
    }
}

// --- MARK: DRAW CTX
impl<'a> DrawCtx<'a> {
    pub(crate) fn new(tree: &'a PanelTree, id: PanelId) -> Self {
        Self { tree, id }
    }
}
