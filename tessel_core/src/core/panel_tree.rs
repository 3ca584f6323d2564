// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

//! The retained panel tree.

use std::any::Any;
use std::rc::Rc;

use hashbrown::HashMap;
use kurbo::{Insets, Point, Rect, Size};
use smallvec::SmallVec;
use tracing::{trace, trace_span};

use crate::app::Recovery;
use crate::core::sizes::unscale_hint;
use crate::core::{Border, Canvas, DrawCtx, PanelId, Sizes, UpdateCtx, Widget};
use crate::layout::Layout;
use crate::util::{AnyMap, Sanitize};

/// A function computing a panel's sizes for a hint, used when no [`Layout`] is installed.
pub type Sizer = Rc<dyn Fn(Size) -> Sizes>;

/// A tooltip assigned to a panel.
///
/// The tooltip is itself a panel, kept detached in the tree until a
/// window shows it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tooltip {
    /// The panel displayed as the tooltip.
    pub panel: PanelId,
    /// Show without the usual delay.
    pub immediate: bool,
}

impl Tooltip {
    /// A tooltip shown after the usual delay.
    pub fn new(panel: PanelId) -> Self {
        Self {
            panel,
            immediate: false,
        }
    }

    /// Builder-style method to show the tooltip without delay.
    pub fn immediate(mut self) -> Self {
        self.immediate = true;
        self
    }
}

/// Geometry and flags of a single panel.
#[derive(Clone, Debug, PartialEq)]
pub struct PanelState {
    /// Location and size in the parent's coordinates.
    pub frame: Rect,
    /// Content scale factor applied to this panel's subtree.
    pub scale: f64,
    /// Hidden panels are neither drawn nor hit.
    pub hidden: bool,
    /// Disabled panels don't receive input and can't be focused.
    pub disabled: bool,
    /// Whether the panel wants keyboard focus.
    pub focusable: bool,
    /// Whether the panel's layout must run before the next draw.
    pub needs_layout: bool,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            frame: Rect::ZERO,
            scale: 1.,
            hidden: false,
            disabled: false,
            focusable: false,
            needs_layout: true,
        }
    }
}

struct PanelNode {
    parent: Option<PanelId>,
    children: Vec<PanelId>,
    state: PanelState,
    // Taken out while one of its hooks runs.
    widget: Option<Box<dyn Widget>>,
    layout: Option<Box<dyn Layout>>,
    sizer: Option<Sizer>,
    border: Option<Box<dyn Border>>,
    layout_data: Option<Box<dyn Any>>,
    client_data: AnyMap,
    tooltip: Option<Tooltip>,
}

/// An arena holding panels and their parent/child relationships.
///
/// Each panel has at most one parent, and children are kept in order.
/// Index 0 is the front-most child: it is hit-tested first and drawn last.
/// Panels that aren't attached to anything stay in the arena until they're
/// [disposed](Self::dispose), so they can be re-added later.
///
/// Methods taking a [`PanelId`] that isn't in the tree are contract violations:
/// they [`debug_panic!`] and then do nothing.
pub struct PanelTree {
    nodes: HashMap<PanelId, PanelNode>,
    focus: Option<PanelId>,
    redraw_requested: bool,
    recovery: Recovery,
}

impl std::fmt::Debug for PanelTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelTree")
            .field("panels", &self.nodes.len())
            .field("focus", &self.focus)
            .field("redraw_requested", &self.redraw_requested)
            .finish_non_exhaustive()
    }
}

impl Default for PanelTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the ancestors of a panel, nearest first.
pub struct Ancestors<'a> {
    tree: &'a PanelTree,
    next: Option<PanelId>,
}

impl std::fmt::Debug for Ancestors<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ancestors")
            .field("next", &self.next)
            .finish_non_exhaustive()
    }
}

impl Iterator for Ancestors<'_> {
    type Item = PanelId;

    fn next(&mut self) -> Option<PanelId> {
        let current = self.next?;
        self.next = self.tree.nodes.get(&current).and_then(|node| node.parent);
        Some(current)
    }
}

// --- MARK: CREATE
impl PanelTree {
    /// An empty tree with its own recovery handle.
    pub fn new() -> Self {
        Self::with_recovery(Recovery::new())
    }

    /// An empty tree that reports callback panics to `recovery`.
    pub fn with_recovery(recovery: Recovery) -> Self {
        Self {
            nodes: HashMap::new(),
            focus: None,
            redraw_requested: false,
            recovery,
        }
    }

    /// The recovery handle callbacks run behind.
    pub fn recovery(&self) -> &Recovery {
        &self.recovery
    }

    /// Add a detached panel driven by `widget`.
    pub fn create(&mut self, widget: impl Widget) -> PanelId {
        self.create_boxed(Box::new(widget))
    }

    /// Add a detached panel driven by a boxed widget.
    pub fn create_boxed(&mut self, widget: Box<dyn Widget>) -> PanelId {
        let id = PanelId::next();
        trace!(id = id.trace(), widget = widget.short_type_name(), "create panel");
        self.nodes.insert(
            id,
            PanelNode {
                parent: None,
                children: Vec::new(),
                state: PanelState::default(),
                widget: Some(widget),
                layout: None,
                sizer: None,
                border: None,
                layout_data: None,
                client_data: AnyMap::new(),
                tooltip: None,
            },
        );
        id
    }

    /// `true` if `id` is in the tree.
    pub fn contains(&self, id: PanelId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of panels in the arena, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` if the arena holds no panels.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Remove `id` and all its descendants from the arena.
    ///
    /// The panel is detached from its parent first. Focus inside the subtree is cleared.
    pub fn dispose(&mut self, id: PanelId) {
        if self.node(id).is_none() {
            return;
        }
        self.remove_from_parent(id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.children);
            }
            if self.focus == Some(current) {
                self.focus = None;
            }
        }
    }

    fn node(&self, id: PanelId) -> Option<&PanelNode> {
        let node = self.nodes.get(&id);
        if node.is_none() {
            debug_panic!("Panel {id} is not in the tree");
        }
        node
    }

    fn node_mut(&mut self, id: PanelId) -> Option<&mut PanelNode> {
        let node = self.nodes.get_mut(&id);
        if node.is_none() {
            debug_panic!("Panel {id} is not in the tree");
        }
        node
    }
}

// --- MARK: HIERARCHY
impl PanelTree {
    /// The parent of `id`, if it's attached.
    pub fn parent(&self, id: PanelId) -> Option<PanelId> {
        self.node(id)?.parent
    }

    /// The children of `id`, front-most first.
    pub fn children(&self, id: PanelId) -> &[PanelId] {
        self.node(id).map_or(&[], |node| &node.children)
    }

    /// The ancestors of `id`, starting with its parent.
    pub fn ancestors(&self, id: PanelId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.nodes.get(&id).and_then(|node| node.parent),
        }
    }

    /// `true` if `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor_of(&self, ancestor: PanelId, id: PanelId) -> bool {
        self.ancestors(id).any(|current| current == ancestor)
    }

    /// The top-most ancestor of `id`, or `id` itself if it's detached.
    pub fn root_of(&self, id: PanelId) -> PanelId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// The position of `child` among the children of `parent`.
    pub fn index_of_child(&self, parent: PanelId, child: PanelId) -> Option<usize> {
        self.children(parent).iter().position(|&current| current == child)
    }

    /// Append `child` to the children of `parent`, detaching it from any prior parent.
    pub fn add_child(&mut self, parent: PanelId, child: PanelId) {
        self.add_child_at_index(parent, child, usize::MAX);
    }

    /// Insert `child` among the children of `parent` at `index`.
    ///
    /// Indices past the end append. Adding a panel under itself or one of its own
    /// descendants is rejected.
    pub fn add_child_at_index(&mut self, parent: PanelId, child: PanelId, index: usize) {
        if self.node(parent).is_none() || self.node(child).is_none() {
            return;
        }
        if parent == child || self.is_ancestor_of(child, parent) {
            debug_panic!("Can't add panel {child} under its own descendant {parent}");
            return;
        }
        self.detach(child);
        let Some(node) = self.nodes.get_mut(&parent) else {
            return;
        };
        let index = index.min(node.children.len());
        node.children.insert(index, child);
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        self.mark_for_layout(parent);
        self.notify_parent_changed(child);
    }

    /// Detach `child` if it is a child of `parent`.
    pub fn remove_child(&mut self, parent: PanelId, child: PanelId) {
        if self.parent(child) == Some(parent) {
            self.remove_from_parent(child);
        }
    }

    /// Detach and return the child of `parent` at `index`.
    ///
    /// Out-of-range indices are ignored.
    pub fn remove_child_at_index(&mut self, parent: PanelId, index: usize) -> Option<PanelId> {
        let child = *self.children(parent).get(index)?;
        self.remove_from_parent(child);
        Some(child)
    }

    /// Detach all children of `parent`.
    pub fn remove_all_children(&mut self, parent: PanelId) {
        let Some(node) = self.node_mut(parent) else {
            return;
        };
        let children = std::mem::take(&mut node.children);
        for &child in &children {
            if let Some(node) = self.nodes.get_mut(&child) {
                node.parent = None;
            }
        }
        self.mark_for_layout(parent);
        for child in children {
            self.notify_parent_changed(child);
        }
    }

    /// Detach `id` from its parent, if it has one.
    pub fn remove_from_parent(&mut self, id: PanelId) {
        if self.detach(id).is_some() {
            self.notify_parent_changed(id);
        }
    }

    /// Move `child` to `index` within its parent's children.
    pub fn move_child_to_index(&mut self, parent: PanelId, child: PanelId, index: usize) {
        let Some(current) = self.index_of_child(parent, child) else {
            return;
        };
        let Some(node) = self.nodes.get_mut(&parent) else {
            return;
        };
        let index = index.min(node.children.len() - 1);
        if current == index {
            return;
        }
        node.children.remove(current);
        node.children.insert(index, child);
        self.mark_for_layout(parent);
        self.notify_parent_changed(child);
    }

    // Unlinks without notifying; returns the former parent.
    fn detach(&mut self, id: PanelId) -> Option<PanelId> {
        let parent = self.nodes.get_mut(&id)?.parent.take()?;
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.retain(|&child| child != id);
        }
        self.mark_for_layout(parent);
        Some(parent)
    }

    fn notify_parent_changed(&mut self, id: PanelId) {
        self.with_widget(id, "on_parent_changed", |widget, tree| {
            widget.on_parent_changed(&mut UpdateCtx::new(tree, id));
        });
    }
}

// --- MARK: ATTRIBUTES
impl PanelTree {
    /// Geometry and flags of `id`.
    pub fn state(&self, id: PanelId) -> Option<&PanelState> {
        self.node(id).map(|node| &node.state)
    }

    /// The frame of `id` in its parent's coordinates.
    pub fn frame_rect(&self, id: PanelId) -> Rect {
        self.node(id).map_or(Rect::ZERO, |node| node.state.frame)
    }

    /// Set the frame of `id`.
    ///
    /// A size change marks the panel as needing layout; a location-only change doesn't.
    /// Either change notifies the panel and then each of its ancestors.
    pub fn set_frame_rect(&mut self, id: PanelId, rect: Rect) {
        let rect = Rect::from_origin_size(
            rect.origin(),
            Size::new(
                rect.width().sanitize("frame width"),
                rect.height().sanitize("frame height"),
            ),
        );
        let Some(node) = self.node_mut(id) else {
            return;
        };
        let old = node.state.frame;
        if old == rect {
            return;
        }
        node.state.frame = rect;
        if old.size() != rect.size() {
            node.state.needs_layout = true;
        }
        self.redraw_requested = true;
        self.with_widget(id, "on_frame_change", |widget, tree| {
            widget.on_frame_change(&mut UpdateCtx::new(tree, id));
        });
        let ancestors: SmallVec<[PanelId; 16]> = self.ancestors(id).collect();
        for ancestor in ancestors {
            self.with_widget(ancestor, "on_frame_change_in_descendant", |widget, tree| {
                widget.on_frame_change_in_descendant(&mut UpdateCtx::new(tree, ancestor), id);
            });
        }
    }

    /// Set only the size of `id`, keeping its location.
    pub fn set_frame_size(&mut self, id: PanelId, size: Size) {
        let origin = self.frame_rect(id).origin();
        self.set_frame_rect(id, Rect::from_origin_size(origin, size));
    }

    /// The content scale of `id`.
    pub fn scale(&self, id: PanelId) -> f64 {
        self.node(id).map_or(1., |node| node.state.scale)
    }

    /// Set the content scale of `id`. The scale must be positive and finite.
    pub fn set_scale(&mut self, id: PanelId, scale: f64) {
        if !(scale.is_finite() && scale > 0.) {
            debug_panic!("Panel scale must be positive and finite. Received: {scale}");
            return;
        }
        if let Some(node) = self.node_mut(id) {
            if node.state.scale != scale {
                node.state.scale = scale;
                self.mark_for_layout(id);
            }
        }
    }

    /// `true` if `id` is hidden.
    pub fn is_hidden(&self, id: PanelId) -> bool {
        self.node(id).is_some_and(|node| node.state.hidden)
    }

    /// Hide or show `id`.
    pub fn set_hidden(&mut self, id: PanelId, hidden: bool) {
        if let Some(node) = self.node_mut(id) {
            if node.state.hidden != hidden {
                node.state.hidden = hidden;
                self.mark_for_layout(id);
            }
        }
    }

    /// `true` unless `id` is disabled.
    pub fn is_enabled(&self, id: PanelId) -> bool {
        self.node(id).is_some_and(|node| !node.state.disabled)
    }

    /// Enable or disable `id`.
    pub fn set_enabled(&mut self, id: PanelId, enabled: bool) {
        if let Some(node) = self.node_mut(id) {
            if node.state.disabled == enabled {
                node.state.disabled = !enabled;
                self.redraw_requested = true;
            }
        }
    }

    /// Mark `id` as wanting keyboard focus.
    pub fn set_focusable(&mut self, id: PanelId, focusable: bool) {
        if let Some(node) = self.node_mut(id) {
            node.state.focusable = focusable;
        }
    }

    /// `true` if `id` can take focus right now: focusable, enabled and not hidden.
    pub fn is_focusable(&self, id: PanelId) -> bool {
        self.nodes.get(&id).is_some_and(|node| {
            node.state.focusable && !node.state.disabled && !node.state.hidden
        })
    }

    /// `true` if `id` or one of its ancestors still needs layout.
    pub fn needs_layout(&self, id: PanelId) -> bool {
        self.node(id).is_some_and(|node| node.state.needs_layout)
    }

    /// Set the needs-layout flag on `id` and all its ancestors, and request a redraw.
    pub fn mark_for_layout(&mut self, id: PanelId) {
        let mut next = Some(id);
        while let Some(current) = next {
            let Some(node) = self.nodes.get_mut(&current) else {
                break;
            };
            node.state.needs_layout = true;
            next = node.parent;
        }
        self.redraw_requested = true;
    }

    /// Request a repaint of the window `id` belongs to.
    pub fn mark_for_redraw(&mut self, _id: PanelId) {
        self.redraw_requested = true;
    }

    /// Return and clear the pending redraw request.
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    /// Install or remove the border of `id`.
    pub fn set_border(&mut self, id: PanelId, border: Option<Box<dyn Border>>) {
        if let Some(node) = self.node_mut(id) {
            node.border = border;
            self.mark_for_layout(id);
        }
    }

    /// The border insets of `id`, or zero if it has no border.
    pub fn insets(&self, id: PanelId) -> Insets {
        self.node(id)
            .and_then(|node| node.border.as_ref())
            .map_or(Insets::ZERO, |border| border.insets())
    }

    /// Install or remove the layout of `id`.
    pub fn set_layout(&mut self, id: PanelId, layout: Option<Box<dyn Layout>>) {
        if let Some(node) = self.node_mut(id) {
            node.layout = layout;
            self.mark_for_layout(id);
        }
    }

    /// `true` if `id` has a layout installed.
    pub fn has_layout(&self, id: PanelId) -> bool {
        self.node(id).is_some_and(|node| node.layout.is_some())
    }

    /// Install or remove the sizer of `id`.
    pub fn set_sizer(&mut self, id: PanelId, sizer: Option<Sizer>) {
        if let Some(node) = self.node_mut(id) {
            node.sizer = sizer;
            self.mark_for_layout(id);
        }
    }

    /// Attach data read by the layout of the parent of `id`.
    pub fn set_layout_data(&mut self, id: PanelId, data: impl Any) {
        if let Some(node) = self.node_mut(id) {
            node.layout_data = Some(Box::new(data));
            self.mark_for_layout(id);
        }
    }

    /// Remove the layout data of `id`.
    pub fn clear_layout_data(&mut self, id: PanelId) {
        if let Some(node) = self.node_mut(id) {
            node.layout_data = None;
            self.mark_for_layout(id);
        }
    }

    /// The layout data of `id`, if it has type `T`.
    pub fn layout_data<T: Any>(&self, id: PanelId) -> Option<&T> {
        self.node(id)?.layout_data.as_ref()?.downcast_ref()
    }

    /// Store a value of type `T` on `id`, replacing any previous one.
    pub fn set_client_data<T: Any>(&mut self, id: PanelId, value: T) {
        if let Some(node) = self.node_mut(id) {
            node.client_data.insert(value);
        }
    }

    /// The value of type `T` stored on `id`.
    pub fn client_data<T: Any>(&self, id: PanelId) -> Option<&T> {
        self.node(id)?.client_data.get::<T>()
    }

    /// Remove and return the value of type `T` stored on `id`.
    pub fn remove_client_data<T: Any>(&mut self, id: PanelId) -> Option<T> {
        self.node_mut(id)?.client_data.remove::<T>()
    }

    /// Assign or clear the tooltip of `id`.
    pub fn set_tooltip(&mut self, id: PanelId, tooltip: Option<Tooltip>) {
        if let Some(node) = self.node_mut(id) {
            node.tooltip = tooltip;
        }
    }

    /// The tooltip assigned to `id`.
    pub fn tooltip(&self, id: PanelId) -> Option<Tooltip> {
        self.node(id)?.tooltip
    }

    /// The panel holding keyboard focus.
    pub fn focus(&self) -> Option<PanelId> {
        self.focus
    }

    pub(crate) fn set_focus_pointer(&mut self, focus: Option<PanelId>) {
        self.focus = focus;
        self.redraw_requested = true;
    }
}

// --- MARK: WIDGETS
impl PanelTree {
    /// Run `f` with the widget of `id` and the rest of the tree.
    ///
    /// The widget is taken out of its slot while `f` runs, behind the tree's
    /// recovery boundary. Returns `None` if `f` panicked, the panel doesn't exist,
    /// or the widget is already in use further up the stack.
    pub fn with_widget<R>(
        &mut self,
        id: PanelId,
        callback: &'static str,
        f: impl FnOnce(&mut dyn Widget, &mut Self) -> R,
    ) -> Option<R> {
        let Some(mut widget) = self.nodes.get_mut(&id)?.widget.take() else {
            trace!(id = id.trace(), callback, "widget is busy, skipping re-entrant call");
            return None;
        };
        let recovery = self.recovery.clone();
        let result = recovery.run(callback, || f(widget.as_mut(), self));
        if let Some(node) = self.nodes.get_mut(&id) {
            node.widget = Some(widget);
        }
        result
    }

    /// The widget of `id`, if it has type `W`.
    pub fn widget<W: Widget>(&self, id: PanelId) -> Option<&W> {
        let widget: &dyn Any = self.nodes.get(&id)?.widget.as_deref()?;
        widget.downcast_ref()
    }

    /// The widget of `id` mutably, if it has type `W`.
    pub fn widget_mut<W: Widget>(&mut self, id: PanelId) -> Option<&mut W> {
        let widget: &mut dyn Any = self.nodes.get_mut(&id)?.widget.as_deref_mut()?;
        widget.downcast_mut()
    }
}

// --- MARK: GEOMETRY
impl PanelTree {
    /// The bounds of `id` in its own coordinates, after applying its scale.
    pub fn local_bounds(&self, id: PanelId) -> Rect {
        let Some(node) = self.node(id) else {
            return Rect::ZERO;
        };
        let size = node.state.frame.size();
        let scale = node.state.scale;
        Rect::from_origin_size(Point::ORIGIN, Size::new(size.width / scale, size.height / scale))
    }

    /// The local bounds of `id` minus its border insets.
    pub fn content_rect(&self, id: PanelId) -> Rect {
        let rect = self.local_bounds(id) - self.insets(id);
        Rect::from_origin_size(
            rect.origin(),
            Size::new(rect.width().max(0.), rect.height().max(0.)),
        )
    }

    /// The minimum, preferred and maximum sizes of `id` for `hint`.
    ///
    /// Delegates to the layout if there is one, else to the sizer, else
    /// returns [`Sizes::default`]. A zero axis in `hint` means unconstrained.
    /// The hint is divided by the panel's scale on the way in and the result
    /// multiplied by it on the way out.
    pub fn sizes(&mut self, id: PanelId, hint: Size) -> Sizes {
        let recovery = self.recovery.clone();
        let Some(node) = self.node_mut(id) else {
            return Sizes::default();
        };
        let scale = node.state.scale;
        let local_hint = unscale_hint(hint, scale);
        let layout = node.layout.take();
        let sizer = node.sizer.clone();
        let sizes = if let Some(mut layout) = layout {
            let sizes = recovery.run("layout_sizes", || layout.layout_sizes(self, id, local_hint));
            if let Some(node) = self.nodes.get_mut(&id) {
                node.layout = Some(layout);
            }
            sizes.unwrap_or_default()
        } else if let Some(sizer) = sizer {
            recovery.run("sizer", || sizer(local_hint)).unwrap_or_default()
        } else {
            Sizes::default()
        };
        sizes.scaled(scale)
    }

    /// The preferred size of `id` with no constraint.
    pub fn preferred_size(&mut self, id: PanelId) -> Size {
        self.sizes(id, Size::ZERO).pref
    }

    /// Set the frame of `id` to its preferred size, keeping its location.
    pub fn pack(&mut self, id: PanelId) {
        let size = self.preferred_size(id);
        self.set_frame_size(id, size);
    }

    /// Run pending layouts in the subtree of `id`.
    ///
    /// Each panel flagged as needing layout runs its layout and has the flag cleared.
    /// Children are always visited, since a child can need layout on its own.
    pub fn validate_layout(&mut self, id: PanelId) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        if node.state.needs_layout {
            if let Some(mut layout) = node.layout.take() {
                let _span = trace_span!("perform_layout", id = id.trace()).entered();
                let recovery = self.recovery.clone();
                recovery.run("perform_layout", || layout.perform_layout(self, id));
                if let Some(node) = self.nodes.get_mut(&id) {
                    node.layout = Some(layout);
                }
            }
            self.redraw_requested = true;
            if let Some(node) = self.nodes.get_mut(&id) {
                node.state.needs_layout = false;
            }
        }
        let children: SmallVec<[PanelId; 16]> = self.children(id).iter().copied().collect();
        for child in children {
            self.validate_layout(child);
        }
    }

    /// The deepest visible panel under `point`, which is in the local coordinates of `id`.
    ///
    /// Children are tested front-most first; if none contains the point, `id` itself is the hit.
    pub fn panel_at(&self, id: PanelId, point: Point) -> PanelId {
        let mut current = id;
        let mut point = point;
        'descend: loop {
            for &child in self.children(current) {
                let Some(node) = self.nodes.get(&child) else {
                    continue;
                };
                if node.state.hidden {
                    continue;
                }
                let frame = node.state.frame;
                if frame.contains(point) {
                    point = ((point - frame.origin()) / node.state.scale).to_point();
                    current = child;
                    continue 'descend;
                }
            }
            return current;
        }
    }

    /// Convert `point` from the local coordinates of `id` to those of its root.
    pub fn point_to_root(&self, id: PanelId, point: Point) -> Point {
        let mut point = point;
        let mut current = id;
        while let Some(node) = self.nodes.get(&current) {
            let Some(parent) = node.parent else {
                break;
            };
            point = (point.to_vec2() * node.state.scale + node.state.frame.origin().to_vec2())
                .to_point();
            current = parent;
        }
        point
    }

    /// Convert `point` from the local coordinates of the root of `id` to those of `id`.
    pub fn point_from_root(&self, id: PanelId, point: Point) -> Point {
        let mut chain: SmallVec<[PanelId; 16]> = SmallVec::new();
        let mut current = id;
        while let Some(node) = self.nodes.get(&current) {
            let Some(parent) = node.parent else {
                break;
            };
            chain.push(current);
            current = parent;
        }
        let mut point = point;
        for panel in chain.iter().rev() {
            if let Some(node) = self.nodes.get(panel) {
                let state = &node.state;
                point = ((point - state.frame.origin()) / state.scale).to_point();
            }
        }
        point
    }

    /// Convert `rect` from the local coordinates of `id` to those of its root.
    pub fn rect_to_root(&self, id: PanelId, rect: Rect) -> Rect {
        Rect::from_points(
            self.point_to_root(id, rect.origin()),
            self.point_to_root(id, Point::new(rect.x1, rect.y1)),
        )
    }

    /// Focusable panels in the subtree of `root`, in depth-first pre-order.
    ///
    /// Hidden subtrees are skipped.
    pub fn focusables(&self, root: PanelId) -> Vec<PanelId> {
        let mut result = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            if node.state.hidden {
                continue;
            }
            if self.is_focusable(id) {
                result.push(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        result
    }

    /// The first focusable panel in the subtree of `id`, including `id` itself.
    pub fn first_focusable(&self, id: PanelId) -> Option<PanelId> {
        if self.is_focusable(id) {
            return Some(id);
        }
        self.focusables(id).first().copied()
    }
}

// --- MARK: DRAW
impl PanelTree {
    /// Draw `id` and its subtree.
    ///
    /// The canvas origin must be at the top-left corner of the panel's frame, and
    /// `dirty` is in the same unscaled coordinates. Children are drawn back to front,
    /// so the first child ends up on top; the border and the widget's
    /// [`draw_over`](Widget::draw_over) come last.
    pub fn draw(&mut self, id: PanelId, canvas: &mut dyn Canvas, dirty: Rect) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        if node.state.hidden {
            return;
        }
        let scale = node.state.scale;
        let frame_bounds = Rect::from_origin_size(Point::ORIGIN, node.state.frame.size());
        let dirty = dirty.intersect(frame_bounds);
        if dirty.area() <= 0. {
            return;
        }
        let bounds = self.local_bounds(id);
        let dirty = dirty.scale_from_origin(1. / scale);

        canvas.save();
        if scale != 1. {
            canvas.scale(scale);
        }
        canvas.clip_rect(dirty);
        self.with_widget(id, "draw", |widget, tree| {
            widget.draw(&mut DrawCtx::new(tree, id), canvas, dirty);
        });

        let children: SmallVec<[PanelId; 16]> = self.children(id).iter().copied().collect();
        for &child in children.iter().rev() {
            let origin = self.frame_rect(child).origin().to_vec2();
            canvas.save();
            canvas.translate(origin);
            self.draw(child, canvas, dirty - origin);
            canvas.restore();
        }

        if let Some(border) = self.nodes.get(&id).and_then(|node| node.border.as_ref()) {
            border.draw(canvas, bounds);
        }
        self.with_widget(id, "draw_over", |widget, tree| {
            widget.draw_over(&mut DrawCtx::new(tree, id), canvas, dirty);
        });
        canvas.restore();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use kurbo::{BezPath, Vec2};
    use peniko::Brush;

    use super::*;
    use crate::core::FontDescriptor;

    #[derive(Default)]
    struct Logged {
        log: Rc<RefCell<Vec<String>>>,
        name: &'static str,
    }

    impl Logged {
        fn named(name: &'static str, log: &Rc<RefCell<Vec<String>>>) -> Self {
            Self {
                log: log.clone(),
                name,
            }
        }
    }

    impl Widget for Logged {
        fn draw(&mut self, _ctx: &mut DrawCtx<'_>, _canvas: &mut dyn Canvas, _dirty: Rect) {
            self.log.borrow_mut().push(format!("draw {}", self.name));
        }

        fn on_parent_changed(&mut self, ctx: &mut UpdateCtx<'_>) {
            let parent = ctx.tree().parent(ctx.id()).map(|id| id.to_raw());
            self.log
                .borrow_mut()
                .push(format!("{} parent {parent:?}", self.name));
        }

        fn on_frame_change(&mut self, _ctx: &mut UpdateCtx<'_>) {
            self.log.borrow_mut().push(format!("{} frame", self.name));
        }

        fn on_frame_change_in_descendant(&mut self, _ctx: &mut UpdateCtx<'_>, _descendant: PanelId) {
            self.log.borrow_mut().push(format!("{} descendant frame", self.name));
        }
    }

    struct NullCanvas;

    impl Canvas for NullCanvas {
        fn save(&mut self) {}
        fn restore(&mut self) {}
        fn clip_rect(&mut self, _rect: Rect) {}
        fn translate(&mut self, _offset: Vec2) {}
        fn scale(&mut self, _scale: f64) {}
        fn fill_path(&mut self, _path: &BezPath, _ink: &Brush) {}
        fn stroke_path(&mut self, _path: &BezPath, _width: f64, _ink: &Brush) {}
        fn draw_text(&mut self, _text: &str, _font: &FontDescriptor, _baseline: Point, _ink: &Brush) {}
    }

    struct StackLayout {
        runs: Rc<RefCell<u32>>,
    }

    impl Layout for StackLayout {
        fn layout_sizes(&mut self, tree: &mut PanelTree, target: PanelId, hint: Size) -> Sizes {
            let children: Vec<_> = tree.children(target).to_vec();
            let mut pref = Size::ZERO;
            for child in children {
                let sizes = tree.sizes(child, hint);
                pref.width = pref.width.max(sizes.pref.width);
                pref.height += sizes.pref.height;
            }
            Sizes::new(pref, pref, pref)
        }

        fn perform_layout(&mut self, tree: &mut PanelTree, target: PanelId) {
            *self.runs.borrow_mut() += 1;
            let width = tree.content_rect(target).width();
            let mut y = 0.;
            for child in tree.children(target).to_vec() {
                let height = tree.sizes(child, Size::ZERO).pref.height;
                tree.set_frame_rect(child, Rect::new(0., y, width, y + height));
                y += height;
            }
        }
    }

    fn fixed(size: Size) -> Option<Sizer> {
        Some(Rc::new(move |_: Size| Sizes::fixed(size)))
    }

    #[test]
    fn add_child_detaches_from_previous_parent() {
        let log = Rc::default();
        let mut tree = PanelTree::new();
        let a = tree.create(Logged::named("a", &log));
        let b = tree.create(Logged::named("b", &log));
        let child = tree.create(Logged::named("child", &log));

        tree.add_child(a, child);
        tree.add_child(b, child);

        assert_eq!(tree.parent(child), Some(b));
        assert!(tree.children(a).is_empty());
        assert_eq!(tree.children(b), &[child]);
    }

    #[test]
    fn ancestors_walk_up_to_the_root() {
        let mut tree = PanelTree::new();
        let root = tree.create(Logged::default());
        let middle = tree.create(Logged::default());
        let leaf = tree.create(Logged::default());
        tree.add_child(root, middle);
        tree.add_child(middle, leaf);

        let ancestors = tree.ancestors(leaf);
        assert!(format!("{ancestors:?}").starts_with("Ancestors"));
        assert_eq!(ancestors.collect::<Vec<_>>(), vec![middle, root]);
        assert!(tree.is_ancestor_of(root, leaf));
        assert_eq!(tree.root_of(leaf), root);
    }

    #[test]
    fn parent_changed_runs_after_tree_update() {
        let log: Rc<RefCell<Vec<String>>> = Rc::default();
        let mut tree = PanelTree::new();
        let parent = tree.create(Logged::named("parent", &log));
        let child = tree.create(Logged::named("child", &log));

        tree.add_child(parent, child);
        tree.remove_child(parent, child);

        assert_eq!(
            *log.borrow(),
            vec![
                format!("child parent {:?}", Some(parent.to_raw())),
                "child parent None".to_string(),
            ]
        );
    }

    #[test]
    fn add_child_at_index_inserts_and_clamps() {
        let mut tree = PanelTree::new();
        let parent = tree.create(Logged::default());
        let a = tree.create(Logged::default());
        let b = tree.create(Logged::default());
        let c = tree.create(Logged::default());

        tree.add_child(parent, a);
        tree.add_child_at_index(parent, b, 0);
        tree.add_child_at_index(parent, c, 99);
        assert_eq!(tree.children(parent), &[b, a, c]);

        tree.move_child_to_index(parent, c, 0);
        assert_eq!(tree.children(parent), &[c, b, a]);
        assert_eq!(tree.index_of_child(parent, a), Some(2));
    }

    #[test]
    #[should_panic(expected = "own descendant")]
    fn cannot_add_ancestor_under_descendant() {
        let mut tree = PanelTree::new();
        let root = tree.create(Logged::default());
        let child = tree.create(Logged::default());
        tree.add_child(root, child);
        tree.add_child(child, root);
    }

    #[test]
    fn remove_child_at_index_ignores_out_of_range() {
        let mut tree = PanelTree::new();
        let parent = tree.create(Logged::default());
        let child = tree.create(Logged::default());
        tree.add_child(parent, child);

        assert_eq!(tree.remove_child_at_index(parent, 3), None);
        assert_eq!(tree.remove_child_at_index(parent, 0), Some(child));
        assert_eq!(tree.parent(child), None);
    }

    #[test]
    fn removal_marks_former_parent_for_layout() {
        let mut tree = PanelTree::new();
        let root = tree.create(Logged::default());
        let parent = tree.create(Logged::default());
        let child = tree.create(Logged::default());
        tree.add_child(root, parent);
        tree.add_child(parent, child);
        tree.validate_layout(root);
        assert!(!tree.needs_layout(root));

        tree.remove_all_children(parent);

        assert!(tree.needs_layout(parent));
        assert!(tree.needs_layout(root));
        assert_eq!(tree.parent(child), None);
    }

    #[test]
    fn location_change_keeps_layout_clean() {
        let log: Rc<RefCell<Vec<String>>> = Rc::default();
        let mut tree = PanelTree::new();
        let parent = tree.create(Logged::named("parent", &log));
        let child = tree.create(Logged::named("child", &log));
        tree.add_child(parent, child);
        tree.set_frame_rect(child, Rect::new(0., 0., 10., 10.));
        tree.validate_layout(parent);
        log.borrow_mut().clear();

        tree.set_frame_rect(child, Rect::new(5., 5., 15., 15.));
        assert!(!tree.needs_layout(child));
        assert_eq!(*log.borrow(), vec!["child frame", "parent descendant frame"]);

        tree.set_frame_rect(child, Rect::new(5., 5., 25., 15.));
        assert!(tree.needs_layout(child));
    }

    #[test]
    fn sizes_fall_back_to_sizer_then_default() {
        let mut tree = PanelTree::new();
        let plain = tree.create(Logged::default());
        assert_eq!(tree.sizes(plain, Size::ZERO), Sizes::default());

        let sized = tree.create(Logged::default());
        tree.set_sizer(sized, fixed(Size::new(20., 10.)));
        tree.set_scale(sized, 2.);
        let sizes = tree.sizes(sized, Size::ZERO);
        assert_eq!(sizes.pref, Size::new(40., 20.));
    }

    #[test]
    fn sizer_sees_unscaled_hint() {
        let mut tree = PanelTree::new();
        let id = tree.create(Logged::default());
        let seen = Rc::new(RefCell::new(Size::ZERO));
        let seen_in_sizer = seen.clone();
        tree.set_sizer(
            id,
            Some(Rc::new(move |hint: Size| {
                *seen_in_sizer.borrow_mut() = hint;
                Sizes::default()
            })),
        );
        tree.set_scale(id, 2.);
        tree.sizes(id, Size::new(100., 0.));
        assert_eq!(*seen.borrow(), Size::new(50., 0.));
    }

    #[test]
    fn validate_layout_recurses_into_clean_parents() {
        let runs = Rc::new(RefCell::new(0));
        let mut tree = PanelTree::new();
        let root = tree.create(Logged::default());
        let inner = tree.create(Logged::default());
        let leaf = tree.create(Logged::default());
        tree.add_child(root, inner);
        tree.add_child(inner, leaf);
        tree.set_layout(inner, Some(Box::new(StackLayout { runs: runs.clone() })));
        tree.set_sizer(leaf, fixed(Size::new(10., 10.)));
        tree.set_frame_rect(root, Rect::new(0., 0., 100., 100.));
        tree.set_frame_rect(inner, Rect::new(0., 0., 50., 50.));
        tree.validate_layout(root);
        assert_eq!(*runs.borrow(), 1);
        assert_eq!(tree.frame_rect(leaf), Rect::new(0., 0., 50., 10.));

        // Only the inner panel is dirty, its clean parent must still be walked.
        tree.set_frame_size(inner, Size::new(60., 50.));
        assert!(!tree.needs_layout(root));
        tree.validate_layout(root);
        assert_eq!(*runs.borrow(), 2);
        assert_eq!(tree.frame_rect(leaf).width(), 60.);
    }

    #[test]
    fn hit_test_returns_innermost_panel() {
        let mut tree = PanelTree::new();
        let root = tree.create(Logged::default());
        let child = tree.create(Logged::default());
        let grandchild = tree.create(Logged::default());
        tree.add_child(root, child);
        tree.add_child(child, grandchild);
        tree.set_frame_rect(root, Rect::new(0., 0., 100., 100.));
        tree.set_frame_rect(child, Rect::new(10., 10., 60., 60.));
        tree.set_frame_rect(grandchild, Rect::new(0., 0., 10., 10.));

        assert_eq!(tree.panel_at(root, Point::new(5., 5.)), root);
        assert_eq!(tree.panel_at(root, Point::new(30., 30.)), child);
        assert_eq!(tree.panel_at(root, Point::new(12., 12.)), grandchild);

        tree.set_hidden(child, true);
        assert_eq!(tree.panel_at(root, Point::new(12., 12.)), root);
    }

    #[test]
    fn hit_test_honours_scale() {
        let mut tree = PanelTree::new();
        let root = tree.create(Logged::default());
        let zoomed = tree.create(Logged::default());
        let inner = tree.create(Logged::default());
        tree.add_child(root, zoomed);
        tree.add_child(zoomed, inner);
        tree.set_frame_rect(zoomed, Rect::new(0., 0., 100., 100.));
        tree.set_scale(zoomed, 2.);
        tree.set_frame_rect(inner, Rect::new(20., 20., 30., 30.));

        assert_eq!(tree.panel_at(root, Point::new(50., 50.)), inner);
        assert_eq!(tree.panel_at(root, Point::new(30., 30.)), zoomed);
        assert_eq!(tree.point_to_root(inner, Point::ORIGIN), Point::new(40., 40.));
        assert_eq!(tree.point_from_root(inner, Point::new(50., 50.)), Point::new(5., 5.));
    }

    #[test]
    fn first_child_is_drawn_last() {
        let log: Rc<RefCell<Vec<String>>> = Rc::default();
        let mut tree = PanelTree::new();
        let root = tree.create(Logged::named("root", &log));
        let front = tree.create(Logged::named("front", &log));
        let back = tree.create(Logged::named("back", &log));
        let hidden = tree.create(Logged::named("hidden", &log));
        tree.add_child(root, front);
        tree.add_child(root, back);
        tree.add_child(root, hidden);
        for id in [root, front, back, hidden] {
            tree.set_frame_rect(id, Rect::new(0., 0., 10., 10.));
        }
        tree.set_hidden(hidden, true);
        log.borrow_mut().clear();

        tree.draw(root, &mut NullCanvas, Rect::new(0., 0., 10., 10.));

        assert_eq!(*log.borrow(), vec!["draw root", "draw back", "draw front"]);
        assert_eq!(tree.panel_at(root, Point::new(5., 5.)), front);
    }

    #[test]
    fn focusables_skip_hidden_and_disabled() {
        let mut tree = PanelTree::new();
        let root = tree.create(Logged::default());
        let a = tree.create(Logged::default());
        let b = tree.create(Logged::default());
        let nested = tree.create(Logged::default());
        let c = tree.create(Logged::default());
        tree.add_child(root, a);
        tree.add_child(root, b);
        tree.add_child(b, nested);
        tree.add_child(root, c);
        for id in [a, nested, c] {
            tree.set_focusable(id, true);
        }
        assert_eq!(tree.focusables(root), vec![a, nested, c]);

        tree.set_hidden(b, true);
        tree.set_enabled(c, false);
        assert_eq!(tree.focusables(root), vec![a]);
        assert_eq!(tree.first_focusable(b), None);
    }

    #[test]
    fn dispose_drops_subtree_and_focus() {
        let mut tree = PanelTree::new();
        let root = tree.create(Logged::default());
        let child = tree.create(Logged::default());
        let grandchild = tree.create(Logged::default());
        tree.add_child(root, child);
        tree.add_child(child, grandchild);
        tree.set_focus_pointer(Some(grandchild));

        tree.dispose(child);

        assert!(!tree.contains(child));
        assert!(!tree.contains(grandchild));
        assert!(tree.children(root).is_empty());
        assert_eq!(tree.focus(), None);
    }

    #[test]
    fn client_data_is_typed() {
        let mut tree = PanelTree::new();
        let id = tree.create(Logged::default());
        tree.set_client_data(id, 7_u32);
        tree.set_client_data(id, "name");
        assert_eq!(tree.client_data::<u32>(id), Some(&7));
        assert_eq!(tree.remove_client_data::<&str>(id), Some("name"));
        assert_eq!(tree.client_data::<&str>(id), None);
    }

    #[test]
    fn widget_downcast() {
        let mut tree = PanelTree::new();
        let id = tree.create(Logged::named("logged", &Rc::default()));
        assert_eq!(tree.widget::<Logged>(id).map(|logged| logged.name), Some("logged"));
    }
}
