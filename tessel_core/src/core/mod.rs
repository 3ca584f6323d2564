// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

//! Basic types and traits Tessel is built on.

mod border;
mod canvas;
mod contexts;
mod drag;
mod events;
mod font;
mod panel_id;
mod panel_tree;
mod sizes;
mod widget;

pub use border::{Border, CompoundBorder, EmptyBorder, LineBorder};
pub use canvas::{Canvas, GlyphRun, SceneCanvas, TextShaper};
pub use contexts::{DrawCtx, EventCtx, UpdateCtx};
pub use drag::{DragData, Drawable};
pub use events::{Handled, InputEvent, KeyEvent, MouseEvent, WheelEvent};
pub use font::{FontDescriptor, FontMetrics, TextExtents};
pub use panel_id::PanelId;
pub use panel_tree::{Ancestors, PanelState, PanelTree, Sizer, Tooltip};
pub use sizes::{MAX_SIZE, Sizes, max_size};
pub use widget::Widget;

pub use cursor_icon::CursorIcon;
pub use ui_events::keyboard::{Key, Modifiers, NamedKey};
pub use ui_events::pointer::PointerButton;

pub(crate) use contexts::WindowRequests;
