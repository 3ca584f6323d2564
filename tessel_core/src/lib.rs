// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

//! Tessel Core provides the retained-mode engine underneath Tessel's widgets.
//!
//! It contains:
//!
//! - The [panel tree][core::PanelTree]: an arena of panels with single-parent ownership,
//!   frame geometry, borders, sizers, layouts and per-panel [`Widget`][core::Widget] hooks.
//! - The [layout contract][layout::Layout] and the [flexible grid layout][layout::FlexLayout],
//!   which supports column/row spanning, per-cell alignment and grab/expand distribution.
//! - [`Window`][app::Window], the unit of event dispatch: hit-testing, bubbling,
//!   focus traversal, data drag and drop, and tooltip sequencing.
//! - The [`TaskQueue`][app::TaskQueue], the only thread-safe way to schedule
//!   work onto the UI thread, and the [`App`][app::App] that drains it one task per tick.
//!
//! Rendering, font shaping and OS windowing are collaborators reached through the
//! [`Canvas`][core::Canvas], [`FontMetrics`][core::FontMetrics],
//! [`NativeWindow`][app::NativeWindow] and [`Platform`][app::Platform] traits.
//! Tessel Winit implements the windowing side on top of `winit`, and Tessel Testing
//! provides headless versions of all of them.
//!
//! # Threading
//!
//! Everything except [`TaskQueue::invoke`][app::TaskQueue::invoke] and
//! [`TaskQueue::invoke_after`][app::TaskQueue::invoke_after] must run on the UI thread.
//! Callbacks run to completion; a panicking callback is caught and reported through
//! [`Recovery`][app::Recovery] instead of unwinding through the event loop.

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use cursor_icon;
pub use ui_events;
pub use {kurbo, peniko, vello};

#[macro_use]
pub mod util;

pub mod app;
pub mod core;
pub mod layout;
pub mod widgets;
