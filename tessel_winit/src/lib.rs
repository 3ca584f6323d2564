// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

//! Tessel Winit runs [Tessel](tessel_core) windows on top of [winit], rendering them with Vello.
//!
//! It provides the OS side of Tessel's collaborators: [`WinitPlatform`](app::WinitPlatform)
//! opens native windows, [`WinitWindow`](app::WinitWindow) implements
//! [`NativeWindow`](tessel_core::app::NativeWindow), and the event loop translates winit's
//! input into [`InputEvent`](tessel_core::core::InputEvent)s, ticks the task queue and
//! sleeps until the next delayed task is due.
//!
//! ## Example
//!
//! ```
//! use std::rc::Rc;
//!
//! use tessel_core::app::WindowOptions;
//! use tessel_core::kurbo::Size;
//! use tessel_core::widgets::Label;
//! use tessel_winit::EstimatedMetrics;
//! use tessel_winit::app::{AppDriver, DriverCtx, EventLoop};
//!
//! struct Hello;
//!
//! impl AppDriver for Hello {
//!     fn on_start(&mut self, ctx: &mut DriverCtx<'_>) {
//!         let options = WindowOptions::new("Hello").with_size(Size::new(320., 200.));
//!         let Ok(id) = ctx.open_window(options) else {
//!             ctx.exit();
//!             return;
//!         };
//!         let Some(window) = ctx.app_mut().window_mut(id) else {
//!             return;
//!         };
//!         let metrics = Rc::new(EstimatedMetrics::default());
//!         let label = Label::new("Hello, Tessel!", metrics).create(window.tree_mut());
//!         window.set_content(label);
//!         window.show();
//!     }
//! }
//!
//! fn main() {
//!     # return;
//!     tessel_winit::app::run(EventLoop::with_user_event(), Hello).unwrap();
//! }
//! ```
//!
//! Text is measured by whatever [`FontMetrics`](tessel_core::core::FontMetrics) the widgets
//! were given, and only drawn once the driver provides a
//! [`TextShaper`](tessel_core::core::TextShaper).
//!
//! [winit]: https://crates.io/crates/winit

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET
#![expect(
    clippy::needless_doctest_main,
    reason = "The doctest for lib.rs should have a main function"
)]

pub use tessel_core;
pub use winit;

mod app_driver;
mod convert_winit_event;
mod event_loop_runner;
mod metrics;
mod native;
mod vello_util;

pub use metrics::EstimatedMetrics;

/// Types needed for running a Tessel app.
pub mod app {
    pub use crate::app_driver::{AppDriver, DriverCtx};
    pub use crate::event_loop_runner::{
        EventLoop, EventLoopBuilder, EventLoopProxy, TesselState, TesselUserEvent, run, run_with,
    };
    pub use crate::native::{WinitPlatform, WinitWindow};
}
