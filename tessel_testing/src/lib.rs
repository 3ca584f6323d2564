// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

//! Headless runner for testing [Tessel](tessel_core) panels and windows.
//!
//! The primary type from this crate is [`TestHarness`], which hosts panels in a
//! window with no OS behind it.
//!
//! The testing harness can:
//!
//! - Simulate mouse movement, clicks, scrolling, key presses, typed text and file drops.
//! - Control the flow of time, so delayed tasks such as tooltips and click flashes
//!   run exactly when the test says so.
//! - Record what a window draws, with [`RecordingCanvas`].
//!
//! The collaborators it uses are public too: [`HeadlessPlatform`] and
//! [`HeadlessWindow`] stand in for the OS, [`FixedMetrics`] measures text with a fixed
//! advance per character, and [`ManualClock`] replaces the system clock.
//! [`Recorder`] wraps any widget and logs the hooks called on it.

// LINEBENDER LINT SET - lib.rs - v3
// See https://linebender.org/wiki/canonical-lints/
// These lints shouldn't apply to examples or tests.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
// These lints shouldn't apply to examples.
#![warn(clippy::print_stdout, clippy::print_stderr)]
// Targeting e.g. 32-bit means structs containing usize can give false positives for 64-bit.
#![cfg_attr(target_pointer_width = "64", warn(clippy::trivially_copy_pass_by_ref))]
// END LINEBENDER LINT SET

mod assert_debug_panics;
mod fixed_metrics;
mod harness;
mod headless;
mod recorder_widget;
mod recording_canvas;

pub use assert_debug_panics::assert_debug_panics_inner;
pub use fixed_metrics::{FixedMetrics, ManualClock};
pub use harness::TestHarness;
pub use headless::{HeadlessHandle, HeadlessPlatform, HeadlessState, HeadlessWindow};
pub use recorder_widget::{Record, Recorder, Recording};
pub use recording_canvas::{DrawOp, RecordingCanvas};

use tessel_core::core::Widget;

/// External trait implemented for all widgets.
///
/// Implements helper methods useful for unit testing.
pub trait TestWidgetExt: Widget + Sized + 'static {
    /// Wrap this widget in a [`Recorder`] that logs into `recording`.
    fn record(self, recording: &Recording) -> Recorder<Self> {
        Recorder::new(self, recording)
    }
}

impl<W: Widget + 'static> TestWidgetExt for W {}
