// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

use tessel_core::app::{App, Platform, WindowError, WindowId, WindowOptions};
use tessel_core::core::TextShaper;
use winit::event_loop::ActiveEventLoop;

use crate::app::{TesselState, WinitPlatform};

/// Context for the [`AppDriver`] trait.
pub struct DriverCtx<'a> {
    state: &'a mut TesselState,
    event_loop: &'a ActiveEventLoop,
}

impl std::fmt::Debug for DriverCtx<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverCtx")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<'a> DriverCtx<'a> {
    pub(crate) fn new(state: &'a mut TesselState, event_loop: &'a ActiveEventLoop) -> Self {
        Self { state, event_loop }
    }
}

/// A trait for defining how your app is set up and torn down.
///
/// Everything that happens in between goes through panel hooks and tasks;
/// the driver only sees the moments that involve the OS.
#[expect(unused_variables, reason = "Default impls doesn't use arguments")]
pub trait AppDriver {
    /// Called once, when the event loop is ready to create windows.
    ///
    /// This is where the first windows should be opened and filled.
    fn on_start(&mut self, ctx: &mut DriverCtx<'_>);

    /// A hook called when a user has requested to close a window.
    ///
    /// By default the window is disposed, and the app exits once no windows are left.
    fn on_close_requested(&mut self, window_id: WindowId, ctx: &mut DriverCtx<'_>) {
        if let Err(err) = ctx.dispose_window(window_id) {
            tracing::warn!(%err, "failed to close window");
        }
        if ctx.app().window_ids().is_empty() {
            ctx.exit();
        }
    }

    /// The shaper used to turn text into glyphs when drawing.
    ///
    /// Without one, text runs are laid out but not drawn.
    fn text_shaper(&self) -> Option<&dyn TextShaper> {
        None
    }
}

impl DriverCtx<'_> {
    /// The application's windows and task queue.
    pub fn app(&self) -> &App {
        &self.state.app
    }

    /// The application's windows and task queue, mutably.
    pub fn app_mut(&mut self) -> &mut App {
        &mut self.state.app
    }

    /// Open a new, hidden window.
    ///
    /// Call [`Window::show`](tessel_core::app::Window::show) once its content is set.
    pub fn open_window(&mut self, options: WindowOptions) -> Result<WindowId, WindowError> {
        self.state.open_window(self.event_loop, options)
    }

    /// Close window `window_id` and release its surface.
    pub fn dispose_window(&mut self, window_id: WindowId) -> Result<(), WindowError> {
        self.state.app.dispose_window(window_id)?;
        self.state.forget_disposed();
        Ok(())
    }

    /// The platform windows are created through, e.g. to reach the clipboard.
    ///
    /// Prefer [`open_window`](Self::open_window) to open windows: windows created
    /// directly through the platform aren't rendered.
    pub fn platform(&mut self) -> WinitPlatform<'_> {
        WinitPlatform::new(self.event_loop, &mut self.state.platform)
    }

    /// The text on the clipboard, if any.
    pub fn clipboard_text(&mut self) -> Option<String> {
        self.platform().clipboard_text()
    }

    /// Replace the clipboard contents.
    pub fn set_clipboard_text(&mut self, text: &str) {
        self.platform().set_clipboard_text(text);
    }

    /// Exits the application (stops the event loop).
    pub fn exit(&mut self) {
        self.state.exit = true;
    }
}
