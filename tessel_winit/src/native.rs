// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

//! The windowing collaborator, implemented with winit.

use std::sync::Arc;

use tessel_core::app::{NativeWindow, Platform, WindowError, WindowOptions};
use tessel_core::cursor_icon::CursorIcon;
use tessel_core::kurbo::{Point, Rect, Size};
use tracing::{debug, warn};
use winit::dpi::{LogicalPosition, LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event_loop::ActiveEventLoop;
use winit::window::{Icon, Window as WindowHandle, WindowAttributes, WindowLevel};

/// Platform state that outlives a single [`WinitPlatform`].
#[derive(Debug)]
pub(crate) struct PlatformState {
    clipboard: Clipboard,
    /// Handles created since the runner last collected them.
    pub(crate) created: Vec<Arc<WindowHandle>>,
}

impl PlatformState {
    pub(crate) fn new() -> Self {
        Self {
            clipboard: Clipboard::new(),
            created: Vec::new(),
        }
    }
}

/// The OS clipboard, or nothing if it couldn't be opened.
///
/// Failures are logged and otherwise behave like an empty clipboard.
struct Clipboard(Option<arboard::Clipboard>);

impl Clipboard {
    fn new() -> Self {
        Self(
            arboard::Clipboard::new()
                .map_err(|err| warn!(%err, "unable to open the clipboard"))
                .ok(),
        )
    }

    fn text(&mut self) -> Option<String> {
        self.0
            .as_mut()?
            .get_text()
            .map_err(|err| debug!(%err, "no text on the clipboard"))
            .ok()
    }

    fn set_text(&mut self, text: &str) {
        let Some(clipboard) = self.0.as_mut() else {
            return;
        };
        if let Err(err) = clipboard.set_text(text) {
            warn!(%err, "failed to set the clipboard text");
        }
    }
}

impl std::fmt::Debug for Clipboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_some() {
            f.write_str("Clipboard(Some(_))")
        } else {
            f.write_str("Clipboard(None)")
        }
    }
}

/// A [`Platform`] borrowing winit's active event loop.
///
/// winit only creates windows from inside its callbacks, so the runner builds one
/// of these for each callback that may open windows.
///
/// Clipboard access goes to the OS clipboard. If it can't be opened, reads
/// return `None` and writes are dropped.
pub struct WinitPlatform<'a> {
    event_loop: &'a ActiveEventLoop,
    state: &'a mut PlatformState,
}

impl std::fmt::Debug for WinitPlatform<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WinitPlatform")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<'a> WinitPlatform<'a> {
    pub(crate) fn new(event_loop: &'a ActiveEventLoop, state: &'a mut PlatformState) -> Self {
        Self { event_loop, state }
    }
}

fn window_attributes(options: &WindowOptions) -> WindowAttributes {
    let mut attributes = WindowAttributes::default()
        .with_title(options.title.clone())
        .with_inner_size(LogicalSize::new(options.size.width, options.size.height))
        .with_resizable(options.resizable)
        .with_decorations(options.decorated)
        // Shown by `Window::show` once the first layout is done.
        .with_visible(false);
    if let Some(position) = options.position {
        attributes = attributes.with_position(LogicalPosition::new(position.x, position.y));
    }
    if options.floating {
        attributes = attributes.with_window_level(WindowLevel::AlwaysOnTop);
    }
    if options.transient {
        attributes = attributes.with_active(false);
    }
    if let Some(icon) = options.title_icons.first() {
        match Icon::from_rgba(icon.rgba.clone(), icon.width, icon.height) {
            Ok(icon) => attributes = attributes.with_window_icon(Some(icon)),
            Err(err) => warn!(%err, "ignoring invalid title icon"),
        }
    }
    attributes
}

impl Platform for WinitPlatform<'_> {
    fn create_window(
        &mut self,
        options: &WindowOptions,
    ) -> Result<Box<dyn NativeWindow>, WindowError> {
        let handle = self
            .event_loop
            .create_window(window_attributes(options))
            .map_err(|err| WindowError::Creation(err.to_string()))?;
        let handle = Arc::new(handle);
        debug!(handle = ?handle.id(), title = options.title, "created winit window");
        self.state.created.push(handle.clone());
        Ok(Box::new(WinitWindow::new(handle)))
    }

    fn clipboard_text(&mut self) -> Option<String> {
        self.state.clipboard.text()
    }

    fn set_clipboard_text(&mut self, text: &str) {
        self.state.clipboard.set_text(text);
    }
}

/// A [`NativeWindow`] backed by a winit window.
#[derive(Debug)]
pub struct WinitWindow {
    handle: Arc<WindowHandle>,
    visible: bool,
}

impl WinitWindow {
    fn new(handle: Arc<WindowHandle>) -> Self {
        Self {
            handle,
            visible: false,
        }
    }

    /// The underlying winit window.
    pub fn handle(&self) -> &WindowHandle {
        &self.handle
    }

    fn logical_rect(&self, position: PhysicalPosition<i32>, size: PhysicalSize<u32>) -> Rect {
        let scale_factor = self.handle.scale_factor();
        let position = position.to_logical::<f64>(scale_factor);
        let size = size.to_logical::<f64>(scale_factor);
        Rect::from_origin_size(
            Point::new(position.x, position.y),
            Size::new(size.width, size.height),
        )
    }
}

impl NativeWindow for WinitWindow {
    fn content_rect(&self) -> Rect {
        // Wayland doesn't report window positions.
        let position = self.handle.inner_position().unwrap_or_default();
        // https://github.com/rust-windowing/winit/issues/2308
        #[cfg(target_os = "ios")]
        let size = self.handle.outer_size();
        #[cfg(not(target_os = "ios"))]
        let size = self.handle.inner_size();
        self.logical_rect(position, size)
    }

    fn set_content_rect(&mut self, rect: Rect) {
        let scale_factor = self.handle.scale_factor();
        let decorations = match (self.handle.inner_position(), self.handle.outer_position()) {
            (Ok(inner), Ok(outer)) => {
                let inner = inner.to_logical::<f64>(scale_factor);
                let outer = outer.to_logical::<f64>(scale_factor);
                (inner.x - outer.x, inner.y - outer.y)
            }
            _ => (0., 0.),
        };
        self.handle.set_outer_position(LogicalPosition::new(
            rect.x0 - decorations.0,
            rect.y0 - decorations.1,
        ));
        // The new size arrives later as a `Resized` event.
        let _ = self
            .handle
            .request_inner_size(LogicalSize::new(rect.width(), rect.height()));
    }

    fn frame_rect(&self) -> Rect {
        let position = self.handle.outer_position().unwrap_or_default();
        self.logical_rect(position, self.handle.outer_size())
    }

    fn set_title(&mut self, title: &str) {
        self.handle.set_title(title);
    }

    fn is_visible(&self) -> bool {
        self.visible && !self.handle.is_minimized().unwrap_or(false)
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.handle.set_visible(visible);
    }

    fn focus(&mut self) {
        self.handle.focus_window();
    }

    fn request_redraw(&mut self) {
        self.handle.request_redraw();
    }

    fn set_cursor(&mut self, cursor: CursorIcon) {
        self.handle.set_cursor(cursor);
    }

    fn close(&mut self) {
        // The OS window is destroyed once the runner drops its handle too.
        self.visible = false;
        self.handle.set_visible(false);
        // HACK: On some systems (known to happen with Wayland on KDE) the IME
        // state outlives the window unless it's disabled first.
        self.handle.set_ime_allowed(false);
    }
}

#[cfg(test)]
mod tests {
    use tessel_core::app::TitleIcon;

    use super::*;

    #[test]
    fn attributes_follow_options() {
        let options = WindowOptions::new("Palette")
            .with_size(Size::new(200., 100.))
            .not_resizable()
            .floating();
        let attributes = window_attributes(&options);

        assert_eq!(attributes.title, "Palette");
        assert!(!attributes.resizable);
        assert!(!attributes.visible);
        assert_eq!(attributes.window_level, WindowLevel::AlwaysOnTop);
        assert!(attributes.window_icon.is_none());
    }

    #[test]
    fn broken_icons_are_skipped() {
        let options = WindowOptions::new("Icons").title_icons([TitleIcon {
            rgba: vec![0; 3],
            width: 4,
            height: 4,
        }]);
        assert!(window_attributes(&options).window_icon.is_none());
    }

    #[test]
    fn unavailable_clipboard_reads_as_empty() {
        let mut clipboard = Clipboard(None);
        clipboard.set_text("dropped");
        assert_eq!(clipboard.text(), None);
        assert_eq!(format!("{clipboard:?}"), "Clipboard(None)");
    }
}
