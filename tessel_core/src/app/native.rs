// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

//! The windowing collaborator.

use cursor_icon::CursorIcon;
use kurbo::Rect;

use crate::app::{WindowId, WindowOptions};

/// Errors from the native windowing layer.
#[derive(Debug, thiserror::Error)]
pub enum WindowError {
    /// The platform refused to create a window.
    #[error("failed to create native window: {0}")]
    Creation(String),
    /// No window with this id is registered.
    #[error("unknown window {0}")]
    UnknownWindow(WindowId),
    /// There is no display or event system to talk to.
    #[error("windowing platform unavailable: {0}")]
    Unavailable(String),
}

/// An OS window, as seen by a [`Window`](crate::app::Window).
///
/// Rectangles are in logical pixels and screen coordinates.
pub trait NativeWindow {
    /// The area the window's panels are drawn into.
    fn content_rect(&self) -> Rect;

    /// Move and resize the content area.
    fn set_content_rect(&mut self, rect: Rect);

    /// The outer bounds, including decorations.
    fn frame_rect(&self) -> Rect;

    /// Change the title.
    fn set_title(&mut self, title: &str);

    /// `true` if the window is shown and not minimized.
    fn is_visible(&self) -> bool;

    /// Show or hide the window.
    fn set_visible(&mut self, visible: bool);

    /// Bring the window to the front and give it keyboard focus.
    fn focus(&mut self);

    /// Ask for a repaint. The platform calls [`Window::draw`](crate::app::Window::draw) later.
    fn request_redraw(&mut self);

    /// Change the pointer shape over the window.
    fn set_cursor(&mut self, cursor: CursorIcon);

    /// Destroy the OS window.
    fn close(&mut self);
}

/// Creates native windows and reaches other OS services.
pub trait Platform {
    /// Create a hidden window configured from `options`.
    fn create_window(&mut self, options: &WindowOptions)
    -> Result<Box<dyn NativeWindow>, WindowError>;

    /// The text on the clipboard, if any.
    fn clipboard_text(&mut self) -> Option<String>;

    /// Replace the clipboard contents with `text`.
    fn set_clipboard_text(&mut self, text: &str);
}
