// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

//! Headless stand-ins for the windowing collaborator.

use std::cell::RefCell;
use std::rc::Rc;

use cursor_icon::CursorIcon;
use kurbo::{Point, Rect};
use tessel_core::app::{NativeWindow, Platform, WindowError, WindowOptions};
use tracing::debug;

/// Everything a [`HeadlessWindow`] has been told so far.
#[derive(Clone, Debug, PartialEq)]
pub struct HeadlessState {
    /// The options the window was created with.
    pub options: WindowOptions,
    /// Content area in screen coordinates.
    pub content_rect: Rect,
    /// Current title.
    pub title: String,
    /// Whether the window is shown.
    pub visible: bool,
    /// Whether the window was focused with [`NativeWindow::focus`].
    pub focused: bool,
    /// Number of times a redraw was requested.
    pub redraw_requests: usize,
    /// The last cursor set.
    pub cursor: CursorIcon,
    /// Whether the window was closed.
    pub closed: bool,
}

/// A shared view of a [`HeadlessWindow`]'s state, kept by tests after the window
/// itself has been handed to the [`App`](tessel_core::app::App).
#[derive(Clone, Debug)]
pub struct HeadlessHandle(Rc<RefCell<HeadlessState>>);

impl HeadlessHandle {
    /// A snapshot of the current state.
    pub fn state(&self) -> HeadlessState {
        self.0.borrow().clone()
    }

    /// Number of redraws requested so far.
    pub fn redraw_requests(&self) -> usize {
        self.0.borrow().redraw_requests
    }

    /// Pretend the user resized the window.
    ///
    /// The driver must then call [`Window::resized`](tessel_core::app::Window::resized).
    pub fn resize(&self, rect: Rect) {
        self.0.borrow_mut().content_rect = rect;
    }
}

/// A [`NativeWindow`] that only records what it's asked to do.
#[derive(Debug)]
pub struct HeadlessWindow {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessWindow {
    /// A hidden window configured from `options`.
    pub fn new(options: &WindowOptions) -> Self {
        let origin = options.position.unwrap_or(Point::ORIGIN);
        Self {
            state: Rc::new(RefCell::new(HeadlessState {
                options: options.clone(),
                content_rect: Rect::from_origin_size(origin, options.size),
                title: options.title.clone(),
                visible: false,
                focused: false,
                redraw_requests: 0,
                cursor: CursorIcon::Default,
                closed: false,
            })),
        }
    }

    /// A handle to this window's state.
    pub fn handle(&self) -> HeadlessHandle {
        HeadlessHandle(self.state.clone())
    }
}

impl NativeWindow for HeadlessWindow {
    fn content_rect(&self) -> Rect {
        self.state.borrow().content_rect
    }

    fn set_content_rect(&mut self, rect: Rect) {
        self.state.borrow_mut().content_rect = rect;
    }

    fn frame_rect(&self) -> Rect {
        let state = self.state.borrow();
        if state.options.decorated {
            // A nominal title bar.
            let rect = state.content_rect;
            Rect::new(rect.x0, rect.y0 - 24., rect.x1, rect.y1)
        } else {
            state.content_rect
        }
    }

    fn set_title(&mut self, title: &str) {
        self.state.borrow_mut().title = title.to_string();
    }

    fn is_visible(&self) -> bool {
        self.state.borrow().visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.state.borrow_mut().visible = visible;
    }

    fn focus(&mut self) {
        self.state.borrow_mut().focused = true;
    }

    fn request_redraw(&mut self) {
        self.state.borrow_mut().redraw_requests += 1;
    }

    fn set_cursor(&mut self, cursor: CursorIcon) {
        self.state.borrow_mut().cursor = cursor;
    }

    fn close(&mut self) {
        let mut state = self.state.borrow_mut();
        state.closed = true;
        state.visible = false;
    }
}

/// A [`Platform`] creating [`HeadlessWindow`]s, with an in-memory clipboard.
#[derive(Debug, Default)]
pub struct HeadlessPlatform {
    windows: Vec<HeadlessHandle>,
    clipboard: Option<String>,
    fail_next: Option<String>,
}

impl HeadlessPlatform {
    /// A platform with no windows and an empty clipboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next [`create_window`](Platform::create_window) call fail with `reason`.
    pub fn fail_next_window(&mut self, reason: impl Into<String>) {
        self.fail_next = Some(reason.into());
    }

    /// Handles to every window created so far, oldest first.
    pub fn windows(&self) -> &[HeadlessHandle] {
        &self.windows
    }

    /// The most recently created window.
    pub fn last_window(&self) -> Option<&HeadlessHandle> {
        self.windows.last()
    }
}

impl Platform for HeadlessPlatform {
    fn create_window(
        &mut self,
        options: &WindowOptions,
    ) -> Result<Box<dyn NativeWindow>, WindowError> {
        if let Some(reason) = self.fail_next.take() {
            return Err(WindowError::Creation(reason));
        }
        let window = HeadlessWindow::new(options);
        debug!(title = options.title, "created headless window");
        self.windows.push(window.handle());
        Ok(Box::new(window))
    }

    fn clipboard_text(&mut self) -> Option<String> {
        self.clipboard.clone()
    }

    fn set_clipboard_text(&mut self, text: &str) {
        self.clipboard = Some(text.to_string());
    }
}
