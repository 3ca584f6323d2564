// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

//! Tools and infrastructure for testing panels.

use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use cursor_icon::CursorIcon;
use kurbo::{Point, Size, Vec2};
use tessel_core::app::{App, AppOptions, Tick, Window, WindowId, WindowOptions};
use tessel_core::core::{
    Handled, InputEvent, Key, KeyEvent, Modifiers, MouseEvent, NamedKey, PanelId, PanelTree,
    PointerButton, WheelEvent, Widget,
};
use tracing::debug;

use crate::{FixedMetrics, HeadlessHandle, HeadlessPlatform, ManualClock, RecordingCanvas};

/// Upper bound on tasks run by one [`TestHarness::run_pending_tasks`] call.
const MAX_TASKS_PER_RUN: usize = 10_000;

/// A headless environment to test panels in.
///
/// The harness owns an [`App`] with a single visible window backed by
/// [`HeadlessPlatform`], and a [`ManualClock`], so delayed tasks only become due
/// when the test calls [`advance_time`](Self::advance_time).
///
/// ## Workflow
///
/// - Create a harness and put some panels in its window.
/// - Send events as if you were a user interacting with the window.
///   Layout is validated before every event.
/// - Run tasks and move time forward as needed.
/// - Check that the panels are in the state you expect.
///
/// ```
/// use tessel_core::widgets::Panel;
/// use tessel_testing::TestHarness;
///
/// let mut harness = TestHarness::create();
/// let panel = harness.set_content(Panel::new());
/// harness.mouse_click_on(panel);
/// assert_eq!(harness.window().content(), panel);
/// ```
pub struct TestHarness {
    app: App,
    platform: HeadlessPlatform,
    clock: Arc<ManualClock>,
    window: WindowId,
    native: HeadlessHandle,
    metrics: Rc<FixedMetrics>,
    mouse_position: Point,
    modifiers: Modifiers,
}

impl std::fmt::Debug for TestHarness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestHarness")
            .field("window", &self.window)
            .field("mouse_position", &self.mouse_position)
            .finish_non_exhaustive()
    }
}

// --- MARK: CREATE
impl TestHarness {
    /// A harness with a 400x400 window and default options.
    pub fn create() -> Self {
        Self::create_with_size(Size::new(400., 400.))
    }

    /// A harness with a window of `size` and default options.
    pub fn create_with_size(size: Size) -> Self {
        Self::create_with(AppOptions::default(), size)
    }

    /// A harness with a window of `size`.
    ///
    /// The clock in `options` is replaced by the harness's [`ManualClock`].
    pub fn create_with(options: AppOptions, size: Size) -> Self {
        let clock = ManualClock::shared();
        let options = AppOptions {
            clock: Some(clock.clone()),
            ..options
        };
        let mut app = App::new(options);
        let mut platform = HeadlessPlatform::new();
        let window = match app.open_window(
            &mut platform,
            WindowOptions::new("Test window").with_size(size),
        ) {
            Ok(window) => window,
            Err(err) => panic!("headless window creation failed: {err}"),
        };
        let native = match platform.last_window() {
            Some(handle) => handle.clone(),
            None => panic!("headless platform didn't record its window"),
        };
        let mut harness = Self {
            app,
            platform,
            clock,
            window,
            native,
            metrics: Rc::new(FixedMetrics::default()),
            mouse_position: Point::ORIGIN,
            modifiers: Modifiers::empty(),
        };
        harness.window_mut().show();
        debug!(window = %window, "test harness ready");
        harness
    }
}

// --- MARK: ACCESSORS
impl TestHarness {
    /// The application.
    pub fn app(&self) -> &App {
        &self.app
    }

    /// The application, mutably.
    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    /// The headless platform, e.g. to open more windows.
    pub fn platform_mut(&mut self) -> &mut HeadlessPlatform {
        &mut self.platform
    }

    /// The id of the harness's window.
    pub fn window_id(&self) -> WindowId {
        self.window
    }

    /// The harness's window.
    ///
    /// # Panics
    ///
    /// If the test disposed of the window.
    #[track_caller]
    pub fn window(&self) -> &Window {
        match self.app.window(self.window) {
            Some(window) => window,
            None => panic!("the harness window was disposed"),
        }
    }

    /// The harness's window, mutably.
    ///
    /// # Panics
    ///
    /// If the test disposed of the window.
    #[track_caller]
    pub fn window_mut(&mut self) -> &mut Window {
        match self.app.window_mut(self.window) {
            Some(window) => window,
            None => panic!("the harness window was disposed"),
        }
    }

    /// The window's panel tree.
    pub fn tree(&self) -> &PanelTree {
        self.window().tree()
    }

    /// The window's panel tree, mutably.
    pub fn tree_mut(&mut self) -> &mut PanelTree {
        self.window_mut().tree_mut()
    }

    /// What the native window has been told so far.
    pub fn native(&self) -> &HeadlessHandle {
        &self.native
    }

    /// Font metrics to build text widgets with.
    pub fn metrics(&self) -> Rc<FixedMetrics> {
        self.metrics.clone()
    }

    /// The clock driving delayed tasks.
    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    /// The cursor currently shown by the window.
    pub fn cursor_icon(&self) -> CursorIcon {
        self.window().cursor()
    }

    /// The panel with keyboard focus.
    pub fn focused(&self) -> Option<PanelId> {
        self.window().focus()
    }
}

// --- MARK: CONTENT
impl TestHarness {
    /// Add `widget` to the tree and make it the window's content.
    pub fn set_content(&mut self, widget: impl Widget) -> PanelId {
        let window = self.window_mut();
        let id = window.tree_mut().create(widget);
        window.set_content(id);
        window.validate_layout();
        id
    }

    /// Add `widget` to the tree as the last child of `parent`.
    pub fn add_child(&mut self, parent: PanelId, widget: impl Widget) -> PanelId {
        let tree = self.tree_mut();
        let id = tree.create(widget);
        tree.add_child(parent, id);
        id
    }
}

// --- MARK: EVENTS
impl TestHarness {
    /// Lay the window out, then dispatch `event` to it.
    pub fn dispatch(&mut self, event: InputEvent) -> Handled {
        let window = self.window_mut();
        window.validate_layout();
        window.dispatch(event)
    }

    fn mouse_event(&self) -> MouseEvent {
        MouseEvent::new(self.mouse_position).with_modifiers(self.modifiers)
    }

    /// Hold `modifiers` for the following mouse and key events.
    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.modifiers = modifiers;
    }

    /// Move the pointer to `position`, in window coordinates.
    pub fn mouse_move(&mut self, position: impl Into<Point>) -> Handled {
        self.mouse_position = position.into();
        self.dispatch(InputEvent::MouseMove(self.mouse_event()))
    }

    /// Press `button` at the current pointer position.
    pub fn mouse_button_press(&mut self, button: PointerButton) -> Handled {
        let event = self.mouse_event().with_button(button);
        self.dispatch(InputEvent::MouseDown(event))
    }

    /// Release `button` at the current pointer position.
    pub fn mouse_button_release(&mut self, button: PointerButton) -> Handled {
        let event = self.mouse_event().with_button(button);
        self.dispatch(InputEvent::MouseUp(event))
    }

    /// Move to `position`, then press and release the primary button.
    pub fn mouse_click_at(&mut self, position: impl Into<Point>) {
        self.mouse_move(position);
        self.mouse_button_press(PointerButton::Primary);
        self.mouse_button_release(PointerButton::Primary);
    }

    /// Click the center of `id`.
    ///
    /// The click lands on whatever panel is on top at that point.
    pub fn mouse_click_on(&mut self, id: PanelId) {
        let center = self.center_of(id);
        self.mouse_click_at(center);
    }

    /// Move the pointer to the center of `id`.
    pub fn mouse_move_to(&mut self, id: PanelId) -> Handled {
        let center = self.center_of(id);
        self.mouse_move(center)
    }

    /// Move the pointer out of the window.
    pub fn mouse_exit(&mut self) -> Handled {
        self.dispatch(InputEvent::MouseExit)
    }

    /// Scroll by `delta` at the current pointer position.
    pub fn mouse_wheel(&mut self, delta: Vec2) -> Handled {
        self.dispatch(InputEvent::MouseWheel(WheelEvent {
            position: self.mouse_position,
            delta,
            modifiers: self.modifiers,
        }))
    }

    /// The center of `id` in window coordinates.
    #[track_caller]
    pub fn center_of(&mut self, id: PanelId) -> Point {
        let window = self.window_mut();
        window.validate_layout();
        let tree = window.tree();
        assert!(tree.contains(id), "panel {id} is not in the tree");
        tree.rect_to_root(id, tree.local_bounds(id)).center()
    }

    /// Press `key` with the held modifiers.
    pub fn key_down(&mut self, key: Key) -> Handled {
        let event = KeyEvent::new(key).with_modifiers(self.modifiers);
        self.dispatch(InputEvent::KeyDown(event))
    }

    /// Release `key` with the held modifiers.
    pub fn key_up(&mut self, key: Key) -> Handled {
        let event = KeyEvent::new(key).with_modifiers(self.modifiers);
        self.dispatch(InputEvent::KeyUp(event))
    }

    /// Press and release `key`.
    pub fn press_key(&mut self, key: Key) -> Handled {
        let handled = self.key_down(key.clone());
        self.key_up(key);
        handled
    }

    /// Press and release Tab, with Shift if `backwards`.
    pub fn press_tab(&mut self, backwards: bool) {
        let held = self.modifiers;
        if backwards {
            self.modifiers |= Modifiers::SHIFT;
        }
        self.press_key(Key::Named(NamedKey::Tab));
        self.modifiers = held;
    }

    /// Send every character of `text` as typed input.
    pub fn type_chars(&mut self, text: &str) {
        for ch in text.chars() {
            self.dispatch(InputEvent::Rune(ch));
        }
    }

    /// Drop `paths` at the current pointer position.
    pub fn drop_files(&mut self, paths: impl IntoIterator<Item = PathBuf>) -> Handled {
        self.dispatch(InputEvent::FileDrop(paths.into_iter().collect()))
    }

    /// Move keyboard focus to `id`.
    pub fn focus_on(&mut self, id: Option<PanelId>) {
        self.window_mut().set_focus(id);
    }
}

// --- MARK: TIME
impl TestHarness {
    /// Run one iteration of the UI loop.
    pub fn tick(&mut self) -> Tick {
        self.app.tick()
    }

    /// Tick until no due task is left. Returns the number of tasks run.
    ///
    /// # Panics
    ///
    /// If tasks keep scheduling more due tasks forever.
    #[track_caller]
    pub fn run_pending_tasks(&mut self) -> usize {
        let mut count = 0;
        while self.app.tick().ran_task {
            count += 1;
            assert!(
                count < MAX_TASKS_PER_RUN,
                "tasks kept scheduling due tasks"
            );
        }
        count
    }

    /// Move the clock forward by `duration`, then run every task that became due.
    pub fn advance_time(&mut self, duration: Duration) -> usize {
        self.clock.advance(duration);
        self.run_pending_tasks()
    }

    /// Paint the window onto a fresh [`RecordingCanvas`].
    pub fn render(&mut self) -> RecordingCanvas {
        let mut canvas = RecordingCanvas::new();
        self.window_mut().draw(&mut canvas);
        canvas
    }
}
