// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use tracing::{debug, debug_span, info};

use crate::app::{
    AppOptions, Platform, Recovery, TaskQueue, Window, WindowError, WindowOptions,
};
use crate::core::{Handled, InputEvent};

/// A unique identifier for a window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(NonZeroU64);

impl WindowId {
    /// Allocate a new, unique `WindowId`.
    pub fn next() -> Self {
        static WINDOW_ID_COUNTER: AtomicU64 = AtomicU64::new(1);
        let id = WINDOW_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(NonZeroU64::new(id).unwrap_or(NonZeroU64::MIN))
    }

    /// The raw value of this id.
    pub fn to_raw(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

/// What happened during one [`App::tick`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tick {
    /// Whether a task ran.
    pub ran_task: bool,
    /// Number of tasks that are already due.
    ///
    /// If this is non-zero, the driver should tick again without waiting for input.
    pub pending: usize,
    /// When the next delayed task becomes due.
    pub next_deadline: Option<Instant>,
}

/// The UI-thread state of a Tessel application: its windows and its task queue.
///
/// `App` is the window registry. It is an explicit object rather than a
/// global, so tests can create a fresh one per case. A driver such as
/// Tessel Winit owns it and calls [`tick`](Self::tick) once per loop iteration.
pub struct App {
    options: AppOptions,
    tasks: TaskQueue,
    recovery: Recovery,
    windows: Vec<Window>,
    active: Option<WindowId>,
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<WindowId> = self.window_ids();
        f.debug_struct("App")
            .field("options", &self.options)
            .field("tasks", &self.tasks)
            .field("windows", &ids)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(AppOptions::default())
    }
}

impl App {
    /// Create an application with no windows.
    pub fn new(options: AppOptions) -> Self {
        let tasks = match &options.clock {
            Some(clock) => TaskQueue::with_clock(clock.clone()),
            None => TaskQueue::new(),
        };
        Self {
            options,
            tasks,
            recovery: Recovery::new(),
            windows: Vec::new(),
            active: None,
        }
    }

    /// The application's task queue. Clone it to schedule work from other threads.
    pub fn tasks(&self) -> &TaskQueue {
        &self.tasks
    }

    /// The recovery boundary shared by every window and task.
    pub fn recovery(&self) -> &Recovery {
        &self.recovery
    }

    /// The options the application was created with.
    pub fn options(&self) -> &AppOptions {
        &self.options
    }

    // --- MARK: WINDOWS

    /// Create a window through `platform` and register it.
    ///
    /// The window starts hidden with an empty content panel.
    pub fn open_window(
        &mut self,
        platform: &mut dyn Platform,
        options: WindowOptions,
    ) -> Result<WindowId, WindowError> {
        let native = platform.create_window(&options)?;
        let id = WindowId::next();
        info!(%id, title = options.title, "opened window");
        let window = Window::new(
            id,
            options,
            native,
            self.tasks.clone(),
            self.recovery.clone(),
            &self.options,
        );
        self.windows.push(window);
        Ok(id)
    }

    /// The window `id`, if it's still open.
    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.windows.iter().find(|window| window.id() == id)
    }

    /// The window `id` mutably, if it's still open.
    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.iter_mut().find(|window| window.id() == id)
    }

    /// All open windows, in the order they were opened.
    pub fn windows(&self) -> impl Iterator<Item = &Window> {
        self.windows.iter()
    }

    /// The ids of all open windows, in the order they were opened.
    pub fn window_ids(&self) -> Vec<WindowId> {
        self.windows.iter().map(Window::id).collect()
    }

    /// `true` if window `id` hasn't been disposed.
    ///
    /// Tasks that captured a window id must check this, since disposing a
    /// window doesn't cancel them.
    pub fn is_valid(&self, id: WindowId) -> bool {
        self.window(id).is_some()
    }

    /// The window that last received keyboard focus from the OS.
    pub fn active_window(&self) -> Option<WindowId> {
        self.active.filter(|&id| self.is_valid(id))
    }

    /// Record which window has OS focus. Called by the driver.
    pub fn set_active_window(&mut self, id: Option<WindowId>) {
        self.active = id.filter(|&id| self.is_valid(id));
    }

    /// Close window `id` and remove it from the registry.
    pub fn dispose_window(&mut self, id: WindowId) -> Result<(), WindowError> {
        let index = self
            .windows
            .iter()
            .position(|window| window.id() == id)
            .ok_or(WindowError::UnknownWindow(id))?;
        let mut window = self.windows.remove(index);
        window.dispose();
        if self.active == Some(id) {
            self.active = None;
        }
        debug!(%id, "disposed window");
        Ok(())
    }

    /// Route `event` to window `id`. See [`Window::dispatch`].
    pub fn dispatch(&mut self, id: WindowId, event: InputEvent) -> Result<Handled, WindowError> {
        let window = self.window_mut(id).ok_or(WindowError::UnknownWindow(id))?;
        Ok(window.dispatch(event))
    }

    // --- MARK: TICK

    /// Run one iteration of the UI loop.
    ///
    /// Promotes delayed tasks whose deadline has passed, runs exactly one due task
    /// behind the recovery boundary, then asks every dirty, visible window for a redraw.
    /// Windows that aren't visible stay dirty until they are.
    pub fn tick(&mut self) -> Tick {
        self.tasks.promote_due();
        let ran_task = match self.tasks.pop() {
            Some(task) => {
                let _span = debug_span!("task").entered();
                let recovery = self.recovery.clone();
                recovery.run("task", || task(self));
                true
            }
            None => false,
        };
        self.flush_redraws();
        Tick {
            ran_task,
            pending: self.tasks.ready_len(),
            next_deadline: self.tasks.next_deadline(),
        }
    }

    /// Ask every dirty, visible window for a redraw.
    pub fn flush_redraws(&mut self) {
        for window in &mut self.windows {
            window.flush_redraw();
        }
    }
}
