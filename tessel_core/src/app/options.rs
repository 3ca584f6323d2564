// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::time::Duration;

use kurbo::{Point, Size};

use crate::app::Clock;

/// Application-wide settings.
#[derive(Clone, Debug)]
pub struct AppOptions {
    /// How long the pointer must rest on a panel before its tooltip shows.
    pub tooltip_delay: Duration,
    /// How long a tooltip stays up.
    pub tooltip_dismissal: Duration,
    /// If a tooltip was up this recently, the next one shows without delay.
    pub tooltip_recent_window: Duration,
    /// Replaces the system clock used to schedule delayed tasks.
    pub clock: Option<Arc<dyn Clock>>,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            tooltip_delay: Duration::from_millis(1500),
            tooltip_dismissal: Duration::from_secs(5),
            tooltip_recent_window: Duration::from_millis(500),
            clock: None,
        }
    }
}

/// An RGBA image used as a window icon.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TitleIcon {
    /// Non-premultiplied RGBA8 pixels, row by row.
    pub rgba: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// How a window should be created.
#[derive(Clone, Debug, PartialEq)]
pub struct WindowOptions {
    /// Title shown by the window manager.
    pub title: String,
    /// Initial content size in logical pixels.
    pub size: Size,
    /// Initial location of the window on screen, if any.
    pub position: Option<Point>,
    /// The user can resize the window.
    pub resizable: bool,
    /// The window has a title bar and borders.
    pub decorated: bool,
    /// The window stays above normal windows.
    pub floating: bool,
    /// The window is short-lived, e.g. a popup, and isn't registered with the task bar.
    pub transient: bool,
    /// Icons for the title bar, in increasing size.
    pub title_icons: Vec<TitleIcon>,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            size: Size::new(640., 480.),
            position: None,
            resizable: true,
            decorated: true,
            floating: false,
            transient: false,
            title_icons: Vec::new(),
        }
    }
}

impl WindowOptions {
    /// A resizable, decorated window titled `title`.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Builder-style method for the initial content size.
    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    /// Builder-style method for the initial location.
    pub fn with_position(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    /// The user can't resize the window.
    pub fn not_resizable(mut self) -> Self {
        self.resizable = false;
        self
    }

    /// The window has no title bar or borders.
    pub fn undecorated(mut self) -> Self {
        self.decorated = false;
        self
    }

    /// The window stays above normal windows.
    pub fn floating(mut self) -> Self {
        self.floating = true;
        self
    }

    /// The window is short-lived, like a popup menu or a tooltip.
    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    /// The icons shown in the title bar.
    pub fn title_icons(mut self, icons: impl IntoIterator<Item = TitleIcon>) -> Self {
        self.title_icons = icons.into_iter().collect();
        self
    }
}
