// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

//! Events.

use std::path::PathBuf;

use kurbo::{Point, Vec2};
use ui_events::keyboard::{Key, Modifiers, NamedKey};
use ui_events::pointer::PointerButton;

/// A raw input event, as delivered by the native layer to a [`Window`](crate::app::Window).
///
/// Positions are in the window's content coordinates.
/// The window decides from its own state whether a move is a hover or a drag.
#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    /// A mouse button was pressed.
    MouseDown(MouseEvent),
    /// A mouse button was released.
    MouseUp(MouseEvent),
    /// The pointer moved, with or without buttons held.
    MouseMove(MouseEvent),
    /// The pointer entered the window.
    MouseEnter(MouseEvent),
    /// The pointer left the window.
    MouseExit,
    /// The scroll wheel or trackpad scrolled.
    MouseWheel(WheelEvent),
    /// A key was pressed.
    KeyDown(KeyEvent),
    /// A key was released.
    KeyUp(KeyEvent),
    /// A character was typed.
    Rune(char),
    /// Files were dropped onto the window at the last known pointer position.
    FileDrop(Vec<PathBuf>),
}

impl InputEvent {
    /// Short name, for debug logging.
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::MouseDown(_) => "MouseDown",
            Self::MouseUp(_) => "MouseUp",
            Self::MouseMove(_) => "MouseMove",
            Self::MouseEnter(_) => "MouseEnter",
            Self::MouseExit => "MouseExit",
            Self::MouseWheel(_) => "MouseWheel",
            Self::KeyDown(_) => "KeyDown",
            Self::KeyUp(_) => "KeyUp",
            Self::Rune(_) => "Rune",
            Self::FileDrop(_) => "FileDrop",
        }
    }

    /// `true` if this event type is likely to occur every frame.
    pub fn is_very_frequent(&self) -> bool {
        matches!(self, Self::MouseMove(_) | Self::MouseWheel(_))
    }
}

/// A mouse button or pointer movement event.
///
/// When handed to a widget, `position` is in that panel's local coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MouseEvent {
    /// Pointer position.
    pub position: Point,
    /// The button that changed state, or the primary button for moves.
    pub button: PointerButton,
    /// Number of clicks in quick succession, starting at 1.
    pub click_count: u32,
    /// Keyboard modifiers held at the time of the event.
    pub modifiers: Modifiers,
}

impl MouseEvent {
    /// A single primary-button event at `position` with no modifiers.
    pub fn new(position: impl Into<Point>) -> Self {
        Self {
            position: position.into(),
            button: PointerButton::Primary,
            click_count: 1,
            modifiers: Modifiers::empty(),
        }
    }

    /// Builder-style method for setting the button.
    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    /// Builder-style method for setting the click count.
    pub fn with_click_count(mut self, click_count: u32) -> Self {
        self.click_count = click_count;
        self
    }

    /// Builder-style method for setting the modifiers.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// The same event, moved to `position`.
    pub fn at(mut self, position: Point) -> Self {
        self.position = position;
        self
    }
}

/// A scroll event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WheelEvent {
    /// Pointer position.
    pub position: Point,
    /// Scroll amount in logical pixels.
    pub delta: Vec2,
    /// Keyboard modifiers held at the time of the event.
    pub modifiers: Modifiers,
}

/// A key press or release.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyEvent {
    /// The logical key.
    pub key: Key,
    /// Keyboard modifiers held at the time of the event.
    pub modifiers: Modifiers,
    /// `true` if this is an auto-repeat of a held key.
    pub repeat: bool,
}

impl KeyEvent {
    /// A key event with no modifiers.
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::empty(),
            repeat: false,
        }
    }

    /// A named key event with no modifiers.
    pub fn named(key: NamedKey) -> Self {
        Self::new(Key::Named(key))
    }

    /// Builder-style method for setting the modifiers.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// `true` for Tab with no modifiers, or with Shift only.
    pub fn is_focus_traversal(&self) -> bool {
        self.key == Key::Named(NamedKey::Tab)
            && (self.modifiers.is_empty() || self.modifiers == Modifiers::SHIFT)
    }
}

/// Whether an event was handled.
///
/// Bubbling stops at the first panel that returns `Handled::Yes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// An event was handled.
    Yes,
    /// An event was not handled.
    No,
}

impl Handled {
    /// Has the event been handled yet?
    pub fn is_handled(self) -> bool {
        self == Self::Yes
    }
}

impl From<bool> for Handled {
    /// Returns `Handled::Yes` if `handled` is true, and `Handled::No` otherwise.
    fn from(handled: bool) -> Self {
        if handled { Self::Yes } else { Self::No }
    }
}
