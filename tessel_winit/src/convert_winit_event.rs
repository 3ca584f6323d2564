// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

use std::time::{Duration, Instant};

use smallvec::SmallVec;
use tessel_core::core::{
    InputEvent, Key, KeyEvent, Modifiers, MouseEvent, NamedKey, PointerButton, WheelEvent,
};
use tessel_core::kurbo::{Point, Vec2};
use winit::event::{ElementState, MouseButton, MouseScrollDelta};
use winit::keyboard::{Key as WinitKey, ModifiersState, NamedKey as WinitNamedKey};

/// Presses closer together than this count as a multi-click.
const MULTI_CLICK_INTERVAL: Duration = Duration::from_millis(500);
/// Presses further apart than this never count as a multi-click.
const MULTI_CLICK_SLOP: f64 = 4.;
/// Logical pixels scrolled per wheel notch.
const LINE_HEIGHT: f64 = 20.;

pub(crate) fn winit_modifiers_to_tessel(state: ModifiersState) -> Modifiers {
    let mut modifiers = Modifiers::empty();
    if state.shift_key() {
        modifiers |= Modifiers::SHIFT;
    }
    if state.control_key() {
        modifiers |= Modifiers::CONTROL;
    }
    if state.alt_key() {
        modifiers |= Modifiers::ALT;
    }
    if state.super_key() {
        modifiers |= Modifiers::META;
    }
    modifiers
}

pub(crate) fn winit_button_to_tessel(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Right => Some(PointerButton::Secondary),
        MouseButton::Middle => Some(PointerButton::Auxiliary),
        MouseButton::Back => Some(PointerButton::X1),
        MouseButton::Forward => Some(PointerButton::X2),
        MouseButton::Other(_) => None,
    }
}

pub(crate) fn winit_key_to_tessel(key: &WinitKey) -> Key {
    let named = match key {
        WinitKey::Character(text) => return Key::Character(text.to_string()),
        WinitKey::Named(WinitNamedKey::Space) => return Key::Character(" ".to_string()),
        WinitKey::Named(named) => named,
        WinitKey::Unidentified(_) | WinitKey::Dead(_) => return Key::Named(NamedKey::Unidentified),
    };
    Key::Named(match named {
        WinitNamedKey::Enter => NamedKey::Enter,
        WinitNamedKey::Tab => NamedKey::Tab,
        WinitNamedKey::Escape => NamedKey::Escape,
        WinitNamedKey::Backspace => NamedKey::Backspace,
        WinitNamedKey::Delete => NamedKey::Delete,
        WinitNamedKey::Insert => NamedKey::Insert,
        WinitNamedKey::ArrowUp => NamedKey::ArrowUp,
        WinitNamedKey::ArrowDown => NamedKey::ArrowDown,
        WinitNamedKey::ArrowLeft => NamedKey::ArrowLeft,
        WinitNamedKey::ArrowRight => NamedKey::ArrowRight,
        WinitNamedKey::Home => NamedKey::Home,
        WinitNamedKey::End => NamedKey::End,
        WinitNamedKey::PageUp => NamedKey::PageUp,
        WinitNamedKey::PageDown => NamedKey::PageDown,
        WinitNamedKey::Shift => NamedKey::Shift,
        WinitNamedKey::Control => NamedKey::Control,
        WinitNamedKey::Alt => NamedKey::Alt,
        WinitNamedKey::Super => NamedKey::Meta,
        WinitNamedKey::CapsLock => NamedKey::CapsLock,
        WinitNamedKey::F1 => NamedKey::F1,
        WinitNamedKey::F2 => NamedKey::F2,
        WinitNamedKey::F3 => NamedKey::F3,
        WinitNamedKey::F4 => NamedKey::F4,
        WinitNamedKey::F5 => NamedKey::F5,
        WinitNamedKey::F6 => NamedKey::F6,
        WinitNamedKey::F7 => NamedKey::F7,
        WinitNamedKey::F8 => NamedKey::F8,
        WinitNamedKey::F9 => NamedKey::F9,
        WinitNamedKey::F10 => NamedKey::F10,
        WinitNamedKey::F11 => NamedKey::F11,
        WinitNamedKey::F12 => NamedKey::F12,
        _ => NamedKey::Unidentified,
    })
}

/// Turns winit's per-window events into Tessel [`InputEvent`]s.
///
/// winit reports modifiers, pointer position and button presses separately;
/// this keeps the state needed to fill in each event.
#[derive(Debug, Default)]
pub(crate) struct PointerState {
    pub(crate) position: Point,
    pub(crate) modifiers: Modifiers,
    held: Option<PointerButton>,
    last_press: Option<(Instant, Point, PointerButton)>,
    click_count: u32,
}

impl PointerState {
    fn mouse_event(&self, button: PointerButton) -> MouseEvent {
        MouseEvent::new(self.position)
            .with_button(button)
            .with_click_count(self.click_count.max(1))
            .with_modifiers(self.modifiers)
    }

    pub(crate) fn set_modifiers(&mut self, state: ModifiersState) {
        self.modifiers = winit_modifiers_to_tessel(state);
    }

    pub(crate) fn cursor_moved(&mut self, position: Point) -> InputEvent {
        self.position = position;
        InputEvent::MouseMove(self.mouse_event(self.held.unwrap_or(PointerButton::Primary)))
    }

    pub(crate) fn cursor_entered(&self) -> InputEvent {
        InputEvent::MouseEnter(self.mouse_event(PointerButton::Primary))
    }

    pub(crate) fn mouse_input(
        &mut self,
        state: ElementState,
        button: MouseButton,
        now: Instant,
    ) -> Option<InputEvent> {
        let button = winit_button_to_tessel(button)?;
        match state {
            ElementState::Pressed => {
                let repeated = self.last_press.is_some_and(|(at, position, last)| {
                    last == button
                        && now.saturating_duration_since(at) <= MULTI_CLICK_INTERVAL
                        && (position - self.position).hypot() <= MULTI_CLICK_SLOP
                });
                self.click_count = if repeated { self.click_count + 1 } else { 1 };
                self.last_press = Some((now, self.position, button));
                if self.held.is_none() {
                    self.held = Some(button);
                }
                Some(InputEvent::MouseDown(self.mouse_event(button)))
            }
            ElementState::Released => {
                if self.held == Some(button) {
                    self.held = None;
                }
                Some(InputEvent::MouseUp(self.mouse_event(button)))
            }
        }
    }

    /// Positive deltas scroll towards the bottom right of the content.
    pub(crate) fn wheel(&self, delta: MouseScrollDelta, scale_factor: f64) -> InputEvent {
        let delta = match delta {
            MouseScrollDelta::LineDelta(x, y) => {
                Vec2::new(-f64::from(x) * LINE_HEIGHT, -f64::from(y) * LINE_HEIGHT)
            }
            MouseScrollDelta::PixelDelta(delta) => {
                let delta = delta.to_logical::<f64>(scale_factor);
                Vec2::new(-delta.x, -delta.y)
            }
        };
        InputEvent::MouseWheel(WheelEvent {
            position: self.position,
            delta,
            modifiers: self.modifiers,
        })
    }

    /// A key press is followed by a rune for each printable character it produced.
    pub(crate) fn keyboard_input(
        &self,
        key: &WinitKey,
        text: Option<&str>,
        state: ElementState,
        repeat: bool,
    ) -> SmallVec<[InputEvent; 2]> {
        let mut event = KeyEvent::new(winit_key_to_tessel(key)).with_modifiers(self.modifiers);
        event.repeat = repeat;
        let mut events = SmallVec::new();
        match state {
            ElementState::Pressed => {
                events.push(InputEvent::KeyDown(event));
                let runes = text
                    .unwrap_or_default()
                    .chars()
                    .filter(|c| !c.is_control())
                    .map(InputEvent::Rune);
                events.extend(runes);
            }
            ElementState::Released => events.push(InputEvent::KeyUp(event)),
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn space_is_a_character() {
        assert_eq!(
            winit_key_to_tessel(&WinitKey::Named(WinitNamedKey::Space)),
            Key::Character(" ".to_string())
        );
        assert_eq!(
            winit_key_to_tessel(&WinitKey::Named(WinitNamedKey::Tab)),
            Key::Named(NamedKey::Tab)
        );
        assert_eq!(
            winit_key_to_tessel(&WinitKey::Character("q".into())),
            Key::Character("q".to_string())
        );
    }

    #[test]
    fn super_maps_to_meta() {
        let modifiers = winit_modifiers_to_tessel(ModifiersState::SHIFT | ModifiersState::SUPER);
        assert_eq!(modifiers, Modifiers::SHIFT | Modifiers::META);
    }

    #[test]
    fn quick_presses_count_as_multi_clicks() {
        let mut pointer = PointerState::default();
        let start = Instant::now();
        pointer.cursor_moved(Point::new(10., 10.));

        let first = pointer.mouse_input(ElementState::Pressed, MouseButton::Left, start);
        assert_matches!(first, Some(InputEvent::MouseDown(event)) if event.click_count == 1);
        pointer.mouse_input(ElementState::Released, MouseButton::Left, start);

        let later = start + Duration::from_millis(100);
        let second = pointer.mouse_input(ElementState::Pressed, MouseButton::Left, later);
        assert_matches!(second, Some(InputEvent::MouseDown(event)) if event.click_count == 2);
        pointer.mouse_input(ElementState::Released, MouseButton::Left, later);

        let much_later = later + Duration::from_secs(2);
        let third = pointer.mouse_input(ElementState::Pressed, MouseButton::Left, much_later);
        assert_matches!(third, Some(InputEvent::MouseDown(event)) if event.click_count == 1);
    }

    #[test]
    fn moves_report_the_held_button() {
        let mut pointer = PointerState::default();
        pointer.mouse_input(ElementState::Pressed, MouseButton::Right, Instant::now());
        let event = pointer.cursor_moved(Point::new(3., 4.));
        assert_matches!(
            event,
            InputEvent::MouseMove(event)
                if event.button == PointerButton::Secondary && event.position == Point::new(3., 4.)
        );
    }

    #[test]
    fn key_presses_produce_runes() {
        let pointer = PointerState::default();
        let key = WinitKey::Character("a".into());
        let events = pointer.keyboard_input(&key, Some("a"), ElementState::Pressed, false);
        assert_eq!(events.len(), 2);
        assert_matches!(&events[0], InputEvent::KeyDown(_));
        assert_eq!(events[1], InputEvent::Rune('a'));

        let enter = WinitKey::Named(WinitNamedKey::Enter);
        let events = pointer.keyboard_input(&enter, Some("\r"), ElementState::Pressed, false);
        assert_eq!(events.len(), 1);

        let events = pointer.keyboard_input(&key, None, ElementState::Released, false);
        assert_matches!(events.as_slice(), [InputEvent::KeyUp(_)]);
    }

    #[test]
    fn wheel_lines_become_pixels() {
        let pointer = PointerState::default();
        let event = pointer.wheel(MouseScrollDelta::LineDelta(0., -1.), 2.);
        assert_matches!(event, InputEvent::MouseWheel(event) if event.delta == Vec2::new(0., 20.));
    }
}
