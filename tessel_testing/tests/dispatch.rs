// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

//! Hit-testing and bubbling of input events.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use assert_matches::assert_matches;
use kurbo::{Point, Rect, Vec2};
use tessel_core::app::Window;
use tessel_core::core::{
    CursorIcon, Handled, InputEvent, Key, MouseEvent, PanelId, PointerButton, Widget,
};
use tessel_core::widgets::Panel;
use tessel_testing::{Record, Recording, TestHarness, TestWidgetExt};

fn child_at(harness: &mut TestHarness, parent: PanelId, widget: impl Widget, rect: Rect) -> PanelId {
    let id = harness.add_child(parent, widget);
    harness.tree_mut().set_frame_rect(id, rect);
    id
}

fn counting_panel(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> Panel {
    let log = log.clone();
    Panel::new().with_mouse_down(move |_, _| {
        log.borrow_mut().push(name);
        Handled::Yes
    })
}

#[test]
fn mouse_down_bubbles_to_the_first_handler() {
    let mut harness = TestHarness::create();
    let log = Rc::new(RefCell::new(Vec::new()));
    let content = harness.set_content(counting_panel(&log, "content"));
    let recording = Recording::default();
    let child = child_at(
        &mut harness,
        content,
        Panel::new().record(&recording),
        Rect::new(10., 10., 110., 110.),
    );
    recording.clear();

    harness.mouse_move((50., 50.));
    let handled = harness.mouse_button_press(PointerButton::Primary);

    assert_eq!(handled, Handled::Yes);
    assert_eq!(*log.borrow(), vec!["content"]);
    assert_matches!(recording.next(), Some(Record::MouseEnter(_)));
    assert_matches!(recording.next(), Some(Record::MouseMove(_)));
    let Some(Record::MouseDown(event)) = recording.next() else {
        panic!("child didn't see the mouse down");
    };
    assert_eq!(event.position, Point::new(40., 40.));
    assert_eq!(harness.window().hovered(), Some(child));
}

#[test]
fn front_most_child_is_hit_first() {
    let mut harness = TestHarness::create();
    let log = Rc::new(RefCell::new(Vec::new()));
    let content = harness.set_content(Panel::new());
    let rect = Rect::new(0., 0., 100., 100.);
    let front = child_at(&mut harness, content, counting_panel(&log, "front"), rect);
    child_at(&mut harness, content, counting_panel(&log, "back"), rect);

    assert_eq!(harness.window().panel_at(Point::new(50., 50.)), front);
    harness.mouse_click_at((50., 50.));
    assert_eq!(*log.borrow(), vec!["front"]);

    harness.tree_mut().set_hidden(front, true);
    harness.mouse_click_at((50., 50.));
    assert_eq!(*log.borrow(), vec!["front", "back"]);
}

#[test]
fn disabled_panels_are_skipped_while_bubbling() {
    let mut harness = TestHarness::create();
    let log = Rc::new(RefCell::new(Vec::new()));
    let content = harness.set_content(counting_panel(&log, "content"));
    let child = child_at(
        &mut harness,
        content,
        counting_panel(&log, "child"),
        Rect::new(0., 0., 100., 100.),
    );
    harness.tree_mut().set_enabled(child, false);

    harness.mouse_click_at((50., 50.));

    assert_eq!(*log.borrow(), vec!["content"]);
}

#[test]
fn drags_and_release_go_to_the_pressed_panel() {
    let mut harness = TestHarness::create();
    let content = harness.set_content(Panel::new());
    let recording = Recording::default();
    let pressed = Panel::new()
        .with_mouse_down(|_, _| Handled::Yes)
        .with_mouse_drag(|_, _| Handled::Yes)
        .with_mouse_up(|_, _| Handled::Yes)
        .record(&recording);
    child_at(&mut harness, content, pressed, Rect::new(0., 0., 50., 50.));
    let other = Recording::default();
    child_at(
        &mut harness,
        content,
        Panel::new().record(&other),
        Rect::new(100., 100., 200., 200.),
    );

    harness.mouse_move((10., 10.));
    harness.mouse_button_press(PointerButton::Primary);
    recording.clear();
    other.clear();

    harness.mouse_move((150., 150.));
    harness.mouse_button_release(PointerButton::Primary);

    let Some(Record::MouseDrag(drag)) = recording.next() else {
        panic!("pressed panel didn't receive the drag");
    };
    assert_eq!(drag.position, Point::new(150., 150.));
    assert_matches!(recording.next(), Some(Record::MouseUp(_)));
    assert_matches!(recording.next(), Some(Record::MouseExit));
    // Only the enter from the release; no moves while the button was down.
    assert_eq!(other.drain().len(), 1);
}

#[test]
fn enter_and_exit_follow_the_pointer() {
    let mut harness = TestHarness::create();
    let content = harness.set_content(Panel::new());
    let left = Recording::default();
    let right = Recording::default();
    child_at(&mut harness, content, Panel::new().record(&left), Rect::new(0., 0., 100., 100.));
    child_at(
        &mut harness,
        content,
        Panel::new().record(&right),
        Rect::new(100., 0., 200., 100.),
    );
    left.clear();
    right.clear();

    harness.mouse_move((50., 50.));
    harness.mouse_move((60., 50.));
    harness.mouse_move((150., 50.));
    harness.mouse_exit();

    assert_matches!(left.next(), Some(Record::MouseEnter(_)));
    assert_matches!(left.next(), Some(Record::MouseMove(_)));
    assert_matches!(left.next(), Some(Record::MouseMove(_)));
    assert_matches!(left.next(), Some(Record::MouseExit));
    assert!(left.is_empty());

    assert_matches!(right.next(), Some(Record::MouseEnter(_)));
    assert_matches!(right.next(), Some(Record::MouseMove(_)));
    assert_matches!(right.next(), Some(Record::MouseExit));
    assert!(harness.window().hovered().is_none());
}

#[test]
fn wheel_and_file_drop_bubble_from_the_pointer() {
    let mut harness = TestHarness::create();
    let scrolled = Rc::new(RefCell::new(Vec::new()));
    let dropped = Rc::new(RefCell::new(Vec::new()));
    let content = {
        let scrolled = scrolled.clone();
        let dropped = dropped.clone();
        harness.set_content(
            Panel::new()
                .with_mouse_wheel(move |_, event| {
                    scrolled.borrow_mut().push(event.delta);
                    Handled::Yes
                })
                .with_file_drop(move |_, paths| {
                    dropped.borrow_mut().extend(paths.iter().cloned());
                    Handled::Yes
                }),
        )
    };
    child_at(&mut harness, content, Panel::new(), Rect::new(0., 0., 100., 100.));

    harness.mouse_move((20., 20.));
    assert_eq!(harness.mouse_wheel(Vec2::new(0., -3.)), Handled::Yes);
    assert_eq!(harness.drop_files([PathBuf::from("a.txt")]), Handled::Yes);

    assert_eq!(*scrolled.borrow(), vec![Vec2::new(0., -3.)]);
    assert_eq!(*dropped.borrow(), vec![PathBuf::from("a.txt")]);
}

#[test]
fn keys_bubble_from_the_focused_panel() {
    let mut harness = TestHarness::create();
    let typed = Rc::new(RefCell::new(String::new()));
    let content = {
        let typed = typed.clone();
        harness.set_content(Panel::new().with_rune(move |_, ch| {
            typed.borrow_mut().push(ch);
            Handled::Yes
        }))
    };
    let recording = Recording::default();
    let field = child_at(
        &mut harness,
        content,
        Panel::new().record(&recording),
        Rect::new(0., 0., 100., 20.),
    );
    harness.tree_mut().set_focusable(field, true);
    harness.focus_on(Some(field));
    recording.clear();

    harness.press_key(Key::Character("x".into()));
    harness.type_chars("hi");

    assert_matches!(recording.next(), Some(Record::KeyDown(_)));
    assert_matches!(recording.next(), Some(Record::KeyUp(_)));
    assert_matches!(recording.next(), Some(Record::Rune('h')));
    assert_matches!(recording.next(), Some(Record::Rune('i')));
    assert_eq!(*typed.borrow(), "hi");
}

#[test]
fn key_up_goes_where_key_down_went() {
    let mut harness = TestHarness::create();
    let content = harness.set_content(Panel::new());
    let first = Recording::default();
    let second = Recording::default();
    let a = child_at(&mut harness, content, Panel::new().record(&first), Rect::new(0., 0., 10., 10.));
    let b = child_at(&mut harness, content, Panel::new().record(&second), Rect::new(20., 0., 30., 10.));
    harness.tree_mut().set_focusable(a, true);
    harness.tree_mut().set_focusable(b, true);
    harness.focus_on(Some(a));
    first.clear();

    harness.key_down(Key::Character("q".into()));
    harness.focus_on(Some(b));
    second.clear();
    harness.key_up(Key::Character("q".into()));

    assert_matches!(first.next(), Some(Record::KeyDown(_)));
    assert_matches!(first.next(), Some(Record::LostFocus));
    assert_matches!(first.next(), Some(Record::KeyUp(_)));
    assert!(second.is_empty());
}

#[test]
fn pre_hook_suppresses_routing() {
    let mut harness = TestHarness::create();
    let recording = Recording::default();
    harness.set_content(Panel::new().record(&recording));
    recording.clear();
    let seen = Rc::new(RefCell::new(0));
    let counter = seen.clone();
    harness.window_mut().set_pre_hook(Some(Box::new(move |_: &mut Window, event: &InputEvent| {
        *counter.borrow_mut() += 1;
        matches!(event, InputEvent::MouseDown(_))
    })));

    harness.mouse_move((5., 5.));
    assert_eq!(harness.mouse_button_press(PointerButton::Primary), Handled::Yes);

    assert_eq!(*seen.borrow(), 2);
    assert_matches!(recording.next(), Some(Record::MouseEnter(_)));
    assert_matches!(recording.next(), Some(Record::MouseMove(_)));
    assert!(recording.is_empty());
}

#[test]
fn event_hook_can_handle_events() {
    let mut harness = TestHarness::create();
    let recording = Recording::default();
    harness.set_content(Panel::new().record(&recording));
    recording.clear();
    harness.window_mut().set_event_hook(Some(Box::new(
        |window: &mut Window, event: &InputEvent| {
            if let InputEvent::MouseDown(MouseEvent { position, .. }) = event {
                window.set_title(format!("clicked at {}x{}", position.x, position.y));
                Handled::Yes
            } else {
                Handled::No
            }
        },
    )));

    harness.mouse_click_at((3., 4.));

    assert_eq!(harness.native().state().title, "clicked at 3x4");
    assert!(
        !recording
            .drain()
            .iter()
            .any(|record| matches!(record, Record::MouseDown(_)))
    );
}

#[test]
fn cursor_comes_from_the_innermost_panel_that_sets_one() {
    let mut harness = TestHarness::create();
    let content = harness.set_content(Panel::new().with_fixed_cursor(CursorIcon::Crosshair));
    child_at(
        &mut harness,
        content,
        Panel::new().with_fixed_cursor(CursorIcon::Pointer),
        Rect::new(0., 0., 50., 50.),
    );
    child_at(&mut harness, content, Panel::new(), Rect::new(100., 0., 150., 50.));

    harness.mouse_move((10., 10.));
    assert_eq!(harness.cursor_icon(), CursorIcon::Pointer);
    assert_eq!(harness.native().state().cursor, CursorIcon::Pointer);

    harness.mouse_move((120., 10.));
    assert_eq!(harness.cursor_icon(), CursorIcon::Crosshair);
}

#[test]
fn panicking_hooks_are_contained() {
    let mut harness = TestHarness::create();
    let panics = Rc::new(RefCell::new(Vec::new()));
    {
        let panics = panics.clone();
        harness
            .app()
            .recovery()
            .set_handler(move |panic| panics.borrow_mut().push(panic.callback));
    }
    let log = Rc::new(RefCell::new(Vec::new()));
    let content = harness.set_content(counting_panel(&log, "content"));
    child_at(
        &mut harness,
        content,
        Panel::new().with_mouse_down(|_, _| panic!("broken widget")),
        Rect::new(0., 0., 50., 50.),
    );

    harness.mouse_click_at((10., 10.));
    harness.mouse_click_at((100., 100.));

    assert_eq!(*panics.borrow(), vec!["on_mouse_down"]);
    // The panic counts as unhandled, so bubbling carries on.
    assert_eq!(*log.borrow(), vec!["content", "content"]);
}
