// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

//! Data drag and drop between panels of one window.

use std::cell::RefCell;
use std::rc::Rc;

use assert_matches::assert_matches;
use kurbo::{Point, Rect, Size};
use peniko::Brush;
use peniko::color::palette;
use tessel_core::core::{Canvas, DragData, Drawable, Handled, PanelId, PointerButton};
use tessel_core::widgets::Panel;
use tessel_testing::{Record, Recording, TestHarness, TestWidgetExt};

struct Swatch;

impl Drawable for Swatch {
    fn logical_size(&self) -> Size {
        Size::new(10., 10.)
    }

    fn draw_in_rect(&self, canvas: &mut dyn Canvas, rect: Rect, ink: &Brush) {
        canvas.fill_rect(rect, ink);
    }
}

fn payload() -> DragData {
    DragData::new()
        .with_value("text", "payload".to_string())
        .with_drawable(Swatch)
        .with_ink(palette::css::RED)
}

struct Scene {
    harness: TestHarness,
    target: PanelId,
    recording: Recording,
    dropped: Rc<RefCell<Option<String>>>,
}

// A source at the top left that starts a drag when dragged,
// and a target to its right that accepts text.
fn scene() -> Scene {
    let mut harness = TestHarness::create();
    let content = harness.set_content(Panel::new());
    let source = harness.add_child(
        content,
        Panel::new()
            .with_mouse_down(|_, _| Handled::Yes)
            .with_mouse_drag(|ctx, _| {
                ctx.start_data_drag(payload());
                Handled::Yes
            }),
    );
    harness
        .tree_mut()
        .set_frame_rect(source, Rect::new(0., 0., 50., 50.));

    let recording = Recording::default();
    let dropped = Rc::new(RefCell::new(None));
    let sink = dropped.clone();
    let target = harness.add_child(
        content,
        Panel::new()
            .with_data_drag_over(|_, _, data| data.contains_key("text"))
            .with_data_drag_drop(move |_, _, data| {
                *sink.borrow_mut() = data.get::<String>("text").cloned();
            })
            .record(&recording),
    );
    harness
        .tree_mut()
        .set_frame_rect(target, Rect::new(100., 0., 200., 100.));
    recording.clear();

    Scene {
        harness,
        target,
        recording,
        dropped,
    }
}

fn start_drag(harness: &mut TestHarness) {
    harness.mouse_move((10., 10.));
    harness.mouse_button_press(PointerButton::Primary);
    harness.mouse_move((20., 20.));
    assert!(harness.window().is_dragging(), "drag didn't start");
}

#[test]
fn payload_is_dropped_on_the_accepting_panel() {
    let Scene {
        mut harness,
        target,
        recording,
        dropped,
    } = scene();
    start_drag(&mut harness);

    harness.mouse_move((150., 50.));
    assert_eq!(harness.window().drag_target(), Some(target));
    harness.mouse_button_release(PointerButton::Primary);

    assert_eq!(recording.next(), Some(Record::DataDragOver(Point::new(50., 50.))));
    assert_eq!(recording.next(), Some(Record::DataDragDrop(Point::new(50., 50.))));
    assert_eq!(dropped.borrow().as_deref(), Some("payload"));
    assert!(!harness.window().is_dragging());
}

#[test]
fn leaving_the_target_sends_exit() {
    let Scene {
        mut harness,
        recording,
        dropped,
        ..
    } = scene();
    start_drag(&mut harness);

    harness.mouse_move((150., 50.));
    harness.mouse_move((300., 300.));
    assert_eq!(harness.window().drag_target(), None);
    harness.mouse_button_release(PointerButton::Primary);

    assert_matches!(recording.next(), Some(Record::DataDragOver(_)));
    assert_matches!(recording.next(), Some(Record::DataDragExit));
    // The release outside the target only produces hover tracking.
    assert!(
        recording
            .drain()
            .iter()
            .all(|record| !matches!(record, Record::DataDragDrop(_)))
    );
    assert_eq!(*dropped.borrow(), None);
}

#[test]
fn preview_follows_the_pointer() {
    let Scene { mut harness, .. } = scene();
    start_drag(&mut harness);
    harness.mouse_move((150., 50.));

    let canvas = harness.render();

    assert_eq!(canvas.fills().last(), Some(&Rect::new(150., 50., 160., 60.)));
    assert!(canvas.is_balanced());
}

#[test]
fn incomplete_payloads_do_not_start_a_drag() {
    let mut harness = TestHarness::create();
    let without_preview = DragData::new().with_value("text", 1_u32);
    assert!(!harness.window_mut().start_data_drag(without_preview));
    assert!(!harness.window_mut().start_data_drag(DragData::new()));
    assert!(!harness.window().is_dragging());

    assert!(harness.window_mut().start_data_drag(payload()));
    assert!(harness.window().is_dragging());
}
