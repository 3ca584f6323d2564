// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

//! The task queue and the application tick.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use tessel_core::app::{App, AppOptions, WindowError, WindowOptions};
use tessel_core::core::InputEvent;
use tessel_testing::{HeadlessPlatform, ManualClock, RecordingCanvas};

fn app_with_clock() -> (App, Arc<ManualClock>) {
    let clock = ManualClock::shared();
    let app = App::new(AppOptions {
        clock: Some(clock.clone()),
        ..AppOptions::default()
    });
    (app, clock)
}

fn log_task(log: &Arc<Mutex<Vec<u32>>>, value: u32) -> impl FnOnce(&mut App) + Send + 'static {
    let log = log.clone();
    move |_: &mut App| log.lock().unwrap().push(value)
}

#[test]
fn one_task_per_tick_in_order() {
    let (mut app, _clock) = app_with_clock();
    let log = Arc::new(Mutex::new(Vec::new()));
    for value in 1..=3 {
        app.tasks().invoke(log_task(&log, value));
    }

    let tick = app.tick();
    assert!(tick.ran_task);
    assert_eq!(tick.pending, 2);
    assert_eq!(*log.lock().unwrap(), vec![1]);

    app.tick();
    app.tick();
    assert_eq!(*log.lock().unwrap(), vec![1, 2, 3]);
    assert!(!app.tick().ran_task);
}

#[test]
fn delayed_tasks_run_once_due() {
    let (mut app, clock) = app_with_clock();
    let log = Arc::new(Mutex::new(Vec::new()));
    let start = app.tasks().now();
    app.tasks()
        .invoke_after(log_task(&log, 20), Duration::from_millis(20));
    app.tasks()
        .invoke_after(log_task(&log, 10), Duration::from_millis(10));
    app.tasks().invoke(log_task(&log, 0));

    app.tick();
    let tick = app.tick();
    assert!(!tick.ran_task);
    assert_eq!(tick.next_deadline, Some(start + Duration::from_millis(10)));

    clock.advance(Duration::from_millis(15));
    assert!(app.tick().ran_task);
    assert!(!app.tick().ran_task);
    clock.advance(Duration::from_millis(10));
    app.tick();

    assert_eq!(*log.lock().unwrap(), vec![0, 10, 20]);
    assert!(app.tasks().is_empty());
}

#[test]
fn tasks_can_come_from_other_threads() {
    let (mut app, _clock) = app_with_clock();
    let wakes = Arc::new(AtomicUsize::new(0));
    let counter = wakes.clone();
    app.tasks().set_waker(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let log = Arc::new(Mutex::new(Vec::new()));

    let tasks = app.tasks().clone();
    let task = log_task(&log, 7);
    std::thread::spawn(move || tasks.invoke(task))
        .join()
        .unwrap();
    app.tick();

    assert_eq!(*log.lock().unwrap(), vec![7]);
    assert_eq!(wakes.load(Ordering::SeqCst), 1);
}

#[test]
fn a_panicking_task_does_not_stop_the_loop() {
    let (mut app, _clock) = app_with_clock();
    let panics = Rc::new(RefCell::new(Vec::new()));
    {
        let panics = panics.clone();
        app.recovery()
            .set_handler(move |panic| panics.borrow_mut().push(panic.clone()));
    }
    let log = Arc::new(Mutex::new(Vec::new()));
    app.tasks().invoke(|_| panic!("task failed"));
    app.tasks().invoke(log_task(&log, 1));

    assert!(app.tick().ran_task);
    assert!(app.tick().ran_task);

    assert_eq!(*log.lock().unwrap(), vec![1]);
    let panics = panics.borrow();
    assert_eq!(panics.len(), 1);
    assert_eq!(panics[0].callback, "task");
    assert_eq!(panics[0].message, "task failed");
}

#[test]
fn tasks_must_check_their_window_is_still_open() {
    let (mut app, _clock) = app_with_clock();
    let mut platform = HeadlessPlatform::new();
    let window = app
        .open_window(&mut platform, WindowOptions::new("doomed"))
        .unwrap();
    let seen = Arc::new(Mutex::new(None));
    let sink = seen.clone();
    app.tasks().invoke(move |app| {
        *sink.lock().unwrap() = Some(app.is_valid(window));
        if let Some(window) = app.window_mut(window) {
            window.set_title("still here");
        }
    });

    app.dispose_window(window).unwrap();
    app.tick();

    assert_eq!(*seen.lock().unwrap(), Some(false));
    let native = platform.last_window().unwrap().state();
    assert!(native.closed);
    assert_eq!(native.title, "doomed");
}

#[test]
fn window_registry_errors() {
    let (mut app, _clock) = app_with_clock();
    let mut platform = HeadlessPlatform::new();

    platform.fail_next_window("no display");
    assert_matches!(
        app.open_window(&mut platform, WindowOptions::new("a")),
        Err(WindowError::Creation(reason)) if reason == "no display"
    );

    let window = app
        .open_window(&mut platform, WindowOptions::new("b"))
        .unwrap();
    assert_eq!(app.window_ids(), vec![window]);
    app.set_active_window(Some(window));
    assert_eq!(app.active_window(), Some(window));

    app.dispose_window(window).unwrap();
    assert_eq!(app.active_window(), None);
    assert_matches!(app.dispose_window(window), Err(WindowError::UnknownWindow(id)) if id == window);
    assert_matches!(
        app.dispatch(window, InputEvent::MouseExit),
        Err(WindowError::UnknownWindow(_))
    );
}

#[test]
fn redraws_are_coalesced_and_wait_for_visibility() {
    let (mut app, _clock) = app_with_clock();
    let mut platform = HeadlessPlatform::new();
    let id = app
        .open_window(&mut platform, WindowOptions::new("paint"))
        .unwrap();
    let native = platform.last_window().unwrap().clone();

    app.window_mut(id).unwrap().request_redraw();
    app.tick();
    assert_eq!(native.redraw_requests(), 0);

    app.window_mut(id).unwrap().show();
    assert_eq!(native.redraw_requests(), 1);
    app.window_mut(id).unwrap().request_redraw();
    app.tick();
    assert_eq!(native.redraw_requests(), 1);

    app.window_mut(id).unwrap().draw(&mut RecordingCanvas::new());
    app.window_mut(id).unwrap().request_redraw();
    app.tick();
    assert_eq!(native.redraw_requests(), 2);
}
