// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

//! Keyboard focus and focus traversal.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tessel_core::core::{Handled, Key, NamedKey, PanelId, PanelTree};
use tessel_core::widgets::Panel;
use tessel_testing::{TestHarness, assert_debug_panics};

type Log = Rc<RefCell<Vec<String>>>;

fn logging_panel(log: &Log, name: &'static str) -> Panel {
    let (gained, lost, hierarchy) = (log.clone(), log.clone(), log.clone());
    Panel::new()
        .with_gained_focus(move |_| gained.borrow_mut().push(format!("{name} gained")))
        .with_lost_focus(move |_| lost.borrow_mut().push(format!("{name} lost")))
        .with_focus_changed_in_hierarchy(move |_, _, _| {
            hierarchy.borrow_mut().push(format!("{name} hierarchy"));
        })
}

struct Form {
    harness: TestHarness,
    log: Log,
    a: PanelId,
    group: PanelId,
    b: PanelId,
    c: PanelId,
    d: PanelId,
}

// content
// ├── a
// ├── group
// │   ├── b
// │   └── c
// └── d
fn form() -> Form {
    let mut harness = TestHarness::create();
    let log = Log::default();
    let content = harness.set_content(logging_panel(&log, "content"));
    let a = harness.add_child(content, logging_panel(&log, "a"));
    let group = harness.add_child(content, logging_panel(&log, "group"));
    let b = harness.add_child(group, logging_panel(&log, "b"));
    let c = harness.add_child(group, logging_panel(&log, "c"));
    let d = harness.add_child(content, logging_panel(&log, "d"));
    for id in [a, b, c, d] {
        harness.tree_mut().set_focusable(id, true);
    }
    Form {
        harness,
        log,
        a,
        group,
        b,
        c,
        d,
    }
}

#[test]
fn tab_walks_focusables_in_tree_order() {
    let Form {
        mut harness, a, b, c, d, ..
    } = form();

    let mut visited = Vec::new();
    for _ in 0..5 {
        harness.press_tab(false);
        visited.push(harness.focused());
    }
    assert_eq!(visited, vec![Some(a), Some(b), Some(c), Some(d), Some(a)]);

    harness.press_tab(true);
    assert_eq!(harness.focused(), Some(d));
    harness.press_tab(true);
    assert_eq!(harness.focused(), Some(c));
}

#[test]
fn shift_tab_from_nothing_starts_at_the_end() {
    let Form { mut harness, d, .. } = form();
    harness.press_tab(true);
    assert_eq!(harness.focused(), Some(d));
}

#[test]
fn hidden_subtrees_are_skipped() {
    let Form {
        mut harness,
        a,
        group,
        d,
        ..
    } = form();
    harness.tree_mut().set_hidden(group, true);

    harness.focus_on(Some(a));
    harness.press_tab(false);
    assert_eq!(harness.focused(), Some(d));
}

#[test]
fn handled_tab_does_not_move_focus() {
    let mut harness = TestHarness::create();
    let content = harness.set_content(Panel::new());
    let editor = harness.add_child(
        content,
        Panel::new().with_key_down(|_, event| (event.key == Key::Named(NamedKey::Tab)).into()),
    );
    let other = harness.add_child(content, Panel::new());
    harness.tree_mut().set_focusable(editor, true);
    harness.tree_mut().set_focusable(other, true);
    harness.focus_on(Some(editor));

    let handled = harness.key_down(Key::Named(NamedKey::Tab));

    assert_eq!(handled, Handled::Yes);
    assert_eq!(harness.focused(), Some(editor));
}

#[test]
fn focus_hooks_run_in_order() {
    let Form {
        mut harness,
        log,
        a,
        b,
        ..
    } = form();
    harness.focus_on(Some(a));
    log.borrow_mut().clear();

    harness.focus_on(Some(b));

    assert_eq!(
        *log.borrow(),
        vec!["a lost", "b gained", "content hierarchy", "group hierarchy"]
    );
}

#[test]
fn focusing_a_container_picks_its_first_focusable() {
    let Form {
        mut harness,
        group,
        b,
        ..
    } = form();
    harness.focus_on(Some(group));
    assert_eq!(harness.focused(), Some(b));

    let empty = harness.set_content(Panel::new());
    harness.focus_on(Some(empty));
    assert_eq!(harness.focused(), None);
}

#[test]
fn refocusing_the_same_panel_is_a_no_op() {
    let Form {
        mut harness, log, a, ..
    } = form();
    harness.focus_on(Some(a));
    log.borrow_mut().clear();

    harness.focus_on(Some(a));

    assert!(log.borrow().is_empty());
}

#[test]
fn replacing_the_content_drops_focus() {
    let Form { mut harness, c, .. } = form();
    harness.focus_on(Some(c));
    harness.set_content(Panel::new());
    assert_eq!(harness.focused(), None);
}

#[test]
fn focusing_a_foreign_panel_is_a_contract_violation() {
    let mut harness = TestHarness::create();
    let foreign = PanelTree::new().create(Panel::new());
    assert_debug_panics!(harness.focus_on(Some(foreign)), "not in the window's tree");
}

fn counting_keys(count: &Rc<Cell<u32>>) -> Panel {
    let count = count.clone();
    Panel::new().with_key_down(move |_, _| {
        count.set(count.get() + 1);
        Handled::Yes
    })
}

#[test]
fn detached_focus_is_dropped_before_keys_are_routed() {
    let mut harness = TestHarness::create();
    let (content_keys, field_keys) = (Rc::new(Cell::new(0)), Rc::new(Cell::new(0)));
    let content = harness.set_content(counting_keys(&content_keys));
    let field = harness.add_child(content, counting_keys(&field_keys));
    harness.tree_mut().set_focusable(field, true);
    harness.focus_on(Some(field));

    harness.tree_mut().remove_from_parent(field);
    harness.key_down(Key::Named(NamedKey::Enter));

    assert_eq!(harness.focused(), None);
    assert_eq!(field_keys.get(), 0);
    assert_eq!(content_keys.get(), 1);
}

#[test]
fn hidden_or_disabled_panels_lose_focus() {
    let Form {
        mut harness,
        log,
        a,
        group,
        b,
        d,
        ..
    } = form();
    harness.focus_on(Some(b));
    log.borrow_mut().clear();

    harness.tree_mut().set_hidden(group, true);
    harness.key_down(Key::Character("x".into()));
    assert_eq!(harness.focused(), None);
    assert_eq!(log.borrow()[0], "b lost");

    harness.focus_on(Some(a));
    harness.tree_mut().set_enabled(a, false);
    harness.press_tab(false);
    assert_eq!(harness.focused(), Some(d));
}
