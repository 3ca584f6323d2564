// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

/// Checks that the given expression panics in debug mode. No-op in release mode.
///
/// Contract violations against the panel tree go through `debug_panic!`,
/// which only panics when debug assertions are on.
#[macro_export]
macro_rules! assert_debug_panics {
    ($expr:expr) => {
        $crate::assert_debug_panics_inner(
            || {
                $expr;
            },
            "".into(),
        )
    };

    ($expr:expr, $needle:expr) => {
        $crate::assert_debug_panics_inner(
            || {
                $expr;
            },
            ($needle).to_string(),
        )
    };
}

use std::panic::{AssertUnwindSafe, catch_unwind};

#[track_caller]
#[doc(hidden)]
pub fn assert_debug_panics_inner(callback: impl FnOnce(), needle: String) {
    if cfg!(not(debug_assertions)) {
        return;
    }

    // Only used in tests: a broken unwind invariant means a confusing test, not UB.
    let Err(err) = catch_unwind(AssertUnwindSafe(callback)) else {
        panic!("expression did not panic");
    };

    let message = if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        panic!("panic payload is neither &str nor String");
    };

    assert!(
        message.contains(&needle),
        "panic message {message:?} does not contain {needle:?}"
    );
}
