// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

//! Miscellaneous utility functions.

/// Panic in debug and `tracing::error` in release mode.
///
/// This macro is in some way a combination of `panic` and `debug_assert`,
/// but it will log the provided message instead of ignoring it in release builds.
///
/// Contract violations against the panel tree (unknown ids, out-of-range indices)
/// go through this macro; callers then fall back to a no-op.
#[macro_export]
macro_rules! debug_panic {
    ($msg:expr$(,)?) => {
        if cfg!(debug_assertions) {
            panic!($msg);
        } else {
            tracing::error!($msg);
        }
    };
    ($fmt:expr, $($arg:tt)+) => {
        if cfg!(debug_assertions) {
            panic!($fmt, $($arg)*);
        } else {
            tracing::error!($fmt, $($arg)*);
        }
    };
}

pub use crate::debug_panic;

/// Provides sanitization of values.
///
/// Right now it is implemented for `f64`, where it forbids non-finite and
/// negative values. Geometry coming from application code goes through it
/// before it reaches layout.
pub trait Sanitize {
    /// Returns the sanitized value.
    #[track_caller]
    fn sanitize(self, name: &str) -> Self;
}

impl Sanitize for f64 {
    /// Ensures the value is finite and non-negative.
    ///
    /// Non-finite or negative value falls back to zero.
    ///
    /// # Panics
    ///
    /// Panics if the value is non-finite or negative and debug assertions are enabled.
    #[track_caller]
    fn sanitize(self, name: &str) -> Self {
        if !self.is_finite() {
            debug_panic!("{name} must be finite. Received: {self}");
            0.
        } else if self < 0. {
            debug_panic!("{name} must be non-negative. Received: {self}");
            0.
        } else {
            self
        }
    }
}

// ---

pub(crate) type AnyMap = anymap3::Map<dyn std::any::Any>;

pub use std::time::{Duration, Instant};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_valid_values() {
        assert_eq!(12.5_f64.sanitize("width"), 12.5);
        assert_eq!(0.0_f64.sanitize("width"), 0.0);
    }
}
