// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

/// A panic caught while running an application callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackPanic {
    /// Name of the callback that panicked, e.g. `"on_mouse_down"` or `"task"`.
    pub callback: &'static str,
    /// The panic message, if it was a string.
    pub message: String,
}

impl fmt::Display for CallbackPanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "callback `{}` panicked: {}", self.callback, self.message)
    }
}

impl std::error::Error for CallbackPanic {}

type Handler = Box<dyn FnMut(&CallbackPanic)>;

/// The recovery boundary every application callback runs behind.
///
/// A panic inside [`run`](Self::run) is caught and handed to the installed handler,
/// or logged if there is none, and the caller carries on.
/// Clones share the same handler.
#[derive(Clone, Default)]
pub struct Recovery {
    handler: Rc<RefCell<Option<Handler>>>,
}

impl fmt::Debug for Recovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let installed = self
            .handler
            .try_borrow()
            .map(|handler| handler.is_some())
            .unwrap_or(true);
        f.debug_struct("Recovery")
            .field("handler_installed", &installed)
            .finish()
    }
}

impl Recovery {
    /// A boundary that logs caught panics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report caught panics to `handler` instead of logging them.
    pub fn set_handler(&self, handler: impl FnMut(&CallbackPanic) + 'static) {
        if let Ok(mut slot) = self.handler.try_borrow_mut() {
            *slot = Some(Box::new(handler));
        } else {
            debug_panic!("Can't replace the recovery handler from inside itself");
        }
    }

    /// Go back to logging caught panics.
    pub fn clear_handler(&self) {
        if let Ok(mut slot) = self.handler.try_borrow_mut() {
            *slot = None;
        }
    }

    /// Run `f`, returning `None` if it panicked.
    pub fn run<R>(&self, callback: &'static str, f: impl FnOnce() -> R) -> Option<R> {
        match catch_unwind(AssertUnwindSafe(f)) {
            Ok(result) => Some(result),
            Err(payload) => {
                self.report(CallbackPanic {
                    callback,
                    message: panic_message(payload.as_ref()),
                });
                None
            }
        }
    }

    fn report(&self, panic: CallbackPanic) {
        match self.handler.try_borrow_mut() {
            Ok(mut handler) => match handler.as_mut() {
                Some(handler) => handler(&panic),
                None => tracing::error!(callback = panic.callback, "{}", panic.message),
            },
            // The handler itself panicked under a nested boundary.
            Err(_) => tracing::error!(callback = panic.callback, "{}", panic.message),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
