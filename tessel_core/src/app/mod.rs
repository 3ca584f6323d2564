// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

//! Types needed for running a Tessel app.

mod clock;
mod native;
mod options;
mod recovery;
mod registry;
mod task_queue;
mod tracing_backend;
mod window;

pub use clock::{Clock, SystemClock};
pub use native::{NativeWindow, Platform, WindowError};
pub use options::{AppOptions, TitleIcon, WindowOptions};
pub use recovery::{CallbackPanic, Recovery};
pub use registry::{App, Tick, WindowId};
pub use task_queue::{Task, TaskQueue};
pub use tracing_backend::{
    TracingSubscriberHasBeenSetError, default_tracing_subscriber, try_init_test_tracing,
    try_init_tracing,
};
pub use window::{EventHook, PreHook, Window};
