// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

//! Common widgets.

mod button;
mod label;
mod panel;

pub use button::{Button, CLICK_FLASH};
pub use label::Label;
pub use panel::Panel;
