// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use hashbrown::HashMap;
use kurbo::{Rect, Size, Vec2};
use peniko::Brush;

use crate::core::Canvas;

/// Something that can be drawn at an arbitrary size, such as a drag preview.
pub trait Drawable {
    /// The natural size of the drawable.
    fn logical_size(&self) -> Size;

    /// Draw into `rect` using `ink`.
    fn draw_in_rect(&self, canvas: &mut dyn Canvas, rect: Rect, ink: &Brush);
}

/// The payload of a data drag.
///
/// A drag only starts when the payload carries at least one value,
/// a preview drawable and an ink to draw the preview with.
#[derive(Clone, Default)]
pub struct DragData {
    values: HashMap<String, Rc<dyn Any>>,
    /// Preview drawn under the pointer while dragging.
    pub drawable: Option<Rc<dyn Drawable>>,
    /// Ink the preview is drawn with.
    pub ink: Option<Brush>,
    /// Offset of the preview's top-left corner from the pointer.
    pub offset: Vec2,
}

impl fmt::Debug for DragData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.values.keys().map(String::as_str).collect();
        keys.sort_unstable();
        f.debug_struct("DragData")
            .field("keys", &keys)
            .field("has_drawable", &self.drawable.is_some())
            .field("ink", &self.ink)
            .field("offset", &self.offset)
            .finish()
    }
}

impl DragData {
    /// An empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style method to add a value under `key`.
    pub fn with_value(mut self, key: impl Into<String>, value: impl Any) -> Self {
        self.values.insert(key.into(), Rc::new(value));
        self
    }

    /// Builder-style method for setting the preview.
    pub fn with_drawable(mut self, drawable: impl Drawable + 'static) -> Self {
        self.drawable = Some(Rc::new(drawable));
        self
    }

    /// Builder-style method for setting the preview ink.
    pub fn with_ink(mut self, ink: impl Into<Brush>) -> Self {
        self.ink = Some(ink.into());
        self
    }

    /// Builder-style method for setting the preview offset.
    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    /// The value stored under `key`, if it has type `T`.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key)?.downcast_ref::<T>()
    }

    /// `true` if a value is stored under `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` if no values are stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `true` if this payload can start a drag.
    pub fn is_valid(&self) -> bool {
        !self.values.is_empty() && self.drawable.is_some() && self.ink.is_some()
    }
}
