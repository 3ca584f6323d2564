// Copyright 2025 the Tessel Authors
// SPDX-License-Identifier: Apache-2.0

use kurbo::{Insets, Size};

/// The "as large as possible" sentinel used for maximum sizes.
///
/// Values are clamped to this so that scaling and summing maximum sizes
/// never overflows into infinity.
pub const MAX_SIZE: f64 = 1_000_000.;

/// The largest size a panel can request.
pub const fn max_size() -> Size {
    Size::new(MAX_SIZE, MAX_SIZE)
}

/// The minimum, preferred and maximum sizes of a panel.
///
/// This is what a [`Layout`](crate::layout::Layout) or a
/// [`Sizer`](crate::core::Sizer) returns for a given hint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sizes {
    /// The smallest size the panel can be made without clipping its content.
    pub min: Size,
    /// The size the panel would like to be.
    pub pref: Size,
    /// The largest size the panel makes use of.
    pub max: Size,
}

impl Default for Sizes {
    /// The unconstrained default: zero minimum and preferred size, maximum as large as possible.
    fn default() -> Self {
        Self {
            min: Size::ZERO,
            pref: Size::ZERO,
            max: max_size(),
        }
    }
}

impl Sizes {
    /// Create a new set of sizes.
    pub const fn new(min: Size, pref: Size, max: Size) -> Self {
        Self { min, pref, max }
    }

    /// Sizes where minimum, preferred and maximum are all `size`.
    pub const fn fixed(size: Size) -> Self {
        Self::new(size, size, size)
    }

    /// Multiply every size by `scale`, keeping the results within [`MAX_SIZE`].
    pub fn scaled(self, scale: f64) -> Self {
        if scale == 1. {
            return self;
        }
        Self {
            min: clamp_to_max(self.min * scale),
            pref: clamp_to_max(self.pref * scale),
            max: clamp_to_max(self.max * scale),
        }
    }

    /// Grow every size by `insets`, keeping the results within [`MAX_SIZE`].
    pub fn grow(self, insets: Insets) -> Self {
        let extra = Size::new(insets.x_value(), insets.y_value());
        Self {
            min: clamp_to_max(self.min + extra),
            pref: clamp_to_max(self.pref + extra),
            max: clamp_to_max(self.max + extra),
        }
    }

    /// Make sure `min <= pref <= max` holds on both axes.
    ///
    /// The minimum wins when the constraints contradict each other.
    pub fn normalized(self) -> Self {
        let pref = Size::new(
            self.pref.width.max(self.min.width),
            self.pref.height.max(self.min.height),
        );
        let max = Size::new(self.max.width.max(pref.width), self.max.height.max(pref.height));
        Self {
            min: self.min,
            pref,
            max,
        }
    }
}

fn clamp_to_max(size: Size) -> Size {
    Size::new(size.width.min(MAX_SIZE), size.height.min(MAX_SIZE))
}

/// Divide a sizing hint by `scale`, leaving unconstrained (zero) axes alone.
pub(crate) fn unscale_hint(hint: Size, scale: f64) -> Size {
    if scale == 1. || scale <= 0. {
        return hint;
    }
    Size::new(
        if hint.width > 0. { hint.width / scale } else { hint.width },
        if hint.height > 0. { hint.height / scale } else { hint.height },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unconstrained() {
        let sizes = Sizes::default();
        assert_eq!(sizes.min, Size::ZERO);
        assert_eq!(sizes.pref, Size::ZERO);
        assert_eq!(sizes.max, max_size());
    }

    #[test]
    fn scaling_never_exceeds_max() {
        let sizes = Sizes::new(Size::new(10., 5.), Size::new(20., 10.), max_size()).scaled(2.);
        assert_eq!(sizes.min, Size::new(20., 10.));
        assert_eq!(sizes.pref, Size::new(40., 20.));
        assert_eq!(sizes.max, max_size());
    }

    #[test]
    fn grow_adds_insets_on_both_axes() {
        let sizes = Sizes::fixed(Size::new(10., 10.)).grow(Insets::new(1., 2., 3., 4.));
        assert_eq!(sizes.pref, Size::new(14., 16.));
    }

    #[test]
    fn unscaled_hint_keeps_zero_axes() {
        assert_eq!(unscale_hint(Size::new(100., 0.), 2.), Size::new(50., 0.));
    }

    #[test]
    fn normalize_lets_minimum_win() {
        let sizes = Sizes::new(Size::new(50., 5.), Size::new(10., 10.), Size::new(20., 8.)).normalized();
        assert_eq!(sizes.pref, Size::new(50., 10.));
        assert_eq!(sizes.max, Size::new(50., 10.));
    }
}
