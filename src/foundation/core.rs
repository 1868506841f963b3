use std::fmt;

use crate::foundation::error::{ZoomError, ZoomResult};

/// Integer axis-aligned box in pixel space, half-open on the max edges.
///
/// Invariant: `max_x >= min_x` and `max_y >= min_y`. The origin is arbitrary; a cropped image
/// keeps the coordinates of the region it was cut from.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct PixelRect {
    /// Inclusive left edge.
    pub min_x: i32,
    /// Inclusive top edge.
    pub min_y: i32,
    /// Exclusive right edge.
    pub max_x: i32,
    /// Exclusive bottom edge.
    pub max_y: i32,
}

impl PixelRect {
    /// Create a validated rectangle.
    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> ZoomResult<Self> {
        if max_x < min_x || max_y < min_y {
            return Err(ZoomError::invalid_dimension(format!(
                "rectangle edges are inverted: [{min_x},{min_y}]-[{max_x},{max_y}]"
            )));
        }
        Ok(Self {
            min_x,
            min_y,
            max_x,
            max_y,
        })
    }

    /// Rectangle anchored at the origin with the given size.
    pub fn from_size(size: FrameSize) -> Self {
        Self {
            min_x: 0,
            min_y: 0,
            max_x: size.width as i32,
            max_y: size.height as i32,
        }
    }

    /// `max_x - min_x`.
    pub fn width(self) -> i32 {
        self.max_x - self.min_x
    }

    /// `max_y - min_y`.
    pub fn height(self) -> i32 {
        self.max_y - self.min_y
    }

    /// Pixel count, widened so large rectangles cannot overflow.
    pub fn area(self) -> i64 {
        i64::from(self.width()) * i64::from(self.height())
    }

    /// True when either side is zero.
    pub fn is_empty(self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Width and height as a [`FrameSize`]; inverted edges clamp to zero.
    pub fn size(self) -> FrameSize {
        FrameSize {
            width: self.width().max(0) as u32,
            height: self.height().max(0) as u32,
        }
    }

    /// Height over width. Zero-width rectangles have no aspect ratio.
    pub fn aspect_ratio(self) -> ZoomResult<f64> {
        if self.width() <= 0 {
            return Err(ZoomError::invalid_dimension(format!(
                "aspect ratio of zero-width rectangle {self}"
            )));
        }
        Ok(f64::from(self.height()) / f64::from(self.width()))
    }

    /// Return `true` when every pixel of `self` lies inside `outer`.
    ///
    /// Empty rectangles are contained in anything.
    pub fn is_inside(self, outer: PixelRect) -> bool {
        if self.is_empty() {
            return true;
        }
        outer.min_x <= self.min_x
            && self.max_x <= outer.max_x
            && outer.min_y <= self.min_y
            && self.max_y <= outer.max_y
    }

    /// Move the rectangle by `(dx, dy)` without resizing it.
    pub fn translate(self, dx: i32, dy: i32) -> Self {
        Self {
            min_x: self.min_x + dx,
            min_y: self.min_y + dy,
            max_x: self.max_x + dx,
            max_y: self.max_y + dy,
        }
    }

    /// Overlap of two rectangles, or `None` when they do not share any pixel.
    pub fn intersect(self, other: PixelRect) -> Option<Self> {
        let r = Self {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        };
        if r.max_x <= r.min_x || r.max_y <= r.min_y {
            None
        } else {
            Some(r)
        }
    }
}

impl fmt::Display for PixelRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{},{}]-[{},{}]",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

/// Output frame dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameSize {
    /// Create a validated size; both dimensions must be non-zero.
    pub fn new(width: u32, height: u32) -> ZoomResult<Self> {
        if width == 0 || height == 0 {
            return Err(ZoomError::invalid_dimension(format!(
                "frame size must be non-zero, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// `width * height`, the length of a row-major buffer of this size.
    pub fn pixel_count(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
