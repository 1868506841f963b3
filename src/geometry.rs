//! Aspect-locked crop windows.
//!
//! [`lock_aspect`] grows a subject rectangle along exactly one axis, symmetrically about its own
//! centre, until its height/width ratio matches the outer frame, then slides it back inside the
//! frame if the growth pushed it over an edge.

use crate::foundation::core::PixelRect;
use crate::foundation::error::{ZoomError, ZoomResult};

/// Lock `inner` to the aspect ratio of `outer`.
///
/// `inner` must be contained in `outer`, otherwise [`ZoomError::OutOfBounds`] is returned. When
/// both ratios compare equal, `inner` is returned unchanged.
///
/// If the required growth is wider (or taller) than `outer` itself, growth on that axis is
/// clamped to `outer`'s extent and the result keeps a residual aspect mismatch.
pub fn lock_aspect(outer: PixelRect, inner: PixelRect) -> ZoomResult<PixelRect> {
    if !inner.is_inside(outer) {
        return Err(ZoomError::out_of_bounds(inner, outer));
    }
    if inner.is_empty() || outer.is_empty() {
        return Err(ZoomError::invalid_dimension(format!(
            "cannot lock aspect of {inner} within {outer}: both need a non-zero area"
        )));
    }

    let outer_ratio = outer.aspect_ratio()?;
    let inner_ratio = inner.aspect_ratio()?;
    tracing::debug!(outer_ratio, inner_ratio, "locking aspect ratio");
    if outer_ratio == inner_ratio {
        return Ok(inner);
    }

    let mut grown = if inner_ratio > outer_ratio {
        let w = f64::from(inner.width());
        let x_shift = ((inner_ratio / outer_ratio * w - w) / 2.0).round() as i32;
        PixelRect {
            min_x: inner.min_x - x_shift,
            max_x: inner.max_x + x_shift,
            ..inner
        }
    } else {
        let h = f64::from(inner.height());
        let y_shift = ((outer_ratio / inner_ratio * h - h) / 2.0).round() as i32;
        PixelRect {
            min_y: inner.min_y - y_shift,
            max_y: inner.max_y + y_shift,
            ..inner
        }
    };
    tracing::debug!(%grown, "grown bounds before shift");

    if grown.width() > outer.width() {
        tracing::warn!(%inner, %outer, "x growth exceeds outer width; clamping");
        grown.min_x = outer.min_x;
        grown.max_x = outer.max_x;
    }
    if grown.height() > outer.height() {
        tracing::warn!(%inner, %outer, "y growth exceeds outer height; clamping");
        grown.min_y = outer.min_y;
        grown.max_y = outer.max_y;
    }

    Ok(shift_inside(outer, grown))
}

/// [`lock_aspect`] falling back to the full `outer` frame on error.
///
/// The fallback is logged at `warn` level so it never happens silently.
pub fn lock_aspect_or_full(outer: PixelRect, inner: PixelRect) -> PixelRect {
    match lock_aspect(outer, inner) {
        Ok(locked) => locked,
        Err(err) => {
            tracing::warn!(%outer, %inner, error = %err, "aspect lock failed; falling back to full frame");
            outer
        }
    }
}

// Symmetric growth from a contained rectangle can only overflow one edge.
fn shift_inside(outer: PixelRect, r: PixelRect) -> PixelRect {
    if r.is_inside(outer) {
        return r;
    }
    if r.min_x < outer.min_x {
        r.translate(outer.min_x - r.min_x, 0)
    } else if r.max_x > outer.max_x {
        r.translate(outer.max_x - r.max_x, 0)
    } else if r.min_y < outer.min_y {
        r.translate(0, outer.min_y - r.min_y)
    } else if r.max_y > outer.max_y {
        r.translate(0, outer.max_y - r.max_y)
    } else {
        r
    }
}

#[cfg(test)]
#[path = "../tests/unit/geometry.rs"]
mod tests;
