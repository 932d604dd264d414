use crate::foundation::error::{FilterError, FilterResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Size, Vec2};

/// Integer pixel size of a texture or render target.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ISize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl ISize {
    /// Create a size from width and height in pixels.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Return `true` when either dimension is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of pixels covered by this size.
    pub fn area(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Byte length of a tightly packed RGBA8 buffer of this size.
    pub fn rgba8_byte_len(self) -> FilterResult<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| FilterError::validation("rgba8 buffer size overflow"))
    }

    /// Largest dimension.
    pub fn max_dimension(self) -> u32 {
        self.width.max(self.height)
    }

    /// `(0, 0, width, height)` as a float rectangle.
    pub fn to_rect(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    /// Pixel size of a (pixel-aligned) rectangle, saturating negative extents to zero.
    pub fn from_rect(rect: Rect) -> Self {
        fn dim(v: f64) -> u32 {
            if !v.is_finite() || v <= 0.0 {
                return 0;
            }
            v.round().min(f64::from(u32::MAX)) as u32
        }
        Self {
            width: dim(rect.width()),
            height: dim(rect.height()),
        }
    }
}

/// Axis-aligned bounds of `rect` after applying `m`.
pub fn transform_bounds(rect: Rect, m: Affine) -> Rect {
    m.transform_rect_bbox(rect)
}

/// Invert `m`, or `None` when it is singular or not finite.
pub fn invert(m: Affine) -> Option<Affine> {
    let det = m.determinant();
    if !det.is_finite() || det.abs() <= f64::EPSILON * 1e-3 {
        return None;
    }
    let inv = m.inverse();
    inv.is_finite().then_some(inv)
}

/// Uniform scale factor `m` applies to areas, as a length ratio.
pub fn approximate_scale(m: Affine) -> f64 {
    m.determinant().abs().sqrt()
}

/// Union of two coverages; an unbounded side makes the result unbounded.
pub fn union_coverage(a: Option<Rect>, b: Option<Rect>) -> Option<Rect> {
    match (a, b) {
        (Some(a), Some(b)) => {
            if is_empty_rect(a) {
                Some(b)
            } else if is_empty_rect(b) {
                Some(a)
            } else {
                Some(a.union(b))
            }
        }
        _ => None,
    }
}

/// Intersection of two coverages; an unbounded side acts as the universe.
///
/// Disjoint inputs produce an empty (zero-area) rectangle, never `None`.
pub fn intersect_coverage(a: Option<Rect>, b: Option<Rect>) -> Option<Rect> {
    match (a, b) {
        (Some(a), Some(b)) => {
            let r = a.intersect(b);
            if r.width() <= 0.0 || r.height() <= 0.0 {
                Some(Rect::new(r.x0, r.y0, r.x0, r.y0))
            } else {
                Some(r)
            }
        }
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

/// Return `true` when `rect` has no positive area.
pub fn is_empty_rect(rect: Rect) -> bool {
    !(rect.width() > 0.0 && rect.height() > 0.0)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
