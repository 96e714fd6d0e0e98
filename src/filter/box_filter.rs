//! Box (nearest/tent-free) reconstruction filter.

use super::{green_line_integral, Filter};
use crate::face::ClippableFace;

/// Separable box filter: `1` on `[-scale/2, scale/2]` in each axis, `0`
/// elsewhere. For `scale == 1` this is the classic "area of intersection
/// with the sample's unit box" filter, and `evaluate_full` degenerates to
/// `1.0` for any pixel fully inside the support.
#[derive(Debug, Clone, Copy)]
pub struct BoxFilter {
    pub scale: f64,
}

impl BoxFilter {
    pub fn new(scale: f64) -> Self {
        BoxFilter { scale }
    }

    #[inline]
    fn half_width(&self) -> f64 {
        0.5 * self.scale
    }

    #[inline]
    fn kernel_1d(&self, t: f64) -> f64 {
        if t.abs() <= self.half_width() {
            1.0
        } else {
            0.0
        }
    }

    /// Antiderivative of the 1D box kernel: a ramp clamped to `[-hw, hw]`.
    #[inline]
    fn antideriv_1d(&self, t: f64) -> f64 {
        t.clamp(-self.half_width(), self.half_width())
    }

    /// Closed-form overlap length of `[lo, lo+1]` with `[-hw, hw]` offset by `c`.
    fn overlap_1d(&self, lo: f64, c: f64) -> f64 {
        let hw = self.half_width();
        let (a0, a1) = (lo - c, lo + 1.0 - c);
        (a1.min(hw) - a0.max(-hw)).max(0.0)
    }
}

impl Filter for BoxFilter {
    fn min_expand(&self) -> f64 {
        self.half_width()
    }
    fn max_expand(&self) -> f64 {
        self.half_width()
    }
    fn bounds_shift(&self) -> f64 {
        -1.0
    }

    fn evaluate_full(&self, x: f64, y: f64, px: f64, py: f64) -> f64 {
        self.overlap_1d(px, x) * self.overlap_1d(py, y)
    }

    fn evaluate_clipped(&self, face: &dyn ClippableFace, x: f64, y: f64, px: f64, py: f64, _area: f64) -> f64 {
        green_line_integral(face, x, y, px, py, |t| self.antideriv_1d(t), |t| self.kernel_1d(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::PolygonalFace;
    use crate::geometry::Vec2;

    #[test]
    fn full_pixel_under_unit_scale_box_is_one() {
        let f = BoxFilter::new(1.0);
        assert!((f.evaluate_full(0.5, 0.5, 0.0, 0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn clipped_half_pixel_is_half() {
        let f = BoxFilter::new(1.0);
        let half = PolygonalFace::from_loop(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(0.5, 0.0),
            Vec2::new(0.5, 1.0),
            Vec2::new(0.0, 1.0),
        ])
        .unwrap();
        let v = f.evaluate_clipped(&half, 0.5, 0.5, 0.0, 0.0, 0.5);
        assert!((v - 0.5).abs() < 1e-6, "got {v}");
    }
}
