//! Numeric kernels: shoelace area, centroid partials, and line-integral
//! evaluators.
//!
//! These are the leaves everything else is built on; other modules assume
//! the *exact* shoelace form used here, since the edged-clipped count-area
//! correction is only consistent with this specific summation order.

use crate::geometry::Vec2;

/// `polygonSignedArea`: `(1/2) * Σ (x_{i+1}+x_i)(y_{i+1}-y_i)`.
///
/// Positive for counter-clockwise loops. Other equivalent shoelace
/// formulations are deliberately not used anywhere in this crate: the
/// edged-clipped count-area correction in [`crate::face::edged_clipped`]
/// assumes this exact per-edge term.
pub fn polygon_signed_area(loop_: &[Vec2]) -> f64 {
    let n = loop_.len();
    let mut area = 0.0;
    for i in 0..n {
        let a = loop_[i];
        let b = loop_[(i + 1) % n];
        area += (b.x + a.x) * (b.y - a.y);
    }
    0.5 * area
}

/// This edge's contribution to [`polygon_signed_area`]: `(1/2)(x1+x0)(y1-y0)`.
#[inline]
pub fn edge_signed_area_contribution(a: Vec2, b: Vec2) -> f64 {
    0.5 * (b.x + a.x) * (b.y - a.y)
}

/// `polygonCentroidPartial`: the un-normalized first moment of a loop.
///
/// Divide by `6 * area` to obtain the centroid. Uses the per-edge term
/// `B = x_i(2y_i+y_{i+1}) + x_{i+1}(y_i+2y_{i+1})`.
pub fn polygon_centroid_partial(loop_: &[Vec2]) -> Vec2 {
    let n = loop_.len();
    let mut partial = Vec2::new(0.0, 0.0);
    for i in 0..n {
        let a = loop_[i];
        let b = loop_[(i + 1) % n];
        let term = a.x * (2.0 * a.y + b.y) + b.x * (a.y + 2.0 * b.y);
        partial.x += (a.x - b.x) * term;
        partial.y += (b.y - a.y) * term;
    }
    partial
}

/// Per-edge centroid-partial contribution, for accumulation over an edge
/// set rather than a closed loop (used by `EdgedFace`/`EdgedClippedFace`).
#[inline]
pub fn edge_centroid_partial_contribution(a: Vec2, b: Vec2) -> Vec2 {
    let term = a.x * (2.0 * a.y + b.y) + b.x * (a.y + 2.0 * b.y);
    Vec2::new((a.x - b.x) * term, (b.y - a.y) * term)
}

/// Resolves a centroid partial + area into an actual centroid, falling back
/// to `fallback` (the bounds center) when `area` is ~0.
pub fn resolve_centroid(partial: Vec2, area: f64, fallback: Vec2) -> Vec2 {
    if area.abs() < 1e-12 {
        fallback
    } else {
        partial / (6.0 * area)
    }
}

/// Minimum distance from the origin to the segment `a -> b`, clamped
/// projection.
pub fn closest_distance_to_origin(a: Vec2, b: Vec2) -> f64 {
    let d = b - a;
    let len_sq = d.dot(&d);
    if len_sq < 1e-18 {
        return a.norm();
    }
    let t = (-a.dot(&d) / len_sq).clamp(0.0, 1.0);
    (a + d * t).norm()
}

/// `lineIntegralDistance`: `∫_segment |r| dr`, evaluated in closed form.
///
/// Splits the segment into radial and tangential components about the
/// origin and integrates `|r|` analytically; for a segment that passes
/// through (or very near) the origin the integral is evaluated piecewise
/// on either side to avoid the removable singularity in the derivative of
/// `|r|` at `r=0`.
pub fn line_integral_distance(a: Vec2, b: Vec2) -> f64 {
    // ∫|r| dr = ∫|r(t)| r'(t) dt for r(t) = a + t(b-a), t in [0,1].
    // With d = b - a, r(t).r(t) = |a|^2 + 2 t (a.d) + t^2 |d|^2, this has a
    // closed-form antiderivative for ∫ sqrt(quadratic) * linear dt.
    let d = b - a;
    let len_sq = d.dot(&d);
    if len_sq < 1e-18 {
        return 0.0;
    }

    // Numerically stable closed form via substitution: integrate
    // f(t) = |a + t d| * (a.d + t|d|^2) dt from the antiderivative of
    // sqrt(A + B t + C t^2) * (B/2 + C t), which is (1/3)(A+Bt+Ct^2)^{3/2}
    // scaled appropriately, since d/dt (A+Bt+Ct^2) = B + 2Ct.
    let a0 = a.dot(&a);
    let b0 = 2.0 * a.dot(&d);
    let c0 = len_sq;
    let q = |t: f64| a0 + b0 * t + c0 * t * t;
    let antideriv = |t: f64| (q(t).max(0.0)).powf(1.5) / (3.0 * c0);
    antideriv(1.0) - antideriv(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn unit_square_area_is_one() {
        assert!((polygon_signed_area(&square()) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn clockwise_square_has_negative_area() {
        let mut s = square();
        s.reverse();
        assert!(polygon_signed_area(&s) < 0.0);
    }

    #[test]
    fn unit_square_centroid_is_center() {
        let area = polygon_signed_area(&square());
        let partial = polygon_centroid_partial(&square());
        let c = resolve_centroid(partial, area, Vec2::new(0.0, 0.0));
        assert!((c.x - 0.5).abs() < 1e-9);
        assert!((c.y - 0.5).abs() < 1e-9);
    }

    #[test]
    fn zero_area_falls_back_to_bounds_center() {
        let fallback = Vec2::new(3.0, 4.0);
        assert_eq!(resolve_centroid(Vec2::new(0.0, 0.0), 0.0, fallback), fallback);
    }

    #[test]
    fn closest_distance_clamps_to_endpoints() {
        let d = closest_distance_to_origin(Vec2::new(1.0, 1.0), Vec2::new(2.0, 1.0));
        assert!((d - 2f64.sqrt()).abs() < 1e-9);
    }
}
