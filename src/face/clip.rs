//! Shared edge-set clipping kernels.
//!
//! These free functions operate on raw `&[LinearEdge]` and are reused by
//! [`crate::face::edged::EdgedFace`] directly and, after materializing the
//! implicit side edges, by [`crate::face::edged_clipped::EdgedClippedFace`].
//! [`crate::face::polygonal::PolygonalFace`] goes through [`crate::geometry::edges_from_polygons`]
//! and back, since a closed loop has no extra information these kernels need.
//!
//! The fake-corner construction follows a single identity: for any fixed
//! point `Q`, `area(F) = Σ_e triangle_area(Q, e.start, e.end)` over the
//! edges of `F`, regardless of `Q`. Splitting each crossing edge at the cut
//! and additionally emitting one edge from the cut point to a *shared* `Q`
//! per side reproduces exactly the clipped region's area/winding without
//! needing the edges to be globally ordered into loops.

use crate::geometry::{LinearEdge, Vec2};

fn push_if_valid(out: &mut Vec<LinearEdge>, a: Vec2, b: Vec2, fake: bool) {
    if a != b {
        out.push(LinearEdge::new_unchecked(a, b, fake));
    }
}

/// Splits `edges` by the scalar field `value_fn` against `split`, assigning
/// `value_fn(p) <= split` to the first ("min") result and `> split` to the
/// second ("max"), closing both with fake-corner edges anchored at `anchor`.
pub(crate) fn binary_clip(
    edges: &[LinearEdge],
    value_fn: impl Fn(Vec2) -> f64,
    split: f64,
    anchor: Vec2,
) -> (Vec<LinearEdge>, Vec<LinearEdge>) {
    let mut min_out = Vec::new();
    let mut max_out = Vec::new();

    for edge in edges {
        let (a, b) = (edge.start, edge.end);
        let (va, vb) = (value_fn(a), value_fn(b));
        let a_min = va <= split;
        let b_min = vb <= split;

        if va == split && vb == split {
            // Colinear on the split line: emitted on both sides, contribution
            // cancels in the winding math.
            min_out.push(*edge);
            max_out.push(*edge);
            continue;
        }

        if a_min && b_min {
            min_out.push(*edge);
            continue;
        }
        if !a_min && !b_min {
            max_out.push(*edge);
            continue;
        }

        // Crosses: split at the intersection and close both fragments
        // toward the shared anchor.
        let t = (split - va) / (vb - va);
        let ix = a + (b - a) * t;

        if a_min {
            push_if_valid(&mut min_out, a, ix, false);
            push_if_valid(&mut max_out, ix, b, false);
            push_if_valid(&mut min_out, ix, anchor, true);
            push_if_valid(&mut max_out, anchor, ix, true);
        } else {
            push_if_valid(&mut max_out, a, ix, false);
            push_if_valid(&mut min_out, ix, b, false);
            push_if_valid(&mut max_out, ix, anchor, true);
            push_if_valid(&mut min_out, anchor, ix, true);
        }
    }

    (min_out, max_out)
}

/// `getBinaryXClip`: split at `x`, fake corners anchored at `(x, fake_corner_y)`.
pub(crate) fn binary_x_clip(edges: &[LinearEdge], x: f64, fake_corner_y: f64) -> (Vec<LinearEdge>, Vec<LinearEdge>) {
    binary_clip(edges, |p| p.x, x, Vec2::new(x, fake_corner_y))
}

/// `getBinaryYClip`: split at `y`, fake corners anchored at `(fake_corner_x, y)`.
pub(crate) fn binary_y_clip(edges: &[LinearEdge], y: f64, fake_corner_x: f64) -> (Vec<LinearEdge>, Vec<LinearEdge>) {
    binary_clip(edges, |p| p.y, y, Vec2::new(fake_corner_x, y))
}

/// `getBinaryLineClip`: splits by the half-plane `normal . p <= value` (`normal` must be unit length).
/// `fake_corner_perp` offsets the anchor along the clip line's tangent, away from the
/// perpendicular foot of the origin.
pub(crate) fn binary_line_clip(
    edges: &[LinearEdge],
    normal: Vec2,
    value: f64,
    fake_corner_perp: f64,
) -> (Vec<LinearEdge>, Vec<LinearEdge>) {
    let tangent = Vec2::new(-normal.y, normal.x);
    let anchor = normal * value + tangent * fake_corner_perp;
    binary_clip(edges, |p| normal.dot(&p), value, anchor)
}

/// `getStripeLineClip`: `values.len() + 1` faces between consecutive strip boundaries.
/// `values` must be sorted ascending.
pub(crate) fn stripe_line_clip(edges: &[LinearEdge], normal: Vec2, values: &[f64]) -> Vec<Vec<LinearEdge>> {
    let mut remaining = edges.to_vec();
    let mut result = Vec::with_capacity(values.len() + 1);
    for &v in values {
        let (strip, rest) = binary_line_clip(&remaining, normal, v, 0.0);
        result.push(strip);
        remaining = rest;
    }
    result.push(remaining);
    result
}

/// `getBinaryCircularClip`: approximates the circle by a regular polygon
/// with chord angle `<= max_angle_split` and sequentially intersects `edges`
/// with each chord's interior half-plane, collecting everything carved off
/// along the way as the "outside" result. Both returned edge sets use
/// `center` as their shared fake-corner anchor, which keeps every
/// intermediate step's closing construction consistent.
pub(crate) fn binary_circular_clip(
    edges: &[LinearEdge],
    center: Vec2,
    radius: f64,
    max_angle_split: f64,
) -> (Vec<LinearEdge>, Vec<LinearEdge>) {
    use std::f64::consts::TAU;

    let segments = ((TAU / max_angle_split).ceil() as usize).max(3);
    let angle_step = TAU / segments as f64;

    let mut inside = edges.to_vec();
    let mut outside = Vec::new();

    for i in 0..segments {
        let theta = i as f64 * angle_step;
        let chord_point = center + Vec2::new(radius * theta.cos(), radius * theta.sin());
        let outward_normal = Vec2::new(theta.cos(), theta.sin());
        let value = outward_normal.dot(&chord_point);

        let (interior, exterior) = binary_clip(&inside, |p| outward_normal.dot(&p), value, center);
        outside.extend(exterior);
        inside = interior;
    }

    (inside, outside)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::edges_from_polygon;

    fn unit_square() -> Vec<LinearEdge> {
        edges_from_polygon(&[
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ])
    }

    fn area(edges: &[LinearEdge]) -> f64 {
        edges.iter().map(|e| e.signed_area_contribution()).sum()
    }

    #[test]
    fn binary_x_clip_conserves_area() {
        let sq = unit_square();
        let (min_e, max_e) = binary_x_clip(&sq, 0.3, 0.0);
        assert!((area(&min_e) - 0.3).abs() < 1e-9);
        assert!((area(&max_e) - 0.7).abs() < 1e-9);
        assert!((area(&min_e) + area(&max_e) - area(&sq)).abs() < 1e-9);
    }

    #[test]
    fn binary_y_clip_conserves_area() {
        let sq = unit_square();
        let (min_e, max_e) = binary_y_clip(&sq, 0.75, 0.0);
        assert!((area(&min_e) - 0.75).abs() < 1e-9);
        assert!((area(&max_e) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn stripe_clip_partitions_area() {
        let sq = unit_square();
        let strips = stripe_line_clip(&sq, Vec2::new(1.0, 0.0), &[0.25, 0.5, 0.75]);
        assert_eq!(strips.len(), 4);
        let total: f64 = strips.iter().map(|s| area(s)).sum();
        assert!((total - 1.0).abs() < 1e-9);
        for s in &strips {
            assert!((area(s) - 0.25).abs() < 1e-9);
        }
    }

    #[test]
    fn circular_clip_partitions_area() {
        let sq = unit_square();
        let (inside, outside) = binary_circular_clip(&sq, Vec2::new(0.5, 0.5), 0.4, std::f64::consts::PI / 16.0);
        let total = area(&inside) + area(&outside);
        assert!((total - 1.0).abs() < 1e-5, "total={total}");
        assert!((area(&inside) - std::f64::consts::PI * 0.16).abs() < 1e-2);
    }
}
