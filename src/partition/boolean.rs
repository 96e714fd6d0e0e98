//! Face-vs-path boolean clip: splits a face's edge set into the
//! portion inside a [`RenderPath`] and the portion outside it.
//!
//! Unlike the axis/line/circle kernels in [`crate::face::clip`], a path
//! boundary isn't a single half-plane, so there is no shared anchor point
//! whose fan-triangle area matches every fragment regardless of path shape.
//! Instead this follows the classic Weiler-Atherton construction: both
//! edge sets are split at their mutual intersections, each fragment is
//! classified by a midpoint test, and the path's own boundary (the part
//! of it that runs through the face's interior) is reused to close both
//! halves — once with its own orientation for the inside half, once
//! reversed for the outside half.
//!
//! This assumes `path` is a simple (non self-intersecting) boundary per
//! loop, consistently oriented; a path relying on even-odd self-overlap
//! for its fill is still classified correctly pointwise (`contains_point`
//! already applies the fill rule) but the reused-boundary construction
//! below picks a single winding direction for it.

use crate::geometry::{edges_from_polygon, winding_number_edges, LinearEdge, Vec2};
use crate::program::path::RenderPath;

const EPS: f64 = 1e-9;

fn segment_intersection_t(a0: Vec2, a1: Vec2, b0: Vec2, b1: Vec2) -> Option<f64> {
    let d1 = a1 - a0;
    let d2 = b1 - b0;
    let denom = d1.x * d2.y - d1.y * d2.x;
    if denom.abs() < 1e-12 {
        return None;
    }
    let diff = b0 - a0;
    let t = (diff.x * d2.y - diff.y * d2.x) / denom;
    let u = (diff.x * d1.y - diff.y * d1.x) / denom;
    if t > -EPS && t < 1.0 + EPS && u > -EPS && u < 1.0 + EPS {
        Some(t.clamp(0.0, 1.0))
    } else {
        None
    }
}

/// Splits `edge` at every parameter in `ts`, dropping parameters too close
/// to an endpoint or to each other to produce a non-degenerate fragment.
fn split_edge(edge: &LinearEdge, mut ts: Vec<f64>) -> Vec<LinearEdge> {
    ts.retain(|t| *t > EPS && *t < 1.0 - EPS);
    ts.sort_by(|a, b| a.partial_cmp(b).unwrap());
    ts.dedup_by(|a, b| (*a - *b).abs() < EPS);

    let mut points = Vec::with_capacity(ts.len() + 2);
    points.push(edge.start);
    for t in ts {
        points.push(edge.start + edge.delta() * t);
    }
    points.push(edge.end);

    points
        .windows(2)
        .filter_map(|w| LinearEdge::new_with_fake_corner(w[0], w[1], edge.contains_fake_corner).ok())
        .collect()
}

/// Splits every edge in `edges` at its intersections with every edge in `against`.
fn split_all(edges: &[LinearEdge], against: &[LinearEdge]) -> Vec<LinearEdge> {
    let mut out = Vec::with_capacity(edges.len());
    for edge in edges {
        let ts: Vec<f64> = against
            .iter()
            .filter_map(|other| segment_intersection_t(edge.start, edge.end, other.start, other.end))
            .collect();
        out.extend(split_edge(edge, ts));
    }
    out
}

fn midpoint(edge: &LinearEdge) -> Vec2 {
    edge.start + edge.delta() * 0.5
}

/// Splits `face_edges` into `(inside, outside)` relative to `path`'s
/// filled interior: one fragment set for each side of the path boundary.
/// Both outputs are complete edge sets in the sense
/// [`crate::face::edged::EdgedFace`] expects: no literal loop closure,
/// but area/winding computed over the set reproduces the true clipped
/// region.
pub fn clip_edges_by_path(face_edges: &[LinearEdge], path: &RenderPath) -> (Vec<LinearEdge>, Vec<LinearEdge>) {
    let path_edges: Vec<LinearEdge> = path.loops.iter().flat_map(|l| edges_from_polygon(l)).collect();

    if path_edges.is_empty() {
        // Trivially-empty path: nothing is inside it.
        return (Vec::new(), face_edges.to_vec());
    }

    let split_face = split_all(face_edges, &path_edges);
    let split_path = split_all(&path_edges, face_edges);

    let mut inside = Vec::new();
    let mut outside = Vec::new();

    for edge in &split_face {
        if path.contains_point(midpoint(edge)) {
            inside.push(*edge);
        } else {
            outside.push(*edge);
        }
    }

    for edge in &split_path {
        // `face_edges` has no fill-rule annotation of its own; any nonzero
        // winding is "inside" for this purpose, matching how every other
        // face representation's `contains_point` treats its own boundary.
        if winding_number_edges(face_edges, midpoint(edge)) != 0 {
            inside.push(*edge);
            outside.push(edge.reversed());
        }
    }

    (inside, outside)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::path::FillRule;

    fn square(min: f64, max: f64) -> Vec<Vec2> {
        vec![Vec2::new(min, min), Vec2::new(max, min), Vec2::new(max, max), Vec2::new(min, max)]
    }

    fn area(edges: &[LinearEdge]) -> f64 {
        edges.iter().map(|e| e.signed_area_contribution()).sum()
    }

    #[test]
    fn overlapping_squares_partition_area() {
        let face_edges = edges_from_polygon(&square(0.0, 1.0));
        let path = RenderPath::new(FillRule::NonZero, vec![square(0.5, 1.5)]);
        let (inside, outside) = clip_edges_by_path(&face_edges, &path);
        assert!((area(&inside) - 0.25).abs() < 1e-9, "inside area = {}", area(&inside));
        assert!((area(&outside) - 0.75).abs() < 1e-9, "outside area = {}", area(&outside));
    }

    #[test]
    fn disjoint_path_leaves_face_entirely_outside() {
        let face_edges = edges_from_polygon(&square(0.0, 1.0));
        let path = RenderPath::new(FillRule::NonZero, vec![square(5.0, 6.0)]);
        let (inside, outside) = clip_edges_by_path(&face_edges, &path);
        assert!(area(&inside).abs() < 1e-9);
        assert!((area(&outside) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn face_fully_inside_path_has_no_outside_remainder() {
        let face_edges = edges_from_polygon(&square(0.25, 0.75));
        let path = RenderPath::new(FillRule::NonZero, vec![square(0.0, 1.0)]);
        let (inside, outside) = clip_edges_by_path(&face_edges, &path);
        assert!((area(&inside) - 0.25).abs() < 1e-9);
        assert!(area(&outside).abs() < 1e-9);
    }

    #[test]
    fn trivially_empty_path_puts_everything_outside() {
        let face_edges = edges_from_polygon(&square(0.0, 1.0));
        let path = RenderPath::new(FillRule::NonZero, vec![]);
        let (inside, outside) = clip_edges_by_path(&face_edges, &path);
        assert!(inside.is_empty());
        assert_eq!(outside.len(), face_edges.len());
    }
}
