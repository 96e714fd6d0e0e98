//! Directed linear edges and the polygon <-> edge-set primitives built on them.

use super::vector::Vec2;
use crate::error::{RasterError, RasterResult};

/// A directed edge from `start` to `end`.
///
/// `contains_fake_corner` marks edges synthesized at a clipping-region
/// corner to close a contour after half-plane clipping. Such edges
/// contribute to signed area and winding like any
/// other edge, but are excluded from bounds computations and from
/// "real" edge iteration — callers that need only the original boundary
/// should filter on this flag rather than keep a second list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearEdge {
    pub start: Vec2,
    pub end: Vec2,
    pub contains_fake_corner: bool,
}

impl LinearEdge {
    /// Constructs an edge, failing on a zero-length segment.
    pub fn new(start: Vec2, end: Vec2) -> RasterResult<Self> {
        Self::new_with_fake_corner(start, end, false)
    }

    /// As [`LinearEdge::new`], additionally marking the edge as a fake corner.
    pub fn new_with_fake_corner(start: Vec2, end: Vec2, contains_fake_corner: bool) -> RasterResult<Self> {
        if start == end {
            return Err(RasterError::DegenerateEdge);
        }
        Ok(LinearEdge { start, end, contains_fake_corner })
    }

    /// Constructs an edge without checking for degeneracy. Used internally
    /// by algorithms that have already established `start != end`, or that
    /// intentionally synthesize a corner edge whose degeneracy will be
    /// filtered later by the simplifier.
    #[inline]
    pub fn new_unchecked(start: Vec2, end: Vec2, contains_fake_corner: bool) -> Self {
        LinearEdge { start, end, contains_fake_corner }
    }

    /// The directed delta `end - start`.
    #[inline]
    pub fn delta(&self) -> Vec2 {
        self.end - self.start
    }

    /// This edge with start/end swapped (orientation flipped).
    #[inline]
    pub fn reversed(&self) -> LinearEdge {
        LinearEdge {
            start: self.end,
            end: self.start,
            contains_fake_corner: self.contains_fake_corner,
        }
    }

    /// This edge's contribution to the shoelace signed-area sum
    /// (`(1/2) * (x0*y1 - x1*y0)`), consistent with [`crate::numeric::polygon_signed_area`].
    #[inline]
    pub fn signed_area_contribution(&self) -> f64 {
        0.5 * (self.start.x * self.end.y - self.end.x * self.start.y)
    }

    /// Green's-theorem line-integral distance contribution: `∫ |r| dr` over this segment,
    /// with `p` as the origin.
    pub fn line_integral_distance(&self, p: Vec2) -> f64 {
        crate::numeric::line_integral_distance(self.start - p, self.end - p)
    }

    /// Minimum distance from `p` to this segment, clamped projection.
    pub fn closest_distance(&self, p: Vec2) -> f64 {
        crate::numeric::closest_distance_to_origin(self.start - p, self.end - p)
    }

    /// Horizontal-ray winding contribution of this edge for `point`: `+1`, `-1` or `0`.
    ///
    /// A ray cast in `+x` from `point` crosses this edge iff exactly one
    /// endpoint is strictly above `point.y`; the sign follows the edge's
    /// vertical direction, matching the standard crossing-number rule.
    #[inline]
    pub fn winding_contribution(&self, point: Vec2) -> i32 {
        let (a, b) = (self.start, self.end);
        if (a.y > point.y) != (b.y > point.y) {
            let t = (point.y - a.y) / (b.y - a.y);
            let x_cross = a.x + t * (b.x - a.x);
            if x_cross > point.x {
                return if b.y > a.y { 1 } else { -1 };
            }
        }
        0
    }
}

/// Builds a closed, CCW-or-CW edge set from a single polygon loop.
///
/// Degenerate (zero-length) edges are silently dropped: they are not a
/// reportable failure, just absent from the result.
pub fn edges_from_polygon(loop_: &[Vec2]) -> Vec<LinearEdge> {
    let n = loop_.len();
    let mut edges = Vec::with_capacity(n);
    for i in 0..n {
        let a = loop_[i];
        let b = loop_[(i + 1) % n];
        if let Ok(e) = LinearEdge::new(a, b) {
            edges.push(e);
        }
    }
    edges
}

/// Builds an edge set from a sequence of polygon loops.
pub fn edges_from_polygons(loops: &[Vec<Vec2>]) -> Vec<LinearEdge> {
    loops.iter().flat_map(|l| edges_from_polygon(l)).collect()
}

/// Winding number of `point` with respect to a set of polygon loops, via
/// horizontal-ray crossing sign sum.
pub fn winding_number_polygons(loops: &[Vec<Vec2>], point: Vec2) -> i32 {
    let mut winding = 0;
    for loop_ in loops {
        let n = loop_.len();
        for i in 0..n {
            let a = loop_[i];
            let b = loop_[(i + 1) % n];
            if let Ok(e) = LinearEdge::new(a, b) {
                winding += e.winding_contribution(point);
            }
        }
    }
    winding
}

/// Winding number of `point` with respect to an edge set (used by
/// [`crate::face::ClippableFace::contains_point`] for edged/edged-clipped faces).
pub fn winding_number_edges<'a>(edges: impl IntoIterator<Item = &'a LinearEdge>, point: Vec2) -> i32 {
    edges.into_iter().map(|e| e.winding_contribution(point)).sum()
}

/// Renders polygon loops to an SVG-style path-data string, for debug export.
pub fn polygons_to_shape(loops: &[Vec<Vec2>]) -> String {
    let mut out = String::new();
    for loop_ in loops {
        if loop_.is_empty() {
            continue;
        }
        out.push_str(&format!("M {} {} ", loop_[0].x, loop_[0].y));
        for p in &loop_[1..] {
            out.push_str(&format!("L {} {} ", p.x, p.y));
        }
        out.push_str("Z ");
    }
    out.trim_end().to_string()
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
    fn degenerate_edge_rejected() {
        let p = Vec2::new(1.0, 1.0);
        assert!(matches!(LinearEdge::new(p, p), Err(RasterError::DegenerateEdge)));
    }

    #[test]
    fn winding_number_inside_unit_square() {
        let loops = vec![square()];
        assert_eq!(winding_number_polygons(&loops, Vec2::new(0.5, 0.5)), 1);
        assert_eq!(winding_number_polygons(&loops, Vec2::new(2.0, 2.0)), 0);
    }

    #[test]
    fn from_polygon_closes_the_loop() {
        let edges = edges_from_polygon(&square());
        assert_eq!(edges.len(), 4);
        assert_eq!(edges.last().unwrap().end, edges.first().unwrap().start);
    }
}
