//! `EdgedClippedFace`: an edge set plus an axis-aligned bound and four signed
//! per-side counts that summarize implicit, axis-aligned boundary edges
//! This is the representation the coarse/fine raster passes pass
//! around, since most faces a grid clip produces are "almost the whole
//! pixel" and representing all four sides explicitly per face would dwarf
//! the cost of the diagonal edges that actually matter.
//!
//! A side's count is the signed number of times its corner-to-corner
//! traversal (in the canonical CCW direction below) contributes to the
//! face — e.g. `min_x_count = 1` means the left side contributes exactly
//! one CCW traversal `(min_x, max_y) -> (min_x, min_y)`; `-1` means the same
//! edge reversed; `0` means that side contributes nothing (the explicit
//! `edges` already cover it, or it isn't part of the boundary at all).

use super::clip::{binary_circular_clip, binary_line_clip, binary_x_clip, binary_y_clip, stripe_line_clip};
use super::edged::EdgedFace;
use super::{Bounds, ClippableFace};
use crate::geometry::{transform_point, LinearEdge, Mat3, Vec2};

#[derive(Debug, Clone)]
pub struct EdgedClippedFace {
    edges: Vec<LinearEdge>,
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
    min_x_count: i32,
    min_y_count: i32,
    max_x_count: i32,
    max_y_count: i32,
}

impl EdgedClippedFace {
    pub fn new(
        edges: Vec<LinearEdge>,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
        min_x_count: i32,
        min_y_count: i32,
        max_x_count: i32,
        max_y_count: i32,
    ) -> Self {
        EdgedClippedFace {
            edges,
            min_x,
            min_y,
            max_x,
            max_y,
            min_x_count,
            min_y_count,
            max_x_count,
            max_y_count,
        }
    }

    /// A face that is the entire `[min_x, max_x] x [min_y, max_y]` rectangle,
    /// represented with no explicit edges at all (every side is implicit).
    pub fn full_rect(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        EdgedClippedFace::new(Vec::new(), min_x, min_y, max_x, max_y, 1, 1, 1, 1)
    }

    pub fn bounds_rect(&self) -> Bounds {
        Bounds {
            min_x: self.min_x,
            min_y: self.min_y,
            max_x: self.max_x,
            max_y: self.max_y,
        }
    }

    pub fn edges(&self) -> &[LinearEdge] {
        &self.edges
    }

    pub fn counts(&self) -> (i32, i32, i32, i32) {
        (self.min_x_count, self.min_y_count, self.max_x_count, self.max_y_count)
    }

    /// The canonical CCW corner-to-corner edge for one rectangle side.
    fn canonical_side(&self, count: i32, a: Vec2, b: Vec2) -> Option<LinearEdge> {
        if count == 0 || a == b {
            return None;
        }
        let (start, end) = if count > 0 { (a, b) } else { (b, a) };
        Some(LinearEdge::new_unchecked(start, end, false))
    }

    /// Materializes the implicit side edges (each repeated `|count|` times)
    /// alongside the explicit `edges`, giving a full edge set equivalent to
    /// this face's boundary.
    fn effective_edges(&self) -> Vec<LinearEdge> {
        let (tl, tr, br, bl) = (
            Vec2::new(self.min_x, self.max_y),
            Vec2::new(self.max_x, self.max_y),
            Vec2::new(self.max_x, self.min_y),
            Vec2::new(self.min_x, self.min_y),
        );
        let mut out = self.edges.clone();
        if let Some(e) = self.canonical_side(self.min_x_count, tl, bl) {
            out.extend(std::iter::repeat(e).take(self.min_x_count.unsigned_abs() as usize));
        }
        if let Some(e) = self.canonical_side(self.min_y_count, bl, br) {
            out.extend(std::iter::repeat(e).take(self.min_y_count.unsigned_abs() as usize));
        }
        if let Some(e) = self.canonical_side(self.max_x_count, br, tr) {
            out.extend(std::iter::repeat(e).take(self.max_x_count.unsigned_abs() as usize));
        }
        if let Some(e) = self.canonical_side(self.max_y_count, tr, tl) {
            out.extend(std::iter::repeat(e).take(self.max_y_count.unsigned_abs() as usize));
        }
        out
    }

    fn as_edged(&self) -> EdgedFace {
        EdgedFace::new(self.effective_edges())
    }

    /// Whether this face is a bare axis-aligned rectangle: no explicit
    /// edges, and all four sides wound the same number of times. Splitting
    /// a face like this along an axis-aligned line always yields two more
    /// rectangles of the same kind, so the count-propagation fast path
    /// below can skip materializing any boundary edges at all.
    fn is_uniform_rect(&self) -> bool {
        self.edges.is_empty() && self.min_x_count == self.min_y_count && self.min_y_count == self.max_x_count && self.max_x_count == self.max_y_count
    }

    fn uniform_rect(count: i32, b: Bounds) -> EdgedClippedFace {
        EdgedClippedFace::new(Vec::new(), b.min_x, b.min_y, b.max_x, b.max_y, count, count, count, count)
    }

    /// Whether all four sides wind the same number of times, independent
    /// of whether any explicit (diagonal) edges are also present. A face
    /// like this is a rectangle at multiplicity `n` with some extra
    /// shapes stitched on via `edges`: cutting it along an axis-aligned
    /// line always needs `n` on all four sides of *both* halves too (the
    /// interior is `n`-thick throughout, so any interior cut line is at
    /// that same multiplicity), which means the axis-aligned sides never
    /// need materializing into real edges just to be split — only the
    /// explicit edges themselves need clipping.
    fn has_uniform_count(&self) -> bool {
        self.min_x_count == self.min_y_count && self.min_y_count == self.max_x_count && self.max_x_count == self.max_y_count
    }

    /// Wraps a clip result with explicit edges only (counts reset to zero).
    /// Used by the clip methods whose cut isn't axis-aligned, where the new
    /// boundary has no corresponding implicit side to propagate a count
    /// onto, so it has to be represented as real edges.
    fn wrap(edges: Vec<LinearEdge>, bounds: Bounds) -> EdgedClippedFace {
        EdgedClippedFace::new(edges, bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y, 0, 0, 0, 0)
    }

    pub fn get_clipped(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> EdgedClippedFace {
        let new_bounds = Bounds {
            min_x: min_x.max(self.min_x),
            min_y: min_y.max(self.min_y),
            max_x: max_x.min(self.max_x),
            max_y: max_y.min(self.max_y),
        };

        if self.is_uniform_rect() {
            return EdgedClippedFace::uniform_rect(self.min_x_count, new_bounds);
        }

        if self.has_uniform_count() {
            let n = self.min_x_count;
            let (_, right) = binary_x_clip(&self.edges, min_x, min_y);
            let (middle, _) = binary_x_clip(&right, max_x, min_y);
            let (_, top) = binary_y_clip(&middle, min_y, min_x);
            let (result, _) = binary_y_clip(&top, max_y, min_x);
            return EdgedClippedFace::new(result, new_bounds.min_x, new_bounds.min_y, new_bounds.max_x, new_bounds.max_y, n, n, n, n);
        }

        let effective = self.effective_edges();
        let (_, right) = binary_x_clip(&effective, min_x, min_y);
        let (middle, _) = binary_x_clip(&right, max_x, min_y);
        let (_, top) = binary_y_clip(&middle, min_y, min_x);
        let (result, _) = binary_y_clip(&top, max_y, min_x);
        EdgedClippedFace::wrap(result, new_bounds)
    }

    /// Count propagation (spec.md §4.3): splitting along `x`, each half
    /// inherits the perpendicular-axis counts (`minYCount`/`maxYCount`)
    /// unchanged — they describe a full-width top/bottom side, and a
    /// narrower sub-rectangle's own top/bottom is still a full-width side
    /// of *it*, at the same multiplicity. The along-axis count
    /// (`minXCount`/`maxXCount`) inherits to whichever half keeps that
    /// original side untouched; the new cut line's count is `n` exactly
    /// when [`has_uniform_count`](Self::has_uniform_count) holds (the
    /// uniform-rect fast path is the special case with no explicit edges
    /// at all), and otherwise falls back to materializing the full
    /// boundary so crossing diagonal edges get their closing edges from
    /// [`binary_x_clip`]'s fake-corner construction instead.
    pub fn get_binary_x_clip(&self, x: f64, fake_corner_y: f64) -> (EdgedClippedFace, EdgedClippedFace) {
        let min_b = Bounds { max_x: x.min(self.max_x), ..self.bounds_rect() };
        let max_b = Bounds { min_x: x.max(self.min_x), ..self.bounds_rect() };

        if self.is_uniform_rect() {
            let n = self.min_x_count;
            return (EdgedClippedFace::uniform_rect(n, min_b), EdgedClippedFace::uniform_rect(n, max_b));
        }

        if self.has_uniform_count() {
            let n = self.min_x_count;
            let (min_e, max_e) = binary_x_clip(&self.edges, x, fake_corner_y);
            return (
                EdgedClippedFace::new(min_e, min_b.min_x, min_b.min_y, min_b.max_x, min_b.max_y, n, n, n, n),
                EdgedClippedFace::new(max_e, max_b.min_x, max_b.min_y, max_b.max_x, max_b.max_y, n, n, n, n),
            );
        }

        let (min_e, max_e) = binary_x_clip(&self.effective_edges(), x, fake_corner_y);
        (EdgedClippedFace::wrap(min_e, min_b), EdgedClippedFace::wrap(max_e, max_b))
    }

    /// Symmetric to [`get_binary_x_clip`](Self::get_binary_x_clip): a
    /// y-split inherits `minXCount`/`maxXCount` unchanged on both halves
    /// and propagates the uniform count onto the new cut line the same
    /// way.
    pub fn get_binary_y_clip(&self, y: f64, fake_corner_x: f64) -> (EdgedClippedFace, EdgedClippedFace) {
        let min_b = Bounds { max_y: y.min(self.max_y), ..self.bounds_rect() };
        let max_b = Bounds { min_y: y.max(self.min_y), ..self.bounds_rect() };

        if self.is_uniform_rect() {
            let n = self.min_x_count;
            return (EdgedClippedFace::uniform_rect(n, min_b), EdgedClippedFace::uniform_rect(n, max_b));
        }

        if self.has_uniform_count() {
            let n = self.min_x_count;
            let (min_e, max_e) = binary_y_clip(&self.edges, y, fake_corner_x);
            return (
                EdgedClippedFace::new(min_e, min_b.min_x, min_b.min_y, min_b.max_x, min_b.max_y, n, n, n, n),
                EdgedClippedFace::new(max_e, max_b.min_x, max_b.min_y, max_b.max_x, max_b.max_y, n, n, n, n),
            );
        }

        let (min_e, max_e) = binary_y_clip(&self.effective_edges(), y, fake_corner_x);
        (EdgedClippedFace::wrap(min_e, min_b), EdgedClippedFace::wrap(max_e, max_b))
    }

    /// Cuts along an arbitrary line. Unlike the axis-aligned clips above,
    /// the new boundary here has no side of the rectangle it could
    /// propagate a count onto, so both halves always come back with
    /// explicit edges; a non-axis-aligned cut also can't tighten the
    /// axis-aligned bound further than the original rectangle, so both
    /// halves keep it and rely on their edges for the true shape.
    pub fn get_binary_line_clip(&self, normal: Vec2, value: f64, fake_corner_perp: f64) -> (EdgedClippedFace, EdgedClippedFace) {
        let (min_e, max_e) = binary_line_clip(&self.effective_edges(), normal, value, fake_corner_perp);
        let b = self.bounds_rect();
        (EdgedClippedFace::wrap(min_e, b), EdgedClippedFace::wrap(max_e, b))
    }

    pub fn get_stripe_line_clip(&self, normal: Vec2, values: &[f64]) -> Vec<EdgedClippedFace> {
        let b = self.bounds_rect();
        stripe_line_clip(&self.effective_edges(), normal, values)
            .into_iter()
            .map(|e| EdgedClippedFace::wrap(e, b))
            .collect()
    }

    /// As with the line clips, a circular arc boundary has no axis-aligned
    /// side to fold a count into, so both results always materialize edges.
    pub fn get_binary_circular_clip(&self, center: Vec2, radius: f64, max_angle_split: f64) -> (EdgedClippedFace, EdgedClippedFace) {
        let (inside, outside) = binary_circular_clip(&self.effective_edges(), center, radius, max_angle_split);
        let b = self.bounds_rect();
        (EdgedClippedFace::wrap(inside, b), EdgedClippedFace::wrap(outside, b))
    }

    pub fn grid_clip_iterate(
        &self,
        step_x: f64,
        step_y: f64,
        mut cell: impl FnMut(i64, i64, EdgedClippedFace),
        mut done: impl FnMut(),
    ) {
        if self.is_uniform_rect() {
            // Every cell a grid produces by clipping a bare rectangle is
            // itself a bare rectangle, so the whole walk stays on the
            // count-propagation fast path with no edge list ever built.
            let n = self.min_x_count;
            if self.max_x > self.min_x && self.max_y > self.min_y {
                let cx0 = (self.min_x / step_x).floor() as i64;
                let cx1 = (self.max_x / step_x).ceil() as i64;
                let cy0 = (self.min_y / step_y).floor() as i64;
                let cy1 = (self.max_y / step_y).ceil() as i64;
                for cy in cy0..cy1 {
                    for cx in cx0..cx1 {
                        let cell_bounds = Bounds {
                            min_x: (cx as f64 * step_x).max(self.min_x),
                            min_y: (cy as f64 * step_y).max(self.min_y),
                            max_x: ((cx + 1) as f64 * step_x).min(self.max_x),
                            max_y: ((cy + 1) as f64 * step_y).min(self.max_y),
                        };
                        cell(cx, cy, EdgedClippedFace::uniform_rect(n, cell_bounds));
                    }
                }
            }
            done();
            return;
        }

        self.as_edged().grid_clip_iterate(
            step_x,
            step_y,
            |cx, cy, edged_cell| {
                let b = Bounds::of_edges(edged_cell.edges()).union(&Bounds {
                    min_x: cx as f64 * step_x,
                    min_y: cy as f64 * step_y,
                    max_x: (cx + 1) as f64 * step_x,
                    max_y: (cy + 1) as f64 * step_y,
                });
                cell(cx, cy, EdgedClippedFace::wrap(edged_cell.edges().to_vec(), b));
            },
            &mut done,
        );
    }

    pub fn get_transformed(&self, m: &Mat3) -> EdgedClippedFace {
        let corners = [
            transform_point(m, Vec2::new(self.min_x, self.min_y)),
            transform_point(m, Vec2::new(self.max_x, self.min_y)),
            transform_point(m, Vec2::new(self.max_x, self.max_y)),
            transform_point(m, Vec2::new(self.min_x, self.max_y)),
        ];
        let new_bounds = Bounds::of_points(corners);
        let edges = self
            .effective_edges()
            .into_iter()
            .map(|e| LinearEdge::new_unchecked(transform_point(m, e.start), transform_point(m, e.end), e.contains_fake_corner))
            .collect();
        EdgedClippedFace::wrap(edges, new_bounds)
    }

    pub fn get_rounded(&self, eps: f64) -> EdgedClippedFace {
        EdgedClippedFace::wrap(self.as_edged().get_rounded(eps).edges().to_vec(), self.bounds_rect())
    }

    pub fn with_reversed_edges(&self) -> EdgedClippedFace {
        EdgedClippedFace::new(
            self.edges.iter().map(|e| e.reversed()).collect(),
            self.min_x,
            self.min_y,
            self.max_x,
            self.max_y,
            -self.min_x_count,
            -self.min_y_count,
            -self.max_x_count,
            -self.max_y_count,
        )
    }
}

impl ClippableFace for EdgedClippedFace {
    fn bounds(&self) -> Bounds {
        self.bounds_rect()
    }

    fn area(&self) -> f64 {
        self.as_edged().area()
    }

    fn centroid(&self) -> Vec2 {
        self.as_edged().centroid()
    }

    fn contains_point(&self, point: Vec2) -> bool {
        self.as_edged().contains_point(point)
    }

    fn get_dot_range(&self, normal: Vec2) -> (f64, f64) {
        self.as_edged().get_dot_range(normal)
    }

    fn get_distance_range_to_edges(&self, point: Vec2) -> (f64, f64) {
        self.as_edged().get_distance_range_to_edges(point)
    }

    fn get_average_distance(&self, point: Vec2) -> f64 {
        self.as_edged().get_average_distance(point)
    }

    fn for_each_edge(&self, callback: &mut dyn FnMut(&LinearEdge)) {
        for e in self.effective_edges() {
            callback(&e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_rect_area_matches_dimensions() {
        let f = EdgedClippedFace::full_rect(0.0, 0.0, 2.0, 3.0);
        assert!((f.area() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn binary_x_clip_of_full_rect_conserves_area() {
        let f = EdgedClippedFace::full_rect(0.0, 0.0, 1.0, 1.0);
        let (min_f, max_f) = f.get_binary_x_clip(0.25, 0.0);
        assert!((min_f.area() - 0.25).abs() < 1e-9);
        assert!((max_f.area() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn reversed_full_rect_has_negative_area() {
        let f = EdgedClippedFace::full_rect(0.0, 0.0, 1.0, 1.0).with_reversed_edges();
        assert!((f.area() + 1.0).abs() < 1e-9);
    }
}
