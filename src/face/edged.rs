//! `EdgedFace`: an unordered edge set with no closed-boundary invariant.

use super::clip::{binary_circular_clip, binary_line_clip, binary_x_clip, binary_y_clip, stripe_line_clip};
use super::{Bounds, ClippableFace};
use crate::geometry::{transform_point, winding_number_edges, LinearEdge, Mat3, Vec2};
use crate::numeric::{edge_centroid_partial_contribution, resolve_centroid};

/// An unordered set of [`LinearEdge`]s whose signed-area sum and winding
/// function describe a face, without any requirement that the edges chain
/// into closed loops. This is the natural result of clipping operations
/// that can't afford to track global edge order.
#[derive(Debug, Clone, Default)]
pub struct EdgedFace {
    edges: Vec<LinearEdge>,
}

impl EdgedFace {
    pub fn new(edges: Vec<LinearEdge>) -> Self {
        EdgedFace { edges }
    }

    pub fn edges(&self) -> &[LinearEdge] {
        &self.edges
    }

    fn real_edges(&self) -> impl Iterator<Item = &LinearEdge> {
        self.edges.iter().filter(|e| !e.contains_fake_corner)
    }

    pub fn get_clipped(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> EdgedFace {
        let (_, right) = binary_x_clip(&self.edges, min_x, min_y);
        let (middle, _) = binary_x_clip(&right, max_x, min_y);
        let (_, top) = binary_y_clip(&middle, min_y, min_x);
        let (result, _) = binary_y_clip(&top, max_y, min_x);
        EdgedFace::new(result)
    }

    pub fn get_binary_x_clip(&self, x: f64, fake_corner_y: f64) -> (EdgedFace, EdgedFace) {
        let (min_e, max_e) = binary_x_clip(&self.edges, x, fake_corner_y);
        (EdgedFace::new(min_e), EdgedFace::new(max_e))
    }

    pub fn get_binary_y_clip(&self, y: f64, fake_corner_x: f64) -> (EdgedFace, EdgedFace) {
        let (min_e, max_e) = binary_y_clip(&self.edges, y, fake_corner_x);
        (EdgedFace::new(min_e), EdgedFace::new(max_e))
    }

    pub fn get_binary_line_clip(&self, normal: Vec2, value: f64, fake_corner_perp: f64) -> (EdgedFace, EdgedFace) {
        let (min_e, max_e) = binary_line_clip(&self.edges, normal, value, fake_corner_perp);
        (EdgedFace::new(min_e), EdgedFace::new(max_e))
    }

    pub fn get_stripe_line_clip(&self, normal: Vec2, values: &[f64]) -> Vec<EdgedFace> {
        stripe_line_clip(&self.edges, normal, values)
            .into_iter()
            .map(EdgedFace::new)
            .collect()
    }

    pub fn get_binary_circular_clip(&self, center: Vec2, radius: f64, max_angle_split: f64) -> (EdgedFace, EdgedFace) {
        let (inside, outside) = binary_circular_clip(&self.edges, center, radius, max_angle_split);
        (EdgedFace::new(inside), EdgedFace::new(outside))
    }

    /// Visits every pixel-aligned cell of a `step_x` x `step_y` grid over
    /// this face's bounds, invoking `cell` with each cell's clipped face,
    /// then `done` once all cells have been emitted.
    pub fn grid_clip_iterate(
        &self,
        step_x: f64,
        step_y: f64,
        mut cell: impl FnMut(i64, i64, EdgedFace),
        mut done: impl FnMut(),
    ) {
        let bounds = self.bounds();
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            done();
            return;
        }
        let x0 = (bounds.min_x / step_x).floor() as i64;
        let x1 = (bounds.max_x / step_x).ceil() as i64;
        let y0 = (bounds.min_y / step_y).floor() as i64;
        let y1 = (bounds.max_y / step_y).ceil() as i64;

        for cx in x0..x1 {
            let (col, _) = binary_x_clip(&self.edges, (cx + 1) as f64 * step_x, bounds.min_y);
            let (_, col) = binary_x_clip(&col, cx as f64 * step_x, bounds.min_y);
            for cy in y0..y1 {
                let (cell_edges, _) = binary_y_clip(&col, (cy + 1) as f64 * step_y, bounds.min_x);
                let (_, cell_edges) = binary_y_clip(&cell_edges, cy as f64 * step_y, bounds.min_x);
                if !cell_edges.is_empty() {
                    cell(cx, cy, EdgedFace::new(cell_edges));
                }
            }
        }
        done();
    }

    pub fn get_transformed(&self, m: &Mat3) -> EdgedFace {
        let edges = self
            .edges
            .iter()
            .map(|e| LinearEdge::new_unchecked(transform_point(m, e.start), transform_point(m, e.end), e.contains_fake_corner))
            .collect();
        EdgedFace::new(edges)
    }

    /// Rounds vertices to the nearest multiple of `eps`, dropping any edge
    /// that becomes degenerate as a result.
    pub fn get_rounded(&self, eps: f64) -> EdgedFace {
        let round = |p: Vec2| Vec2::new((p.x / eps).round() * eps, (p.y / eps).round() * eps);
        let edges = self
            .edges
            .iter()
            .filter_map(|e| {
                let (a, b) = (round(e.start), round(e.end));
                (a != b).then(|| LinearEdge::new_unchecked(a, b, e.contains_fake_corner))
            })
            .collect();
        EdgedFace::new(edges)
    }

    pub fn with_reversed_edges(&self) -> EdgedFace {
        EdgedFace::new(self.edges.iter().map(|e| e.reversed()).collect())
    }
}

impl ClippableFace for EdgedFace {
    fn bounds(&self) -> Bounds {
        Bounds::of_edges(&self.edges)
    }

    fn area(&self) -> f64 {
        self.edges.iter().map(|e| e.signed_area_contribution()).sum()
    }

    fn centroid(&self) -> Vec2 {
        let area = self.area();
        let partial = self
            .edges
            .iter()
            .map(|e| edge_centroid_partial_contribution(e.start, e.end))
            .fold(Vec2::new(0.0, 0.0), |a, b| a + b);
        resolve_centroid(partial, area, self.bounds().center())
    }

    fn contains_point(&self, point: Vec2) -> bool {
        winding_number_edges(&self.edges, point) != 0
    }

    fn get_dot_range(&self, normal: Vec2) -> (f64, f64) {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for e in self.real_edges() {
            for p in [e.start, e.end] {
                let d = normal.dot(&p);
                lo = lo.min(d);
                hi = hi.max(d);
            }
        }
        (lo, hi)
    }

    fn get_distance_range_to_edges(&self, point: Vec2) -> (f64, f64) {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for e in self.real_edges() {
            let d_near = e.closest_distance(point);
            let d_far = (e.start - point).norm().max((e.end - point).norm());
            lo = lo.min(d_near);
            hi = hi.max(d_far);
        }
        (lo, hi)
    }

    fn get_average_distance(&self, point: Vec2) -> f64 {
        let area = self.area();
        if area.abs() < 1e-12 {
            return 0.0;
        }
        let sum: f64 = self.real_edges().map(|e| e.line_integral_distance(point)).sum();
        sum / area
    }

    fn for_each_edge(&self, callback: &mut dyn FnMut(&LinearEdge)) {
        for e in &self.edges {
            if !e.contains_fake_corner {
                callback(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::edges_from_polygon;

    fn unit_square() -> EdgedFace {
        EdgedFace::new(edges_from_polygon(&[
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ]))
    }

    #[test]
    fn area_and_centroid_match_unit_square() {
        let f = unit_square();
        assert!((f.area() - 1.0).abs() < 1e-9);
        let c = f.centroid();
        assert!((c.x - 0.5).abs() < 1e-9 && (c.y - 0.5).abs() < 1e-9);
    }

    #[test]
    fn binary_x_clip_conserves_area() {
        let f = unit_square();
        let (min_f, max_f) = f.get_binary_x_clip(0.4, 0.0);
        assert!((min_f.area() - 0.4).abs() < 1e-9);
        assert!((max_f.area() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn grid_clip_iterate_visits_every_cell_and_conserves_area() {
        let f = unit_square();
        let mut total = 0.0;
        let mut cells = 0;
        f.grid_clip_iterate(
            0.5,
            0.5,
            |_, _, cell| {
                total += cell.area();
                cells += 1;
            },
            || {},
        );
        assert_eq!(cells, 4);
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn contains_point_respects_winding() {
        let f = unit_square();
        assert!(f.contains_point(Vec2::new(0.5, 0.5)));
        assert!(!f.contains_point(Vec2::new(2.0, 2.0)));
    }
}
