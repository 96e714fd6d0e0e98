//! `PolygonalFace`: ordered CCW/CW loops, the natural tessellator output.

use super::edged::EdgedFace;
use super::edged_clipped::EdgedClippedFace;
use super::stitch::stitch_loops;
use super::{Bounds, ClippableFace};
use crate::error::{RasterError, RasterResult};
use crate::geometry::{edges_from_polygons, transform_point, winding_number_polygons, LinearEdge, Mat3, Vec2};
use crate::numeric::{polygon_centroid_partial, polygon_signed_area, resolve_centroid};

/// The default quantization used when reconstructing loops from an edge set
/// via [`PolygonalFace::to_polygonal_face`] / the `from_edges` conversions.
pub const DEFAULT_STITCH_EPS: f64 = 1e-9;

#[derive(Debug, Clone, Default)]
pub struct PolygonalFace {
    loops: Vec<Vec<Vec2>>,
}

impl PolygonalFace {
    /// Builds a face from a single closed loop.
    pub fn from_loop(loop_: Vec<Vec2>) -> RasterResult<Self> {
        Self::from_loops(vec![loop_])
    }

    /// Builds a face from several closed loops.
    pub fn from_loops(loops: Vec<Vec<Vec2>>) -> RasterResult<Self> {
        for l in &loops {
            if l.len() < 3 {
                return Err(RasterError::InvariantViolation(
                    "polygon loop needs at least 3 vertices".into(),
                ));
            }
        }
        Ok(PolygonalFace { loops })
    }

    pub fn loops(&self) -> &[Vec<Vec2>] {
        &self.loops
    }

    fn edges(&self) -> Vec<LinearEdge> {
        edges_from_polygons(&self.loops)
    }

    pub fn to_edged_face(&self) -> EdgedFace {
        EdgedFace::new(self.edges())
    }

    pub fn to_edged_clipped_face(&self) -> EdgedClippedFace {
        let edges = self.edges();
        let b = Bounds::of_edges(&edges);
        EdgedClippedFace::new(edges, b.min_x, b.min_y, b.max_x, b.max_y, 0, 0, 0, 0)
    }

    /// As [`PolygonalFace::to_edged_clipped_face`], but the caller vouches
    /// that `bounds` is already a correct (not merely conservative) bound,
    /// skipping the scan that would otherwise recompute it.
    pub fn to_edged_clipped_face_without_check(&self, bounds: Bounds) -> EdgedClippedFace {
        EdgedClippedFace::new(self.edges(), bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y, 0, 0, 0, 0)
    }

    fn from_edges(edges: &[LinearEdge], eps: f64) -> PolygonalFace {
        PolygonalFace { loops: stitch_loops(edges, eps) }
    }

    pub fn get_clipped(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> PolygonalFace {
        Self::from_edges(self.to_edged_face().get_clipped(min_x, min_y, max_x, max_y).edges(), DEFAULT_STITCH_EPS)
    }

    pub fn get_binary_x_clip(&self, x: f64, fake_corner_y: f64) -> (PolygonalFace, PolygonalFace) {
        let (a, b) = self.to_edged_face().get_binary_x_clip(x, fake_corner_y);
        (Self::from_edges(a.edges(), DEFAULT_STITCH_EPS), Self::from_edges(b.edges(), DEFAULT_STITCH_EPS))
    }

    pub fn get_binary_y_clip(&self, y: f64, fake_corner_x: f64) -> (PolygonalFace, PolygonalFace) {
        let (a, b) = self.to_edged_face().get_binary_y_clip(y, fake_corner_x);
        (Self::from_edges(a.edges(), DEFAULT_STITCH_EPS), Self::from_edges(b.edges(), DEFAULT_STITCH_EPS))
    }

    pub fn get_binary_line_clip(&self, normal: Vec2, value: f64, fake_corner_perp: f64) -> (PolygonalFace, PolygonalFace) {
        let (a, b) = self.to_edged_face().get_binary_line_clip(normal, value, fake_corner_perp);
        (Self::from_edges(a.edges(), DEFAULT_STITCH_EPS), Self::from_edges(b.edges(), DEFAULT_STITCH_EPS))
    }

    pub fn get_stripe_line_clip(&self, normal: Vec2, values: &[f64]) -> Vec<PolygonalFace> {
        self.to_edged_face()
            .get_stripe_line_clip(normal, values)
            .into_iter()
            .map(|f| Self::from_edges(f.edges(), DEFAULT_STITCH_EPS))
            .collect()
    }

    pub fn get_binary_circular_clip(&self, center: Vec2, radius: f64, max_angle_split: f64) -> (PolygonalFace, PolygonalFace) {
        let (a, b) = self.to_edged_face().get_binary_circular_clip(center, radius, max_angle_split);
        (Self::from_edges(a.edges(), DEFAULT_STITCH_EPS), Self::from_edges(b.edges(), DEFAULT_STITCH_EPS))
    }

    /// Cell-major within loop-major: the grid for each input loop is walked
    /// in full before moving to the next loop.
    pub fn grid_clip_iterate(
        &self,
        step_x: f64,
        step_y: f64,
        mut cell: impl FnMut(i64, i64, PolygonalFace),
        mut done: impl FnMut(),
    ) {
        for single_loop in &self.loops {
            let face = EdgedFace::new(edges_from_polygons(std::slice::from_ref(single_loop)));
            face.grid_clip_iterate(
                step_x,
                step_y,
                |cx, cy, edged_cell| cell(cx, cy, Self::from_edges(edged_cell.edges(), DEFAULT_STITCH_EPS)),
                || {},
            );
        }
        done();
    }

    pub fn get_transformed(&self, m: &Mat3) -> PolygonalFace {
        PolygonalFace {
            loops: self
                .loops
                .iter()
                .map(|l| l.iter().map(|&p| transform_point(m, p)).collect())
                .collect(),
        }
    }

    pub fn get_rounded(&self, eps: f64) -> PolygonalFace {
        let round = |p: Vec2| Vec2::new((p.x / eps).round() * eps, (p.y / eps).round() * eps);
        let loops = self
            .loops
            .iter()
            .map(|l| {
                let mut out: Vec<Vec2> = Vec::with_capacity(l.len());
                for &p in l {
                    let rp = round(p);
                    if out.last() != Some(&rp) {
                        out.push(rp);
                    }
                }
                if out.len() > 1 && out.first() == out.last() {
                    out.pop();
                }
                out
            })
            .filter(|l| l.len() >= 3)
            .collect();
        PolygonalFace { loops }
    }

    pub fn with_reversed_edges(&self) -> PolygonalFace {
        PolygonalFace {
            loops: self
                .loops
                .iter()
                .map(|l| l.iter().rev().copied().collect())
                .collect(),
        }
    }
}

impl ClippableFace for PolygonalFace {
    fn bounds(&self) -> Bounds {
        Bounds::of_points(self.loops.iter().flatten().copied())
    }

    fn area(&self) -> f64 {
        self.loops.iter().map(|l| polygon_signed_area(l)).sum()
    }

    fn centroid(&self) -> Vec2 {
        let area = self.area();
        let partial = self
            .loops
            .iter()
            .map(|l| polygon_centroid_partial(l))
            .fold(Vec2::new(0.0, 0.0), |a, b| a + b);
        resolve_centroid(partial, area, self.bounds().center())
    }

    fn contains_point(&self, point: Vec2) -> bool {
        winding_number_polygons(&self.loops, point) != 0
    }

    fn get_dot_range(&self, normal: Vec2) -> (f64, f64) {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for p in self.loops.iter().flatten() {
            let d = normal.dot(p);
            lo = lo.min(d);
            hi = hi.max(d);
        }
        (lo, hi)
    }

    fn get_distance_range_to_edges(&self, point: Vec2) -> (f64, f64) {
        self.to_edged_face().get_distance_range_to_edges(point)
    }

    fn get_average_distance(&self, point: Vec2) -> f64 {
        self.to_edged_face().get_average_distance(point)
    }

    fn for_each_edge(&self, callback: &mut dyn FnMut(&LinearEdge)) {
        for e in self.edges() {
            callback(&e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> PolygonalFace {
        PolygonalFace::from_loop(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_degenerate_loop() {
        assert!(PolygonalFace::from_loop(vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)]).is_err());
    }

    #[test]
    fn area_matches_shoelace() {
        assert!((square().area() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn binary_x_clip_round_trips_through_edges_and_back() {
        let (min_f, max_f) = square().get_binary_x_clip(0.5, 0.0);
        assert!((min_f.area() - 0.5).abs() < 1e-9);
        assert!((max_f.area() - 0.5).abs() < 1e-9);
        assert_eq!(min_f.loops().len(), 1);
        assert_eq!(max_f.loops().len(), 1);
    }

    #[test]
    fn reversed_loop_has_negated_area() {
        assert!((square().with_reversed_edges().area() + 1.0).abs() < 1e-9);
    }
}
