//! Generalizes the analytic filter integrator
//! ([`crate::filter::integrator::integrate`]) from image-texel sampling to
//! arbitrary `RenderProgram` evaluation, so the fine pass can apply the
//! same per-cell "full / partial / empty" weighting to any program node,
//! not just `Image`.

use crate::error::RasterResult;
use crate::face::{ClippableFace, EdgedClippedFace};
use crate::filter::Filter;
use crate::geometry::{Vec2, Vec4};
use crate::program::{EvaluationContext, ImageResources};

use super::FineEntry;

/// Evaluates `entry`'s program over its face's contribution to the pixel
/// sampled at `(x, y)`, normalized by accumulated filter weight.
pub fn sample_pixel(entry: &FineEntry, filter: &dyn Filter, x: f64, y: f64, images: &dyn ImageResources) -> RasterResult<Vec4> {
    if entry.is_constant && entry.is_full_area {
        // No boundary runs through this entry's bin at all, so every pixel
        // in it is fully covered and the program's color (which
        // doesn't vary by point) needs evaluating only once.
        let ctx = EvaluationContext::new(&entry.face);
        return entry.program.evaluate(&ctx, crate::geometry::Vec2::new(x, y), images);
    }

    integrate_program(&entry.face, filter, x, y, entry.program, images)
}

/// As [`crate::filter::integrator::integrate`], but colors are produced by
/// evaluating `program` against each cell's own face (so gradients,
/// blends and path booleans vary correctly across the filter footprint)
/// rather than by sampling a discrete image texel. Shares the same
/// accumulate-then-normalize loop, including the opaque/non-opaque
/// normalization split, keyed here off
/// [`crate::program::RenderProgram::is_fully_opaque`] rather than an
/// [`crate::filter::ImageSampler`] flag.
pub fn integrate_program(face: &EdgedClippedFace, filter: &dyn Filter, x: f64, y: f64, program: &crate::program::RenderProgram, images: &dyn ImageResources) -> RasterResult<Vec4> {
    crate::filter::integrate_cells(face, filter, x, y, program.is_fully_opaque(), |ix, iy, cell| {
        let ctx = EvaluationContext::new(cell);
        let px = ix as f64;
        let py = iy as f64;
        let sample_point = if program.needs_centroid() { Vec2::new(ctx.get_center_x(), ctx.get_center_y()) } else { Vec2::new(px + 0.5, py + 0.5) };
        program.evaluate(&ctx, sample_point, images)
    })
}
