//! Two-pass rasterizer: bins renderable faces into
//! 16x16-pixel tiles (coarse pass), then walks each bin's face list once
//! per pixel, evaluating the filter integrator and program evaluator per
//! contributing face and compositing in list order (fine pass).
//!
//! The coarse pass builds its per-face candidate lists with the same
//! `scoped_threadpool` chunking [`crate::parallel::reduce`]/[`crate::parallel::scan`]
//! use: faces are split into workgroup-sized chunks, each chunk's thread
//! clips its faces against every bin it touches independently, and the
//! per-chunk candidates are then stably grouped by bin with
//! [`crate::parallel::radix_sort`]. Grouping by `(bin_index, insertion_order)`
//! rather than `bin_index` alone keeps the sort stable, which is what lets
//! the fine pass still walk each bin's list in "most recently inserted
//! first" order afterward, matching what a single sequential pass over the
//! faces would have produced.

mod sample;

pub use sample::integrate_program;

use crate::codec::{self, RasterEdgeClip, TwoPassFineRenderableFace};
use crate::error::RasterResult;
use crate::face::{Bounds, ClippableFace, EdgedClippedFace};
use crate::filter::Filter;
use crate::geometry::Vec4;
use crate::parallel::{self, Vec2uLexicographicalOrder};
use crate::partition::{partition, RenderableFace};
use crate::program::{blend, BlendMode, Compose, FilterKind, ImageResources, RenderProgram};

const NEXT_ADDRESS_NONE: u32 = codec::NEXT_ADDRESS_NONE;

/// Pixels per bin side.
pub const BIN_SIZE: u32 = 16;

/// Coarse-pass "clipped area is degenerate" threshold.
const MIN_BIN_AREA: f64 = 1e-4;
/// Coarse-pass "area equals the full bin area" threshold.
const FULL_AREA_EPS: f64 = 1e-6;

/// Per-frame rasterizer configuration.
#[derive(Debug, Clone, Copy)]
pub struct TwoPassConfig {
    pub width: u32,
    pub height: u32,
    pub filter_kind: FilterKind,
    pub filter_scale: f64,
}

impl TwoPassConfig {
    pub fn new(width: u32, height: u32, filter_kind: FilterKind, filter_scale: f64) -> Self {
        TwoPassConfig { width, height, filter_kind, filter_scale }
    }

    fn build_filter(&self) -> Box<dyn Filter> {
        self.filter_kind.build(self.filter_scale)
    }

    fn bins_x(&self) -> u32 {
        (self.width + BIN_SIZE - 1) / BIN_SIZE
    }

    fn bins_y(&self) -> u32 {
        (self.height + BIN_SIZE - 1) / BIN_SIZE
    }

    fn bounds(&self) -> Bounds {
        Bounds { min_x: 0.0, min_y: 0.0, max_x: self.width as f64, max_y: self.height as f64 }
    }
}

/// One node of a bin's singly-linked face list, terminated by
/// [`NEXT_ADDRESS_NONE`].
struct FineEntry<'p> {
    face: EdgedClippedFace,
    program: &'p RenderProgram,
    is_constant: bool,
    /// Whether this entry's clipped area equals its bin's area within
    /// `FULL_AREA_EPS` (the "fully covers this bin" shortcut).
    is_full_area: bool,
    next: u32,
}

/// The coarse pass's output: per-bin list heads plus the flat entry array
/// every head indexes into, used directly by [`fine_pass`]; plus the same
/// data re-expressed as the fixed-layout [`TwoPassFineRenderableFace`]/
/// [`RasterEdgeClip`] records a GPU upload of this pass's results would
/// actually carry, kept here so that encoding isn't a code path this crate
/// only exercises in the codec module's own tests.
pub struct CoarsePassResult<'p> {
    bin_heads: Vec<u32>,
    entries: Vec<FineEntry<'p>>,
    bins_x: u32,
    bins_y: u32,
    /// Distinct programs referenced by `fine_faces`, in order of first
    /// appearance; a `fine_faces[i].program_index` indexes into this.
    pub programs: Vec<&'p RenderProgram>,
    pub fine_faces: Vec<TwoPassFineRenderableFace>,
    pub edge_arena: Vec<RasterEdgeClip>,
}

/// Whether `program` yields the same color at every point of its face,
/// i.e. has no dependence on the evaluation point or centroid at all.
/// Recurses through the
/// point-independent combinators; any node whose evaluation samples a
/// coordinate (gradients, images, blends, path booleans) is not constant.
fn is_spatially_constant(program: &RenderProgram) -> bool {
    match program {
        RenderProgram::Transparent | RenderProgram::Color { .. } => true,
        RenderProgram::Alpha { child, .. }
        | RenderProgram::Premultiply { child }
        | RenderProgram::Unpremultiply { child }
        | RenderProgram::Filter { child, .. }
        | RenderProgram::NormalDebug { child }
        | RenderProgram::ColorSpaceConvert { child, .. } => is_spatially_constant(child),
        RenderProgram::Stack { children } => children.iter().all(is_spatially_constant),
        RenderProgram::Phong { normal, base, .. } => is_spatially_constant(normal) && is_spatially_constant(base),
        _ => false,
    }
}

/// Appends every bin candidate `renderable` overlaps to `out`, as
/// `(bin_index, entry)` pairs in raster order. Run once per face on
/// whichever thread owns that face's chunk.
fn collect_face_candidates<'p>(
    renderable: &RenderableFace<'p>,
    bins_x: u32,
    bins_y: u32,
    expand: f64,
    out: &mut Vec<(u32, FineEntry<'p>)>,
) {
    let face_bounds = renderable.face.bounds_rect();
    let bx0 = ((face_bounds.min_x - expand) / BIN_SIZE as f64).floor().max(0.0) as u32;
    let by0 = ((face_bounds.min_y - expand) / BIN_SIZE as f64).floor().max(0.0) as u32;
    let bx1 = (((face_bounds.max_x + expand) / BIN_SIZE as f64).ceil() as u32).min(bins_x);
    let by1 = (((face_bounds.max_y + expand) / BIN_SIZE as f64).ceil() as u32).min(bins_y);

    let is_constant = is_spatially_constant(renderable.program);

    for by in by0..by1 {
        for bx in bx0..bx1 {
            let bin_min_x = (bx * BIN_SIZE) as f64 - expand;
            let bin_min_y = (by * BIN_SIZE) as f64 - expand;
            let bin_max_x = ((bx + 1) * BIN_SIZE) as f64 + expand;
            let bin_max_y = ((by + 1) * BIN_SIZE) as f64 + expand;

            let clipped = renderable.face.get_clipped(bin_min_x, bin_min_y, bin_max_x, bin_max_y);
            let area = clipped.area().abs();
            if area < MIN_BIN_AREA {
                continue;
            }

            let bin_area = (bin_max_x - bin_min_x) * (bin_max_y - bin_min_y);
            let is_full_area = (area - bin_area).abs() < FULL_AREA_EPS;
            let bin_index = by * bins_x + bx;

            out.push((
                bin_index,
                FineEntry {
                    face: clipped,
                    program: renderable.program,
                    is_constant,
                    is_full_area,
                    next: NEXT_ADDRESS_NONE,
                },
            ));
        }
    }
}

/// Builds the fixed-layout codec projection of `entries`/`bin_heads`: one
/// [`TwoPassFineRenderableFace`] per entry plus a shared [`RasterEdgeClip`]
/// arena, deduplicating programs by pointer into `programs`.
fn encode_fine_faces<'p>(entries: &[FineEntry<'p>]) -> (Vec<&'p RenderProgram>, Vec<TwoPassFineRenderableFace>, Vec<RasterEdgeClip>) {
    let mut programs: Vec<&'p RenderProgram> = Vec::new();
    let mut edge_arena: Vec<RasterEdgeClip> = Vec::new();
    let mut fine_faces = Vec::with_capacity(entries.len());

    for entry in entries {
        let program_index = match programs.iter().position(|p| std::ptr::eq(*p, entry.program)) {
            Some(i) => i as u32,
            None => {
                programs.push(entry.program);
                (programs.len() - 1) as u32
            }
        };

        let edges_index = edge_arena.len() as u32;
        entry.face.for_each_edge(&mut |edge| {
            edge_arena.push(RasterEdgeClip {
                start_x: edge.start.x as f32,
                start_y: edge.start.y as f32,
                end_x: edge.end.x as f32,
                end_y: edge.end.y as f32,
                contains_fake_corner: edge.contains_fake_corner as u32,
            });
        });
        let num_edges = edge_arena.len() as u32 - edges_index;

        let (min_x_count, min_y_count, max_x_count, max_y_count) = entry.face.counts();

        let mut flags = 0u32;
        if entry.program.needs_centroid() {
            flags |= 1 << codec::fine_face_flags::NEEDS_CENTROID;
        }
        if entry.is_constant {
            flags |= 1 << codec::fine_face_flags::IS_CONSTANT;
        }
        if entry.is_full_area {
            flags |= 1 << codec::fine_face_flags::IS_FULL_AREA;
        }

        fine_faces.push(TwoPassFineRenderableFace {
            program_index,
            flags,
            edges_index,
            num_edges,
            min_x_count,
            min_y_count,
            max_x_count,
            max_y_count,
            next_address: entry.next,
        });
    }

    (programs, fine_faces, edge_arena)
}

/// Coarse pass: clips every renderable face to each bin it overlaps
/// (expanded by the filter's support) and splices a list entry onto that
/// bin's head.
///
/// Per-face clipping is independent work, so it's farmed out across a
/// `scoped_threadpool` exactly the way [`crate::parallel::reduce`] chunks
/// its input; each chunk's thread appends its own candidates to a private
/// buffer, after which the buffers are flattened back into original face
/// order and the `(bin_index, insertion_order)` pairs are stably sorted
/// with [`crate::parallel::radix_sort`] to group candidates by bin without
/// losing the insertion order a sequential pass would have produced.
pub fn coarse_pass<'p>(faces: &[RenderableFace<'p>], config: &TwoPassConfig) -> CoarsePassResult<'p> {
    let bins_x = config.bins_x();
    let bins_y = config.bins_y();
    let num_bins = (bins_x * bins_y) as usize;
    let filter = config.build_filter();
    let expand = (filter.min_expand().max(filter.max_expand()) - 0.5).max(0.0);

    log::debug!("coarse pass: {} faces over {}x{} bins", faces.len(), bins_x, bins_y);

    let workgroup_size = parallel::DEFAULT_WORKGROUP_SIZE.max(1);
    let chunks: Vec<&[RenderableFace<'p>]> = faces.chunks(workgroup_size).collect();
    let mut chunk_candidates: Vec<Vec<(u32, FineEntry<'p>)>> = (0..chunks.len()).map(|_| Vec::new()).collect();

    {
        let mut pool = scoped_threadpool::Pool::new(num_cpus::get() as u32);
        pool.scoped(|scope| {
            for (slot, chunk) in chunk_candidates.iter_mut().zip(chunks.iter()) {
                scope.execute(move || {
                    for renderable in chunk.iter() {
                        collect_face_candidates(renderable, bins_x, bins_y, expand, slot);
                    }
                });
            }
        });
    }

    let mut flat: Vec<Option<FineEntry<'p>>> = Vec::new();
    let mut keys: Vec<(u32, u32)> = Vec::new();
    for candidates in chunk_candidates {
        for (bin_index, entry) in candidates {
            let order = flat.len() as u32;
            keys.push((bin_index, order));
            flat.push(Some(entry));
        }
    }

    parallel::radix_sort(&mut keys, &Vec2uLexicographicalOrder, 8);

    let mut bin_heads = vec![NEXT_ADDRESS_NONE; num_bins];
    let mut entries: Vec<FineEntry<'p>> = Vec::with_capacity(flat.len());
    for (k, &(bin_index, original_index)) in keys.iter().enumerate() {
        let mut entry = flat[original_index as usize].take().expect("radix_sort visits every original index exactly once");
        entry.next = if k > 0 && keys[k - 1].0 == bin_index { k as u32 - 1 } else { NEXT_ADDRESS_NONE };
        entries.push(entry);
        bin_heads[bin_index as usize] = k as u32;
    }

    let (programs, fine_faces, edge_arena) = encode_fine_faces(&entries);
    log::debug!("coarse pass: {} entries, {} distinct programs, {} edges", entries.len(), programs.len(), edge_arena.len());

    CoarsePassResult { bin_heads, entries, bins_x, bins_y, programs, fine_faces, edge_arena }
}

/// Fine pass: one bin at a time, one pixel at a time, walks the
/// bin's list in list order (head-to-tail, i.e. reverse of coarse-pass
/// insertion) and composites each contributing face's color with
/// Porter-Duff Over.
pub fn fine_pass(coarse: &CoarsePassResult<'_>, config: &TwoPassConfig, images: &dyn ImageResources) -> RasterResult<Vec<Vec4>> {
    let filter = config.build_filter();
    let mut out = vec![Vec4::zeros(); (config.width * config.height) as usize];

    for by in 0..coarse.bins_y {
        for bx in 0..coarse.bins_x {
            let bin_index = (by * coarse.bins_x + bx) as usize;
            let x0 = bx * BIN_SIZE;
            let y0 = by * BIN_SIZE;
            let x1 = (x0 + BIN_SIZE).min(config.width);
            let y1 = (y0 + BIN_SIZE).min(config.height);

            for py in y0..y1 {
                for px in x0..x1 {
                    let mut acc = Vec4::zeros();
                    let mut addr = coarse.bin_heads[bin_index];
                    let mut guard = 0usize;
                    while addr != NEXT_ADDRESS_NONE {
                        if addr as usize >= coarse.entries.len() {
                            return Err(crate::error::RasterError::InvariantViolation(format!(
                                "bin {bin_index} list points at out-of-range entry {addr}"
                            )));
                        }
                        let entry = &coarse.entries[addr];
                        let contribution = sample::sample_pixel(entry, &*filter, px as f64 + 0.5, py as f64 + 0.5, images)?;
                        acc = blend::compose(Compose::Over, BlendMode::Normal, contribution, acc);
                        addr = entry.next;

                        guard += 1;
                        if guard > coarse.entries.len() + 1 {
                            return Err(crate::error::RasterError::InvariantViolation(format!("bin {bin_index} list does not terminate")));
                        }
                    }
                    out[(py * config.width + px) as usize] = acc;
                }
            }
        }
    }

    Ok(out)
}

/// Runs the full two-pass pipeline (partition -> coarse -> fine) over
/// `program`.
pub fn render_two_pass(program: &RenderProgram, config: &TwoPassConfig, images: &dyn ImageResources, tile_size: Option<f64>) -> RasterResult<Vec<Vec4>> {
    let faces = partition(program, config.bounds(), tile_size);
    let coarse = coarse_pass(&faces, config);
    fine_pass(&coarse, config, images)
}

/// The reference (non-GPU) path: the filter integrator and program
/// evaluator applied directly per pixel,
/// with no bin/list intermediate. Functionally equivalent to
/// [`render_two_pass`], useful as an independent cross-check and for
/// frame sizes too small to benefit from binning.
pub fn render_reference(program: &RenderProgram, bounds: Bounds, width: u32, height: u32, filter_kind: FilterKind, filter_scale: f64, images: &dyn ImageResources) -> RasterResult<Vec<Vec4>> {
    let faces = partition(program, bounds, None);
    let filter = filter_kind.build(filter_scale);
    let mut out = vec![Vec4::zeros(); (width * height) as usize];

    // Pixel (px, py)'s world-space sample center; for the common case of
    // `bounds` already being the `[0, width) x [0, height)` pixel grid this
    // is just `(px + 0.5, py + 0.5)`.
    let scale_x = bounds.width() / width as f64;
    let scale_y = bounds.height() / height as f64;

    for py in 0..height {
        for px in 0..width {
            let sample_x = bounds.min_x + (px as f64 + 0.5) * scale_x;
            let sample_y = bounds.min_y + (py as f64 + 0.5) * scale_y;

            let mut acc = Vec4::zeros();
            for renderable in &faces {
                let entry = FineEntry {
                    face: renderable.face.clone(),
                    program: renderable.program,
                    is_constant: is_spatially_constant(renderable.program),
                    is_full_area: false,
                    next: NEXT_ADDRESS_NONE,
                };
                let contribution = sample::sample_pixel(&entry, &*filter, sample_x, sample_y, images)?;
                acc = blend::compose(Compose::Over, BlendMode::Normal, contribution, acc);
            }
            out[(py * width + px) as usize] = acc;
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::{FillRule, RenderPath};
    use std::sync::Arc;

    struct NoImages;
    impl ImageResources for NoImages {
        fn get(&self, _id: u32) -> Option<&Arc<dyn crate::filter::ImageSampler>> {
            None
        }
    }

    #[test]
    fn solid_color_fills_every_pixel() {
        let program = RenderProgram::Color { color: Vec4::new(1.0, 0.0, 0.0, 1.0) };
        let config = TwoPassConfig::new(32, 32, FilterKind::Box, 1.0);
        let pixels = render_two_pass(&program, &config, &NoImages, None).unwrap();
        assert_eq!(pixels.len(), 32 * 32);
        for p in &pixels {
            assert!((p - Vec4::new(1.0, 0.0, 0.0, 1.0)).norm() < 1e-6);
        }
    }

    #[test]
    fn path_boolean_produces_two_solid_regions() {
        let path = RenderPath::new(
            FillRule::NonZero,
            vec![vec![
                crate::geometry::Vec2::new(0.0, 0.0),
                crate::geometry::Vec2::new(16.0, 0.0),
                crate::geometry::Vec2::new(16.0, 32.0),
                crate::geometry::Vec2::new(0.0, 32.0),
            ]],
        );
        let program = RenderProgram::PathBoolean {
            path,
            inside: Box::new(RenderProgram::Color { color: Vec4::new(1.0, 0.0, 0.0, 1.0) }),
            outside: Box::new(RenderProgram::Color { color: Vec4::new(0.0, 0.0, 1.0, 1.0) }),
        };
        let config = TwoPassConfig::new(32, 32, FilterKind::Box, 1.0);
        let pixels = render_two_pass(&program, &config, &NoImages, None).unwrap();
        assert!((pixels[0] - Vec4::new(1.0, 0.0, 0.0, 1.0)).norm() < 1e-3);
        assert!((pixels[31] - Vec4::new(0.0, 0.0, 1.0, 1.0)).norm() < 1e-3);
    }

    #[test]
    fn two_pass_and_reference_paths_agree_on_interior_pixels() {
        let program = RenderProgram::Alpha { child: Box::new(RenderProgram::Color { color: Vec4::new(0.2, 0.4, 0.6, 1.0) }), alpha: 0.5 };
        let config = TwoPassConfig::new(16, 16, FilterKind::Box, 1.0);
        let two_pass = render_two_pass(&program, &config, &NoImages, None).unwrap();
        let reference = render_reference(&program, config.bounds(), 16, 16, FilterKind::Box, 1.0, &NoImages).unwrap();
        for (a, b) in two_pass.iter().zip(reference.iter()) {
            assert!((a - b).norm() < 1e-3, "a={a:?} b={b:?}");
        }
    }

    #[test]
    fn coarse_pass_populates_real_codec_records() {
        let program = RenderProgram::Alpha { child: Box::new(RenderProgram::Color { color: Vec4::new(0.2, 0.4, 0.6, 1.0) }), alpha: 0.5 };
        let config = TwoPassConfig::new(32, 32, FilterKind::Box, 1.0);
        let faces = partition(&program, config.bounds(), None);
        let coarse = coarse_pass(&faces, &config);

        assert!(!coarse.fine_faces.is_empty());
        assert_eq!(coarse.programs.len(), 1);

        for face in &coarse.fine_faces {
            let bytes = codec::encode(face);
            let decoded: TwoPassFineRenderableFace = codec::decode(&bytes).unwrap();
            assert_eq!(decoded, *face);
            assert!((face.edges_index as usize) + (face.num_edges as usize) <= coarse.edge_arena.len());
        }
    }

    #[test]
    fn is_spatially_constant_sees_through_point_independent_combinators() {
        let constant = RenderProgram::Alpha { child: Box::new(RenderProgram::Color { color: Vec4::zeros() }), alpha: 0.5 };
        assert!(is_spatially_constant(&constant));

        let varying = RenderProgram::LinearGradient { from: crate::geometry::Vec2::new(0.0, 0.0), to: crate::geometry::Vec2::new(1.0, 0.0), stops: vec![(0.0, Vec4::zeros())] };
        assert!(!is_spatially_constant(&varying));
    }
}
