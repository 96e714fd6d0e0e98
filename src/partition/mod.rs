//! Face partitioner: turns a `RenderProgram` tree plus a clip bound into a
//! flat list of *renderable faces* — `(face, program)` pairs whose program
//! is constant across the face's interior.
//!
//! Only [`RenderProgram::PathBoolean`] actually changes which region of
//! the plane a subtree applies to; every other node type (blends,
//! gradients, stacks, filters...) is evaluated per-pixel by the filter
//! integrator and bytecode evaluator and is therefore an atomic leaf as
//! far as partitioning is concerned. So this module
//! recurses only through `PathBoolean`, splitting the current face against
//! its path with [`boolean::clip_edges_by_path`] and carrying the
//! unsplit, still-whole face into every other node's children.

mod boolean;

use crate::face::{Bounds, ClippableFace, EdgedClippedFace};
use crate::geometry::LinearEdge;
use crate::program::RenderProgram;

/// Degenerate-face threshold shared with the rest of the clip pipeline.
const MIN_AREA: f64 = 1e-8;

/// A single `(face, program)` pair: `program` is constant over `face`'s interior.
pub struct RenderableFace<'p> {
    pub face: EdgedClippedFace,
    pub program: &'p RenderProgram,
}

/// Partitions `program` over `bounds`, optionally cutting any face wider
/// or taller than `tile_size` along the tile grid. Degenerate faces
/// (`|area| < 1e-8`) are discarded.
pub fn partition<'p>(program: &'p RenderProgram, bounds: Bounds, tile_size: Option<f64>) -> Vec<RenderableFace<'p>> {
    let root = EdgedClippedFace::full_rect(bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y);
    let mut out = Vec::new();
    partition_into(root, program, tile_size, &mut out);
    out
}

fn partition_into<'p>(face: EdgedClippedFace, program: &'p RenderProgram, tile_size: Option<f64>, out: &mut Vec<RenderableFace<'p>>) {
    if let RenderProgram::PathBoolean { path, inside, outside } = program {
        let edges: Vec<LinearEdge> = collect_edges(&face);
        let (inside_edges, outside_edges) = boolean::clip_edges_by_path(&edges, path);

        let inside_face = wrap(inside_edges);
        if is_significant(&inside_face) {
            partition_into(inside_face, inside, tile_size, out);
        }

        let outside_face = wrap(outside_edges);
        if is_significant(&outside_face) {
            partition_into(outside_face, outside, tile_size, out);
        }
        return;
    }

    emit_tiled(face, program, tile_size, out);
}

/// Emits `face` as a leaf renderable face, cutting it along the tile grid
/// first if it exceeds `tile_size` in either dimension.
fn emit_tiled<'p>(face: EdgedClippedFace, program: &'p RenderProgram, tile_size: Option<f64>, out: &mut Vec<RenderableFace<'p>>) {
    let bounds = face.bounds_rect();
    let exceeds_tile = match tile_size {
        Some(size) => bounds.width() > size || bounds.height() > size,
        None => false,
    };

    if !exceeds_tile {
        if is_significant(&face) {
            out.push(RenderableFace { face, program });
        }
        return;
    }

    let size = tile_size.unwrap();
    face.grid_clip_iterate(
        size,
        size,
        |_cell_x, _cell_y, cell| {
            if is_significant(&cell) {
                out.push(RenderableFace { face: cell, program });
            }
        },
        || {},
    );
}

fn collect_edges(face: &EdgedClippedFace) -> Vec<LinearEdge> {
    let mut edges = Vec::new();
    face.for_each_edge(&mut |e| edges.push(*e));
    edges
}

fn wrap(edges: Vec<LinearEdge>) -> EdgedClippedFace {
    let bounds = Bounds::of_edges(&edges);
    EdgedClippedFace::new(edges, bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y, 0, 0, 0, 0)
}

fn is_significant(face: &EdgedClippedFace) -> bool {
    face.area().abs() >= MIN_AREA
}
