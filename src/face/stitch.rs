//! Reconstructs closed polygon loops from an unordered edge set. Used when
//! a representation that doesn't track loop
//! order (`EdgedFace`, `EdgedClippedFace`) needs to hand back ordered loops,
//! e.g. for export or for a consumer that only accepts [`super::PolygonalFace`].

use std::collections::HashMap;

use crate::geometry::{LinearEdge, Vec2};

type Key = (i64, i64);

fn quantize(p: Vec2, eps: f64) -> Key {
    ((p.x / eps).round() as i64, (p.y / eps).round() as i64)
}

/// Greedily chains real edges (fake-corner edges are dropped first, since
/// they exist only to balance area/winding bookkeeping, not to describe the
/// actual boundary) into closed loops by matching endpoints within `eps`.
/// Any edge that can't be chained into a loop (a dangling fragment left by
/// an approximate match) is dropped; callers needing an exact round-trip
/// should keep using the edge-set form instead.
pub(crate) fn stitch_loops(edges: &[LinearEdge], eps: f64) -> Vec<Vec<Vec2>> {
    let real: Vec<&LinearEdge> = edges.iter().filter(|e| !e.contains_fake_corner).collect();

    let mut by_start: HashMap<Key, Vec<usize>> = HashMap::new();
    for (i, e) in real.iter().enumerate() {
        by_start.entry(quantize(e.start, eps)).or_default().push(i);
    }

    let mut used = vec![false; real.len()];
    let mut loops = Vec::new();

    for start_idx in 0..real.len() {
        if used[start_idx] {
            continue;
        }
        let loop_start_key = quantize(real[start_idx].start, eps);
        let mut points = Vec::new();
        let mut current = start_idx;

        loop {
            used[current] = true;
            points.push(real[current].start);
            let end_key = quantize(real[current].end, eps);
            if end_key == loop_start_key {
                break;
            }
            match by_start.get(&end_key).and_then(|candidates| candidates.iter().copied().find(|&i| !used[i])) {
                Some(next) => current = next,
                None => break,
            }
        }

        if points.len() >= 3 {
            loops.push(points);
        }
    }

    loops
}
