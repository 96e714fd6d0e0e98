//! GPU-style parallel primitives: segmented scan/reduce, radix sort and
//! merge, specified at the algorithm level over fixed-size flat arrays and
//! emulated here with a CPU thread pool.
//!
//! A dispatch is modeled as `D` workgroups of `W` lanes each processing a
//! `blocked` (contiguous) or `striped` (interleaved) span of a `W*G`-item
//! tile; inter-workgroup ordering only exists across dispatches. On the CPU
//! reference path one workgroup is emulated by one `scoped_threadpool` job
//! operating on a contiguous (`blocked`) slice, and a dispatch is the
//! `scope()` call that joins all of them — the same mapping the two-pass
//! rasterizer's coarse/fine dispatches use.
//!
//! The non-commutative reductions this crate actually needs (composite
//! Porter-Duff is not commutative) require the reduction tree to preserve
//! source order; every primitive below combines left-to-right within a
//! chunk and folds chunks together in index order, never reassociating
//! across a commutative-only tree.

mod sort;

pub use sort::{corank, merge, radix_sort, BitOrder, U32AscendingOrder, U32ReverseOrder, Vec2uLexicographicalOrder};

use std::cmp;

/// Default lane count per workgroup (`W`), the CPU stand-in used to decide
/// how many `scoped_threadpool` jobs a dispatch spawns. A power of two in
/// the 64-256 range; the CPU path cares only about "big enough chunks to
/// amortize the thread-pool job", not the exact GPU-subgroup value.
pub const DEFAULT_WORKGROUP_SIZE: usize = 128;

/// How a workgroup's `W*G` items map onto lanes.
/// `Blocked` is what every primitive in this module actually uses: each
/// chunk handed to a worker thread is a contiguous span, so within-chunk
/// combination happens in source order and non-commutative operators stay
/// correct. `Striped` is retained to document the alternative the GPU
/// kernels may choose for coalesced memory access; it doesn't change the
/// *result* of these CPU-side primitives, only a real GPU's memory pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPattern {
    Blocked,
    Striped,
}

fn chunk_count(len: usize, workgroup_size: usize) -> usize {
    if len == 0 {
        1
    } else {
        (len + workgroup_size - 1) / workgroup_size
    }
}

/// `Reduce(x, ⊕, identity)`: folds `items` with the associative, possibly
/// non-commutative `op`, left to right. Multi-level: each workgroup-sized
/// chunk is reduced on its own thread-pool job, then the per-chunk partials
/// are folded together in chunk order — "write one value per workgroup,
/// then recursively reduce", collapsed to two levels since a chunk count
/// rarely needs a third.
pub fn reduce<T, F>(items: &[T], identity: T, op: F) -> T
where
    T: Clone + Send,
    F: Fn(T, T) -> T + Sync,
{
    if items.is_empty() {
        return identity;
    }
    let workgroup_size = DEFAULT_WORKGROUP_SIZE;
    let chunks: Vec<&[T]> = items.chunks(workgroup_size).collect();
    let mut partials: Vec<T> = vec![identity.clone(); chunks.len()];

    let mut pool = scoped_threadpool::Pool::new(num_cpus::get() as u32);
    pool.scoped(|scope| {
        for (slot, chunk) in partials.iter_mut().zip(chunks.iter()) {
            let op = &op;
            let identity = identity.clone();
            scope.execute(move || {
                *slot = chunk.iter().cloned().fold(identity, |a, b| op(a, b));
            });
        }
    });

    partials.into_iter().fold(identity, |a, b| op(a, b))
}

/// `Scan(x, ⊕, identity, exclusive|inclusive)`: per-element prefix fold.
/// Each workgroup-sized chunk is scanned locally and in parallel; the
/// chunk-local results are then corrected by adding in the reduced total
/// of every earlier chunk (computed in chunk order, so a non-commutative
/// `op` still sees every element in source order) — local scan, reduce the
/// local totals, propagate, without needing the `W*G` tiling to literally
/// recurse three levels for array sizes this crate actually produces.
pub fn scan<T, F>(items: &[T], identity: T, inclusive: bool, op: F) -> Vec<T>
where
    T: Clone + Send,
    F: Fn(T, T) -> T + Sync,
{
    if items.is_empty() {
        return Vec::new();
    }
    let workgroup_size = DEFAULT_WORKGROUP_SIZE;
    let chunks: Vec<&[T]> = items.chunks(workgroup_size).collect();

    // Pass 1: local inclusive scan per chunk, in parallel.
    let mut local: Vec<Vec<T>> = chunks.iter().map(|c| Vec::with_capacity(c.len())).collect();
    {
        let mut pool = scoped_threadpool::Pool::new(num_cpus::get() as u32);
        pool.scoped(|scope| {
            for (out, chunk) in local.iter_mut().zip(chunks.iter()) {
                let op = &op;
                let identity = identity.clone();
                scope.execute(move || {
                    let mut running = identity;
                    for item in chunk.iter().cloned() {
                        running = op(running, item);
                        out.push(running.clone());
                    }
                });
            }
        });
    }

    // Pass 2: exclusive prefix over the per-chunk totals, sequential
    // (chunk count is small relative to item count, and this is exactly
    // the non-commutative-safe "combine chunk totals in order" step).
    let mut carries: Vec<T> = Vec::with_capacity(chunks.len());
    let mut running = identity.clone();
    for chunk_result in &local {
        carries.push(running.clone());
        if let Some(total) = chunk_result.last() {
            running = op(running, total.clone());
        }
    }

    // Pass 3: apply each chunk's carry-in to its local scan. Exclusive
    // output at position `i` uses the local *inclusive* value at `i-1`
    // (or `identity` at the chunk's first element) before folding in the
    // carry, so the shift happens against `chunk_local` directly rather
    // than the already-emitted (and already carry-adjusted) `out`.
    let mut out = Vec::with_capacity(items.len());
    for (chunk_local, carry) in local.into_iter().zip(carries.into_iter()) {
        if inclusive {
            out.extend(chunk_local.into_iter().map(|v| op(carry.clone(), v)));
        } else {
            out.push(carry.clone());
            for v in chunk_local.iter().take(chunk_local.len().saturating_sub(1)) {
                out.push(op(carry.clone(), v.clone()));
            }
        }
    }
    out
}

/// Segment key extractor for [`segmented_scan`]/[`segmented_reduce`]: items
/// sharing the same key associate with each other but never across a key
/// boundary — the raster pipeline's key is the bin index a candidate falls
/// into.
pub fn segmented_scan<T, K, F, KeyFn>(items: &[T], identity: T, inclusive: bool, op: F, key: KeyFn) -> Vec<T>
where
    T: Clone,
    K: PartialEq,
    F: Fn(T, T) -> T,
    KeyFn: Fn(&T) -> K,
{
    let mut out = Vec::with_capacity(items.len());
    let mut current_key: Option<K> = None;
    // `running` is always the segment's exclusive prefix (identity at the
    // segment's first element); inclusive output folds the current item
    // in before pushing, exclusive output pushes first and folds after.
    let mut running = identity.clone();
    for item in items {
        let k = key(item);
        if current_key.as_ref() != Some(&k) {
            running = identity.clone();
            current_key = Some(k);
        }
        if inclusive {
            running = op(running, item.clone());
            out.push(running.clone());
        } else {
            out.push(running.clone());
            running = op(running, item.clone());
        }
    }
    out
}

/// `Segmented reduce`: the reduced value of each maximal run of equal keys,
/// one output entry per distinct run (not one per input element).
pub fn segmented_reduce<T, K, F, KeyFn>(items: &[T], op: F, key: KeyFn) -> Vec<(K, T)>
where
    T: Clone,
    K: PartialEq,
    F: Fn(T, T) -> T,
    KeyFn: Fn(&T) -> K,
{
    let mut out: Vec<(K, T)> = Vec::new();
    for item in items {
        let k = key(item);
        match out.last_mut() {
            Some((last_key, acc)) if *last_key == k => *acc = op(acc.clone(), item.clone()),
            _ => out.push((k, item.clone())),
        }
    }
    out
}

#[inline]
pub(crate) fn div_ceil(a: usize, b: usize) -> usize {
    cmp::max(1, (a + b - 1) / b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduce_sums_matches_total() {
        let items: Vec<i64> = (0..1000).collect();
        let total: i64 = items.iter().sum();
        assert_eq!(reduce(&items, 0, |a, b| a + b), total);
    }

    #[test]
    fn scan_inclusive_matches_prefix_sum() {
        let items: Vec<i64> = (1..=500).collect();
        let scanned = scan(&items, 0, true, |a, b| a + b);
        let mut running = 0;
        for (i, &v) in items.iter().enumerate() {
            running += v;
            assert_eq!(scanned[i], running);
        }
    }

    #[test]
    fn segmented_reduce_respects_key_boundaries() {
        let items = vec![(0u32, 1i64), (0, 2), (1, 10), (1, 20), (1, 30), (2, 100)];
        let reduced = segmented_reduce(&items, |a, b| (a.0, a.1 + b.1), |x| x.0);
        assert_eq!(reduced, vec![(0, (0, 3)), (1, (1, 60)), (2, (2, 100))]);
    }

    #[test]
    fn chunk_count_covers_all_items() {
        assert_eq!(chunk_count(257, 128), 3);
        assert_eq!(chunk_count(0, 128), 1);
    }
}
