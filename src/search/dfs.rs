//! Branch-and-bound backtracker
//!
//! Depth-first placement of marks with a distance bitset for O(1) duplicate
//! detection. The search is strictly sequential within a frame; the parallel
//! drivers run many frames concurrently, each from its own seed triple.
//!
//! Pruning rules:
//! - even unit spacing of the remaining marks must still fit the target,
//! - the next mark may not exceed `target - (remaining marks after it)`,
//! - the second mark stays in the lower half of the ruler (the mirror image
//!   of any ruler is a ruler, so only one orientation is searched).
//!
//! Every commit is paired with an exact rollback: `commit` sets the new
//! distances, `retract` clears the same set, and the recursion only skips
//! the rollback when propagating a completed ruler upwards.

use crate::config::EngineConfig;
use crate::search::distance_bitset::DistanceBitset;
use crate::simd::{self, ProbeBackend, ProbeFn};
use crate::types::{Ruler, MAX_MARKS};

/// Depth from which new distances are probed in batches of eight instead of
/// one at a time. Below this the batch setup outweighs the gather.
pub(crate) const SIMD_BATCH_MIN_DEPTH: usize = 6;

/// Per-worker search state: committed mark prefix plus the distance bitset.
///
/// Stack-allocated and private to one worker; initializing a frame per seed
/// costs no heap allocation.
pub(crate) struct SearchFrame {
    pub positions: [u32; MAX_MARKS],
    pub bitset: DistanceBitset,
}

impl SearchFrame {
    /// Frame with only the origin mark committed
    pub fn root() -> Self {
        Self { positions: [0; MAX_MARKS], bitset: DistanceBitset::new() }
    }

    /// Frame seeded with the triple `(0, second, third)` and its three
    /// distances committed.
    ///
    /// Returns `None` when the seed distances collide, which by
    /// construction only happens for `third == 2 * second`.
    pub fn seeded(second: u32, third: u32) -> Option<Self> {
        let mut frame = Self::root();
        frame.positions[1] = second;
        frame.positions[2] = third;
        frame.bitset.set(second);
        let d13 = third;
        let d23 = third - second;
        if frame.bitset.test(d13) || frame.bitset.test(d23) {
            return None;
        }
        frame.bitset.set(d13);
        frame.bitset.set(d23);
        Some(frame)
    }

    /// Commit `next` at `depth`: record the mark and set every distance it
    /// forms with the committed prefix.
    #[inline]
    fn commit(&mut self, depth: usize, next: u32) {
        self.positions[depth] = next;
        for i in 0..depth {
            self.bitset.set(next - self.positions[i]);
        }
    }

    /// Exact inverse of [`SearchFrame::commit`]: clears the same distances.
    #[inline]
    fn retract(&mut self, depth: usize, next: u32) {
        for i in 0..depth {
            self.bitset.clear(next - self.positions[i]);
        }
    }

    /// The committed prefix as a validated ruler
    pub fn into_ruler(self, n: usize) -> Option<Ruler> {
        Ruler::new(self.positions[..n].to_vec()).ok()
    }
}

/// Immutable per-solve search context: bounds, probe binding, and logging.
///
/// The probe backend is selected once here; the recursion calls it through
/// a plain function pointer.
pub(crate) struct DfsContext {
    n: usize,
    target: u32,
    probe: ProbeFn,
    batch_probes: bool,
    verbose: bool,
}

impl DfsContext {
    pub fn new(n: u32, target: u32, config: &EngineConfig) -> Self {
        let backend = simd::select_backend(&config.simd);
        Self {
            n: n as usize,
            target,
            probe: backend.probe_fn(),
            batch_probes: backend != ProbeBackend::Scalar,
            verbose: config.search.debug_logging,
        }
    }

    /// Whether placing `next` at `depth` would repeat a used distance
    #[inline]
    fn has_duplicate(&self, frame: &SearchFrame, depth: usize, next: u32) -> bool {
        if self.batch_probes && depth >= SIMD_BATCH_MIN_DEPTH {
            let mut k = 0;
            while k < depth {
                // pad with distance 0, which is never marked
                let mut batch = [0u32; 8];
                let take = (depth - k).min(8);
                for (slot, &p) in batch.iter_mut().zip(&frame.positions[k..k + take]) {
                    *slot = next - p;
                }
                if (self.probe)(frame.bitset.words(), &batch) {
                    return true;
                }
                k += take;
            }
            false
        } else {
            frame.positions[..depth].iter().any(|&p| frame.bitset.test(next - p))
        }
    }

    /// Recursive branch-and-bound placement of the mark at `depth`.
    ///
    /// Returns true iff the frame now holds a complete ruler ending exactly
    /// at the target length. On false the frame is restored to its state at
    /// entry.
    pub fn search(&self, frame: &mut SearchFrame, depth: usize) -> bool {
        if depth == self.n {
            return frame.positions[self.n - 1] == self.target;
        }
        let last = frame.positions[depth - 1];

        // minimal possible final length if we place marks 1 apart
        if last + (self.n - depth) as u32 > self.target {
            return false;
        }

        let mut max_next = self.target - (self.n - depth - 1) as u32;
        if depth == 1 {
            // mirror symmetry break for the second mark
            max_next = max_next.min(self.target / 2).max(last + 1);
        }

        for next in (last + 1)..=max_next {
            // fast reject on the smallest new distance; sound because
            // committed distances are only cleared on backtrack from the
            // matching commit, never between siblings
            if frame.bitset.test(next - last) {
                continue;
            }
            if self.has_duplicate(frame, depth, next) {
                continue;
            }
            frame.commit(depth, next);
            if self.verbose && depth < 6 {
                log::debug!("depth {} add {}", depth, next);
            }
            if self.search(frame, depth + 1) {
                return true;
            }
            frame.retract(depth, next);
        }
        false
    }
}

/// Single-threaded solve: full DFS from the origin mark.
pub(crate) fn solve_single(n: u32, target: u32, config: &EngineConfig) -> Option<Ruler> {
    let ctx = DfsContext::new(n, target, config);
    let mut frame = SearchFrame::root();
    if ctx.search(&mut frame, 1) {
        frame.into_ruler(n as usize)
    } else {
        None
    }
}
