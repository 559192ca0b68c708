// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Best-fit arena layout over liveness windows.
//!
//! The algorithm is the interval analogue of register allocation:
//!
//! 1. Scratch requests are visited in order of first use (stable on
//!    ties, so serialized order breaks them).
//! 2. Before placing a request, every active region whose window closed
//!    strictly before the new window opens is retired to the free list.
//!    Adjacent free regions are coalesced on insert.
//! 3. The smallest sufficient free region wins (best-fit); a larger
//!    region is split and the remainder stays free.
//! 4. When nothing fits, the arena grows: by only the deficit if a free
//!    region touches the arena end, otherwise by the full request.
//!
//! Growth is unbounded by design; callers on constrained targets
//! pre-validate `arena_bytes` against their budget.

use crate::{Liveness, PlanError, PlanRequest, PlanStats, StorageClass};

/// Arena offsets are aligned so that `f32` fast-path views stay aligned
/// regardless of the element kinds packed around them.
const ARENA_ALIGN: usize = 8;

/// Where one tensor's bytes live, as decided by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Context-owned heap buffer of the tensor's exact size.
    Dedicated,
    /// Baked constant buffer, filled from the network description.
    Constant,
    /// A reserved byte range inside the shared scratch arena.
    Arena { offset: usize, len: usize },
    /// Designated forward-call input buffer.
    Input,
    /// Designated forward-call output buffer.
    Output,
}

/// The planner's output: one placement per request, in request order,
/// plus the final arena size and accounting.
#[derive(Debug, Clone)]
pub struct BufferPlan {
    pub placements: Vec<Placement>,
    pub arena_bytes: usize,
    pub stats: PlanStats,
}

/// A contiguous region inside the arena with its owner's window.
#[derive(Debug, Clone, Copy)]
struct ActiveRegion {
    offset: usize,
    len: usize,
    last_use: usize,
}

/// A contiguous region available for reuse.
#[derive(Debug, Clone, Copy)]
struct FreeRegion {
    offset: usize,
    len: usize,
}

/// Assigns a [`Placement`] to every request.
///
/// `reuse` disables arena sharing when `false`: scratch requests
/// degrade to dedicated buffers. Output must be bit-identical either
/// way; this switch exists so that the equivalence can be tested and so
/// constrained targets can trade memory for easier debugging.
pub fn plan(requests: &[PlanRequest], reuse: bool) -> Result<BufferPlan, PlanError> {
    for (index, req) in requests.iter().enumerate() {
        if req.liveness.first_use > req.liveness.last_use {
            return Err(PlanError::InvalidLiveness {
                index,
                first_use: req.liveness.first_use,
                last_use: req.liveness.last_use,
            });
        }
    }

    let mut stats = PlanStats::default();
    let mut placements = vec![Placement::Dedicated; requests.len()];

    // Pass-through classes keep their declared strategy.
    let mut scratch_order: Vec<usize> = Vec::new();
    for (index, req) in requests.iter().enumerate() {
        match req.class {
            StorageClass::Dedicated => {
                placements[index] = Placement::Dedicated;
                stats.record(StorageClass::Dedicated, req.size_bytes);
            }
            StorageClass::Constant => {
                placements[index] = Placement::Constant;
                stats.record(StorageClass::Constant, req.size_bytes);
            }
            StorageClass::Input => {
                placements[index] = Placement::Input;
                stats.record(StorageClass::Input, req.size_bytes);
            }
            StorageClass::Output => {
                placements[index] = Placement::Output;
                stats.record(StorageClass::Output, req.size_bytes);
            }
            StorageClass::Scratch if !reuse => {
                placements[index] = Placement::Dedicated;
                stats.record(StorageClass::Scratch, req.size_bytes);
            }
            StorageClass::Scratch => {
                stats.record(StorageClass::Scratch, req.size_bytes);
                scratch_order.push(index);
            }
        }
    }

    // First-use order; stable sort keeps serialized order on ties.
    scratch_order.sort_by_key(|&i| requests[i].liveness.first_use);

    let mut arena_len = 0usize;
    let mut active: Vec<ActiveRegion> = Vec::new();
    let mut free: Vec<FreeRegion> = Vec::new();

    for &index in &scratch_order {
        let req = &requests[index];
        let need = align_up(req.size_bytes, ARENA_ALIGN);

        if need == 0 {
            placements[index] = Placement::Arena { offset: 0, len: 0 };
            continue;
        }

        retire(&mut active, &mut free, req.liveness.first_use);

        let offset = match best_fit(&free, need) {
            Some(slot) => {
                let region = free.remove(slot);
                if region.len > need {
                    // Split: the tail stays free.
                    insert_free(
                        &mut free,
                        FreeRegion {
                            offset: region.offset + need,
                            len: region.len - need,
                        },
                    );
                }
                stats.reused_bytes += need as u64;
                region.offset
            }
            None => {
                // Grow the arena. A free region touching the end only
                // needs topping up by the deficit.
                if let Some(slot) = free
                    .iter()
                    .position(|r| r.offset + r.len == arena_len)
                {
                    let region = free.remove(slot);
                    arena_len += need - region.len;
                    stats.reused_bytes += region.len as u64;
                    region.offset
                } else {
                    let offset = arena_len;
                    arena_len += need;
                    offset
                }
            }
        };

        placements[index] = Placement::Arena { offset, len: need };
        active.push(ActiveRegion {
            offset,
            len: need,
            last_use: req.liveness.last_use,
        });
    }

    stats.arena_bytes = arena_len;
    tracing::debug!("buffer plan: {}", stats.summary());

    Ok(BufferPlan {
        placements,
        arena_bytes: arena_len,
        stats,
    })
}

impl BufferPlan {
    /// Checks the core aliasing invariant over a finished plan: no two
    /// arena placements overlap in bytes while overlapping in liveness.
    ///
    /// Cheap relative to load time; the loader runs it when binding
    /// audits are enabled, and the property tests hammer it.
    pub fn check_aliasing(&self, requests: &[PlanRequest]) -> Result<(), PlanError> {
        struct ArenaSlot {
            index: usize,
            offset: usize,
            len: usize,
            liveness: Liveness,
        }

        let arena: Vec<ArenaSlot> = self
            .placements
            .iter()
            .zip(requests)
            .enumerate()
            .filter_map(|(index, (p, r))| match *p {
                Placement::Arena { offset, len } if len > 0 => Some(ArenaSlot {
                    index,
                    offset,
                    len,
                    liveness: r.liveness,
                }),
                _ => None,
            })
            .collect();

        for (i, a) in arena.iter().enumerate() {
            for b in arena.iter().skip(i + 1) {
                let bytes_overlap = a.offset < b.offset + b.len && b.offset < a.offset + a.len;
                if bytes_overlap && a.liveness.overlaps(&b.liveness) {
                    return Err(PlanError::AliasingViolation {
                        first: a.index,
                        second: b.index,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Moves every active region whose window closed before `first_use`
/// to the free list.
fn retire(active: &mut Vec<ActiveRegion>, free: &mut Vec<FreeRegion>, first_use: usize) {
    let mut i = 0;
    while i < active.len() {
        if active[i].last_use < first_use {
            let region = active.swap_remove(i);
            insert_free(
                free,
                FreeRegion {
                    offset: region.offset,
                    len: region.len,
                },
            );
        } else {
            i += 1;
        }
    }
}

/// Inserts into the offset-sorted free list, coalescing with both
/// neighbors where the regions touch.
fn insert_free(free: &mut Vec<FreeRegion>, region: FreeRegion) {
    let pos = free.partition_point(|r| r.offset < region.offset);
    free.insert(pos, region);

    // Merge with the successor first so indices stay valid.
    if pos + 1 < free.len() && free[pos].offset + free[pos].len == free[pos + 1].offset {
        free[pos].len += free[pos + 1].len;
        free.remove(pos + 1);
    }
    if pos > 0 && free[pos - 1].offset + free[pos - 1].len == free[pos].offset {
        free[pos - 1].len += free[pos].len;
        free.remove(pos);
    }
}

/// Index of the smallest free region that fits, if any.
fn best_fit(free: &[FreeRegion], need: usize) -> Option<usize> {
    free.iter()
        .enumerate()
        .filter(|(_, r)| r.len >= need)
        .min_by_key(|(_, r)| r.len)
        .map(|(i, _)| i)
}

fn align_up(n: usize, align: usize) -> usize {
    n.div_ceil(align) * align
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(size: usize, first: usize, last: usize) -> PlanRequest {
        PlanRequest::new(size, StorageClass::Scratch, Liveness::new(first, last))
    }

    fn arena_of(plan: &BufferPlan, i: usize) -> (usize, usize) {
        match plan.placements[i] {
            Placement::Arena { offset, len } => (offset, len),
            other => panic!("request {i} not in arena: {other:?}"),
        }
    }

    #[test]
    fn test_disjoint_windows_share_bytes() {
        let reqs = vec![scratch(64, 0, 1), scratch(64, 2, 3)];
        let plan = plan(&reqs, true).unwrap();

        assert_eq!(arena_of(&plan, 0), arena_of(&plan, 1));
        assert_eq!(plan.arena_bytes, 64);
    }

    #[test]
    fn test_overlapping_windows_get_disjoint_bytes() {
        let reqs = vec![scratch(64, 0, 2), scratch(64, 1, 3)];
        let plan = plan(&reqs, true).unwrap();

        let (o0, l0) = arena_of(&plan, 0);
        let (o1, l1) = arena_of(&plan, 1);
        assert!(o0 + l0 <= o1 || o1 + l1 <= o0);
        assert_eq!(plan.arena_bytes, 128);
    }

    #[test]
    fn test_inclusive_boundary_does_not_reuse() {
        // last_use == first_use means both are live at node 1.
        let reqs = vec![scratch(32, 0, 1), scratch(32, 1, 2)];
        let plan = plan(&reqs, true).unwrap();
        assert_eq!(plan.arena_bytes, 64);
    }

    #[test]
    fn test_best_fit_prefers_smallest_sufficient_hole() {
        // Two retired holes of different sizes, kept apart by a
        // still-live separator; the new 32-byte tensor should land in
        // the 32-byte hole, not the 128-byte one.
        let reqs = vec![
            scratch(128, 0, 1), // offset 0, retired
            scratch(64, 0, 5),  // offset 128, separator stays live
            scratch(32, 0, 1),  // offset 192, retired
            scratch(32, 2, 5),  // best fit = the 32-byte hole at 192
        ];
        let plan = plan(&reqs, true).unwrap();
        assert_eq!(arena_of(&plan, 3), (192, 32));
        assert_eq!(plan.arena_bytes, 224);
    }

    #[test]
    fn test_growth_by_deficit_extends_end_region() {
        // A 32-byte hole at the arena end; a 64-byte request should
        // extend the arena by 32, not by 64.
        let reqs = vec![
            scratch(64, 0, 5),  // offset 0, pins the front
            scratch(32, 0, 1),  // offset 64, retired early
            scratch(64, 2, 3),  // reuses offset 64, arena grows 96 → 128
        ];
        let plan = plan(&reqs, true).unwrap();
        assert_eq!(arena_of(&plan, 2), (64, 64));
        assert_eq!(plan.arena_bytes, 128);
    }

    #[test]
    fn test_split_leaves_remainder_free() {
        let reqs = vec![
            scratch(128, 0, 1), // offset 0, retired
            scratch(32, 2, 5),  // takes [0, 32) of the hole
            scratch(96, 3, 5),  // remainder [32, 128) fits exactly
        ];
        let plan = plan(&reqs, true).unwrap();
        assert_eq!(arena_of(&plan, 1), (0, 32));
        assert_eq!(arena_of(&plan, 2), (32, 96));
        assert_eq!(plan.arena_bytes, 128);
    }

    #[test]
    fn test_coalescing_merges_neighbors() {
        // Two adjacent retired regions must serve one large request.
        let reqs = vec![
            scratch(64, 0, 1), // offset 0
            scratch(64, 0, 1), // offset 64
            scratch(128, 2, 3),
        ];
        let plan = plan(&reqs, true).unwrap();
        assert_eq!(arena_of(&plan, 2), (0, 128));
        assert_eq!(plan.arena_bytes, 128);
    }

    #[test]
    fn test_reuse_disabled_degrades_to_dedicated() {
        let reqs = vec![scratch(64, 0, 1), scratch(64, 2, 3)];
        let plan = plan(&reqs, false).unwrap();
        assert!(plan
            .placements
            .iter()
            .all(|p| matches!(p, Placement::Dedicated)));
        assert_eq!(plan.arena_bytes, 0);
    }

    #[test]
    fn test_pass_through_classes() {
        let reqs = vec![
            PlanRequest::new(16, StorageClass::Input, Liveness::new(0, 3)),
            PlanRequest::new(16, StorageClass::Constant, Liveness::new(0, 3)),
            PlanRequest::new(16, StorageClass::Dedicated, Liveness::new(0, 3)),
            PlanRequest::new(16, StorageClass::Output, Liveness::new(0, 3)),
        ];
        let plan = plan(&reqs, true).unwrap();
        assert_eq!(plan.placements[0], Placement::Input);
        assert_eq!(plan.placements[1], Placement::Constant);
        assert_eq!(plan.placements[2], Placement::Dedicated);
        assert_eq!(plan.placements[3], Placement::Output);
        assert_eq!(plan.arena_bytes, 0);
    }

    #[test]
    fn test_zero_sized_request() {
        let reqs = vec![scratch(0, 0, 1), scratch(64, 0, 1)];
        let plan = plan(&reqs, true).unwrap();
        assert_eq!(arena_of(&plan, 0), (0, 0));
        assert_eq!(plan.arena_bytes, 64);
    }

    #[test]
    fn test_offsets_are_aligned() {
        let reqs = vec![scratch(3, 0, 2), scratch(5, 0, 2), scratch(9, 0, 2)];
        let plan = plan(&reqs, true).unwrap();
        for i in 0..reqs.len() {
            let (offset, len) = arena_of(&plan, i);
            assert_eq!(offset % 8, 0);
            assert_eq!(len % 8, 0);
            assert!(len >= reqs[i].size_bytes);
        }
    }

    #[test]
    fn test_invalid_liveness_rejected() {
        let reqs = vec![scratch(8, 3, 1)];
        assert!(matches!(
            plan(&reqs, true),
            Err(PlanError::InvalidLiveness { index: 0, .. })
        ));
    }

    /// Deterministic xorshift so the property test needs no rand dep.
    struct XorShift(u64);

    impl XorShift {
        fn next(&mut self) -> u64 {
            let mut x = self.0;
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            self.0 = x;
            x
        }

        fn below(&mut self, n: u64) -> usize {
            (self.next() % n) as usize
        }
    }

    #[test]
    fn test_property_no_live_overlap_randomized() {
        let mut rng = XorShift(0x9e3779b97f4a7c15);

        for _ in 0..200 {
            let n = 2 + rng.below(30);
            let reqs: Vec<PlanRequest> = (0..n)
                .map(|_| {
                    let first = rng.below(20);
                    let last = first + rng.below(8);
                    let size = 1 + rng.below(512);
                    scratch(size, first, last)
                })
                .collect();

            let plan = plan(&reqs, true).unwrap();
            plan.check_aliasing(&reqs)
                .expect("planner violated the liveness/aliasing invariant");

            // Arena must at least hold the largest single request.
            let max_req = reqs
                .iter()
                .map(|r| super::align_up(r.size_bytes, 8))
                .max()
                .unwrap();
            assert!(plan.arena_bytes >= max_req);
        }
    }

    #[test]
    fn test_property_reuse_never_beats_peak_footprint() {
        // The arena can't be smaller than the peak sum of
        // simultaneously live requests.
        let mut rng = XorShift(0x2545f4914f6cdd1d);

        for _ in 0..100 {
            let n = 2 + rng.below(20);
            let reqs: Vec<PlanRequest> = (0..n)
                .map(|_| {
                    let first = rng.below(12);
                    let last = first + rng.below(6);
                    scratch(8 * (1 + rng.below(16)), first, last)
                })
                .collect();

            let plan = plan(&reqs, true).unwrap();

            // At the peak instant every live request occupies disjoint
            // bytes, so the arena can never be smaller than their sum.
            let peak = (0..20)
                .map(|t| {
                    reqs.iter()
                        .filter(|r| r.liveness.first_use <= t && t <= r.liveness.last_use)
                        .map(|r| super::align_up(r.size_bytes, 8))
                        .sum::<usize>()
                })
                .max()
                .unwrap();
            assert!(plan.arena_bytes >= peak);
        }
    }
}
