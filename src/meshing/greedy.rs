//! Greedy face merging.
//!
//! Works on one planar slice at a time: the builder fills a 16×16 mask of
//! [`FaceSeed`]s for a face direction, then [`merge_slice`] grows each seed
//! into the widest run of compatible faces along U, extends that run along V
//! while every covered cell still matches, and emits one quad per rectangle.
//!
//! Merging is only valid when the texture atlas can wrap a tile across the
//! merged extent; the builder checks that capability once at setup and skips
//! this pass entirely otherwise.

use super::face::FaceSeed;
use crate::voxels::region::REGION_DIM;

/// Edge length of a slice mask.
pub const SLICE_DIM: usize = REGION_DIM as usize;
/// Cells in one slice mask.
pub const SLICE_AREA: usize = SLICE_DIM * SLICE_DIM;

/// One face direction's worth of faces in a single plane of the region.
pub type SliceMask = [Option<FaceSeed>; SLICE_AREA];

/// Empty mask value for resetting between slices.
pub const EMPTY_SLICE: SliceMask = [None; SLICE_AREA];

/// Merges the mask into maximal rectangles and calls `emit(u, v, w, h, seed)`
/// for each. Consumes the mask (cells are cleared as they are covered).
///
/// The scan order (V-major, then U) is fixed, so identical input masks always
/// produce identical quads.
pub fn merge_slice(
    mask: &mut SliceMask,
    light_tolerance: u8,
    mut emit: impl FnMut(usize, usize, usize, usize, FaceSeed),
) {
    for v in 0..SLICE_DIM {
        for u in 0..SLICE_DIM {
            let Some(seed) = mask[v * SLICE_DIM + u] else {
                continue;
            };

            // Grow along U as far as compatible seeds run.
            let mut w = 1;
            while u + w < SLICE_DIM {
                match mask[v * SLICE_DIM + u + w] {
                    Some(next) if seed.merges_with(&next, light_tolerance) => w += 1,
                    _ => break,
                }
            }

            // Extend along V while the whole row underneath matches.
            let mut h = 1;
            'grow: while v + h < SLICE_DIM {
                for du in 0..w {
                    match mask[(v + h) * SLICE_DIM + u + du] {
                        Some(next) if seed.merges_with(&next, light_tolerance) => {}
                        _ => break 'grow,
                    }
                }
                h += 1;
            }

            for dv in 0..h {
                for du in 0..w {
                    mask[(v + dv) * SLICE_DIM + u + du] = None;
                }
            }

            emit(u, v, w, h, seed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed(block: u8, light: u8) -> FaceSeed {
        FaceSeed {
            block,
            layer: block as u32,
            light,
            tint: [1.0, 1.0, 1.0],
        }
    }

    fn collect_quads(mask: &mut SliceMask, tolerance: u8) -> Vec<(usize, usize, usize, usize)> {
        let mut quads = Vec::new();
        merge_slice(mask, tolerance, |u, v, w, h, _| quads.push((u, v, w, h)));
        quads
    }

    #[test]
    fn uniform_slice_becomes_one_quad() {
        let mut mask = [Some(seed(1, 15)); SLICE_AREA];
        let quads = collect_quads(&mut mask, 0);
        assert_eq!(quads, vec![(0, 0, SLICE_DIM, SLICE_DIM)]);
    }

    #[test]
    fn differing_blocks_split_quads() {
        let mut mask = EMPTY_SLICE;
        for u in 0..SLICE_DIM {
            mask[u] = Some(seed(if u < 8 { 1 } else { 2 }, 15));
        }
        let quads = collect_quads(&mut mask, 0);
        assert_eq!(quads, vec![(0, 0, 8, 1), (8, 0, 8, 1)]);
    }

    #[test]
    fn light_tolerance_bounds_merging() {
        let mut mask = EMPTY_SLICE;
        mask[0] = Some(seed(1, 15));
        mask[1] = Some(seed(1, 14));
        mask[2] = Some(seed(1, 11));

        let quads = collect_quads(&mut mask.clone(), 1);
        assert_eq!(quads, vec![(0, 0, 2, 1), (2, 0, 1, 1)]);

        let quads = collect_quads(&mut mask, 0);
        assert_eq!(quads.len(), 3);
    }

    #[test]
    fn rectangles_never_overrun_ragged_rows() {
        // Row 0 is full, row 1 only half full: the tall rectangle must stop
        // where the second row ends.
        let mut mask = EMPTY_SLICE;
        for u in 0..SLICE_DIM {
            mask[u] = Some(seed(1, 15));
        }
        for u in 0..8 {
            mask[SLICE_DIM + u] = Some(seed(1, 15));
        }
        let quads = collect_quads(&mut mask, 0);
        let covered: usize = quads.iter().map(|&(_, _, w, h)| w * h).sum();
        assert_eq!(covered, SLICE_DIM + 8);
        // No cell may be emitted twice.
        let mut seen = [false; SLICE_AREA];
        for &(u, v, w, h) in &quads {
            for dv in 0..h {
                for du in 0..w {
                    assert!(!seen[(v + dv) * SLICE_DIM + u + du]);
                    seen[(v + dv) * SLICE_DIM + u + du] = true;
                }
            }
        }
    }

    #[test]
    fn merged_quads_never_exceed_naive_count() {
        let mut rng_mask = EMPTY_SLICE;
        let mut naive = 0;
        for cell in rng_mask.iter_mut() {
            if fastrand::bool() {
                *cell = Some(seed(fastrand::u8(1..4), 15));
                naive += 1;
            }
        }
        let quads = collect_quads(&mut rng_mask, 0);
        assert!(quads.len() <= naive);
        let covered: usize = quads.iter().map(|&(_, _, w, h)| w * h).sum();
        assert_eq!(covered, naive);
    }
}
