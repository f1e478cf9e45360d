//! # Region Module
//!
//! A `VoxelRegion` is the unit of mesh rebuilding: a 16³ cube of block ids
//! with stored light values and dirty tracking.
//!
//! ## Storage
//!
//! - `blocks`: dense `Vec<BlockId>`, one byte per voxel.
//! - `occupancy`: a bit vector with one bit per voxel, set for blocks that
//!   occlude their neighbors. Face culling only needs this bit, so the hot
//!   inner loop of the builder never touches the id array for neighbors.
//! - `light`: stored light level 0–15 per voxel, written by the lighting
//!   system, read-only here.
//!
//! ## Dirty tracking
//!
//! Two independent flags mark a region for rebuild: `geometry_dirty` (topology
//! changed) and `lighting_dirty` (stored light changed). Every edit also bumps
//! a monotonically increasing `revision`. A build snapshots the revision it
//! read; the flags are cleared after the device-mesh swap only if the revision
//! still matches. A region edited while its build is in flight therefore stays
//! dirty and is rebuilt again, so no edit is ever silently lost.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard};

use bitvec::prelude::BitVec;
use cgmath::Point3;

use super::block::{block_info, BlockId};

/// Regions are cubes of this many voxels per edge.
pub const REGION_DIM: i32 = 16;
/// Voxels in one region plane.
pub const REGION_PLANE: i32 = REGION_DIM * REGION_DIM;
/// Voxels in one region.
pub const REGION_VOLUME: usize = (REGION_PLANE * REGION_DIM) as usize;
/// Highest stored light level.
pub const LIGHT_MAX: u8 = 15;

/// Linear index of a voxel inside a region. Coordinates must be in
/// `0..REGION_DIM`.
#[inline]
pub fn voxel_index(x: i32, y: i32, z: i32) -> usize {
    debug_assert!((0..REGION_DIM).contains(&x));
    debug_assert!((0..REGION_DIM).contains(&y));
    debug_assert!((0..REGION_DIM).contains(&z));
    (x + REGION_DIM * (y + REGION_DIM * z)) as usize
}

/// The voxel payload of a region. Cloned into worker-local scratch before a
/// build so the builder reads an immutable snapshot while edits continue.
#[derive(Clone)]
pub struct RegionData {
    pub blocks: Vec<BlockId>,
    pub occupancy: BitVec,
    pub light: Vec<u8>,
}

impl Default for RegionData {
    fn default() -> Self {
        Self {
            blocks: vec![0; REGION_VOLUME],
            occupancy: BitVec::repeat(false, REGION_VOLUME),
            light: vec![LIGHT_MAX; REGION_VOLUME],
        }
    }
}

impl RegionData {
    #[inline]
    pub fn block_at(&self, x: i32, y: i32, z: i32) -> BlockId {
        self.blocks[voxel_index(x, y, z)]
    }

    #[inline]
    pub fn light_at(&self, x: i32, y: i32, z: i32) -> u8 {
        self.light[voxel_index(x, y, z)]
    }

    /// O(1) check whether the voxel occludes neighboring faces.
    #[inline]
    pub fn is_occluding(&self, x: i32, y: i32, z: i32) -> bool {
        self.occupancy[voxel_index(x, y, z)]
    }

    fn set_block(&mut self, x: i32, y: i32, z: i32, id: BlockId) {
        let idx = voxel_index(x, y, z);
        self.blocks[idx] = id;
        let occludes = block_info(id).map(|info| info.occludes()).unwrap_or(false);
        self.occupancy.set(idx, occludes);
    }
}

/// A 16³ region of voxels with dirty tracking.
///
/// Regions are owned by world management and shared with the build pipeline
/// through `Arc`. The payload sits behind a lock because edits (main thread)
/// and snapshots (workers) overlap; the dirty flags and revision are atomics
/// so marking a region dirty never contends with a build in progress.
pub struct VoxelRegion {
    position: Point3<i32>,
    data: RwLock<RegionData>,
    geometry_dirty: AtomicBool,
    lighting_dirty: AtomicBool,
    revision: AtomicU64,
}

impl VoxelRegion {
    /// Creates an empty (all air, fully lit) region. New regions start
    /// geometry-dirty so their first mesh gets built.
    pub fn new(position: Point3<i32>) -> Self {
        Self {
            position,
            data: RwLock::new(RegionData::default()),
            geometry_dirty: AtomicBool::new(true),
            lighting_dirty: AtomicBool::new(false),
            revision: AtomicU64::new(0),
        }
    }

    /// Creates a region by evaluating `f` for every voxel.
    pub fn from_fn(position: Point3<i32>, mut f: impl FnMut(i32, i32, i32) -> BlockId) -> Self {
        let region = Self::new(position);
        {
            let mut data = region.data.write().unwrap();
            for z in 0..REGION_DIM {
                for y in 0..REGION_DIM {
                    for x in 0..REGION_DIM {
                        data.set_block(x, y, z, f(x, y, z));
                    }
                }
            }
        }
        region
    }

    /// Creates a region completely filled with one block type.
    pub fn filled(position: Point3<i32>, id: BlockId) -> Self {
        Self::from_fn(position, |_, _, _| id)
    }

    pub fn position(&self) -> Point3<i32> {
        self.position
    }

    /// World-space center of the region, used for priority distances and for
    /// back-to-front sorting of the water pass.
    pub fn center(&self) -> Point3<f32> {
        let half = REGION_DIM as f32 * 0.5;
        Point3::new(
            (self.position.x * REGION_DIM) as f32 + half,
            (self.position.y * REGION_DIM) as f32 + half,
            (self.position.z * REGION_DIM) as f32 + half,
        )
    }

    /// Read access to the voxel payload. Held briefly by workers while they
    /// clone a snapshot.
    pub fn data(&self) -> RwLockReadGuard<'_, RegionData> {
        self.data.read().unwrap()
    }

    /// Writes one voxel and marks the region geometry-dirty.
    pub fn set_block(&self, x: i32, y: i32, z: i32, id: BlockId) {
        self.data.write().unwrap().set_block(x, y, z, id);
        self.mark_geometry_dirty();
    }

    /// Writes one stored light value and marks the region lighting-dirty.
    pub fn set_light(&self, x: i32, y: i32, z: i32, level: u8) {
        debug_assert!(level <= LIGHT_MAX);
        self.data.write().unwrap().light[voxel_index(x, y, z)] = level;
        self.mark_lighting_dirty();
    }

    /// Marks the region for rebuild after a topology change.
    pub fn mark_geometry_dirty(&self) {
        self.revision.fetch_add(1, Ordering::AcqRel);
        self.geometry_dirty.store(true, Ordering::Release);
    }

    /// Marks the region for rebuild after a stored-light change.
    pub fn mark_lighting_dirty(&self) {
        self.revision.fetch_add(1, Ordering::AcqRel);
        self.lighting_dirty.store(true, Ordering::Release);
    }

    pub fn is_geometry_dirty(&self) -> bool {
        self.geometry_dirty.load(Ordering::Acquire)
    }

    pub fn is_lighting_dirty(&self) -> bool {
        self.lighting_dirty.load(Ordering::Acquire)
    }

    /// True when either dirty flag is set.
    pub fn needs_rebuild(&self) -> bool {
        self.is_geometry_dirty() || self.is_lighting_dirty()
    }

    /// The revision a build must snapshot before reading the payload. Reading
    /// it before the snapshot means an edit that slips in between leaves the
    /// stored revision ahead of the snapshot, which keeps the flags set.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Clears both dirty flags if no edit happened since `snapshot` was read.
    /// Returns whether the flags were cleared; `false` means the region was
    /// re-dirtied while its build was in flight and will be rebuilt.
    pub fn clear_dirty_if_current(&self, snapshot: u64) -> bool {
        if self.revision.load(Ordering::Acquire) == snapshot {
            self.geometry_dirty.store(false, Ordering::Release);
            self.lighting_dirty.store(false, Ordering::Release);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxels::block::BlockKind;

    #[test]
    fn new_region_needs_first_build() {
        let region = VoxelRegion::new(Point3::new(0, 0, 0));
        assert!(region.is_geometry_dirty());
        assert!(!region.is_lighting_dirty());
    }

    #[test]
    fn edits_bump_revision_and_flags() {
        let region = VoxelRegion::new(Point3::new(0, 0, 0));
        let rev = region.revision();
        region.clear_dirty_if_current(rev);
        assert!(!region.needs_rebuild());

        region.set_block(1, 2, 3, BlockKind::Stone.id());
        assert!(region.is_geometry_dirty());
        assert!(!region.is_lighting_dirty());
        assert!(region.revision() > rev);

        let rev = region.revision();
        region.clear_dirty_if_current(rev);
        region.set_light(1, 2, 3, 7);
        assert!(region.is_lighting_dirty());
        assert!(!region.is_geometry_dirty());
    }

    #[test]
    fn stale_snapshot_does_not_clear_flags() {
        let region = VoxelRegion::new(Point3::new(0, 0, 0));
        let snapshot = region.revision();
        // An edit lands while the build for `snapshot` is still in flight.
        region.set_block(0, 0, 0, BlockKind::Dirt.id());
        assert!(!region.clear_dirty_if_current(snapshot));
        assert!(region.needs_rebuild());
        // The follow-up build sees the newer revision and clears normally.
        assert!(region.clear_dirty_if_current(region.revision()));
        assert!(!region.needs_rebuild());
    }

    #[test]
    fn occupancy_tracks_render_class() {
        let region = VoxelRegion::new(Point3::new(0, 0, 0));
        region.set_block(0, 0, 0, BlockKind::Stone.id());
        region.set_block(1, 0, 0, BlockKind::Water.id());
        region.set_block(2, 0, 0, BlockKind::Leaves.id());
        let data = region.data();
        assert!(data.is_occluding(0, 0, 0));
        assert!(!data.is_occluding(1, 0, 0));
        assert!(!data.is_occluding(2, 0, 0));
    }

    #[test]
    fn center_is_region_midpoint() {
        let region = VoxelRegion::new(Point3::new(1, 0, -1));
        assert_eq!(region.center(), Point3::new(24.0, 8.0, -8.0));
    }
}
