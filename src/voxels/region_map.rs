//! The table of loaded regions.
//!
//! World management inserts and removes regions; workers look up the region a
//! task names plus its six face neighbors. The map lives behind a
//! [`Shared`](crate::core::Shared) read-write lock, and workers hold the read
//! guard only long enough to clone `Arc` handles out of it.

use std::collections::HashMap;
use std::sync::Arc;

use cgmath::Point3;

use super::face_dir::FaceDir;
use super::region::VoxelRegion;

/// All regions currently loaded, keyed by region coordinate.
#[derive(Default)]
pub struct RegionMap {
    regions: HashMap<Point3<i32>, Arc<VoxelRegion>>,
}

impl RegionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a region, replacing any previous region at the same position.
    pub fn insert(&mut self, region: Arc<VoxelRegion>) {
        self.regions.insert(region.position(), region);
    }

    /// Removes a region. Returns the removed handle so callers can tell
    /// whether anything was loaded there.
    pub fn remove(&mut self, position: Point3<i32>) -> Option<Arc<VoxelRegion>> {
        self.regions.remove(&position)
    }

    pub fn get(&self, position: Point3<i32>) -> Option<&Arc<VoxelRegion>> {
        self.regions.get(&position)
    }

    pub fn contains(&self, position: Point3<i32>) -> bool {
        self.regions.contains_key(&position)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Iterates over all loaded regions.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<VoxelRegion>> {
        self.regions.values()
    }

    /// Collects the six face neighbors of a region. Slots stay `None` for
    /// neighbors that are not loaded.
    pub fn neighbors(&self, position: Point3<i32>) -> NeighborSet {
        let mut set = NeighborSet::default();
        for dir in FaceDir::all() {
            let offset = dir.offset();
            let neighbor = Point3::new(
                position.x + offset.x,
                position.y + offset.y,
                position.z + offset.z,
            );
            set.regions[dir as usize] = self.regions.get(&neighbor).cloned();
        }
        set
    }
}

/// The face neighbors of one region, indexed by [`FaceDir`].
#[derive(Default)]
pub struct NeighborSet {
    pub regions: [Option<Arc<VoxelRegion>>; 6],
}

impl NeighborSet {
    pub fn get(&self, dir: FaceDir) -> Option<&Arc<VoxelRegion>> {
        self.regions[dir as usize].as_ref()
    }

    /// Number of neighbor slots with no loaded region.
    pub fn missing_count(&self) -> usize {
        self.regions.iter().filter(|slot| slot.is_none()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(x: i32, y: i32, z: i32) -> Arc<VoxelRegion> {
        Arc::new(VoxelRegion::new(Point3::new(x, y, z)))
    }

    #[test]
    fn insert_and_lookup() {
        let mut map = RegionMap::new();
        map.insert(region(0, 0, 0));
        assert!(map.contains(Point3::new(0, 0, 0)));
        assert!(!map.contains(Point3::new(1, 0, 0)));
        assert_eq!(map.len(), 1);

        map.remove(Point3::new(0, 0, 0));
        assert!(map.is_empty());
    }

    #[test]
    fn neighbors_reports_missing_slots() {
        let mut map = RegionMap::new();
        map.insert(region(0, 0, 0));
        map.insert(region(1, 0, 0));
        map.insert(region(0, 1, 0));

        let set = map.neighbors(Point3::new(0, 0, 0));
        assert!(set.get(FaceDir::PosX).is_some());
        assert!(set.get(FaceDir::PosY).is_some());
        assert!(set.get(FaceDir::NegX).is_none());
        assert_eq!(set.missing_count(), 4);
    }
}
