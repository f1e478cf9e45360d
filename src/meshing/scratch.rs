//! Per-worker scratch buffers.
//!
//! Each worker owns one [`ScratchBuffers`] for its whole lifetime and reuses
//! it across builds: vertex and index vectors keep their capacity, and the
//! region snapshots are `clone_from`ed so their allocations survive too. The
//! only allocation a steady-state build performs is the compact copy handed
//! to the result queue.

use super::greedy::{SliceMask, EMPTY_SLICE};
use super::MeshData;
use crate::render::vertex::MeshVertex;
use crate::voxels::region::RegionData;

/// One vertex stream being accumulated.
#[derive(Default)]
pub struct StreamScratch {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl StreamScratch {
    /// Appends a quad as four vertices and two triangles.
    pub fn push_quad(
        &mut self,
        corners: [[f32; 3]; 4],
        uvs: [[f32; 2]; 4],
        layer: u32,
        color: [f32; 3],
    ) {
        let base = self.vertices.len() as u32;
        for i in 0..4 {
            self.vertices
                .push(MeshVertex::new(corners[i], uvs[i], layer, color));
        }
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    /// Compact copy of the accumulated stream; the scratch keeps its capacity.
    pub fn to_mesh_data(&self) -> MeshData {
        MeshData {
            vertices: self.vertices.clone(),
            indices: self.indices.clone(),
        }
    }
}

/// All reusable state a worker needs for one build.
pub struct ScratchBuffers {
    pub opaque: StreamScratch,
    pub cutout: StreamScratch,
    pub water: StreamScratch,
    /// Snapshot of the region being built.
    pub center: RegionData,
    /// Snapshots of the loaded face neighbors, indexed by `FaceDir`.
    pub neighbors: [Option<RegionData>; 6],
    /// Mask reused by the greedy pass, one slice at a time.
    pub mask: SliceMask,
}

impl Default for ScratchBuffers {
    fn default() -> Self {
        Self {
            opaque: StreamScratch::default(),
            cutout: StreamScratch::default(),
            water: StreamScratch::default(),
            center: RegionData::default(),
            neighbors: Default::default(),
            mask: EMPTY_SLICE,
        }
    }
}

impl ScratchBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the output streams. Snapshots are overwritten by the next
    /// `load_snapshots`, and the mask is cleared as each slice is merged.
    pub fn clear(&mut self) {
        self.opaque.clear();
        self.cutout.clear();
        self.water.clear();
    }

    /// Copies a region and its loaded neighbors into the scratch, reusing the
    /// previous snapshots' allocations. Each source lock is held only for the
    /// duration of its own copy.
    pub fn load_snapshots(
        &mut self,
        region: &crate::voxels::region::VoxelRegion,
        neighbors: &crate::voxels::region_map::NeighborSet,
    ) {
        self.center.clone_from(&region.data());
        for (slot, source) in self.neighbors.iter_mut().zip(neighbors.regions.iter()) {
            match source {
                Some(neighbor) => match slot {
                    Some(data) => data.clone_from(&neighbor.data()),
                    None => *slot = Some(neighbor.data().clone()),
                },
                None => *slot = None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_quad_emits_two_triangles() {
        let mut stream = StreamScratch::default();
        stream.push_quad(
            [[0.0; 3], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            [[0.0; 2], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
            0,
            [1.0; 3],
        );
        assert_eq!(stream.vertices.len(), 4);
        assert_eq!(stream.indices, vec![0, 1, 2, 0, 2, 3]);

        stream.push_quad(
            [[0.0; 3], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            [[0.0; 2], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
            0,
            [1.0; 3],
        );
        assert_eq!(stream.indices[6..], [4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn clear_keeps_capacity() {
        let mut stream = StreamScratch::default();
        stream.push_quad(
            [[0.0; 3]; 4],
            [[0.0; 2]; 4],
            0,
            [1.0; 3],
        );
        let capacity = stream.vertices.capacity();
        stream.clear();
        assert!(stream.vertices.is_empty());
        assert_eq!(stream.vertices.capacity(), capacity);
    }
}
