//! # Meshing Module
//!
//! Off-thread conversion of voxel data into vertex streams: face culling
//! against neighbors, optional greedy merging of coplanar faces, and baking of
//! stored light into per-vertex color. Everything in this module is pure CPU
//! work; nothing here touches the graphics device.
//!
//! The output of a build is a [`RegionMeshData`]: three independent streams
//! (opaque, cutout, water) that the device layer uploads as separate buffers
//! because they draw in different render passes.

pub mod atlas;
pub mod builder;
pub mod face;
pub mod greedy;
pub mod light;
pub mod scratch;

pub use atlas::{AtlasAddressing, TextureAtlas, TileArrayAtlas};
pub use builder::{BuildError, MeshBuilder};
pub use face::{FaceQuad, FaceSeed};
pub use scratch::ScratchBuffers;

use crate::render::vertex::MeshVertex;

/// One vertex stream with its index list.
#[derive(Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }
}

/// The three streams produced by one region build.
#[derive(Clone, Default)]
pub struct RegionMeshData {
    pub opaque: MeshData,
    pub cutout: MeshData,
    pub water: MeshData,
}

impl RegionMeshData {
    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty() && self.cutout.is_empty() && self.water.is_empty()
    }

    pub fn total_vertices(&self) -> usize {
        self.opaque.vertex_count() + self.cutout.vertex_count() + self.water.vertex_count()
    }
}
