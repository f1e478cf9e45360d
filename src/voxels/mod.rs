//! # Voxels Module
//!
//! Voxel data as the build pipeline sees it: compact block identifiers with a
//! static property table, fixed-size regions with dirty tracking, and the map
//! of loaded regions that workers read neighbor data from.

pub mod block;
pub mod face_dir;
pub mod region;
pub mod region_map;

pub use block::{block_info, BlockId, BlockInfo, BlockKind, RenderClass};
pub use face_dir::FaceDir;
pub use region::{RegionData, VoxelRegion, LIGHT_MAX, REGION_DIM, REGION_VOLUME};
pub use region_map::{NeighborSet, RegionMap};
