//! # Block Module
//!
//! Compact block identifiers and the static property table the mesh builder
//! consults: render class (which vertex stream a block feeds, and whether it
//! occludes its neighbors), per-face texture layers, and biome tint.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use super::face_dir::FaceDir;

/// The integer type blocks are stored as in region memory.
pub type BlockId = u8;

/// How a block participates in rendering.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RenderClass {
    /// Emits nothing and occludes nothing (air).
    None,
    /// Fully opaque; occludes every neighboring face.
    Opaque,
    /// Alpha-tested geometry such as foliage; rendered, but occludes nothing.
    Cutout,
    /// Alpha-blended liquid; faces against other water are suppressed.
    Water,
}

/// Enumerates the block types known to the pipeline.
///
/// `FromPrimitive` allows conversion from the compact [`BlockId`]
/// representation stored in regions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
pub enum BlockKind {
    Air = 0,
    Stone = 1,
    Dirt = 2,
    Grass = 3,
    Sand = 4,
    Wood = 5,
    Leaves = 6,
    Water = 7,
    Lantern = 8,
}

impl BlockKind {
    /// Converts a stored id back into a `BlockKind`, if the id is known.
    pub fn from_id(id: BlockId) -> Option<Self> {
        FromPrimitive::from_u8(id)
    }

    pub fn id(self) -> BlockId {
        self as BlockId
    }
}

/// Static properties of one block type.
pub struct BlockInfo {
    pub class: RenderClass,
    /// Texture-array layer per face, indexed by `FaceDir` discriminant.
    pub layers: [u32; 6],
    /// Biome tint multiplier; `[1, 1, 1]` for untinted blocks.
    pub tint: [f32; 3],
}

impl BlockInfo {
    pub fn occludes(&self) -> bool {
        self.class == RenderClass::Opaque
    }

    pub fn layer(&self, dir: FaceDir) -> u32 {
        self.layers[dir as usize]
    }
}

const UNTINTED: [f32; 3] = [1.0, 1.0, 1.0];
const FOLIAGE_TINT: [f32; 3] = [0.53, 0.74, 0.35];

/// Layer assignments follow the face order [-X, +X, -Y, +Y, -Z, +Z].
static BLOCK_TABLE: phf::Map<u8, BlockInfo> = phf::phf_map! {
    0u8 => BlockInfo { class: RenderClass::None,   layers: [0, 0, 0, 0, 0, 0],       tint: UNTINTED },
    1u8 => BlockInfo { class: RenderClass::Opaque, layers: [1, 1, 1, 1, 1, 1],       tint: UNTINTED },
    2u8 => BlockInfo { class: RenderClass::Opaque, layers: [2, 2, 2, 2, 2, 2],       tint: UNTINTED },
    // Grass: dirt underneath, grass on top, grassy sides.
    3u8 => BlockInfo { class: RenderClass::Opaque, layers: [3, 3, 2, 4, 3, 3],       tint: FOLIAGE_TINT },
    4u8 => BlockInfo { class: RenderClass::Opaque, layers: [5, 5, 5, 5, 5, 5],       tint: UNTINTED },
    5u8 => BlockInfo { class: RenderClass::Opaque, layers: [6, 6, 7, 7, 6, 6],       tint: UNTINTED },
    6u8 => BlockInfo { class: RenderClass::Cutout, layers: [8, 8, 8, 8, 8, 8],       tint: FOLIAGE_TINT },
    7u8 => BlockInfo { class: RenderClass::Water,  layers: [9, 9, 9, 9, 9, 9],       tint: UNTINTED },
    8u8 => BlockInfo { class: RenderClass::Opaque, layers: [10, 10, 10, 10, 10, 10], tint: UNTINTED },
};

/// Looks up the static properties for a stored block id.
///
/// Returns `None` for ids outside the table, which the builder reports as a
/// corrupt-region error rather than meshing garbage.
pub fn block_info(id: BlockId) -> Option<&'static BlockInfo> {
    BLOCK_TABLE.get(&id)
}
