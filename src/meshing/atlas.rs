//! Texture atlas interface.
//!
//! Atlas packing is owned by an external system; the builder only asks it
//! where a block face's texture lives and, crucially, whether the addressing
//! scheme can wrap a texture across a merged quad.

use crate::voxels::block::{block_info, BlockId};
use crate::voxels::face_dir::FaceDir;

/// How block-face textures are addressed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AtlasAddressing {
    /// Each tile is its own layer of a texture array, sampled with repeat
    /// addressing. UVs beyond 1.0 wrap within the tile, so a merged quad can
    /// tile its texture across its full extent.
    ArrayLayers,
    /// Tiles are packed into one 2D texture and addressed by sub-rectangle.
    /// UVs cannot leave the rectangle, so faces must stay one quad each:
    /// greedy merging is disabled under this addressing.
    PackedRects,
}

/// Where to find the texture for a block face.
pub trait TextureAtlas: Send + Sync {
    /// The addressing scheme of this atlas. Queried once at builder setup.
    fn addressing(&self) -> AtlasAddressing;

    /// Texture-array layer for a block face. Meaningful under `ArrayLayers`.
    fn layer(&self, block: BlockId, dir: FaceDir) -> u32;

    /// UV sub-rectangle `[u1, v1, u2, v2]` for a block face. Meaningful under
    /// `PackedRects`.
    fn uv_rect(&self, _block: BlockId, _dir: FaceDir) -> [f32; 4] {
        [0.0, 0.0, 1.0, 1.0]
    }
}

/// Atlas backed by the static block table: one array layer per tile.
#[derive(Default)]
pub struct TileArrayAtlas;

impl TextureAtlas for TileArrayAtlas {
    fn addressing(&self) -> AtlasAddressing {
        AtlasAddressing::ArrayLayers
    }

    fn layer(&self, block: BlockId, dir: FaceDir) -> u32 {
        block_info(block).map(|info| info.layer(dir)).unwrap_or(0)
    }
}
