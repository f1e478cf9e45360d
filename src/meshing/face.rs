//! Face quads emitted by the builder.
//!
//! A [`FaceSeed`] is one unmerged voxel face in a planar slice; the greedy
//! pass combines runs of compatible seeds into a [`FaceQuad`] covering a
//! `w × h` rectangle of faces. With merging disabled every quad is 1×1.

use cgmath::Point3;

use crate::voxels::block::BlockId;
use crate::voxels::face_dir::FaceDir;

/// The mergeable identity of one voxel face.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FaceSeed {
    pub block: BlockId,
    /// Texture-array layer the face samples.
    pub layer: u32,
    /// Stored light of the cell the face looks into (0–15).
    pub light: u8,
    /// Biome tint of the block.
    pub tint: [f32; 3],
}

impl FaceSeed {
    /// Whether two faces may join one quad: same block, same texture, same
    /// tint, and stored light within the configured tolerance. One light value
    /// (the seed's) shades the whole quad, so the tolerance stays small.
    pub fn merges_with(&self, other: &FaceSeed, light_tolerance: u8) -> bool {
        self.block == other.block
            && self.layer == other.layer
            && self.tint == other.tint
            && self.light.abs_diff(other.light) <= light_tolerance
    }
}

/// A merged rectangle of faces in one planar slice.
///
/// `origin` is the region-local coordinate of the quad's minimum voxel. The
/// rectangle extends `w` faces along the slice's U axis and `h` along its V
/// axis; which world axes those are depends on `dir` (X faces: U = Z, V = Y;
/// Y faces: U = X, V = Z; Z faces: U = X, V = Y).
#[derive(Copy, Clone, Debug)]
pub struct FaceQuad {
    pub dir: FaceDir,
    pub origin: Point3<i32>,
    pub w: u32,
    pub h: u32,
    pub seed: FaceSeed,
}

impl FaceQuad {
    /// The four corners of the quad in world space, wound counter-clockwise
    /// as seen from outside (the direction the face normal points).
    pub fn corners(&self, region_origin: Point3<f32>) -> [[f32; 3]; 4] {
        let x = region_origin.x + self.origin.x as f32;
        let y = region_origin.y + self.origin.y as f32;
        let z = region_origin.z + self.origin.z as f32;
        let fw = self.w as f32;
        let fh = self.h as f32;

        match self.dir {
            FaceDir::NegX => [
                [x, y, z],
                [x, y, z + fw],
                [x, y + fh, z + fw],
                [x, y + fh, z],
            ],
            FaceDir::PosX => [
                [x + 1.0, y, z + fw],
                [x + 1.0, y, z],
                [x + 1.0, y + fh, z],
                [x + 1.0, y + fh, z + fw],
            ],
            FaceDir::NegY => [
                [x, y, z],
                [x + fw, y, z],
                [x + fw, y, z + fh],
                [x, y, z + fh],
            ],
            FaceDir::PosY => [
                [x, y + 1.0, z + fh],
                [x + fw, y + 1.0, z + fh],
                [x + fw, y + 1.0, z],
                [x, y + 1.0, z],
            ],
            FaceDir::NegZ => [
                [x + fw, y, z],
                [x, y, z],
                [x, y + fh, z],
                [x + fw, y + fh, z],
            ],
            FaceDir::PosZ => [
                [x, y, z + 1.0],
                [x + fw, y, z + 1.0],
                [x + fw, y + fh, z + 1.0],
                [x, y + fh, z + 1.0],
            ],
        }
    }

    /// Per-corner UVs in tile units, matching the corner order of
    /// [`FaceQuad::corners`]. A merged quad spans `0..w` × `0..h`, which tiles
    /// its texture under repeat addressing.
    pub fn uvs(&self) -> [[f32; 2]; 4] {
        let fw = self.w as f32;
        let fh = self.h as f32;
        match self.dir {
            FaceDir::PosX => [[fw, fh], [0.0, fh], [0.0, 0.0], [fw, 0.0]],
            FaceDir::NegY => [[0.0, 0.0], [fw, 0.0], [fw, fh], [0.0, fh]],
            FaceDir::NegX | FaceDir::PosY | FaceDir::NegZ | FaceDir::PosZ => {
                [[0.0, fh], [fw, fh], [fw, 0.0], [0.0, 0.0]]
            }
        }
    }
}
