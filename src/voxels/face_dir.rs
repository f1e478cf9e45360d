//! The six face directions of a voxel.

use cgmath::Vector3;

/// One face of an axis-aligned voxel cube.
///
/// The discriminants index per-face tables (texture layers, neighbor sets).
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum FaceDir {
    NegX = 0,
    PosX = 1,
    NegY = 2,
    PosY = 3,
    NegZ = 4,
    PosZ = 5,
}

impl FaceDir {
    /// All six directions, in discriminant order.
    pub fn all() -> [FaceDir; 6] {
        [
            FaceDir::NegX,
            FaceDir::PosX,
            FaceDir::NegY,
            FaceDir::PosY,
            FaceDir::NegZ,
            FaceDir::PosZ,
        ]
    }

    /// Unit step from a voxel to the neighbor this face looks at.
    pub fn offset(self) -> Vector3<i32> {
        match self {
            FaceDir::NegX => Vector3::new(-1, 0, 0),
            FaceDir::PosX => Vector3::new(1, 0, 0),
            FaceDir::NegY => Vector3::new(0, -1, 0),
            FaceDir::PosY => Vector3::new(0, 1, 0),
            FaceDir::NegZ => Vector3::new(0, 0, -1),
            FaceDir::PosZ => Vector3::new(0, 0, 1),
        }
    }

    /// Outward unit normal of the face.
    pub fn normal(self) -> Vector3<f32> {
        let o = self.offset();
        Vector3::new(o.x as f32, o.y as f32, o.z as f32)
    }

    /// True for the directions that step toward higher coordinates.
    pub fn is_positive(self) -> bool {
        matches!(self, FaceDir::PosX | FaceDir::PosY | FaceDir::PosZ)
    }
}
