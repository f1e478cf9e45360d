//! Static light baking.
//!
//! Vertex color is fixed at build time from two inputs only: the stored light
//! level of the cell a face looks into, and the face direction. Time-of-day
//! never appears here; it is applied as a uniform at render time, so the
//! day/night cycle can run without re-tessellating anything.

use crate::voxels::face_dir::FaceDir;
use crate::voxels::region::LIGHT_MAX;

/// Maps a stored light level (0–15) to a brightness factor.
///
/// Quadratic, so low light levels fall off faster than a linear ramp, and
/// monotonic from `floor` at level 0 up to 1.0 at level 15.
pub fn light_curve(level: u8, floor: f32) -> f32 {
    let t = level.min(LIGHT_MAX) as f32 / LIGHT_MAX as f32;
    floor + (1.0 - floor) * t * t
}

/// Fixed directional shading factor, darkening down- and side-facing faces so
/// unlit geometry still reads as three-dimensional.
pub fn face_shade(dir: FaceDir) -> f32 {
    match dir {
        FaceDir::PosY => 1.0,
        FaceDir::NegY => 0.5,
        FaceDir::NegX | FaceDir::PosX => 0.8,
        FaceDir::NegZ | FaceDir::PosZ => 0.65,
    }
}

/// The baked vertex color for a face: directional shade × light curve × tint.
pub fn baked_color(dir: FaceDir, level: u8, floor: f32, tint: [f32; 3]) -> [f32; 3] {
    let brightness = face_shade(dir) * light_curve(level, floor);
    [
        brightness * tint[0],
        brightness * tint[1],
        brightness * tint[2],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLOOR: f32 = 0.12;

    #[test]
    fn curve_spans_floor_to_one() {
        assert!((light_curve(0, FLOOR) - FLOOR).abs() < 1e-6);
        assert!((light_curve(LIGHT_MAX, FLOOR) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn curve_is_monotonic() {
        for level in 0..LIGHT_MAX {
            assert!(light_curve(level, FLOOR) < light_curve(level + 1, FLOOR));
        }
    }

    #[test]
    fn out_of_range_level_clamps() {
        assert_eq!(light_curve(40, FLOOR), light_curve(LIGHT_MAX, FLOOR));
    }

    #[test]
    fn top_faces_are_brightest() {
        for dir in FaceDir::all() {
            assert!(face_shade(dir) <= face_shade(FaceDir::PosY));
            assert!(face_shade(dir) >= face_shade(FaceDir::NegY));
        }
    }

    #[test]
    fn tint_scales_channels_independently() {
        let color = baked_color(FaceDir::PosY, LIGHT_MAX, FLOOR, [0.5, 1.0, 0.25]);
        assert!((color[0] - 0.5).abs() < 1e-6);
        assert!((color[1] - 1.0).abs() < 1e-6);
        assert!((color[2] - 0.25).abs() < 1e-6);
    }
}
