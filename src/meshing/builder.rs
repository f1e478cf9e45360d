//! The mesh data builder.
//!
//! Runs on worker threads against immutable region snapshots. One build walks
//! all six face directions slice by slice, culls faces against neighboring
//! voxels (including across region borders), optionally greedy-merges each
//! slice, and bakes stored light into vertex color. The result is pure CPU
//! data; uploading it is the device layer's job.

use std::sync::Arc;

use cgmath::Point3;
use thiserror::Error;

use super::atlas::{AtlasAddressing, TextureAtlas};
use super::face::{FaceQuad, FaceSeed};
use super::greedy::{merge_slice, EMPTY_SLICE, SLICE_DIM};
use super::light::baked_color;
use super::scratch::{ScratchBuffers, StreamScratch};
use super::RegionMeshData;
use crate::config::PipelineConfig;
use crate::voxels::block::{block_info, BlockId, BlockKind, RenderClass};
use crate::voxels::face_dir::FaceDir;
use crate::voxels::region::{RegionData, LIGHT_MAX, REGION_DIM};

/// Why a build could not produce mesh data.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Required neighbor regions are not loaded yet. The task is requeued at
    /// reduced urgency until the defer limit forces the build through.
    #[error("{missing} neighbor region(s) not loaded")]
    NeighborsNotReady { missing: usize },
    /// The region snapshot contains a block id outside the block table.
    #[error("unknown block id {id} at ({x}, {y}, {z})")]
    CorruptRegion { id: BlockId, x: i32, y: i32, z: i32 },
}

/// Converts region snapshots into vertex streams.
///
/// One builder is shared by all workers; it is immutable after construction.
/// Whether greedy merging actually runs is resolved here, once, from the
/// configuration switch and the atlas addressing capability: a packed-rect
/// atlas cannot wrap a texture across a merged quad, so merging silently
/// falling back to per-face quads is the correct (documented) behavior, not a
/// degradation to detect at draw time.
pub struct MeshBuilder {
    atlas: Arc<dyn TextureAtlas>,
    greedy: bool,
    packed_uvs: bool,
    light_floor: f32,
    light_tolerance: u8,
}

impl MeshBuilder {
    pub fn new(atlas: Arc<dyn TextureAtlas>, config: &PipelineConfig) -> Self {
        let wrap_capable = atlas.addressing() == AtlasAddressing::ArrayLayers;
        if config.greedy_merging && !wrap_capable {
            log::warn!(
                "greedy merging requested but the atlas cannot wrap per tile; \
                 using one quad per face"
            );
        }
        Self {
            greedy: config.greedy_merging && wrap_capable,
            packed_uvs: !wrap_capable,
            light_floor: config.light_floor,
            light_tolerance: config.light_merge_tolerance,
            atlas,
        }
    }

    /// Whether faces will be merged. False when disabled by configuration or
    /// unsupported by the atlas.
    pub fn greedy_enabled(&self) -> bool {
        self.greedy
    }

    /// Builds the three vertex streams for the region snapshotted into
    /// `scratch`.
    ///
    /// With `force` unset, missing neighbor snapshots abort the build with
    /// [`BuildError::NeighborsNotReady`] so the scheduler can retry later.
    /// With `force` set (the deadlock-avoidance path after repeated
    /// deferrals), missing neighbors are treated as fully lit air and the
    /// build proceeds on best-available data.
    pub fn build(
        &self,
        position: Point3<i32>,
        scratch: &mut ScratchBuffers,
        force: bool,
    ) -> Result<RegionMeshData, BuildError> {
        let missing = scratch.neighbors.iter().filter(|n| n.is_none()).count();
        if missing > 0 && !force {
            return Err(BuildError::NeighborsNotReady { missing });
        }

        scratch.clear();
        let region_origin = Point3::new(
            (position.x * REGION_DIM) as f32,
            (position.y * REGION_DIM) as f32,
            (position.z * REGION_DIM) as f32,
        );

        let ScratchBuffers {
            opaque,
            cutout,
            water,
            center,
            neighbors,
            mask,
        } = scratch;

        for dir in FaceDir::all() {
            for s in 0..REGION_DIM {
                *mask = EMPTY_SLICE;
                let mut occupied = false;

                for v in 0..SLICE_DIM {
                    for u in 0..SLICE_DIM {
                        let (x, y, z) = slice_cell(dir, s, u as i32, v as i32);
                        let id = center.block_at(x, y, z);
                        let info =
                            block_info(id).ok_or(BuildError::CorruptRegion { id, x, y, z })?;
                        if info.class == RenderClass::None {
                            continue;
                        }

                        let offset = dir.offset();
                        let (nid, nlight, neighbor_occludes) =
                            sample(center, neighbors, dir, x + offset.x, y + offset.y, z + offset.z);
                        let visible = match info.class {
                            // Water never faces water, so the interior of a
                            // connected volume stays unmeshed.
                            RenderClass::Water => {
                                nid != BlockKind::Water.id() && !neighbor_occludes
                            }
                            _ => !neighbor_occludes,
                        };
                        if !visible {
                            continue;
                        }

                        mask[v * SLICE_DIM + u] = Some(FaceSeed {
                            block: id,
                            layer: self.atlas.layer(id, dir),
                            light: nlight,
                            tint: info.tint,
                        });
                        occupied = true;
                    }
                }

                if !occupied {
                    continue;
                }

                let mut emit = |u: usize, v: usize, w: usize, h: usize, seed: FaceSeed| {
                    let (x, y, z) = slice_cell(dir, s, u as i32, v as i32);
                    let quad = FaceQuad {
                        dir,
                        origin: Point3::new(x, y, z),
                        w: w as u32,
                        h: h as u32,
                        seed,
                    };
                    let stream = match block_info(seed.block).map(|i| i.class) {
                        Some(RenderClass::Water) => &mut *water,
                        Some(RenderClass::Cutout) => &mut *cutout,
                        _ => &mut *opaque,
                    };
                    self.emit_quad(stream, &quad, region_origin);
                };

                if self.greedy {
                    merge_slice(mask, self.light_tolerance, &mut emit);
                } else {
                    for v in 0..SLICE_DIM {
                        for u in 0..SLICE_DIM {
                            if let Some(seed) = mask[v * SLICE_DIM + u] {
                                emit(u, v, 1, 1, seed);
                            }
                        }
                    }
                }
            }
        }

        Ok(RegionMeshData {
            opaque: opaque.to_mesh_data(),
            cutout: cutout.to_mesh_data(),
            water: water.to_mesh_data(),
        })
    }

    fn emit_quad(&self, stream: &mut StreamScratch, quad: &FaceQuad, region_origin: Point3<f32>) {
        let mut uvs = quad.uvs();
        if self.packed_uvs {
            // Quads are 1x1 here, so the tile-unit UVs are 0 or 1 and map
            // directly onto the atlas sub-rectangle.
            let rect = self.atlas.uv_rect(quad.seed.block, quad.dir);
            for uv in &mut uvs {
                uv[0] = rect[0] + uv[0] * (rect[2] - rect[0]);
                uv[1] = rect[1] + uv[1] * (rect[3] - rect[1]);
            }
        }
        let color = baked_color(quad.dir, quad.seed.light, self.light_floor, quad.seed.tint);
        stream.push_quad(quad.corners(region_origin), uvs, quad.seed.layer, color);
    }
}

/// Maps slice coordinates to a voxel: X faces sweep (U, V) = (Z, Y), Y faces
/// (X, Z), Z faces (X, Y).
fn slice_cell(dir: FaceDir, s: i32, u: i32, v: i32) -> (i32, i32, i32) {
    match dir {
        FaceDir::NegX | FaceDir::PosX => (s, v, u),
        FaceDir::NegY | FaceDir::PosY => (u, s, v),
        FaceDir::NegZ | FaceDir::PosZ => (u, v, s),
    }
}

/// Reads the block, light, and occlusion bit at a coordinate that may be one
/// step outside the center region. Occlusion comes from the snapshot's
/// occupancy mask, not a block-table lookup. Out-of-range coordinates resolve
/// through the neighbor the face direction points at; an unloaded neighbor
/// reads as fully lit air (only reachable on forced builds).
fn sample(
    center: &RegionData,
    neighbors: &[Option<RegionData>; 6],
    dir: FaceDir,
    x: i32,
    y: i32,
    z: i32,
) -> (BlockId, u8, bool) {
    let in_range = |c: i32| (0..REGION_DIM).contains(&c);
    if in_range(x) && in_range(y) && in_range(z) {
        return (
            center.block_at(x, y, z),
            center.light_at(x, y, z),
            center.is_occluding(x, y, z),
        );
    }
    let (wx, wy, wz) = (
        x.rem_euclid(REGION_DIM),
        y.rem_euclid(REGION_DIM),
        z.rem_euclid(REGION_DIM),
    );
    match &neighbors[dir as usize] {
        Some(data) => (
            data.block_at(wx, wy, wz),
            data.light_at(wx, wy, wz),
            data.is_occluding(wx, wy, wz),
        ),
        None => (BlockKind::Air.id(), LIGHT_MAX, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meshing::atlas::TileArrayAtlas;
    use crate::meshing::light::{face_shade, light_curve};
    use crate::voxels::region::VoxelRegion;
    use crate::voxels::region_map::RegionMap;
    use std::sync::Arc as StdArc;

    fn builder(greedy: bool) -> MeshBuilder {
        let config = PipelineConfig {
            greedy_merging: greedy,
            ..PipelineConfig::default()
        };
        MeshBuilder::new(StdArc::new(TileArrayAtlas), &config)
    }

    fn scratch_for(map: &RegionMap, position: Point3<i32>) -> ScratchBuffers {
        let mut scratch = ScratchBuffers::new();
        let region = map.get(position).expect("region loaded");
        scratch.load_snapshots(region, &map.neighbors(position));
        scratch
    }

    fn lone_region(region: VoxelRegion) -> (RegionMap, Point3<i32>) {
        let position = region.position();
        let mut map = RegionMap::new();
        map.insert(StdArc::new(region));
        (map, position)
    }

    #[test]
    fn fully_occluded_interior_emits_nothing() {
        let origin = Point3::new(0, 0, 0);
        let mut map = RegionMap::new();
        map.insert(StdArc::new(VoxelRegion::filled(origin, BlockKind::Stone.id())));
        for dir in FaceDir::all() {
            let offset = dir.offset();
            map.insert(StdArc::new(VoxelRegion::filled(
                Point3::new(offset.x, offset.y, offset.z),
                BlockKind::Stone.id(),
            )));
        }

        let mut scratch = scratch_for(&map, origin);
        let data = builder(true)
            .build(origin, &mut scratch, false)
            .expect("all neighbors loaded");
        assert!(data.is_empty());
    }

    #[test]
    fn shared_face_between_adjacent_voxels_is_culled() {
        let (map, position) = lone_region(VoxelRegion::from_fn(Point3::new(0, 0, 0), |x, y, z| {
            if y == 0 && z == 0 && (x == 0 || x == 1) {
                BlockKind::Stone.id()
            } else {
                BlockKind::Air.id()
            }
        }));

        let mut scratch = scratch_for(&map, position);
        let data = builder(false)
            .build(position, &mut scratch, true)
            .expect("forced build");
        // Two cubes share one interior face pair: 12 - 2 = 10 quads.
        assert_eq!(data.opaque.vertex_count(), 10 * 4);
        assert_eq!(data.opaque.index_count(), 10 * 6);
        assert!(data.cutout.is_empty());
        assert!(data.water.is_empty());
    }

    #[test]
    fn isolated_voxel_emits_six_faces_with_curved_light() {
        let region = VoxelRegion::from_fn(Point3::new(0, 0, 0), |x, y, z| {
            if (x, y, z) == (8, 8, 8) {
                BlockKind::Stone.id()
            } else {
                BlockKind::Air.id()
            }
        });
        // The light that shades a face is the light of the cell it looks into.
        let level = 10;
        for dir in FaceDir::all() {
            let o = dir.offset();
            region.set_light(8 + o.x, 8 + o.y, 8 + o.z, level);
        }
        let (map, position) = lone_region(region);

        let mut scratch = scratch_for(&map, position);
        let data = builder(false)
            .build(position, &mut scratch, true)
            .expect("forced build");
        assert_eq!(data.opaque.vertex_count(), 6 * 4);

        let floor = PipelineConfig::default().light_floor;
        let curve = light_curve(level, floor);
        let max = data
            .opaque
            .vertices
            .iter()
            .map(|v| v.color[0])
            .fold(f32::MIN, f32::max);
        let min = data
            .opaque
            .vertices
            .iter()
            .map(|v| v.color[0])
            .fold(f32::MAX, f32::min);
        assert!((max - face_shade(FaceDir::PosY) * curve).abs() < 1e-6);
        assert!((min - face_shade(FaceDir::NegY) * curve).abs() < 1e-6);
    }

    #[test]
    fn water_does_not_mesh_against_water() {
        let (map, position) = lone_region(VoxelRegion::from_fn(Point3::new(0, 0, 0), |x, y, z| {
            if y == 4 && z == 4 && (x == 4 || x == 5) {
                BlockKind::Water.id()
            } else {
                BlockKind::Air.id()
            }
        }));

        let mut scratch = scratch_for(&map, position);
        let data = builder(false)
            .build(position, &mut scratch, true)
            .expect("forced build");
        assert!(data.opaque.is_empty());
        assert_eq!(data.water.vertex_count(), 10 * 4);
    }

    #[test]
    fn cutout_neighbors_do_not_occlude() {
        let (map, position) = lone_region(VoxelRegion::from_fn(Point3::new(0, 0, 0), |x, y, z| {
            match (x, y, z) {
                (4, 4, 4) => BlockKind::Stone.id(),
                (5, 4, 4) => BlockKind::Leaves.id(),
                _ => BlockKind::Air.id(),
            }
        }));

        let mut scratch = scratch_for(&map, position);
        let data = builder(false)
            .build(position, &mut scratch, true)
            .expect("forced build");
        // The stone keeps all six faces; the leaf block loses only the face
        // the stone occludes.
        assert_eq!(data.opaque.vertex_count(), 6 * 4);
        assert_eq!(data.cutout.vertex_count(), 5 * 4);
    }

    #[test]
    fn missing_neighbors_defer_unless_forced() {
        let (map, position) = lone_region(VoxelRegion::filled(
            Point3::new(0, 0, 0),
            BlockKind::Stone.id(),
        ));

        let mut scratch = scratch_for(&map, position);
        let b = builder(true);
        match b.build(position, &mut scratch, false) {
            Err(BuildError::NeighborsNotReady { missing }) => assert_eq!(missing, 6),
            other => panic!("expected deferral, got {:?}", other.map(|d| d.total_vertices())),
        }

        // Forced: missing neighbors read as air, each boundary merges to one
        // full-size quad.
        let data = b.build(position, &mut scratch, true).expect("forced build");
        assert_eq!(data.opaque.vertex_count(), 6 * 4);
    }

    #[test]
    fn flat_slab_merges_to_six_quads() {
        let (map, position) = lone_region(VoxelRegion::from_fn(
            Point3::new(0, 0, 0),
            |_, y, _| {
                if y == 0 {
                    BlockKind::Stone.id()
                } else {
                    BlockKind::Air.id()
                }
            },
        ));

        let mut scratch = scratch_for(&map, position);
        let data = builder(true)
            .build(position, &mut scratch, true)
            .expect("forced build");
        assert_eq!(data.opaque.vertex_count(), 6 * 4);
        assert_eq!(data.opaque.index_count(), 6 * 6);
    }

    #[test]
    fn merged_output_never_exceeds_naive_output() {
        fastrand::seed(7);
        let (map, position) = lone_region(VoxelRegion::from_fn(
            Point3::new(0, 0, 0),
            |_, _, _| {
                if fastrand::f32() < 0.4 {
                    BlockKind::Dirt.id()
                } else {
                    BlockKind::Air.id()
                }
            },
        ));

        let mut scratch = scratch_for(&map, position);
        let merged = builder(true)
            .build(position, &mut scratch, true)
            .expect("forced build");
        let naive = builder(false)
            .build(position, &mut scratch, true)
            .expect("forced build");
        assert!(merged.opaque.vertex_count() <= naive.opaque.vertex_count());
        assert!(merged.opaque.vertex_count() > 0);
    }

    #[test]
    fn identical_input_builds_byte_identical_output() {
        fastrand::seed(99);
        let (map, position) = lone_region(VoxelRegion::from_fn(
            Point3::new(1, -2, 3),
            |_, _, _| fastrand::u8(0..4),
        ));

        let b = builder(true);
        let mut scratch_a = scratch_for(&map, position);
        let mut scratch_b = scratch_for(&map, position);
        let first = b.build(position, &mut scratch_a, true).expect("build");
        let second = b.build(position, &mut scratch_b, true).expect("build");

        let bytes = |d: &crate::meshing::MeshData| -> Vec<u8> {
            bytemuck::cast_slice(&d.vertices).to_vec()
        };
        assert_eq!(bytes(&first.opaque), bytes(&second.opaque));
        assert_eq!(first.opaque.indices, second.opaque.indices);
        assert_eq!(bytes(&first.water), bytes(&second.water));
    }

    #[test]
    fn unknown_block_id_is_a_build_error() {
        let (map, position) = lone_region(VoxelRegion::from_fn(
            Point3::new(0, 0, 0),
            |x, y, z| if (x, y, z) == (3, 3, 3) { 200 } else { 0 },
        ));

        let mut scratch = scratch_for(&map, position);
        match builder(true).build(position, &mut scratch, true) {
            Err(BuildError::CorruptRegion { id: 200, x: 3, y: 3, z: 3 }) => {}
            other => panic!("expected corrupt-region error, got {:?}", other.err()),
        }
    }
}
