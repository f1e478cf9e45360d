//! # chunkmesh
//!
//! A concurrent chunk-mesh build pipeline for voxel renderers: priority
//! scheduling of dirty regions, off-thread geometry generation with greedy
//! face merging and baked per-vertex light, and thread-safe hand-off to the
//! single thread that owns GPU resources.
//!
//! ## Architecture
//!
//! ```text
//! edits ──▶ dirty flags ──▶ BuildScheduler ──tasks──▶ WorkerPool
//!                                ▲                        │
//!                                └──── deferrals ──results┘
//!                                                         ▼
//!                  RenderPasses ◀── DeviceMeshManager (render thread)
//! ```
//!
//! - [`pipeline::BuildScheduler`] decides which dirty regions get worker time
//!   and in what order; urgent regions (visible and close) skip every
//!   per-frame throttle.
//! - [`pipeline::WorkerPool`] turns region snapshots into vertex streams on a
//!   fixed pool of threads. Two bounded channels and two concurrent marker
//!   sets are the entire synchronization surface.
//! - [`device::DeviceMeshManager`] runs on the render thread, the only place
//!   GPU buffers are created or destroyed (enforced by the `!Send`
//!   [`core::RenderContext`] token), and swaps each region's meshes as a unit.
//! - [`render::RenderPasses`] draws opaque, cutout, and water geometry and
//!   applies the ambient-brightness scalar as a per-frame uniform. A day/night
//!   tick therefore costs one uniform write and zero rebuilds.
//!
//! ## Frame driver
//!
//! The embedding application owns the window, the camera, and the frame loop.
//! Each simulation tick it calls [`MeshPipeline::set_ambient_brightness`];
//! each frame it calls [`MeshPipeline::schedule`] with the current camera,
//! [`MeshPipeline::pump`] with the render-thread token, then records the
//! three passes through [`render::RenderPasses`].

pub mod config;
pub mod core;
pub mod device;
pub mod meshing;
pub mod pipeline;
pub mod render;
pub mod voxels;

use std::sync::Arc;

use cgmath::Point3;

use crate::config::PipelineConfig;
use crate::core::{RenderContext, Shared};
use crate::device::DeviceMeshManager;
use crate::meshing::{MeshBuilder, TextureAtlas};
use crate::pipeline::{BuildScheduler, CameraView, WorkerPool};
use crate::voxels::{RegionMap, VoxelRegion};

/// The assembled build pipeline.
///
/// Owns the scheduler, the worker pool, and the device-mesh manager, and
/// exposes the narrow interface the surrounding engine drives: dirty marking,
/// per-frame scheduling, result pumping, and the ambient scalar.
pub struct MeshPipeline {
    config: PipelineConfig,
    regions: Shared<RegionMap>,
    scheduler: BuildScheduler,
    workers: WorkerPool,
    device_meshes: DeviceMeshManager,
    ambient: f32,
}

impl MeshPipeline {
    /// Builds the pipeline and starts its workers.
    pub fn new(config: PipelineConfig, atlas: Arc<dyn TextureAtlas>) -> Self {
        let regions = Shared::new(RegionMap::new());
        let scheduler = BuildScheduler::new(&config);
        let builder = Arc::new(MeshBuilder::new(atlas, &config));
        let workers = WorkerPool::new(
            &config,
            builder,
            regions.clone(),
            scheduler.building_set(),
        );
        let device_meshes = DeviceMeshManager::new(&config, scheduler.building_set());
        Self {
            config,
            regions,
            scheduler,
            workers,
            device_meshes,
            ambient: 1.0,
        }
    }

    /// Hands a region to the pipeline. New regions are geometry-dirty, so the
    /// next scheduling pass picks them up.
    pub fn load_region(&self, region: VoxelRegion) -> Arc<VoxelRegion> {
        let region = Arc::new(region);
        self.regions.write().insert(region.clone());
        region
    }

    /// Drops a region and destroys its device meshes. A build still in flight
    /// for it is discarded when its result is drained.
    pub fn unload_region(&mut self, ctx: &RenderContext, position: Point3<i32>) {
        self.regions.write().remove(position);
        self.device_meshes.remove_region(ctx, position);
    }

    /// The loaded-region table, for the world systems that feed the pipeline.
    pub fn regions(&self) -> &Shared<RegionMap> {
        &self.regions
    }

    /// Called by the world system after a block add/remove.
    pub fn mark_geometry_dirty(&self, position: Point3<i32>) {
        if let Some(region) = self.regions.read().get(position) {
            region.mark_geometry_dirty();
        }
    }

    /// Called by the lighting system after a stored-light change. Takes the
    /// full rebuild path; baked vertex light cannot be patched in place.
    pub fn mark_lighting_dirty(&self, position: Point3<i32>) {
        if let Some(region) = self.regions.read().get(position) {
            region.mark_lighting_dirty();
        }
    }

    /// Called once per simulation tick by the day/night system. Changes
    /// nothing but a uniform at render time: no tasks, no vertex data.
    pub fn set_ambient_brightness(&mut self, ambient: f32) {
        self.ambient = ambient.clamp(0.0, 1.0);
    }

    pub fn ambient_brightness(&self) -> f32 {
        self.ambient
    }

    /// One scheduling pass: refresh queued priorities against the camera,
    /// enqueue every dirty region, and hand tasks to the workers within the
    /// per-pass budget (urgent tasks excepted). Returns builds started.
    pub fn schedule(&mut self, camera: &CameraView) -> usize {
        let map = self.regions.read();
        self.scheduler.refresh(camera, &map);
        for region in map.iter() {
            if region.needs_rebuild() {
                self.scheduler.enqueue(region, camera);
            }
        }
        self.scheduler
            .drain(self.config.max_builds_per_pass, self.workers.task_sender(), &map)
    }

    /// Once per frame on the render thread: drain finished builds and swap
    /// device meshes within the upload budget. Returns swaps performed.
    pub fn pump(&mut self, ctx: &RenderContext) -> usize {
        let map = self.regions.read();
        self.device_meshes
            .drain_results(ctx, self.workers.results(), &map, &mut self.scheduler)
    }

    /// Region meshes for the render passes to draw.
    pub fn device_meshes(&self) -> &DeviceMeshManager {
        &self.device_meshes
    }

    /// Queued tasks, in-flight builds, and results awaiting upload; the debug
    /// overlay hook.
    pub fn pending_build_count(&self) -> usize {
        self.scheduler.pending() + self.device_meshes.pending_upload_count()
    }

    /// Stops the workers and waits for them to exit.
    pub fn shutdown(self) {
        self.workers.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meshing::TileArrayAtlas;
    use crate::voxels::block::BlockKind;
    use cgmath::Vector3;

    fn pipeline() -> MeshPipeline {
        let config = PipelineConfig {
            workers: 1,
            ..PipelineConfig::default()
        };
        MeshPipeline::new(config, Arc::new(TileArrayAtlas))
    }

    fn camera() -> CameraView {
        CameraView::new(Point3::new(0.0, 0.0, 0.0), Vector3::unit_z())
    }

    #[test]
    fn ambient_changes_schedule_no_builds() {
        let mut pipeline = pipeline();
        let region = pipeline.load_region(VoxelRegion::filled(
            Point3::new(0, 0, 0),
            BlockKind::Stone.id(),
        ));
        // Pretend the first build already happened.
        region.clear_dirty_if_current(region.revision());

        pipeline.set_ambient_brightness(0.3);
        pipeline.set_ambient_brightness(0.9);
        assert_eq!(pipeline.schedule(&camera()), 0);
        assert_eq!(pipeline.pending_build_count(), 0);
        pipeline.shutdown();
    }

    #[test]
    fn dirty_regions_get_scheduled_once() {
        let mut pipeline = pipeline();
        // Load the center and all six face neighbors so the build completes
        // instead of deferring, then mark everything clean.
        let center = pipeline.load_region(VoxelRegion::filled(
            Point3::new(0, 0, 0),
            BlockKind::Stone.id(),
        ));
        center.clear_dirty_if_current(center.revision());
        for dir in crate::voxels::FaceDir::all() {
            let offset = dir.offset();
            let neighbor = pipeline.load_region(VoxelRegion::new(Point3::new(
                offset.x, offset.y, offset.z,
            )));
            neighbor.clear_dirty_if_current(neighbor.revision());
        }

        pipeline.mark_geometry_dirty(Point3::new(0, 0, 0));
        assert_eq!(pipeline.schedule(&camera()), 1);
        // Queued or building either way: the second pass must not
        // double-schedule the same region.
        assert_eq!(pipeline.schedule(&camera()), 0);
        pipeline.shutdown();
    }

    #[test]
    fn ambient_brightness_clamps() {
        let mut pipeline = pipeline();
        pipeline.set_ambient_brightness(7.0);
        assert_eq!(pipeline.ambient_brightness(), 1.0);
        pipeline.set_ambient_brightness(-1.0);
        assert_eq!(pipeline.ambient_brightness(), 0.0);
        pipeline.shutdown();
    }
}
