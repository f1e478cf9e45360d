//! Device-mesh ownership and swapping.
//!
//! Runs once per frame on the render thread: drains whatever the workers have
//! finished, applies urgent results unconditionally and normal results up to
//! a budget, swaps each region's meshes as a unit, and only then destroys the
//! replaced buffers. The triage step ([`plan_uploads`]) is a pure function so
//! the budget and ordering rules are testable without a GPU.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use cgmath::Point3;
use crossbeam_channel::Receiver;
use dashmap::DashSet;

use super::mesh::RegionMeshes;
use crate::config::PipelineConfig;
use crate::core::RenderContext;
use crate::pipeline::scheduler::BuildScheduler;
use crate::pipeline::task::{BuildOutcome, MeshDataResult};
use crate::voxels::region_map::RegionMap;

/// Owner of every region's device meshes.
pub struct DeviceMeshManager {
    meshes: HashMap<Point3<i32>, RegionMeshes>,
    /// Normal results that exceeded a frame's upload budget, applied first on
    /// the next frame.
    deferred_uploads: VecDeque<MeshDataResult>,
    uploads_per_frame: usize,
    building: Arc<DashSet<Point3<i32>>>,
}

impl DeviceMeshManager {
    pub fn new(config: &PipelineConfig, building: Arc<DashSet<Point3<i32>>>) -> Self {
        Self {
            meshes: HashMap::new(),
            deferred_uploads: VecDeque::new(),
            uploads_per_frame: config.uploads_per_frame,
            building,
        }
    }

    /// Drains the result channel and applies as many results as the frame
    /// budget allows. Deferral outcomes are routed back to the scheduler.
    /// Returns the number of mesh swaps performed.
    pub fn drain_results(
        &mut self,
        ctx: &RenderContext,
        results: &Receiver<BuildOutcome>,
        regions: &RegionMap,
        scheduler: &mut BuildScheduler,
    ) -> usize {
        let mut batch: Vec<MeshDataResult> = self.deferred_uploads.drain(..).collect();
        for outcome in results.try_iter() {
            match outcome {
                BuildOutcome::Built(result) => batch.push(result),
                BuildOutcome::Deferred(task) => scheduler.requeue_deferred(task, regions),
            }
        }

        let (apply_now, carry) = plan_uploads(batch, self.uploads_per_frame);
        self.deferred_uploads = carry;

        let mut applied = 0;
        for result in apply_now {
            self.apply(ctx, result, regions);
            applied += 1;
        }
        applied
    }

    /// Swaps one region's meshes for a build result, or discards the result
    /// if the region was unloaded while the build was in flight.
    fn apply(&mut self, ctx: &RenderContext, result: MeshDataResult, regions: &RegionMap) {
        let position = result.position;

        let Some(region) = regions.get(position) else {
            log::debug!("discarding mesh for unloaded region {position:?}");
            self.building.remove(&position);
            return;
        };

        if result.data.is_empty() {
            // The region meshed to nothing (e.g. its last block was removed):
            // there is no replacement, just the old meshes to drop.
            if let Some(old) = self.meshes.remove(&position) {
                old.destroy(ctx);
            }
        } else {
            let fresh = RegionMeshes::create(ctx, position, region.center(), &result.data);
            // Install the replacement before destroying what it replaces, so
            // the region is never left without meshes mid-frame.
            let old = self.meshes.insert(position, fresh);
            if let Some(old) = old {
                old.destroy(ctx);
            }
        }

        if !region.clear_dirty_if_current(result.revision) {
            log::debug!("region {position:?} re-dirtied during its build; will rebuild");
        }
        self.building.remove(&position);
        log::trace!(
            "swapped meshes for {position:?} (built in {:?})",
            result.build_duration
        );
    }

    /// Destroys the meshes of an unloaded region.
    pub fn remove_region(&mut self, ctx: &RenderContext, position: Point3<i32>) {
        if let Some(meshes) = self.meshes.remove(&position) {
            meshes.destroy(ctx);
        }
    }

    pub fn get(&self, position: Point3<i32>) -> Option<&RegionMeshes> {
        self.meshes.get(&position)
    }

    /// All regions that currently have device meshes; the render passes
    /// iterate this.
    pub fn meshes(&self) -> impl Iterator<Item = &RegionMeshes> {
        self.meshes.values()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Results carried past this frame's upload budget.
    pub fn pending_upload_count(&self) -> usize {
        self.deferred_uploads.len()
    }
}

/// Splits a batch of results into "apply this frame" and "carry to the next".
///
/// Stable urgent-first sort: urgent results all apply this frame regardless of
/// the budget, normal results apply in arrival order until the budget is
/// spent.
pub(crate) fn plan_uploads(
    mut batch: Vec<MeshDataResult>,
    budget: usize,
) -> (Vec<MeshDataResult>, VecDeque<MeshDataResult>) {
    batch.sort_by_key(|result| !result.urgent);

    let mut apply_now = Vec::with_capacity(batch.len().min(budget));
    let mut carry = VecDeque::new();
    let mut normals = 0;

    for result in batch {
        if result.urgent {
            apply_now.push(result);
        } else if normals < budget {
            normals += 1;
            apply_now.push(result);
        } else {
            carry.push_back(result);
        }
    }

    (apply_now, carry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meshing::RegionMeshData;
    use web_time::Duration;

    fn result(x: i32, urgent: bool) -> MeshDataResult {
        MeshDataResult {
            position: Point3::new(x, 0, 0),
            revision: 0,
            urgent,
            build_duration: Duration::from_millis(1),
            data: RegionMeshData::default(),
        }
    }

    #[test]
    fn urgent_results_bypass_the_budget() {
        let batch = vec![
            result(0, false),
            result(1, true),
            result(2, false),
            result(3, true),
            result(4, false),
        ];
        let (now, carry) = plan_uploads(batch, 1);
        let applied: Vec<i32> = now.iter().map(|r| r.position.x).collect();
        // Both urgent results plus one normal within budget.
        assert_eq!(applied, vec![1, 3, 0]);
        let carried: Vec<i32> = carry.iter().map(|r| r.position.x).collect();
        assert_eq!(carried, vec![2, 4]);
    }

    #[test]
    fn arrival_order_is_preserved_within_tiers() {
        let batch = vec![result(10, false), result(11, false), result(12, false)];
        let (now, carry) = plan_uploads(batch, 8);
        let applied: Vec<i32> = now.iter().map(|r| r.position.x).collect();
        assert_eq!(applied, vec![10, 11, 12]);
        assert!(carry.is_empty());
    }

    #[test]
    fn zero_budget_still_applies_urgent() {
        let batch = vec![result(0, false), result(1, true)];
        let (now, carry) = plan_uploads(batch, 0);
        assert_eq!(now.len(), 1);
        assert!(now[0].urgent);
        assert_eq!(carry.len(), 1);
    }
}
