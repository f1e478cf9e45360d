//! Priority scheduling of region rebuilds.
//!
//! The scheduler owns the priority queue and the two marker sets that enforce
//! the pipeline's cardinality invariant: a region has at most one queued task
//! and at most one in-flight build at any time. The `queued` set covers the
//! window between enqueue and drain; the `building` set covers drain until the
//! device-mesh swap (or until a worker reports deferral/failure). The sets are
//! concurrent because workers and the device-mesh owner release markers from
//! their own sides.

use std::collections::BinaryHeap;
use std::sync::Arc;

use cgmath::{InnerSpace, Point3, Vector3};
use crossbeam_channel::{Sender, TrySendError};
use dashmap::DashSet;
use web_time::Instant;

use super::task::BuildTask;
use crate::config::PipelineConfig;
use crate::voxels::region::VoxelRegion;
use crate::voxels::region_map::RegionMap;

/// Camera state the scheduler prioritizes against.
#[derive(Copy, Clone, Debug)]
pub struct CameraView {
    pub position: Point3<f32>,
    pub forward: Vector3<f32>,
}

impl CameraView {
    pub fn new(position: Point3<f32>, forward: Vector3<f32>) -> Self {
        Self { position, forward }
    }
}

/// Decides which dirty regions get worker time, and in what order.
pub struct BuildScheduler {
    heap: BinaryHeap<BuildTask>,
    queued: Arc<DashSet<Point3<i32>>>,
    building: Arc<DashSet<Point3<i32>>>,
    next_seq: u64,
    capacity: usize,
    close_radius_sq: f32,
    urgency_dot: f32,
}

impl BuildScheduler {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            heap: BinaryHeap::new(),
            queued: Arc::new(DashSet::new()),
            building: Arc::new(DashSet::new()),
            next_seq: 0,
            capacity: config.scheduler_capacity,
            close_radius_sq: config.close_radius * config.close_radius,
            urgency_dot: config.urgency_dot,
        }
    }

    /// Handle to the in-flight marker set, shared with the worker pool and the
    /// device-mesh manager.
    pub fn building_set(&self) -> Arc<DashSet<Point3<i32>>> {
        self.building.clone()
    }

    /// Queues a rebuild for `region` unless one is already queued or in
    /// flight. Returns whether a task was added.
    pub fn enqueue(&mut self, region: &VoxelRegion, camera: &CameraView) -> bool {
        let position = region.position();
        if self.queued.contains(&position) || self.building.contains(&position) {
            return false;
        }

        let to_center = region.center() - camera.position;
        let distance_sq = to_center.magnitude2();
        let task = BuildTask {
            position,
            distance_sq,
            urgent: self.is_urgent(distance_sq, to_center, camera),
            queued_at: Instant::now(),
            seq: self.next_seq,
            deferrals: 0,
            revision: region.revision(),
        };
        self.next_seq += 1;
        self.queued.insert(position);
        self.heap.push(task);
        self.evict_overflow();
        true
    }

    /// Cheap view-direction test: a region is urgent when it lies within the
    /// close radius and roughly in front of the camera. Not a frustum test;
    /// the cost has to stay negligible per dirty region per pass.
    fn is_urgent(&self, distance_sq: f32, to_center: Vector3<f32>, camera: &CameraView) -> bool {
        if distance_sq > self.close_radius_sq {
            return false;
        }
        if distance_sq <= f32::EPSILON {
            // Camera is inside the region.
            return true;
        }
        let toward = to_center / distance_sq.sqrt();
        toward.dot(camera.forward.normalize()) >= self.urgency_dot
    }

    /// Re-evaluates distance and urgency of every queued task against the
    /// current camera, and drops tasks whose region was unloaded. Runs once
    /// per scheduling pass so a camera turn promotes already-queued regions.
    pub fn refresh(&mut self, camera: &CameraView, regions: &RegionMap) {
        if self.heap.is_empty() {
            return;
        }
        let entries = std::mem::take(&mut self.heap).into_vec();
        self.heap = entries
            .into_iter()
            .filter_map(|mut task| {
                let Some(region) = regions.get(task.position) else {
                    self.queued.remove(&task.position);
                    return None;
                };
                let to_center = region.center() - camera.position;
                task.distance_sq = to_center.magnitude2();
                task.urgent = self.is_urgent(task.distance_sq, to_center, camera);
                Some(task)
            })
            .collect();
    }

    /// Pops tasks in priority order and hands them to the worker channel.
    ///
    /// At most `max_normal` non-urgent builds are started; urgent builds are
    /// never throttled. Tasks whose region went clean (or away) since enqueue
    /// are dropped silently. Returns the number of builds started.
    pub fn drain(
        &mut self,
        max_normal: usize,
        tasks_tx: &Sender<BuildTask>,
        regions: &RegionMap,
    ) -> usize {
        let mut started = 0;
        let mut normal_started = 0;

        while let Some(mut task) = self.heap.pop() {
            if !task.urgent && normal_started >= max_normal {
                // Everything below the heap top is non-urgent too.
                self.heap.push(task);
                break;
            }

            let Some(region) = regions.get(task.position) else {
                self.queued.remove(&task.position);
                continue;
            };
            if !region.needs_rebuild() {
                self.queued.remove(&task.position);
                continue;
            }

            task.revision = region.revision();
            self.queued.remove(&task.position);
            self.building.insert(task.position);
            let urgent = task.urgent;

            match tasks_tx.try_send(task) {
                Ok(()) => {
                    started += 1;
                    if !urgent {
                        normal_started += 1;
                    }
                }
                Err(TrySendError::Full(task)) | Err(TrySendError::Disconnected(task)) => {
                    self.building.remove(&task.position);
                    self.queued.insert(task.position);
                    self.heap.push(task);
                    break;
                }
            }
        }

        started
    }

    /// Puts a deferred task back in the queue at reduced urgency: never
    /// urgent, distance penalized by its deferral count, and behind its tier
    /// in FIFO order. Dropped if the region vanished or got re-queued through
    /// another path meanwhile.
    pub fn requeue_deferred(&mut self, mut task: BuildTask, regions: &RegionMap) {
        if !regions.contains(task.position) {
            return;
        }
        if self.queued.contains(&task.position) || self.building.contains(&task.position) {
            return;
        }
        task.deferrals += 1;
        task.urgent = false;
        task.distance_sq *= 1.0 + task.deferrals as f32;
        task.seq = self.next_seq;
        self.next_seq += 1;
        self.queued.insert(task.position);
        self.heap.push(task);
        self.evict_overflow();
    }

    /// Drops the oldest, least-urgent queued entries once the queue exceeds
    /// its capacity, bounding memory during load bursts. Evicted regions stay
    /// dirty and get re-enqueued by a later pass.
    fn evict_overflow(&mut self) {
        if self.heap.len() <= self.capacity {
            return;
        }
        let mut entries = std::mem::take(&mut self.heap).into_vec();
        entries.sort_by(|a, b| a.urgent.cmp(&b.urgent).then_with(|| a.seq.cmp(&b.seq)));
        let excess = entries.len() - self.capacity;
        for task in entries.drain(..excess) {
            self.queued.remove(&task.position);
            log::warn!(
                "build queue over capacity, evicting region at {:?}",
                task.position
            );
        }
        self.heap = entries.into();
    }

    pub fn queued_count(&self) -> usize {
        self.queued.len()
    }

    pub fn building_count(&self) -> usize {
        self.building.len()
    }

    /// Queued plus in-flight builds, for debug overlays.
    pub fn pending(&self) -> usize {
        self.queued.len() + self.building.len()
    }
}
