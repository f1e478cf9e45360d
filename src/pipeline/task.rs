//! Build tasks and their results.

use std::cmp::Ordering;

use cgmath::Point3;
use web_time::{Duration, Instant};

use crate::meshing::RegionMeshData;

/// A scheduled rebuild of one region.
///
/// Tasks are totally ordered for the priority queue: urgent before normal,
/// nearer before farther within a tier, and enqueue order (the monotonic
/// `seq`) breaking ties so equal-priority tasks drain FIFO.
#[derive(Debug, Clone)]
pub struct BuildTask {
    pub position: Point3<i32>,
    /// Squared distance from the region center to the camera at enqueue (or
    /// last refresh) time.
    pub distance_sq: f32,
    /// Urgent tasks are visible close-by regions; they skip every per-frame
    /// throttle in the pipeline.
    pub urgent: bool,
    pub queued_at: Instant,
    /// Monotonic enqueue counter, unique per scheduler.
    pub seq: u64,
    /// Times this build was pushed back because neighbors were missing.
    pub deferrals: u32,
    /// Region revision the build snapshot will be taken against.
    pub revision: u64,
}

impl PartialEq for BuildTask {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BuildTask {}

impl Ord for BuildTask {
    fn cmp(&self, other: &Self) -> Ordering {
        // Greater = drained first (BinaryHeap is a max-heap).
        self.urgent
            .cmp(&other.urgent)
            .then_with(|| other.distance_sq.total_cmp(&self.distance_sq))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for BuildTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Finished mesh data for one region, produced by exactly one worker and
/// consumed by the device-mesh owner. Ownership moves onto the result queue;
/// the worker keeps nothing.
pub struct MeshDataResult {
    pub position: Point3<i32>,
    /// Revision of the region data this mesh was built from.
    pub revision: u64,
    pub urgent: bool,
    /// Wall-clock time the build took on the worker.
    pub build_duration: Duration,
    pub data: RegionMeshData,
}

/// What a worker sends back for one task.
pub enum BuildOutcome {
    /// Mesh data ready for upload.
    Built(MeshDataResult),
    /// Neighbors were missing; the task should be requeued at reduced
    /// urgency. Routed through the result queue so only the consumer side
    /// ever touches the scheduler.
    Deferred(BuildTask),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    fn task(urgent: bool, distance_sq: f32, seq: u64) -> BuildTask {
        BuildTask {
            position: Point3::new(seq as i32, 0, 0),
            distance_sq,
            urgent,
            queued_at: Instant::now(),
            seq,
            deferrals: 0,
            revision: 0,
        }
    }

    #[test]
    fn urgent_outranks_distance() {
        let far_urgent = task(true, 1000.0, 0);
        let near_normal = task(false, 1.0, 1);
        assert!(far_urgent > near_normal);
    }

    #[test]
    fn nearer_outranks_farther_within_tier() {
        assert!(task(false, 4.0, 0) > task(false, 9.0, 1));
        assert!(task(true, 4.0, 1) > task(true, 9.0, 0));
    }

    #[test]
    fn equal_priority_drains_fifo() {
        let first = task(false, 25.0, 0);
        let second = task(false, 25.0, 1);
        assert!(first > second);
    }

    #[test]
    fn heap_pops_in_priority_order() {
        let mut heap = BinaryHeap::new();
        heap.push(task(false, 100.0, 0));
        heap.push(task(true, 400.0, 1));
        heap.push(task(false, 1.0, 2));
        heap.push(task(true, 4.0, 3));

        let order: Vec<u64> = std::iter::from_fn(|| heap.pop()).map(|t| t.seq).collect();
        assert_eq!(order, vec![3, 1, 2, 0]);
    }
}
