//! The mesh-building worker pool.
//!
//! A fixed number of OS threads share one bounded task channel and one
//! bounded result channel; those two channels plus the building marker set
//! are the only state that crosses the thread boundary. Workers block only on
//! their task channel and exit when it disconnects.
//!
//! A worker never touches the graphics API, and a failing build never takes
//! the pool down: panics are caught per task, the building marker is
//! released, and the region is left dirty for a later retry.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;

use cgmath::Point3;
use crossbeam_channel::{bounded, Receiver, Sender};
use dashmap::DashSet;
use web_time::Instant;

use super::task::{BuildOutcome, BuildTask, MeshDataResult};
use crate::config::PipelineConfig;
use crate::core::Shared;
use crate::meshing::{BuildError, MeshBuilder, ScratchBuffers};
use crate::voxels::region_map::RegionMap;

/// Handle to the worker threads and the two hand-off channels.
pub struct WorkerPool {
    workers: Vec<JoinHandle<()>>,
    tasks_tx: Sender<BuildTask>,
    results_rx: Receiver<BuildOutcome>,
}

impl WorkerPool {
    /// Spawns the pool. Worker count comes from the configuration (hardware
    /// parallelism by default); each worker owns its scratch buffers for the
    /// lifetime of the pool.
    pub fn new(
        config: &PipelineConfig,
        builder: Arc<MeshBuilder>,
        regions: Shared<RegionMap>,
        building: Arc<DashSet<Point3<i32>>>,
    ) -> Self {
        let (tasks_tx, tasks_rx) = bounded::<BuildTask>(config.task_queue_capacity);
        let (results_tx, results_rx) = bounded::<BuildOutcome>(config.result_queue_capacity);

        let count = config.worker_count();
        log::info!("starting {count} mesh worker(s)");

        let mut workers = Vec::with_capacity(count);
        for index in 0..count {
            let tasks_rx = tasks_rx.clone();
            let results_tx = results_tx.clone();
            let builder = builder.clone();
            let regions = regions.clone();
            let building = building.clone();
            let defer_limit = config.defer_limit;

            let handle = std::thread::Builder::new()
                .name(format!("mesh-worker-{index}"))
                .spawn(move || {
                    worker_loop(tasks_rx, results_tx, builder, regions, building, defer_limit);
                })
                .expect("spawning mesh worker thread");
            workers.push(handle);
        }

        Self {
            workers,
            tasks_tx,
            results_rx,
        }
    }

    /// Sender side of the task channel, used by the scheduler's drain.
    pub fn task_sender(&self) -> &Sender<BuildTask> {
        &self.tasks_tx
    }

    /// Receiver side of the result channel, drained by the device-mesh owner.
    pub fn results(&self) -> &Receiver<BuildOutcome> {
        &self.results_rx
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Disconnects the task channel and joins every worker.
    pub fn shutdown(self) {
        let WorkerPool {
            workers, tasks_tx, ..
        } = self;
        drop(tasks_tx);
        for handle in workers {
            let _ = handle.join();
        }
    }
}

fn worker_loop(
    tasks_rx: Receiver<BuildTask>,
    results_tx: Sender<BuildOutcome>,
    builder: Arc<MeshBuilder>,
    regions: Shared<RegionMap>,
    building: Arc<DashSet<Point3<i32>>>,
    defer_limit: u32,
) {
    let mut scratch = ScratchBuffers::new();

    while let Ok(mut task) = tasks_rx.recv() {
        let position = task.position;

        // Snapshot the region and its neighbors under a short read lock; the
        // build itself runs against the copies.
        let snapshot = {
            let map = regions.read();
            map.get(position)
                .map(|region| (region.clone(), map.neighbors(position)))
        };
        let Some((region, neighbors)) = snapshot else {
            // Unloaded between drain and pickup.
            building.remove(&position);
            continue;
        };

        task.revision = region.revision();
        scratch.load_snapshots(&region, &neighbors);

        let force = task.deferrals >= defer_limit;
        if force && neighbors.missing_count() > 0 {
            log::warn!(
                "building {position:?} with {} neighbor(s) missing after {} deferral(s)",
                neighbors.missing_count(),
                task.deferrals
            );
        }

        let started = Instant::now();
        let built = catch_unwind(AssertUnwindSafe(|| {
            builder.build(position, &mut scratch, force)
        }));

        match built {
            Ok(Ok(data)) => {
                let result = MeshDataResult {
                    position,
                    revision: task.revision,
                    urgent: task.urgent,
                    build_duration: started.elapsed(),
                    data,
                };
                // The building marker stays set until the device-mesh owner
                // applies or discards the result.
                if results_tx.try_send(BuildOutcome::Built(result)).is_err() {
                    building.remove(&position);
                    log::warn!(
                        "result queue rejected mesh for {position:?}; region stays dirty"
                    );
                }
            }
            Ok(Err(BuildError::NeighborsNotReady { missing })) => {
                building.remove(&position);
                log::debug!("deferring {position:?}: {missing} neighbor(s) not loaded");
                let _ = results_tx.try_send(BuildOutcome::Deferred(task));
            }
            Ok(Err(err)) => {
                building.remove(&position);
                log::error!("mesh build failed for {position:?}: {err}");
            }
            Err(_) => {
                building.remove(&position);
                log::error!("mesh build panicked for {position:?}; region left dirty for retry");
            }
        }
    }
}
