//! # Pipeline Module
//!
//! The concurrent machinery between "a region was edited" and "mesh data is
//! ready to upload": build tasks with their total order, the priority
//! scheduler with its queued/building marker sets, and the worker pool joined
//! to the rest of the system by exactly two bounded channels.

pub mod scheduler;
pub mod task;
pub mod worker;

pub use scheduler::{BuildScheduler, CameraView};
pub use task::{BuildOutcome, BuildTask, MeshDataResult};
pub use worker::WorkerPool;
