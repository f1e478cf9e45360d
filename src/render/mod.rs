//! # Render Module
//!
//! The draw side of the pipeline: the vertex format shared with the builder,
//! the three material passes (opaque, cutout, water), and the day/night
//! helper that produces the per-frame ambient-brightness scalar. Ambient
//! brightness reaches the GPU as a single uniform; vertex buffers never
//! change with the time of day.

pub mod day_night;
pub mod passes;
pub mod vertex;

pub use day_night::DayNightCycle;
pub use passes::{RenderPasses, DEPTH_FORMAT, MESH_SHADER};
pub use vertex::MeshVertex;
