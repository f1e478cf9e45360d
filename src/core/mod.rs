//! # Core Module
//!
//! Fundamental ownership primitives used throughout the mesh pipeline:
//!
//! - `Shared`: thread-safe reference-counted resource with read-write locking,
//!   used for state that crosses the worker-thread boundary (the region map).
//! - `RenderContext`: the capability token owned by the render thread; every
//!   function that creates or destroys GPU resources takes a reference to it,
//!   so cross-thread misuse of the graphics device is a compile error.

pub mod render_context;
pub mod shared;

pub use render_context::RenderContext;
pub use shared::Shared;
