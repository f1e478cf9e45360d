use std::marker::PhantomData;

use wgpu::{Device, Queue};

/// Capability token for the thread that owns GPU resources.
///
/// Exactly one `RenderContext` is created, on the thread that will render.
/// The `PhantomData<*const ()>` member makes the type `!Send` and `!Sync`, so
/// the token cannot move to a worker thread and neither can anything that
/// requires `&RenderContext` to run. Device-mesh creation and destruction both
/// take the token, which turns "workers never call into the graphics API" from
/// a convention into a compile-time guarantee.
pub struct RenderContext {
    device: Device,
    queue: Queue,
    _single_thread: PhantomData<*const ()>,
}

impl RenderContext {
    /// Wraps the device and queue handles. Call this once, on the thread that
    /// drives rendering; the resulting token cannot leave that thread.
    pub fn new(device: Device, queue: Queue) -> Self {
        Self {
            device,
            queue,
            _single_thread: PhantomData,
        }
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }
}
