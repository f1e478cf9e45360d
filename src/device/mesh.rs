//! GPU-resident meshes.

use cgmath::Point3;
use wgpu::util::{BufferInitDescriptor, DeviceExt};

use crate::core::RenderContext;
use crate::meshing::{MeshData, RegionMeshData};

/// One uploaded vertex stream: a vertex buffer, an index buffer, and the draw
/// count. Owned exclusively by the render thread.
pub struct DeviceMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl DeviceMesh {
    /// Uploads one stream. Callers skip empty streams; an empty buffer is a
    /// waste of a buffer.
    pub fn create(ctx: &RenderContext, label: &str, data: &MeshData) -> Self {
        debug_assert!(!data.is_empty());
        let vertex_label = format!("{label} vertices");
        let index_label = format!("{label} indices");
        let vertex_buffer = ctx.device().create_buffer_init(&BufferInitDescriptor {
            label: Some(&vertex_label),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = ctx.device().create_buffer_init(&BufferInitDescriptor {
            label: Some(&index_label),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
        }
    }

    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &wgpu::Buffer {
        &self.index_buffer
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Releases the GPU allocations immediately rather than waiting for the
    /// handles to drop.
    pub fn destroy(&self, _ctx: &RenderContext) {
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
    }
}

/// The up-to-three device meshes of one region, swapped as a unit.
pub struct RegionMeshes {
    position: Point3<i32>,
    /// World-space region center, kept for back-to-front sorting of the water
    /// pass without re-deriving it per frame.
    center: Point3<f32>,
    pub opaque: Option<DeviceMesh>,
    pub cutout: Option<DeviceMesh>,
    pub water: Option<DeviceMesh>,
}

impl RegionMeshes {
    /// Uploads every non-empty stream of a build result.
    pub fn create(
        ctx: &RenderContext,
        position: Point3<i32>,
        center: Point3<f32>,
        data: &RegionMeshData,
    ) -> Self {
        let upload = |stream: &MeshData, kind: &str| -> Option<DeviceMesh> {
            if stream.is_empty() {
                None
            } else {
                let label = format!("region {position:?} {kind}");
                Some(DeviceMesh::create(ctx, &label, stream))
            }
        };
        Self {
            position,
            center,
            opaque: upload(&data.opaque, "opaque"),
            cutout: upload(&data.cutout, "cutout"),
            water: upload(&data.water, "water"),
        }
    }

    pub fn position(&self) -> Point3<i32> {
        self.position
    }

    pub fn center(&self) -> Point3<f32> {
        self.center
    }

    pub fn is_empty(&self) -> bool {
        self.opaque.is_none() && self.cutout.is_none() && self.water.is_none()
    }

    pub fn destroy(&self, ctx: &RenderContext) {
        if let Some(mesh) = &self.opaque {
            mesh.destroy(ctx);
        }
        if let Some(mesh) = &self.cutout {
            mesh.destroy(ctx);
        }
        if let Some(mesh) = &self.water {
            mesh.destroy(ctx);
        }
    }
}
