//! The vertex format for region meshes.

/// A mesh vertex as uploaded to the GPU.
///
/// `uv` is in tile units under array-layer atlas addressing (a merged quad
/// spans `0..w`, which tiles under repeat sampling) or absolute atlas
/// coordinates under packed-rect addressing. `color` is the baked light:
/// directional shade × light curve × biome tint, fixed at build time.
///
/// Layout (36 bytes): position 12, uv 8, layer 4, color 12.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub layer: u32,
    pub color: [f32; 3],
}

impl MeshVertex {
    pub fn new(position: [f32; 3], uv: [f32; 2], layer: u32, color: [f32; 3]) -> Self {
        Self {
            position,
            uv,
            layer,
            color,
        }
    }

    /// Vertex buffer layout matching the shader's input attributes.
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: 12,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: 20,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Uint32,
                },
                wgpu::VertexAttribute {
                    offset: 24,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}
