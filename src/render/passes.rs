//! The three material passes.
//!
//! One shader module, three pipelines:
//!
//! 1. **Opaque** — depth test + write, back-face culling, no blending.
//! 2. **Cutout** — same depth state, alpha-tested in the fragment stage.
//! 3. **Water** — depth test without write, alpha blending, culling disabled
//!    so both sides of a thin sheet are visible; regions draw back-to-front.
//!
//! All three read the frame uniform, which carries the view-projection matrix
//! and the ambient-brightness scalar. The scalar is written once per frame in
//! [`RenderPasses::prepare_frame`]; it never appears in any vertex buffer.

use cgmath::{Matrix4, Point3};

use crate::config::PipelineConfig;
use crate::core::RenderContext;
use crate::device::mesh::{DeviceMesh, RegionMeshes};
use crate::render::vertex::MeshVertex;

/// Depth buffer format the passes are built against.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// The built-in region mesh shader.
pub const MESH_SHADER: &str = include_str!("shader.wgsl");

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
    ambient: f32,
    water_boost: f32,
    _pad: [f32; 2],
}

/// Pipelines and per-frame state for drawing region meshes.
pub struct RenderPasses {
    opaque_pipeline: wgpu::RenderPipeline,
    cutout_pipeline: wgpu::RenderPipeline,
    water_pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    atlas_layout: wgpu::BindGroupLayout,
    water_boost: f32,
}

impl RenderPasses {
    pub fn new(
        ctx: &RenderContext,
        config: &PipelineConfig,
        color_format: wgpu::TextureFormat,
    ) -> Self {
        let device = ctx.device();

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Region Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(MESH_SHADER.into()),
        });

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Frame Uniforms Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let atlas_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Atlas Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2Array,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame Uniforms Bind Group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Region Mesh Pipeline Layout"),
            bind_group_layouts: &[&frame_layout, &atlas_layout],
            push_constant_ranges: &[],
        });

        let opaque_pipeline = build_pipeline(
            device,
            &pipeline_layout,
            &shader,
            "fs_opaque",
            "Opaque Pass",
            color_format,
            wgpu::BlendState::REPLACE,
            true,
            Some(wgpu::Face::Back),
        );
        let cutout_pipeline = build_pipeline(
            device,
            &pipeline_layout,
            &shader,
            "fs_cutout",
            "Cutout Pass",
            color_format,
            wgpu::BlendState::REPLACE,
            true,
            Some(wgpu::Face::Back),
        );
        let water_pipeline = build_pipeline(
            device,
            &pipeline_layout,
            &shader,
            "fs_water",
            "Water Pass",
            color_format,
            wgpu::BlendState::ALPHA_BLENDING,
            false,
            None,
        );

        Self {
            opaque_pipeline,
            cutout_pipeline,
            water_pipeline,
            frame_buffer,
            frame_bind_group,
            atlas_layout,
            water_boost: config.water_ambient_boost,
        }
    }

    /// Layout the texture-atlas bind group must match (a 2D array texture and
    /// a filtering sampler with repeat addressing).
    pub fn atlas_bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.atlas_layout
    }

    /// Uploads the frame uniforms: one write covers the camera matrices and
    /// the ambient scalar for all three passes.
    pub fn prepare_frame(&self, ctx: &RenderContext, view_proj: Matrix4<f32>, ambient: f32) {
        let uniforms = FrameUniforms {
            view_proj: view_proj.into(),
            ambient: ambient.clamp(0.0, 1.0),
            water_boost: self.water_boost,
            _pad: [0.0; 2],
        };
        ctx.queue()
            .write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// Pass 1: opaque geometry, unordered across regions.
    pub fn render_opaque<'m>(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        atlas_bind_group: &wgpu::BindGroup,
        meshes: impl Iterator<Item = &'m RegionMeshes>,
    ) {
        pass.set_pipeline(&self.opaque_pipeline);
        self.bind_common(pass, atlas_bind_group);
        for region in meshes {
            if let Some(mesh) = &region.opaque {
                draw_mesh(pass, mesh);
            }
        }
    }

    /// Pass 2: alpha-tested cutout geometry, unordered across regions.
    pub fn render_cutout<'m>(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        atlas_bind_group: &wgpu::BindGroup,
        meshes: impl Iterator<Item = &'m RegionMeshes>,
    ) {
        pass.set_pipeline(&self.cutout_pipeline);
        self.bind_common(pass, atlas_bind_group);
        for region in meshes {
            if let Some(mesh) = &region.cutout {
                draw_mesh(pass, mesh);
            }
        }
    }

    /// Pass 3: water, sorted back-to-front by region center so blending
    /// composes correctly.
    pub fn render_water<'m>(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        atlas_bind_group: &wgpu::BindGroup,
        meshes: impl Iterator<Item = &'m RegionMeshes>,
        camera_position: Point3<f32>,
    ) {
        let mut sorted: Vec<(&'m RegionMeshes, f32)> = meshes
            .filter(|region| region.water.is_some())
            .map(|region| {
                let delta = region.center() - camera_position;
                (region, delta.x * delta.x + delta.y * delta.y + delta.z * delta.z)
            })
            .collect();
        if sorted.is_empty() {
            return;
        }
        sorted.sort_by(|a, b| b.1.total_cmp(&a.1));

        pass.set_pipeline(&self.water_pipeline);
        self.bind_common(pass, atlas_bind_group);
        for (region, _) in sorted {
            if let Some(mesh) = &region.water {
                draw_mesh(pass, mesh);
            }
        }
    }

    fn bind_common(&self, pass: &mut wgpu::RenderPass<'_>, atlas_bind_group: &wgpu::BindGroup) {
        pass.set_bind_group(0, &self.frame_bind_group, &[]);
        pass.set_bind_group(1, atlas_bind_group, &[]);
    }
}

fn draw_mesh(pass: &mut wgpu::RenderPass<'_>, mesh: &DeviceMesh) {
    pass.set_vertex_buffer(0, mesh.vertex_buffer().slice(..));
    pass.set_index_buffer(mesh.index_buffer().slice(..), wgpu::IndexFormat::Uint32);
    pass.draw_indexed(0..mesh.index_count(), 0, 0..1);
}

#[allow(clippy::too_many_arguments)]
fn build_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    fragment_entry: &str,
    label: &str,
    color_format: wgpu::TextureFormat,
    blend: wgpu::BlendState,
    depth_write: bool,
    cull_mode: Option<wgpu::Face>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[MeshVertex::desc()],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}
