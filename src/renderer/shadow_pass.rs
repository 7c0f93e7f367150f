//! Depth-only render of the scene from the light
//!
//! Owns the shadow map. The lit pass samples it through `shadow_view` and the
//! comparison sampler; the debug view reads it through `shadow_view` too.

use super::forward_pass::scene_primitive;
use super::model::Model;
use super::texture::{create_depth_texture, DEPTH_FORMAT};
use super::uniforms::{LightSpaceUniform, ObjectBuffer};
use super::vertex::ModelVertex;
use crate::scene::{FillMode, FrameMatrices};
use cgmath::{Matrix4, SquareMatrix};
use wgpu::util::DeviceExt;

pub struct ShadowPass {
    resolution: u32,
    shadow_view: wgpu::TextureView,
    comparison_sampler: wgpu::Sampler,
    light_buffer: wgpu::Buffer,
    light_bind_group: wgpu::BindGroup,
    pipeline: wgpu::RenderPipeline,
}

impl ShadowPass {
    pub fn new(device: &wgpu::Device, resolution: u32, objects: &ObjectBuffer) -> Self {
        log::info!("[ShadowPass::new] Creating {}x{} shadow map", resolution, resolution);
        let shadow_view = create_depth_texture(device, "Shadow Map", resolution, resolution, 1);

        let comparison_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Comparison Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let light_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Space Buffer"),
            contents: bytemuck::cast_slice(&[LightSpaceUniform::new(Matrix4::identity())]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let light_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("light_space_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let light_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("light_space_bind_group"),
            layout: &light_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: light_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Depth Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/depth.wgsl").into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Depth Pipeline Layout"),
            bind_group_layouts: &[&light_bind_group_layout, objects.layout()],
            push_constant_ranges: &[],
        });

        // Always filled and single-sampled, whatever the lit pass is doing
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Depth Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[ModelVertex::desc()],
            },
            fragment: None,
            primitive: scene_primitive(FillMode::Fill),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        Self {
            resolution,
            shadow_view,
            comparison_sampler,
            light_buffer,
            light_bind_group,
            pipeline,
        }
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn shadow_view(&self) -> &wgpu::TextureView {
        &self.shadow_view
    }

    pub fn comparison_sampler(&self) -> &wgpu::Sampler {
        &self.comparison_sampler
    }

    pub fn prepare(&self, queue: &wgpu::Queue, frame: &FrameMatrices) {
        queue.write_buffer(
            &self.light_buffer,
            0,
            bytemuck::cast_slice(&[LightSpaceUniform::new(frame.light_space)]),
        );
    }

    /// Clear the shadow map and draw every scene object into it.
    /// `models` is indexed by mesh handle; object slot `i` is `frame.objects[i]`.
    pub fn record(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        frame: &FrameMatrices,
        models: &[Model],
        objects: &ObjectBuffer,
    ) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Shadow Pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.shadow_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.light_bind_group, &[]);

        for (slot, object) in frame.objects.iter().enumerate() {
            let Some(model) = models.get(object.mesh.0) else {
                continue;
            };
            render_pass.set_bind_group(1, objects.bind_group(), &[objects.offset(slot)]);
            model.draw_geometry(&mut render_pass);
        }
    }
}
