//! Lit scene objects plus the light marker
//!
//! Pipelines depend on polygon mode and sample count, both switchable at
//! runtime, so they are built on first use and cached per combination.

use super::model::{MaterialFactory, Model};
use super::shadow_pass::ShadowPass;
use super::texture::DEPTH_FORMAT;
use super::uniforms::{FrameUniform, ObjectBuffer};
use super::vertex::{cube_vertices, ModelVertex, PositionVertex, CUBE_INDICES};
use crate::scene::{FillMode, FrameMatrices, SceneState};
use std::collections::HashMap;
use wgpu::util::DeviceExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub fill_mode: FillMode,
    pub sample_count: u32,
}

pub fn polygon_mode(fill_mode: FillMode) -> wgpu::PolygonMode {
    match fill_mode {
        FillMode::Fill => wgpu::PolygonMode::Fill,
        FillMode::Line => wgpu::PolygonMode::Line,
        FillMode::Point => wgpu::PolygonMode::Point,
    }
}

/// Device feature a polygon mode needs, if any
pub fn required_feature(fill_mode: FillMode) -> wgpu::Features {
    match fill_mode {
        FillMode::Fill => wgpu::Features::empty(),
        FillMode::Line => wgpu::Features::POLYGON_MODE_LINE,
        FillMode::Point => wgpu::Features::POLYGON_MODE_POINT,
    }
}

/// Triangle state shared by every pass that draws scene geometry.
/// Front faces wind counter-clockwise and back faces are culled.
pub fn scene_primitive(fill_mode: FillMode) -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        strip_index_format: None,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: Some(wgpu::Face::Back),
        polygon_mode: polygon_mode(fill_mode),
        unclipped_depth: false,
        conservative: false,
    }
}

/// Fall back to filled polygons when the device lacks the feature
pub fn supported_fill_mode(requested: FillMode, features: wgpu::Features) -> FillMode {
    if features.contains(required_feature(requested)) {
        requested
    } else {
        FillMode::Fill
    }
}

struct Pipelines {
    lit: wgpu::RenderPipeline,
    marker: wgpu::RenderPipeline,
}

pub struct ForwardPass {
    color_format: wgpu::TextureFormat,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    lit_layout: wgpu::PipelineLayout,
    marker_layout: wgpu::PipelineLayout,
    lit_shader: wgpu::ShaderModule,
    marker_shader: wgpu::ShaderModule,
    materials: MaterialFactory,
    pipelines: HashMap<PipelineKey, Pipelines>,
    marker_vertices: wgpu::Buffer,
    marker_indices: wgpu::Buffer,
}

impl ForwardPass {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        shadow: &ShadowPass,
        objects: &ObjectBuffer,
    ) -> Self {
        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame Uniform Buffer"),
            size: std::mem::size_of::<FrameUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: frame_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(shadow.shadow_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(shadow.comparison_sampler()),
                },
            ],
        });

        let materials = MaterialFactory::new(device, queue);

        let lit_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Lit Pipeline Layout"),
            bind_group_layouts: &[&frame_bind_group_layout, objects.layout(), materials.layout()],
            push_constant_ranges: &[],
        });
        let marker_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Light Marker Pipeline Layout"),
            bind_group_layouts: &[&frame_bind_group_layout, objects.layout()],
            push_constant_ranges: &[],
        });

        let lit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Lit Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/lit.wgsl").into()),
        });
        let marker_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Light Marker Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/light_cube.wgsl").into()),
        });

        let marker_vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Marker Vertex Buffer"),
            contents: bytemuck::cast_slice(&cube_vertices(1.0)),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let marker_indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Light Marker Index Buffer"),
            contents: bytemuck::cast_slice(&CUBE_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            color_format,
            frame_buffer,
            frame_bind_group,
            lit_layout,
            marker_layout,
            lit_shader,
            marker_shader,
            materials,
            pipelines: HashMap::new(),
            marker_vertices,
            marker_indices,
        }
    }

    pub fn materials(&self) -> &MaterialFactory {
        &self.materials
    }

    /// Upload this frame's uniform and make sure the pipelines for `key` exist
    pub fn prepare(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, key: PipelineKey, frame: &FrameMatrices, scene: &SceneState) {
        queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::cast_slice(&[FrameUniform::new(frame, scene)]),
        );

        if !self.pipelines.contains_key(&key) {
            log::info!(
                "[ForwardPass::prepare] Building pipelines for {:?} with {}x sampling",
                key.fill_mode,
                key.sample_count
            );
            let pipelines = Pipelines {
                lit: self.build_pipeline(device, key, true),
                marker: self.build_pipeline(device, key, false),
            };
            self.pipelines.insert(key, pipelines);
        }
    }

    fn build_pipeline(&self, device: &wgpu::Device, key: PipelineKey, lit: bool) -> wgpu::RenderPipeline {
        let (label, layout, shader, buffers) = if lit {
            ("Lit Pipeline", &self.lit_layout, &self.lit_shader, [ModelVertex::desc()])
        } else {
            ("Light Marker Pipeline", &self.marker_layout, &self.marker_shader, [PositionVertex::desc()])
        };

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: "vs_main",
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: scene_primitive(key.fill_mode),
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState {
                count: key.sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        })
    }

    /// Draw the lit objects, then the light marker from the last object slot.
    /// `prepare` must have run with the same key this frame.
    pub fn record<'a>(
        &'a self,
        render_pass: &mut wgpu::RenderPass<'a>,
        key: PipelineKey,
        frame: &FrameMatrices,
        models: &'a [Model],
        objects: &'a ObjectBuffer,
    ) {
        let Some(pipelines) = self.pipelines.get(&key) else {
            log::warn!("[ForwardPass::record] No pipelines for {:?}, skipping", key);
            return;
        };

        render_pass.set_pipeline(&pipelines.lit);
        render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
        for (slot, object) in frame.objects.iter().enumerate() {
            let Some(model) = models.get(object.mesh.0) else {
                continue;
            };
            render_pass.set_bind_group(1, objects.bind_group(), &[objects.offset(slot)]);
            model.draw(render_pass);
        }

        let marker_slot = frame.objects.len();
        render_pass.set_pipeline(&pipelines.marker);
        render_pass.set_bind_group(0, &self.frame_bind_group, &[]);
        render_pass.set_bind_group(1, objects.bind_group(), &[objects.offset(marker_slot)]);
        render_pass.set_vertex_buffer(0, self.marker_vertices.slice(..));
        render_pass.set_index_buffer(self.marker_indices.slice(..), wgpu::IndexFormat::Uint16);
        render_pass.draw_indexed(0..CUBE_INDICES.len() as u32, 0, 0..1);
    }
}
