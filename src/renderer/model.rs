//! OBJ model loading
//!
//! Meshes are triangulated and single-indexed on load. Each MTL material gets
//! a bind group with its diffuse and specular maps; missing maps fall back to
//! 1x1 white (diffuse) and black (specular).

use super::error::{RendererErrorContext, RendererResult};
use super::texture::Texture;
use super::vertex::ModelVertex;
use crate::error::ViewerError;
use std::path::Path;
use wgpu::util::DeviceExt;

/// Bind group index of the material in the lit pipeline
pub const MATERIAL_GROUP: u32 = 2;

pub struct Material {
    pub name: String,
    pub bind_group: wgpu::BindGroup,
}

pub struct Mesh {
    pub name: String,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
    material: usize,
}

pub struct Model {
    pub name: String,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
}

pub fn material_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let texture_entry = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    };

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("material_bind_group_layout"),
        entries: &[
            // Diffuse map
            texture_entry(0),
            // Specular map
            texture_entry(1),
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

/// Shared state for building material bind groups
pub struct MaterialFactory {
    layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    white: Texture,
    black: Texture,
}

impl MaterialFactory {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Material Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            layout: material_bind_group_layout(device),
            sampler,
            white: Texture::solid(device, queue, "Default Diffuse", [255, 255, 255, 255]),
            black: Texture::solid(device, queue, "Default Specular", [0, 0, 0, 255]),
        }
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    fn build(&self, device: &wgpu::Device, name: &str, diffuse: Option<&Texture>, specular: Option<&Texture>) -> Material {
        let diffuse = diffuse.unwrap_or(&self.white);
        let specular = specular.unwrap_or(&self.black);

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(name),
            layout: &self.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&specular.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        Material {
            name: name.to_string(),
            bind_group,
        }
    }
}

impl Model {
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        materials: &MaterialFactory,
        name: &str,
        path: &Path,
    ) -> RendererResult<Self> {
        let (obj_models, obj_materials) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS).asset_context(path)?;

        let obj_materials = obj_materials.unwrap_or_else(|e| {
            log::warn!("[Model::load] {}: no usable MTL ({}), using default material", path.display(), e);
            Vec::new()
        });

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut loaded = Vec::with_capacity(obj_materials.len() + 1);
        for material in &obj_materials {
            let diffuse = load_map(device, queue, base_dir, material.diffuse_texture.as_deref())?;
            let specular = load_map(device, queue, base_dir, material.specular_texture.as_deref())?;
            loaded.push(materials.build(device, &material.name, diffuse.as_ref(), specular.as_ref()));
        }
        // Meshes without a material use the last entry
        let fallback = loaded.len();
        loaded.push(materials.build(device, "default", None, None));

        let mut meshes = Vec::with_capacity(obj_models.len());
        for obj in obj_models {
            let vertices = mesh_vertices(&obj.mesh, &obj.name)?;
            let material = obj
                .mesh
                .material_id
                .filter(|&id| id < fallback)
                .unwrap_or(fallback);

            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Vertex Buffer", obj.name)),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Index Buffer", obj.name)),
                contents: bytemuck::cast_slice(&obj.mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

            meshes.push(Mesh {
                name: obj.name,
                vertex_buffer,
                index_buffer,
                num_indices: obj.mesh.indices.len() as u32,
                material,
            });
        }

        log::info!(
            "[Model::load] {} from {}: {} meshes, {} materials",
            name,
            path.display(),
            meshes.len(),
            obj_materials.len()
        );

        Ok(Self {
            name: name.to_string(),
            meshes,
            materials: loaded,
        })
    }

    /// Draw every mesh, binding its material at `MATERIAL_GROUP`
    pub fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        for mesh in &self.meshes {
            render_pass.set_bind_group(MATERIAL_GROUP, &self.materials[mesh.material].bind_group, &[]);
            mesh.draw(render_pass);
        }
    }

    /// Draw geometry only, for the depth pass
    pub fn draw_geometry<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        for mesh in &self.meshes {
            mesh.draw(render_pass);
        }
    }
}

impl Mesh {
    fn draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.num_indices, 0, 0..1);
    }
}

fn load_map(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    base_dir: &Path,
    file: Option<&str>,
) -> RendererResult<Option<Texture>> {
    match file {
        Some(file) if !file.is_empty() => Texture::load(device, queue, &base_dir.join(file)).map(Some),
        _ => Ok(None),
    }
}

/// Interleave positions, normals and texture coordinates.
///
/// OBJ texture coordinates put v = 0 at the bottom; wgpu samples with v = 0 at
/// the top, so v is flipped here.
pub fn mesh_vertices(mesh: &tobj::Mesh, name: &str) -> RendererResult<Vec<ModelVertex>> {
    let count = mesh.positions.len() / 3;
    if mesh.normals.len() / 3 != count {
        return Err(ViewerError::MissingAttribute {
            mesh: name.to_string(),
            attribute: "normals",
        });
    }
    if mesh.texcoords.len() / 2 != count {
        return Err(ViewerError::MissingAttribute {
            mesh: name.to_string(),
            attribute: "texture coordinates",
        });
    }

    Ok(mesh
        .positions
        .chunks_exact(3)
        .zip(mesh.normals.chunks_exact(3))
        .zip(mesh.texcoords.chunks_exact(2))
        .map(|((p, n), uv)| ModelVertex::new([p[0], p[1], p[2]], [n[0], n[1], n[2]], [uv[0], 1.0 - uv[1]]))
        .collect())
}
