//! Texture creation: material images, depth attachments, the shadow map and
//! the skybox cubemap

use super::error::{RendererErrorContext, RendererResult};
use crate::error::ViewerError;
use std::path::Path;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Texture plus its default view
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl Texture {
    /// Decode an image file into an sRGB RGBA8 texture
    pub fn load(device: &wgpu::Device, queue: &wgpu::Queue, path: &Path) -> RendererResult<Self> {
        let image = image::open(path).asset_context(path)?.to_rgba8();
        let (width, height) = image.dimensions();
        log::debug!("[Texture::load] {} ({}x{})", path.display(), width, height);

        let label = path.display().to_string();
        Ok(Self::from_rgba8(device, queue, &label, width, height, &image))
    }

    /// Single-pixel texture used when a material has no map
    pub fn solid(device: &wgpu::Device, queue: &wgpu::Queue, label: &str, rgba: [u8; 4]) -> Self {
        Self::from_rgba8(device, queue, label, 1, 1, &rgba)
    }

    pub fn from_rgba8(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        width: u32,
        height: u32,
        data: &[u8],
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        write_layer(queue, &texture, 0, width, height, data);

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    /// Six faces in +X, -X, +Y, -Y, +Z, -Z order, all the same size
    pub fn cubemap(device: &wgpu::Device, queue: &wgpu::Queue, faces: &[impl AsRef<Path>]) -> RendererResult<Self> {
        if faces.len() != 6 {
            return Err(ViewerError::SkyboxFaces {
                expected: 6,
                found: faces.len(),
            });
        }

        let mut images = Vec::with_capacity(6);
        for face in faces {
            let path = face.as_ref();
            images.push((path, image::open(path).asset_context(path)?.to_rgba8()));
        }

        let (width, height) = images[0].1.dimensions();
        for (path, image) in &images {
            if image.dimensions() != (width, height) {
                return Err(ViewerError::asset(
                    path,
                    format!(
                        "cubemap face is {}x{}, expected {}x{}",
                        image.width(),
                        image.height(),
                        width,
                        height
                    ),
                ));
            }
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Skybox Cubemap"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        for (layer, (_, image)) in images.iter().enumerate() {
            write_layer(queue, &texture, layer as u32, width, height, image);
        }
        log::info!("[Texture::cubemap] Loaded skybox with {}x{} faces", width, height);

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Skybox Cubemap View"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        Ok(Self { texture, view })
    }
}

fn write_layer(queue: &wgpu::Queue, texture: &wgpu::Texture, layer: u32, width: u32, height: u32, data: &[u8]) {
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
            aspect: wgpu::TextureAspect::All,
        },
        data,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

/// Validates and clamps texture dimensions to GPU limits
/// Returns (clamped_width, clamped_height, was_clamped)
pub fn validate_texture_dimensions(
    requested_width: u32,
    requested_height: u32,
    max_dimension: u32,
) -> (u32, u32, bool) {
    let clamped_width = requested_width.clamp(1, max_dimension);
    let clamped_height = requested_height.clamp(1, max_dimension);
    let was_clamped = clamped_width != requested_width || clamped_height != requested_height;

    (clamped_width, clamped_height, was_clamped)
}

/// Creates a depth attachment with validated dimensions
pub fn create_depth_texture(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
    sample_count: u32,
) -> wgpu::TextureView {
    let max_texture_dimension = device.limits().max_texture_dimension_2d;
    let (width, height, was_clamped) = validate_texture_dimensions(width, height, max_texture_dimension);

    if was_clamped {
        log::warn!(
            "[create_depth_texture] {} clamped to {}x{} (max: {})",
            label,
            width,
            height,
            max_texture_dimension
        );
    }

    // Single-sampled depth can be sampled later (shadow map, debug view)
    let usage = if sample_count == 1 {
        wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING
    } else {
        wgpu::TextureUsages::RENDER_ATTACHMENT
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Multisampled colour target resolved into the swapchain image
pub fn create_msaa_target(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    sample_count: u32,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("MSAA Colour Target"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: config.format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
