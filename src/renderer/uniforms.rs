//! GPU-visible uniform blocks
//!
//! Every struct mirrors a WGSL struct field for field. Vectors are widened to
//! `vec4` so the Rust and WGSL layouts agree without manual padding rules.

use crate::scene::{FrameMatrices, ObjectTransform, SceneState};
use cgmath::{Matrix3, Matrix4, SquareMatrix};

/// Grey the fog fades towards
pub const FOG_COLOR: [f32; 4] = [0.5, 0.5, 0.5, 1.0];

/// Per-frame data of the lit pass (group 0, binding 0)
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniform {
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
    light_space: [[f32; 4]; 4],
    /// xyz: eye-space light direction
    light_dir: [f32; 4],
    light_color: [f32; 4],
    /// xyz: position, w: 1.0 when the spotlight is on
    spot_position: [f32; 4],
    spot_direction: [f32; 4],
    fog_color: [f32; 4],
    /// x: fog density, y: fog on, z: inner cutoff, w: outer cutoff
    params: [f32; 4],
}

impl FrameUniform {
    pub fn new(frame: &FrameMatrices, scene: &SceneState) -> Self {
        let flag = |on: bool| if on { 1.0 } else { 0.0 };
        let spot = &scene.spotlight;

        Self {
            view: frame.view.into(),
            projection: frame.projection.into(),
            light_space: frame.light_space.into(),
            light_dir: frame.light_dir_eye.extend(0.0).into(),
            light_color: scene.light_color.extend(1.0).into(),
            spot_position: spot.position.extend(flag(scene.toggles.spotlight)).into(),
            spot_direction: spot.direction.extend(0.0).into(),
            fog_color: FOG_COLOR,
            params: [
                scene.fog.density,
                flag(scene.fog.enabled),
                spot.inner_cutoff,
                spot.outer_cutoff,
            ],
        }
    }
}

/// Per-draw transforms, one dynamic-offset slot each
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    model: [[f32; 4]; 4],
    /// mat3x3 columns padded to 16 bytes
    normal: [[f32; 4]; 3],
}

impl ObjectUniform {
    pub fn new(model: Matrix4<f32>, normal: Matrix3<f32>) -> Self {
        Self {
            model: model.into(),
            normal: [
                normal.x.extend(0.0).into(),
                normal.y.extend(0.0).into(),
                normal.z.extend(0.0).into(),
            ],
        }
    }
}

impl From<&ObjectTransform> for ObjectUniform {
    fn from(transform: &ObjectTransform) -> Self {
        Self::new(transform.model, transform.normal)
    }
}

/// Object slots for a frame: every scene object, then the light marker
pub fn object_uniforms(frame: &FrameMatrices) -> Vec<ObjectUniform> {
    frame
        .objects
        .iter()
        .map(ObjectUniform::from)
        .chain(std::iter::once(ObjectUniform::new(
            frame.light_marker,
            Matrix3::identity(),
        )))
        .collect()
}

/// Light-space transform for the depth pass
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightSpaceUniform {
    light_space: [[f32; 4]; 4],
}

impl LightSpaceUniform {
    pub fn new(light_space: Matrix4<f32>) -> Self {
        Self {
            light_space: light_space.into(),
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkyboxUniform {
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
}

impl SkyboxUniform {
    pub fn new(frame: &FrameMatrices) -> Self {
        Self {
            view: frame.skybox_view.into(),
            projection: frame.projection.into(),
        }
    }
}

pub fn align_up(size: usize, alignment: usize) -> usize {
    (size + alignment - 1) / alignment * alignment
}

/// Dynamic-offset uniform buffer holding every object slot of a frame.
///
/// Shared by the depth pass and the lit pass so both read the same model
/// matrices. Grows to the next power of two when a frame needs more slots.
pub struct ObjectBuffer {
    layout: wgpu::BindGroupLayout,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: usize,
    capacity: usize,
    staging: Vec<u8>,
}

impl ObjectBuffer {
    pub fn new(device: &wgpu::Device, capacity: usize) -> Self {
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("object_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<ObjectUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let alignment = device.limits().min_uniform_buffer_offset_alignment as usize;
        let stride = align_up(std::mem::size_of::<ObjectUniform>(), alignment);
        let capacity = capacity.max(1).next_power_of_two();
        let (buffer, bind_group) = create_object_buffer(device, &layout, stride, capacity);

        Self {
            layout,
            buffer,
            bind_group,
            stride,
            capacity,
            staging: Vec::new(),
        }
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Byte offset of `slot` for `set_bind_group`
    pub fn offset(&self, slot: usize) -> wgpu::DynamicOffset {
        (slot * self.stride) as wgpu::DynamicOffset
    }

    /// Upload all slots of this frame in one write
    pub fn write(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, uniforms: &[ObjectUniform]) {
        if uniforms.len() > self.capacity {
            let capacity = uniforms.len().next_power_of_two();
            log::debug!(
                "[ObjectBuffer::write] Growing object buffer from {} to {} slots",
                self.capacity,
                capacity
            );
            let (buffer, bind_group) = create_object_buffer(device, &self.layout, self.stride, capacity);
            self.buffer = buffer;
            self.bind_group = bind_group;
            self.capacity = capacity;
        }

        pack_slots(&mut self.staging, uniforms, self.stride);
        queue.write_buffer(&self.buffer, 0, &self.staging);
    }
}

fn create_object_buffer(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    stride: usize,
    capacity: usize,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Object Uniform Buffer"),
        size: (stride * capacity) as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("object_bind_group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: wgpu::BufferSize::new(std::mem::size_of::<ObjectUniform>() as u64),
            }),
        }],
    });

    (buffer, bind_group)
}

/// Lay uniforms out at `stride` byte intervals
fn pack_slots(staging: &mut Vec<u8>, uniforms: &[ObjectUniform], stride: usize) {
    staging.clear();
    staging.resize(stride * uniforms.len(), 0);
    for (slot, uniform) in uniforms.iter().enumerate() {
        let start = slot * stride;
        let bytes = bytemuck::bytes_of(uniform);
        staging[start..start + bytes.len()].copy_from_slice(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewerConfig;
    use cgmath::{Deg, Vector3};

    #[test]
    fn test_uniform_sizes_match_wgsl() {
        assert_eq!(std::mem::size_of::<FrameUniform>(), 288);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 112);
        assert_eq!(std::mem::size_of::<SkyboxUniform>(), 128);
    }

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(112, 256), 256);
        assert_eq!(align_up(256, 256), 256);
        assert_eq!(align_up(257, 256), 512);
    }

    #[test]
    fn test_slots_are_packed_at_stride() {
        let a = ObjectUniform::new(Matrix4::from_scale(2.0), Matrix3::identity());
        let b = ObjectUniform::new(
            Matrix4::from_translation(Vector3::new(1.0, 2.0, 3.0)),
            Matrix3::from_angle_y(Deg(30.0)),
        );
        let mut staging = Vec::new();
        pack_slots(&mut staging, &[a, b], 256);

        assert_eq!(staging.len(), 512);
        let second: ObjectUniform = bytemuck::pod_read_unaligned(&staging[256..256 + 112]);
        assert_eq!(second, b);
        assert!(staging[112..256].iter().all(|&byte| byte == 0));
    }

    #[test]
    fn test_marker_takes_last_slot() {
        let scene = SceneState::new(&ViewerConfig::default());
        let frame = scene.frame(Matrix4::identity());
        let uniforms = object_uniforms(&frame);

        assert_eq!(uniforms.len(), frame.objects.len() + 1);
        assert_eq!(
            uniforms[uniforms.len() - 1],
            ObjectUniform::new(frame.light_marker, Matrix3::identity())
        );
    }
}
