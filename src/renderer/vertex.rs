use bytemuck::{Pod, Zeroable};

/// Vertex of a loaded OBJ mesh
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl ModelVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], tex_coords: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coords,
        }
    }

    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // Position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Normal
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // Texture coordinates
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Position-only vertex for the light marker and the skybox cube
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PositionVertex {
    pub position: [f32; 3],
}

impl PositionVertex {
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PositionVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            }],
        }
    }
}

/// Unit cube centred on the origin, 8 corners
pub fn cube_vertices(half_extent: f32) -> [PositionVertex; 8] {
    let h = half_extent;
    [
        // Back face corners
        PositionVertex { position: [-h, -h, -h] },
        PositionVertex { position: [h, -h, -h] },
        PositionVertex { position: [h, h, -h] },
        PositionVertex { position: [-h, h, -h] },
        // Front face corners
        PositionVertex { position: [-h, -h, h] },
        PositionVertex { position: [h, -h, h] },
        PositionVertex { position: [h, h, h] },
        PositionVertex { position: [-h, h, h] },
    ]
}

/// Triangle list for `cube_vertices`, counter-clockwise seen from outside
#[rustfmt::skip]
pub const CUBE_INDICES: [u16; 36] = [
    // -Z
    0, 2, 1, 0, 3, 2,
    // +Z
    4, 5, 6, 4, 6, 7,
    // -X
    0, 4, 7, 0, 7, 3,
    // +X
    1, 2, 6, 1, 6, 5,
    // -Y
    0, 1, 5, 0, 5, 4,
    // +Y
    3, 7, 6, 3, 6, 2,
];

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3};

    #[test]
    fn test_model_vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<ModelVertex>(), 32);
        assert_eq!(ModelVertex::desc().attributes[2].offset, 24);
    }

    #[test]
    fn test_cube_triangles_face_outwards() {
        let corners = cube_vertices(1.0);
        for tri in CUBE_INDICES.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vector3::from(corners[i as usize].position));
            let normal = (b - a).cross(c - a);
            let centre = (a + b + c) / 3.0;
            assert!(normal.dot(centre) > 0.0, "triangle {:?} faces inwards", tri);
        }
    }
}
