//! Directional light, shadow frustum and spotlight parameters
//!
//! Everything here is a pure function of its inputs so the depth pass and the
//! lit pass can be fed from one computation per frame.

use crate::camera::{OPENGL_TO_WGPU_MATRIX, WORLD_UP};
use crate::config::{LightConfig, ShadowConfig, SpotlightConfig};
use cgmath::{Deg, Matrix, Matrix3, Matrix4, Point3, SquareMatrix, Vector3};

/// Orthographic light frustum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowFrustum {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ShadowFrustum {
    fn default() -> Self {
        Self::from(&ShadowConfig::default())
    }
}

impl From<&ShadowConfig> for ShadowFrustum {
    fn from(config: &ShadowConfig) -> Self {
        Self {
            left: config.left,
            right: config.right,
            bottom: config.bottom,
            top: config.top,
            near: config.near,
            far: config.far,
        }
    }
}

impl ShadowFrustum {
    pub fn projection(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX
            * cgmath::ortho(self.left, self.right, self.bottom, self.top, self.near, self.far)
    }
}

/// Rotation of the light about world Y
pub fn light_rotation(light_angle: f32) -> Matrix4<f32> {
    Matrix4::from_angle_y(Deg(light_angle))
}

/// Projection * view of the directional light.
///
/// The light direction is treated as a point, rotated about world Y, and used
/// as the eye of a look-at towards `target`.
pub fn light_space_matrix(
    light_dir: Vector3<f32>,
    light_angle: f32,
    target: Point3<f32>,
    frustum: &ShadowFrustum,
) -> Matrix4<f32> {
    let rotated = light_rotation(light_angle) * light_dir.extend(1.0);
    let eye = Point3::from_homogeneous(rotated);
    let light_view = Matrix4::look_at_rh(eye, target, WORLD_UP);
    frustum.projection() * light_view
}

/// Light direction expressed in eye space for the lit pass
pub fn light_direction_eye(view: Matrix4<f32>, light_angle: f32, light_dir: Vector3<f32>) -> Vector3<f32> {
    let upper = upper_3x3(view * light_rotation(light_angle));
    inverse_transpose(upper) * light_dir
}

/// Inverse-transpose of the upper 3x3 of view * model.
///
/// Singular matrices fall back to identity.
pub fn normal_matrix(view: Matrix4<f32>, model: Matrix4<f32>) -> Matrix3<f32> {
    inverse_transpose(upper_3x3(view * model))
}

/// Model matrix of the small cube marking where the light sits
pub fn light_marker_model(light_angle: f32, config: &LightConfig) -> Matrix4<f32> {
    light_rotation(light_angle)
        * Matrix4::from_translation(Vector3::new(0.0, config.marker_height, 0.0))
        * Matrix4::from_scale(config.marker_scale)
}

fn upper_3x3(m: Matrix4<f32>) -> Matrix3<f32> {
    Matrix3::from_cols(m.x.truncate(), m.y.truncate(), m.z.truncate())
}

fn inverse_transpose(m: Matrix3<f32>) -> Matrix3<f32> {
    m.invert().unwrap_or_else(Matrix3::identity).transpose()
}

/// Spotlight cone in eye space, cutoffs stored as cosines
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spotlight {
    pub inner_cutoff: f32,
    pub outer_cutoff: f32,
    pub position: Vector3<f32>,
    pub direction: Vector3<f32>,
}

impl From<&SpotlightConfig> for Spotlight {
    fn from(config: &SpotlightConfig) -> Self {
        Self {
            inner_cutoff: config.inner_cutoff_degrees.to_radians().cos(),
            outer_cutoff: config.outer_cutoff_degrees.to_radians().cos(),
            position: Vector3::from(config.position),
            direction: Vector3::from(config.direction),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector4};

    fn light_dir() -> Vector3<f32> {
        Vector3::new(1.0, 1.0, 0.0)
    }

    #[test]
    fn test_light_space_is_deterministic() {
        let frustum = ShadowFrustum::default();
        let target = Point3::new(0.0, 0.0, 0.0);
        let a = light_space_matrix(light_dir(), 37.0, target, &frustum);
        let b = light_space_matrix(light_dir(), 37.0, target, &frustum);

        let a: [[f32; 4]; 4] = a.into();
        let b: [[f32; 4]; 4] = b.into();
        for (col_a, col_b) in a.iter().zip(b.iter()) {
            for (x, y) in col_a.iter().zip(col_b.iter()) {
                assert_eq!(x.to_bits(), y.to_bits());
            }
        }
    }

    #[test]
    fn test_light_space_changes_with_angle() {
        let frustum = ShadowFrustum::default();
        let target = Point3::new(0.0, 0.0, 0.0);
        let a = light_space_matrix(light_dir(), 0.0, target, &frustum);
        let b = light_space_matrix(light_dir(), 90.0, target, &frustum);
        assert_ne!(a, b);
    }

    #[test]
    fn test_target_lands_inside_depth_range() {
        let frustum = ShadowFrustum::default();
        let m = light_space_matrix(light_dir(), 15.0, Point3::new(0.0, 0.0, 0.0), &frustum);
        let clip = m * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let depth = clip.z / clip.w;
        assert!(depth > 0.0 && depth < 1.0, "depth {}", depth);
    }

    #[test]
    fn test_eye_space_light_direction_with_identity_view() {
        let dir = light_direction_eye(Matrix4::identity(), 90.0, light_dir());
        // Rotating (1, 1, 0) a quarter turn about Y gives (0, 1, -1)
        assert!((dir - Vector3::new(0.0, 1.0, -1.0)).magnitude() < 1e-5);
    }

    #[test]
    fn test_normal_matrix_under_non_uniform_scale() {
        let model = Matrix4::from_nonuniform_scale(2.0, 1.0, 1.0);
        let normal = normal_matrix(Matrix4::identity(), model);

        // Surface x + y = 0 has normal (1, 1, 0); after stretching x by 2 the
        // tangent (1, -1, 0) becomes (2, -1, 0) and the normal must stay perpendicular.
        let n = normal * Vector3::new(1.0, 1.0, 0.0);
        let t = Vector3::new(2.0, -1.0, 0.0);
        assert!(n.dot(t).abs() < 1e-5);
    }

    #[test]
    fn test_singular_model_falls_back_to_identity() {
        let model = Matrix4::from_scale(0.0);
        assert_eq!(normal_matrix(Matrix4::identity(), model), Matrix3::identity());
    }

    #[test]
    fn test_marker_sits_above_origin_when_unrotated() {
        let model = light_marker_model(0.0, &LightConfig::default());
        let centre = model * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert_eq!(centre, Vector4::new(0.0, 20.0, 0.0, 1.0));
    }

    #[test]
    fn test_spotlight_cutoffs_are_cosines() {
        let spot = Spotlight::from(&SpotlightConfig::default());
        assert!((spot.inner_cutoff - 10f32.to_radians().cos()).abs() < 1e-6);
        assert!((spot.outer_cutoff - 20f32.to_radians().cos()).abs() < 1e-6);
        assert!(spot.inner_cutoff > spot.outer_cutoff);
    }
}
