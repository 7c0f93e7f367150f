/// Camera Module
///
/// First-person fly camera. Keeps an explicit front/right/up basis instead of
/// deriving it from angles, so mouse-look (`rotate`) only ever touches `front`
/// and the scripted orbit (`scene_preview`) is the only path that rebuilds
/// `right`.

use cgmath::{Deg, InnerSpace, Matrix4, Point3, Vector3};

/// World up used by the view matrix and the preview orbit
pub const WORLD_UP: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);

/// Fixed point the preview orbit starts from before rotation
pub const PREVIEW_ANCHOR: Point3<f32> = Point3::new(16.0, 7.0, 21.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Forward,
    Backward,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub front: Vector3<f32>,
    pub right: Vector3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    /// Build the basis from position/target/up.
    ///
    /// `front` points from the target towards the camera. `up` does not need to
    /// be perpendicular to `front`; it is re-derived from the cross products.
    pub fn new(position: Point3<f32>, target: Point3<f32>, up: Vector3<f32>) -> Self {
        let front = (position - target).normalize();
        let right = up.cross(front).normalize();
        let up = front.cross(right);

        Self {
            position,
            target,
            front,
            right,
            up,
        }
    }

    /// View matrix looking along `front`, always against `WORLD_UP` so there is no roll
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.position + self.front, WORLD_UP)
    }

    pub fn move_camera(&mut self, direction: MoveDirection, speed: f32) {
        match direction {
            MoveDirection::Forward => self.position += self.front * speed,
            MoveDirection::Backward => self.position -= self.front * speed,
            MoveDirection::Right => self.position += self.right * speed,
            MoveDirection::Left => self.position -= self.right * speed,
        }
    }

    /// Point `front` along the spherical direction given in degrees.
    /// `right` and `up` are left alone.
    pub fn rotate(&mut self, pitch: f32, yaw: f32) {
        let (sin_yaw, cos_yaw) = yaw.to_radians().sin_cos();
        let (sin_pitch, cos_pitch) = pitch.to_radians().sin_cos();

        let front = Vector3::new(cos_yaw * cos_pitch, sin_pitch, sin_yaw * cos_pitch);
        self.front = front.normalize();
    }

    /// Orbit the preview anchor about world Y by `angle` degrees and look at the target.
    ///
    /// `right` is `front × WORLD_UP` here, the opposite operand order to `new`.
    pub fn scene_preview(&mut self, angle: f32) {
        let rotation = Matrix4::from_angle_y(Deg(angle));
        let anchor = PREVIEW_ANCHOR.to_homogeneous();

        self.position = Point3::from_homogeneous(rotation * anchor);
        self.front = (self.target - self.position).normalize();
        self.right = self.front.cross(WORLD_UP).normalize();
    }

    pub fn log_state(&self) {
        log::info!(
            "[Camera] position: x = {:.4} y = {:.4} z = {:.4}",
            self.position.x,
            self.position.y,
            self.position.z
        );
        log::info!(
            "[Camera] direction: x = {:.4} y = {:.4} z = {:.4}",
            self.front.x,
            self.front.y,
            self.front.z
        );
    }
}

/// Perspective projection for the window's aspect ratio.
///
/// cgmath produces OpenGL clip space (z in [-1, 1]); the result is remapped to
/// the [0, 1] depth range wgpu expects.
pub fn perspective_projection(fov_degrees: f32, width: u32, height: u32, near: f32, far: f32) -> Matrix4<f32> {
    let aspect = width.max(1) as f32 / height.max(1) as f32;
    OPENGL_TO_WGPU_MATRIX * cgmath::perspective(Deg(fov_degrees), aspect, near, far)
}

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{EuclideanSpace, Vector4};

    const EPS: f32 = 1e-4;

    fn approx(a: Vector3<f32>, b: Vector3<f32>) -> bool {
        (a - b).magnitude() < EPS
    }

    fn default_camera() -> Camera {
        Camera::new(Point3::new(0.0, 6.0, 5.5), Point3::new(0.0, 0.0, 0.0), WORLD_UP)
    }

    #[test]
    fn test_basis_is_orthonormal() {
        let camera = Camera::new(
            Point3::new(3.0, 2.0, -7.0),
            Point3::new(1.0, -4.0, 2.0),
            Vector3::new(0.2, 1.0, 0.1),
        );

        assert!((camera.front.magnitude() - 1.0).abs() < EPS);
        assert!((camera.right.magnitude() - 1.0).abs() < EPS);
        assert!((camera.up.magnitude() - 1.0).abs() < EPS);
        assert!(camera.front.dot(camera.right).abs() < EPS);
        assert!(camera.front.dot(camera.up).abs() < EPS);
        assert!(camera.right.dot(camera.up).abs() < EPS);
    }

    #[test]
    fn test_front_points_away_from_target() {
        let camera = default_camera();
        let expected = Vector3::new(0.0, 6.0, 5.5).normalize();
        assert!(approx(camera.front, expected));
        assert!(approx(camera.right, Vector3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_move_forward_follows_front() {
        let mut camera = default_camera();
        let start = camera.position;
        let front = camera.front;

        camera.move_camera(MoveDirection::Forward, 0.1);

        assert!(approx(camera.position - start, front * 0.1));
    }

    #[test]
    fn test_move_left_right_cancel() {
        let mut camera = default_camera();
        let start = camera.position;

        camera.move_camera(MoveDirection::Left, 0.7);
        camera.move_camera(MoveDirection::Right, 0.7);
        camera.move_camera(MoveDirection::Forward, 0.3);
        camera.move_camera(MoveDirection::Backward, 0.3);

        assert!((camera.position - start).magnitude() < EPS);
    }

    #[test]
    fn test_rotate_sets_front_only() {
        let mut camera = default_camera();
        let right = camera.right;
        let up = camera.up;

        camera.rotate(0.0, -90.0);

        assert!(approx(camera.front, Vector3::new(0.0, 0.0, -1.0)));
        assert_eq!(camera.right, right);
        assert_eq!(camera.up, up);
    }

    #[test]
    fn test_rotate_is_independent_of_prior_moves() {
        let mut moved = default_camera();
        moved.move_camera(MoveDirection::Right, 3.0);
        moved.move_camera(MoveDirection::Forward, 2.0);
        moved.rotate(12.0, 40.0);

        let mut fresh = default_camera();
        fresh.rotate(12.0, 40.0);

        assert!(approx(moved.front, fresh.front));
    }

    #[test]
    fn test_view_matrix_maps_position_to_origin() {
        let mut camera = default_camera();
        camera.rotate(-20.0, -90.0);
        let view = camera.view_matrix();
        let eye = view * camera.position.to_homogeneous();
        assert!(eye.truncate().magnitude() < EPS);

        // A point straight ahead lands on the negative view-space z axis
        let ahead = view * (camera.position + camera.front * 4.0).to_homogeneous();
        assert!(approx(ahead.truncate(), Vector3::new(0.0, 0.0, -4.0)));
    }

    #[test]
    fn test_scene_preview_quarter_turn() {
        let mut camera = default_camera();
        camera.scene_preview(90.0);

        assert!(approx(camera.position.to_vec(), Vector3::new(21.0, 7.0, -16.0)));
        let expected_front = (Point3::new(0.0, 0.0, 0.0) - camera.position).normalize();
        assert!(approx(camera.front, expected_front));
        assert!(approx(camera.right, expected_front.cross(WORLD_UP).normalize()));
    }

    #[test]
    fn test_scene_preview_ignores_current_position() {
        let mut a = default_camera();
        let mut b = default_camera();
        b.move_camera(MoveDirection::Forward, 25.0);

        a.scene_preview(33.0);
        b.scene_preview(33.0);

        assert_eq!(a.position, b.position);
    }

    #[test]
    fn test_projection_depth_range() {
        let proj = perspective_projection(45.0, 800, 600, 0.1, 1000.0);
        let near = proj * Vector4::new(0.0, 0.0, -0.1, 1.0);
        let far = proj * Vector4::new(0.0, 0.0, -1000.0, 1.0);
        assert!((near.z / near.w).abs() < 1e-4);
        assert!((far.z / far.w - 1.0).abs() < 1e-3);
    }
}
