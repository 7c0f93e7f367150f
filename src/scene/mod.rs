//! Scene state owned by the frame loop
//!
//! Replaces the loose process-wide globals (camera, animation counters, fog and
//! light parameters) with one struct that the passes receive by reference.

pub mod animation;
pub mod controls;

pub use animation::{AnimatedObject, Animation, MeshHandle, TriangleWave};
pub use controls::{apply_input, FrameRequests};

use crate::camera::Camera;
use crate::config::{FogConfig, LightConfig, ViewerConfig};
use crate::input::MouseLook;
use crate::lighting::{self, ShadowFrustum, Spotlight};
use cgmath::{Deg, Matrix3, Matrix4, Rad, Vector3};

pub const SCENE_MESH: MeshHandle = MeshHandle(0);
pub const TREE_MESH: MeshHandle = MeshHandle(1);
pub const SCARECROW_MESH: MeshHandle = MeshHandle(2);
pub const WANDERER_MESH: MeshHandle = MeshHandle(3);

/// Point the tree pulses about
pub const TREE_ANCHOR: Vector3<f32> = Vector3::new(6.25, 1.44, -12.48);
/// Point the scarecrow spins about
pub const SCARECROW_ANCHOR: Vector3<f32> = Vector3::new(10.29, 0.0, 13.808);

/// Degrees added to the preview orbit each frame while it runs
pub const PREVIEW_STEP: f32 = 0.3;
/// Degrees per frame for Q/E and K/L
pub const ROTATION_STEP: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillMode {
    Fill,
    Line,
    Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogState {
    pub enabled: bool,
    pub density: f32,
    pub step: f32,
}

impl From<&FogConfig> for FogState {
    fn from(config: &FogConfig) -> Self {
        Self {
            enabled: config.enabled,
            density: config.density.clamp(0.0, 1.0),
            step: config.step,
        }
    }
}

impl FogState {
    pub fn thicken(&mut self) {
        self.density = (self.density + self.step).min(1.0);
    }

    pub fn thin(&mut self) {
        self.density = (self.density - self.step).max(0.0);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PreviewState {
    pub active: bool,
    pub angle: f32,
}

/// Render switches flipped from the keyboard
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderToggles {
    pub fill_mode: FillMode,
    pub msaa: bool,
    pub spotlight: bool,
    pub show_depth_map: bool,
}

/// Transform of one draw, shared by the depth pass and the lit pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectTransform {
    pub mesh: MeshHandle,
    pub model: Matrix4<f32>,
    pub normal: Matrix3<f32>,
}

/// Everything the passes need for one frame, derived once
#[derive(Debug, Clone, PartialEq)]
pub struct FrameMatrices {
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub light_space: Matrix4<f32>,
    pub light_dir_eye: Vector3<f32>,
    pub objects: Vec<ObjectTransform>,
    pub light_marker: Matrix4<f32>,
    /// View with the translation stripped, for the skybox
    pub skybox_view: Matrix4<f32>,
}

#[derive(Debug, Clone)]
pub struct SceneState {
    pub camera: Camera,
    pub look: MouseLook,
    pub camera_speed: f32,
    /// Whole-scene rotation about Y, degrees
    pub scene_angle: f32,
    /// Light rotation about Y, degrees
    pub light_angle: f32,
    pub light_dir: Vector3<f32>,
    pub light_color: Vector3<f32>,
    pub light: LightConfig,
    pub frustum: ShadowFrustum,
    pub spotlight: Spotlight,
    pub fog: FogState,
    pub preview: PreviewState,
    pub toggles: RenderToggles,
    pub objects: Vec<AnimatedObject>,
    pub frame_count: u64,
}

impl SceneState {
    pub fn new(config: &ViewerConfig) -> Self {
        let camera = Camera::new(
            config.camera.position(),
            config.camera.target(),
            config.camera.up(),
        );

        Self {
            camera,
            look: MouseLook::new(
                config.camera.initial_yaw,
                config.camera.initial_pitch,
                config.camera.mouse_sensitivity,
            ),
            camera_speed: config.camera.speed,
            scene_angle: 0.0,
            light_angle: 0.0,
            light_dir: Vector3::from(config.light.direction),
            light_color: Vector3::from(config.light.color),
            light: config.light.clone(),
            frustum: ShadowFrustum::from(&config.shadow),
            spotlight: Spotlight::from(&config.spotlight),
            fog: FogState::from(&config.fog),
            preview: PreviewState::default(),
            toggles: RenderToggles {
                fill_mode: FillMode::Fill,
                msaa: config.render.msaa,
                spotlight: config.spotlight.enabled,
                show_depth_map: false,
            },
            objects: farm_objects(),
            frame_count: 0,
        }
    }

    /// Advance every animation by one frame and apply the preview orbit
    pub fn update(&mut self) {
        for object in &mut self.objects {
            object.animation.advance();
        }

        if self.preview.active {
            self.preview.angle += PREVIEW_STEP;
            self.camera.scene_preview(self.preview.angle);
        }

        self.frame_count += 1;
        if self.frame_count % 600 == 0 {
            log::debug!(
                "[SceneState::update] Frame {} [{}]: scene {:.1}°, light {:.1}°, fog {} ({:.4}), preview {}",
                self.frame_count,
                self.object_names().join(", "),
                self.scene_angle,
                self.light_angle,
                self.fog.enabled,
                self.fog.density,
                self.preview.active
            );
        }
    }

    /// Names of the drawn objects in slot order
    pub fn object_names(&self) -> Vec<&'static str> {
        self.objects.iter().map(|object| object.name).collect()
    }

    /// Rotation applied to every scene object
    pub fn base_model(&self) -> Matrix4<f32> {
        Matrix4::from_angle_y(Deg(self.scene_angle))
    }

    pub fn light_space_matrix(&self) -> Matrix4<f32> {
        lighting::light_space_matrix(self.light_dir, self.light_angle, self.camera.target, &self.frustum)
    }

    /// Derive this frame's matrices. Call after `update` so both passes see
    /// the same transforms.
    pub fn frame(&self, projection: Matrix4<f32>) -> FrameMatrices {
        let view = self.camera.view_matrix();
        let base = self.base_model();

        let objects = self
            .objects
            .iter()
            .map(|object| {
                let model = object.animation.model_matrix(base);
                ObjectTransform {
                    mesh: object.mesh,
                    model,
                    normal: lighting::normal_matrix(view, model),
                }
            })
            .collect();

        let mut skybox_view = view;
        skybox_view.w = cgmath::Vector4::new(0.0, 0.0, 0.0, 1.0);

        FrameMatrices {
            view,
            projection,
            light_space: self.light_space_matrix(),
            light_dir_eye: lighting::light_direction_eye(view, self.light_angle, self.light_dir),
            objects,
            light_marker: lighting::light_marker_model(self.light_angle, &self.light),
            skybox_view,
        }
    }

    pub fn tree_scale(&self) -> Option<f32> {
        self.objects.iter().find_map(|object| match (&object.animation, object.mesh) {
            (Animation::Pulse { wave, .. }, TREE_MESH) => Some(wave.value),
            _ => None,
        })
    }

    pub fn wanderer_offset(&self) -> Option<f32> {
        self.objects.iter().find_map(|object| match (&object.animation, object.mesh) {
            (Animation::Wander { wave }, WANDERER_MESH) => Some(wave.value),
            _ => None,
        })
    }
}

/// The four props of the farm, in draw order
pub fn farm_objects() -> Vec<AnimatedObject> {
    vec![
        AnimatedObject::new("scene", SCENE_MESH, Animation::Static),
        AnimatedObject::new(
            "tree",
            TREE_MESH,
            Animation::Pulse {
                anchor: TREE_ANCHOR,
                wave: TriangleWave::new(0.5, 0.5, 2.0, 0.01),
            },
        ),
        AnimatedObject::new(
            "scarecrow",
            SCARECROW_MESH,
            Animation::Spin {
                anchor: SCARECROW_ANCHOR,
                angle: Rad(0.0),
                step: Rad(0.01),
            },
        ),
        // Same scalar on X and Z: the wanderer walks the diagonal
        AnimatedObject::new(
            "wanderer",
            WANDERER_MESH,
            Animation::Wander {
                wave: TriangleWave::new(0.0, 0.0, 10.0, 0.01),
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::perspective_projection;
    use cgmath::{InnerSpace, SquareMatrix, Vector4};

    fn scene() -> SceneState {
        SceneState::new(&ViewerConfig::default())
    }

    #[test]
    fn test_depth_and_lit_passes_share_transforms() {
        let mut state = scene();
        for _ in 0..37 {
            state.update();
        }
        let projection = perspective_projection(45.0, 800, 600, 0.1, 1000.0);
        let a = state.frame(projection);
        let b = state.frame(projection);
        assert_eq!(a, b);
        assert_eq!(a.objects.len(), 4);
    }

    #[test]
    fn test_static_scene_uses_base_rotation() {
        let mut state = scene();
        state.scene_angle = 30.0;
        let frame = state.frame(Matrix4::identity());
        assert_eq!(frame.objects[0].mesh, SCENE_MESH);
        assert_eq!(frame.objects[0].model, Matrix4::from_angle_y(Deg(30.0)));
    }

    #[test]
    fn test_objects_are_named_in_slot_order() {
        let state = scene();
        assert_eq!(state.object_names(), vec!["scene", "tree", "scarecrow", "wanderer"]);
        assert_eq!(state.objects[1].mesh, TREE_MESH);
        assert_eq!(state.objects[2].mesh, SCARECROW_MESH);
    }

    #[test]
    fn test_rotated_scene_carries_prop_anchors() {
        let mut state = scene();
        for _ in 0..25 {
            state.scene_angle += ROTATION_STEP;
            state.update();
        }
        let base = state.base_model();
        let frame = state.frame(Matrix4::identity());

        for (slot, mesh, anchor) in [(1, TREE_MESH, TREE_ANCHOR), (2, SCARECROW_MESH, SCARECROW_ANCHOR)] {
            let object = &frame.objects[slot];
            assert_eq!(object.mesh, mesh);
            let landed = object.model * anchor.extend(1.0);
            let expected = base * anchor.extend(1.0);
            assert!(
                (landed - expected).magnitude() < 1e-4,
                "{:?} anchor at {:?}, expected {:?}",
                mesh,
                landed,
                expected
            );
        }
    }

    #[test]
    fn test_animation_bounds_hold_over_many_frames() {
        let mut state = scene();
        for _ in 0..5_000 {
            state.update();
            let scale = state.tree_scale().unwrap();
            let offset = state.wanderer_offset().unwrap();
            assert!((0.5..=2.0).contains(&scale));
            assert!((0.0..=10.0).contains(&offset));
        }
    }

    #[test]
    fn test_preview_advances_only_while_active() {
        let mut state = scene();
        state.update();
        assert_eq!(state.preview.angle, 0.0);

        state.preview.active = true;
        state.update();
        state.update();
        assert!((state.preview.angle - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_skybox_view_has_no_translation() {
        let mut state = scene();
        state.camera.position = cgmath::Point3::new(40.0, 3.0, -12.0);
        let frame = state.frame(Matrix4::identity());
        assert_eq!(frame.skybox_view.w, Vector4::new(0.0, 0.0, 0.0, 1.0));
        assert_eq!(frame.skybox_view.x, frame.view.x);
    }

    #[test]
    fn test_fog_density_clamps() {
        let mut fog = FogState { enabled: true, density: 0.99995, step: 0.0001 };
        fog.thicken();
        assert_eq!(fog.density, 1.0);

        let mut fog = FogState { enabled: true, density: 0.00005, step: 0.0001 };
        fog.thin();
        assert_eq!(fog.density, 0.0);
    }
}
