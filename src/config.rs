//! Viewer configuration
//!
//! Every field has a default matching the hand-authored farm scene, so an
//! empty or missing TOML file yields a working viewer.

use crate::error::{ViewerError, ViewerResult};
use cgmath::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "farm-viewer.toml";

/// Main viewer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub light: LightConfig,
    pub shadow: ShadowConfig,
    pub fog: FogConfig,
    pub spotlight: SpotlightConfig,
    pub render: RenderConfig,
    pub assets: AssetConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen_size: [u32; 2],
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Farm Viewer".to_string(),
            width: 800,
            height: 600,
            fullscreen_size: [1400, 800],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub up: [f32; 3],
    pub speed: f32,
    pub mouse_sensitivity: f32,
    pub initial_yaw: f32,
    pub initial_pitch: f32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 6.0, 5.5],
            target: [0.0, 0.0, 0.0],
            up: [0.0, 1.0, 0.0],
            speed: 0.1,
            mouse_sensitivity: 0.15,
            initial_yaw: -90.0,
            initial_pitch: 0.0,
            fov_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl CameraConfig {
    pub fn position(&self) -> Point3<f32> {
        Point3::from(self.position)
    }

    pub fn target(&self) -> Point3<f32> {
        Point3::from(self.target)
    }

    pub fn up(&self) -> Vector3<f32> {
        Vector3::from(self.up)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    /// Direction towards the light before rotation
    pub direction: [f32; 3],
    pub color: [f32; 3],
    pub marker_height: f32,
    pub marker_scale: f32,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            direction: [1.0, 1.0, 0.0],
            color: [1.0, 1.0, 1.0],
            marker_height: 20.0,
            marker_scale: 0.5,
        }
    }
}

/// Shadow map resolution and the orthographic light frustum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    pub resolution: u32,
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            resolution: 2048,
            left: -100.0,
            right: 50.0,
            bottom: -50.0,
            top: 50.0,
            near: 0.1,
            far: 200.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FogConfig {
    pub enabled: bool,
    pub density: f32,
    /// Density change per frame while Y/U is held
    pub step: f32,
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            density: 0.005,
            step: 0.0001,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotlightConfig {
    pub enabled: bool,
    pub inner_cutoff_degrees: f32,
    pub outer_cutoff_degrees: f32,
    pub position: [f32; 3],
    pub direction: [f32; 3],
}

impl Default for SpotlightConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            inner_cutoff_degrees: 10.0,
            outer_cutoff_degrees: 20.0,
            position: [0.0, 1.0, 0.0],
            direction: [0.0, 0.0, -1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub msaa: bool,
    pub clear_color: [f32; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            msaa: true,
            clear_color: [0.3, 0.3, 0.3],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub scene: PathBuf,
    pub tree: PathBuf,
    pub scarecrow: PathBuf,
    pub wanderer: PathBuf,
    /// Cubemap faces in +X, -X, +Y, -Y, +Z, -Z order
    pub skybox: Vec<PathBuf>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            scene: PathBuf::from("objects/Scene.obj"),
            tree: PathBuf::from("objects/tree/tree.obj"),
            scarecrow: PathBuf::from("objects/scarecrow/scarecrow.obj"),
            wanderer: PathBuf::from("objects/racoon/racoon.obj"),
            skybox: ["posx", "negx", "posy", "negy", "posz", "negz"]
                .iter()
                .map(|face| PathBuf::from(format!("skybox/{}.jpg", face)))
                .collect(),
        }
    }
}

impl AssetConfig {
    /// Model paths in mesh-handle order: scene, tree, scarecrow, wanderer
    pub fn meshes(&self) -> [(&'static str, &Path); 4] {
        [
            ("scene", self.scene.as_path()),
            ("tree", self.tree.as_path()),
            ("scarecrow", self.scarecrow.as_path()),
            ("wanderer", self.wanderer.as_path()),
        ]
    }
}

impl ViewerConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(source: &str, origin: &str) -> ViewerResult<Self> {
        let config: ViewerConfig =
            toml::from_str(source).map_err(|e| ViewerError::config(origin, e))?;
        config.validate(origin)?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> ViewerResult<Self> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let source = std::fs::read_to_string(path).map_err(|e| ViewerError::config(&origin, e))?;
        log::info!("[ViewerConfig::load] Loaded configuration from {}", origin);
        Self::from_toml_str(&source, &origin)
    }

    /// Resolve the configuration for this run: explicit path, then the
    /// default file if present, then built-in defaults.
    pub fn resolve(explicit: Option<PathBuf>) -> ViewerResult<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::load(fallback)
                } else {
                    log::info!("[ViewerConfig::resolve] No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self, origin: &str) -> ViewerResult<()> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ViewerError::config(origin, "window size must be non-zero"));
        }
        if self.shadow.resolution == 0 {
            return Err(ViewerError::config(origin, "shadow.resolution must be non-zero"));
        }
        if !(self.camera.fov_degrees > 0.0 && self.camera.fov_degrees < 180.0) {
            return Err(ViewerError::config(origin, "camera.fov_degrees must lie in (0, 180)"));
        }
        if !(self.camera.far > 0.0) {
            return Err(ViewerError::config(origin, "camera.far must be positive"));
        }
        if !(self.camera.near > 0.0) {
            return Err(ViewerError::config(origin, "camera.near must be positive"));
        }
        if self.camera.near >= self.camera.far {
            return Err(ViewerError::config(origin, "camera.near must be less than camera.far"));
        }
        if self.shadow.near >= self.shadow.far {
            return Err(ViewerError::config(origin, "shadow.near must be less than shadow.far"));
        }
        if !(0.0..=1.0).contains(&self.fog.density) {
            return Err(ViewerError::config(origin, "fog.density must lie in [0, 1]"));
        }
        if self.assets.skybox.len() != 6 {
            return Err(ViewerError::config(
                origin,
                format!("assets.skybox needs 6 faces, got {}", self.assets.skybox.len()),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = ViewerConfig::from_toml_str("", "inline").unwrap();
        assert_eq!(config, ViewerConfig::default());
        assert_eq!(config.camera.position, [0.0, 6.0, 5.5]);
        assert_eq!(config.shadow.resolution, 2048);
        assert!((config.fog.density - 0.005).abs() < f32::EPSILON);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = ViewerConfig::from_toml_str(
            "[fog]\nenabled = true\n\n[window]\nwidth = 1024\n",
            "inline",
        )
        .unwrap();
        assert!(config.fog.enabled);
        assert!((config.fog.step - 0.0001).abs() < f32::EPSILON);
        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 600);
    }

    fn rejection(document: &str) -> String {
        match ViewerConfig::from_toml_str(document, "inline") {
            Err(ViewerError::Config { message, .. }) => message,
            other => panic!("expected a config error, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_non_positive_near() {
        assert!(rejection("[camera]\nnear = 0.0\n").contains("camera.near must be positive"));
        assert!(rejection("[camera]\nnear = -0.5\nfar = 10.0\n").contains("camera.near must be positive"));
    }

    #[test]
    fn test_rejects_non_positive_far() {
        assert!(rejection("[camera]\nnear = -2.0\nfar = -1.0\n").contains("camera.far must be positive"));
        assert!(rejection("[camera]\nnear = -1.0\nfar = 0.0\n").contains("camera.far must be positive"));
    }

    #[test]
    fn test_rejects_fov_out_of_range() {
        for fov in ["0.0", "-10.0", "180.0", "270.0"] {
            let document = format!("[camera]\nfov_degrees = {}\n", fov);
            assert!(rejection(&document).contains("fov_degrees"), "fov {}", fov);
        }
    }

    #[test]
    fn test_accepted_camera_builds_a_projection() {
        let config = ViewerConfig::from_toml_str("[camera]\nfov_degrees = 179.0\nnear = 0.01\nfar = 5.0\n", "inline").unwrap();
        let projection = crate::camera::perspective_projection(
            config.camera.fov_degrees,
            config.window.width,
            config.window.height,
            config.camera.near,
            config.camera.far,
        );
        assert!(projection.x.x.is_finite() && projection.y.y.is_finite());
    }

    #[test]
    fn test_rejects_inverted_clip_planes() {
        let result = ViewerConfig::from_toml_str("[camera]\nnear = 10.0\nfar = 1.0\n", "inline");
        assert!(matches!(result, Err(ViewerError::Config { .. })));
    }

    #[test]
    fn test_rejects_wrong_skybox_face_count() {
        let result = ViewerConfig::from_toml_str("[assets]\nskybox = [\"a.jpg\"]\n", "inline");
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let result = ViewerConfig::from_toml_str("[window\nwidth = ", "broken.toml");
        match result {
            Err(ViewerError::Config { path, .. }) => assert_eq!(path, "broken.toml"),
            other => panic!("expected config error, got {:?}", other),
        }
    }
}
