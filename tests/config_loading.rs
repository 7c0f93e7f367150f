// Configuration loading from disk

use farm_viewer::config::ViewerConfig;
use farm_viewer::scene::SceneState;
use farm_viewer::ViewerError;
use std::io::Write;
use std::path::PathBuf;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_overrides_feed_scene_state() {
    let file = write_config(
        r#"
[camera]
position = [1.0, 2.0, 3.0]
speed = 0.5

[fog]
enabled = true
density = 0.02

[spotlight]
enabled = true
"#,
    );

    let config = ViewerConfig::load(file.path()).unwrap();
    assert_eq!(config.camera.position, [1.0, 2.0, 3.0]);

    let scene = SceneState::new(&config);
    assert_eq!(scene.camera.position, cgmath::Point3::new(1.0, 2.0, 3.0));
    assert_eq!(scene.camera_speed, 0.5);
    assert!(scene.fog.enabled);
    assert!((scene.fog.density - 0.02).abs() < 1e-6);
    assert!(scene.toggles.spotlight);
}

#[test]
fn test_resolve_with_explicit_path() {
    let file = write_config("[shadow]\nresolution = 1024\n");
    let config = ViewerConfig::resolve(Some(file.path().to_path_buf())).unwrap();
    assert_eq!(config.shadow.resolution, 1024);
}

#[test]
fn test_missing_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing: PathBuf = dir.path().join("absent.toml");

    let result = ViewerConfig::load(&missing);
    assert!(matches!(result, Err(ViewerError::Config { .. })));
}

#[test]
fn test_malformed_toml_names_the_file() {
    let file = write_config("[window\nwidth = ");
    let err = ViewerConfig::load(file.path()).unwrap_err();
    assert!(err.to_string().contains(&file.path().display().to_string()));
}

#[test]
fn test_wrong_skybox_face_count_rejected() {
    let file = write_config("[assets]\nskybox = [\"a.jpg\", \"b.jpg\"]\n");
    let result = ViewerConfig::load(file.path());
    assert!(matches!(result, Err(ViewerError::Config { .. })));
}
