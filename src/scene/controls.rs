//! Keyboard and mouse bindings
//!
//! Held keys act every frame; M, F, I and Escape act once per press.

use super::{FillMode, SceneState, ROTATION_STEP};
use crate::camera::MoveDirection;
use crate::input::{InputState, KeyCode};

/// Window-level work the frame loop has to carry out after the bindings ran
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameRequests {
    pub close: bool,
    pub toggle_fullscreen: bool,
}

const MOVES: [(KeyCode, MoveDirection); 4] = [
    (KeyCode::KeyW, MoveDirection::Forward),
    (KeyCode::KeyS, MoveDirection::Backward),
    (KeyCode::KeyA, MoveDirection::Left),
    (KeyCode::KeyD, MoveDirection::Right),
];

/// Apply this frame's input to the scene
pub fn apply_input(scene: &mut SceneState, input: &InputState) -> FrameRequests {
    let mut requests = FrameRequests::default();

    let (dx, dy) = input.get_mouse_delta();
    if scene.look.apply_delta(dx, dy) {
        scene.camera.rotate(scene.look.pitch, scene.look.yaw);
    }

    if input.was_key_just_pressed(KeyCode::Escape) {
        log::info!("[controls] Escape pressed, closing");
        requests.close = true;
    }
    if input.was_key_just_pressed(KeyCode::KeyF) {
        requests.toggle_fullscreen = true;
    }
    if input.was_key_just_pressed(KeyCode::KeyI) {
        scene.camera.log_state();
    }
    if input.was_key_just_pressed(KeyCode::KeyM) {
        scene.toggles.show_depth_map = !scene.toggles.show_depth_map;
        log::info!("[controls] Depth map view: {}", scene.toggles.show_depth_map);
    }

    apply_toggles(scene, input);

    if input.is_key_pressed(KeyCode::KeyQ) {
        scene.scene_angle -= ROTATION_STEP;
    }
    if input.is_key_pressed(KeyCode::KeyE) {
        scene.scene_angle += ROTATION_STEP;
    }
    if input.is_key_pressed(KeyCode::KeyK) {
        scene.light_angle -= ROTATION_STEP;
    }
    if input.is_key_pressed(KeyCode::KeyL) {
        scene.light_angle += ROTATION_STEP;
    }

    if input.is_key_pressed(KeyCode::KeyY) {
        scene.fog.thicken();
    }
    if input.is_key_pressed(KeyCode::KeyU) {
        scene.fog.thin();
    }

    for (key, direction) in MOVES {
        if input.is_key_pressed(key) {
            scene.camera.move_camera(direction, scene.camera_speed);
        }
    }

    requests
}

/// On/off pairs: held keys, logged at info on a change and at debug otherwise
fn apply_toggles(scene: &mut SceneState, input: &InputState) {
    let pressed = |key| input.is_key_pressed(key);

    switch(pressed(KeyCode::KeyZ), &mut scene.preview.active, true, "Scene preview");
    switch(pressed(KeyCode::KeyX), &mut scene.preview.active, false, "Scene preview");

    for (key, mode) in [
        (KeyCode::Digit1, FillMode::Line),
        (KeyCode::Digit2, FillMode::Point),
        (KeyCode::Digit3, FillMode::Fill),
    ] {
        if !pressed(key) {
            continue;
        }
        if scene.toggles.fill_mode == mode {
            log::debug!("[controls] Polygon mode already {:?}", mode);
        } else {
            scene.toggles.fill_mode = mode;
            log::info!("[controls] Polygon mode: {:?}", mode);
        }
    }

    switch(pressed(KeyCode::Digit4), &mut scene.toggles.msaa, true, "Multisampling");
    switch(pressed(KeyCode::Digit5), &mut scene.toggles.msaa, false, "Multisampling");
    switch(pressed(KeyCode::KeyO), &mut scene.toggles.spotlight, true, "Spotlight");
    switch(pressed(KeyCode::KeyP), &mut scene.toggles.spotlight, false, "Spotlight");
    switch(pressed(KeyCode::KeyR), &mut scene.fog.enabled, true, "Fog");
    switch(pressed(KeyCode::KeyT), &mut scene.fog.enabled, false, "Fog");
}

/// Drive a flag towards `target` while its key is held.
/// Returns whether the flag changed.
fn switch(held: bool, flag: &mut bool, target: bool, label: &str) -> bool {
    if !held {
        return false;
    }
    let state = if target { "on" } else { "off" };
    if *flag == target {
        log::debug!("[controls] {} already {}", label, state);
        return false;
    }
    *flag = target;
    log::info!("[controls] {} {}", label, state);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewerConfig;
    use cgmath::InnerSpace;
    use winit::event::ElementState;

    fn scene() -> SceneState {
        SceneState::new(&ViewerConfig::default())
    }

    fn hold(input: &mut InputState, key: KeyCode) {
        input.process_key(key, ElementState::Pressed);
    }

    #[test]
    fn test_held_key_rotates_every_frame() {
        let mut scene = scene();
        let mut input = InputState::new();
        hold(&mut input, KeyCode::KeyE);
        for _ in 0..10 {
            apply_input(&mut scene, &input);
            input.end_frame();
        }
        assert_eq!(scene.scene_angle, 10.0);
    }

    #[test]
    fn test_depth_map_toggles_once_per_press() {
        let mut scene = scene();
        let mut input = InputState::new();
        hold(&mut input, KeyCode::KeyM);
        for _ in 0..5 {
            apply_input(&mut scene, &input);
            input.end_frame();
        }
        assert!(scene.toggles.show_depth_map);

        input.process_key(KeyCode::KeyM, ElementState::Released);
        hold(&mut input, KeyCode::KeyM);
        apply_input(&mut scene, &input);
        assert!(!scene.toggles.show_depth_map);
    }

    #[test]
    fn test_fullscreen_and_close_are_requests() {
        let mut scene = scene();
        let mut input = InputState::new();
        hold(&mut input, KeyCode::KeyF);
        hold(&mut input, KeyCode::Escape);
        let requests = apply_input(&mut scene, &input);
        assert!(requests.toggle_fullscreen);
        assert!(requests.close);

        input.end_frame();
        assert_eq!(apply_input(&mut scene, &input), FrameRequests::default());
    }

    #[test]
    fn test_mouse_motion_turns_camera() {
        let mut scene = scene();
        let before = scene.camera.front;
        let mut input = InputState::new();
        input.process_mouse_motion((100.0, 0.0));
        apply_input(&mut scene, &input);

        assert!((scene.look.yaw - (-90.0 + 15.0)).abs() < 1e-4);
        assert!((scene.camera.front - before).magnitude() > 1e-3);
    }

    #[test]
    fn test_no_motion_leaves_front_untouched() {
        let mut scene = scene();
        let before = scene.camera.front;
        apply_input(&mut scene, &InputState::new());
        assert_eq!(scene.camera.front, before);
    }

    #[test]
    fn test_fill_mode_and_switches() {
        let mut scene = scene();
        let mut input = InputState::new();
        for key in [KeyCode::Digit1, KeyCode::Digit5, KeyCode::KeyO, KeyCode::KeyR, KeyCode::KeyZ] {
            hold(&mut input, key);
        }
        apply_input(&mut scene, &input);

        assert_eq!(scene.toggles.fill_mode, FillMode::Line);
        assert!(!scene.toggles.msaa);
        assert!(scene.toggles.spotlight);
        assert!(scene.fog.enabled);
        assert!(scene.preview.active);
    }

    #[test]
    fn test_switch_changes_only_towards_target() {
        let mut flag = false;
        assert!(!switch(false, &mut flag, true, "Fog"));
        assert!(!flag);

        assert!(switch(true, &mut flag, true, "Fog"));
        assert!(flag);

        // Holding the key on later frames is a no-op
        assert!(!switch(true, &mut flag, true, "Fog"));
        assert!(flag);

        assert!(switch(true, &mut flag, false, "Fog"));
        assert!(!flag);
    }

    #[test]
    fn test_held_toggle_keeps_state_across_frames() {
        let mut scene = scene();
        let mut input = InputState::new();
        hold(&mut input, KeyCode::KeyR);
        hold(&mut input, KeyCode::Digit2);
        for _ in 0..3 {
            apply_input(&mut scene, &input);
            input.end_frame();
        }
        assert!(scene.fog.enabled);
        assert_eq!(scene.toggles.fill_mode, FillMode::Point);
    }

    #[test]
    fn test_fog_density_steps_while_held() {
        let mut scene = scene();
        let mut input = InputState::new();
        hold(&mut input, KeyCode::KeyY);
        for _ in 0..100 {
            apply_input(&mut scene, &input);
        }
        assert!((scene.fog.density - 0.015).abs() < 1e-5);
    }
}
