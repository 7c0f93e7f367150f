use std::collections::HashSet;
use winit::event::ElementState;
pub use winit::keyboard::KeyCode;

/// Mouse-look sensitivity applied to raw motion deltas
pub const MOUSE_SENSITIVITY: f32 = 0.15;

/// Pitch limit in degrees, short of straight up/down
pub const PITCH_LIMIT: f32 = 89.0;

/// Keyboard and mouse state written by window events and consumed once per frame
#[derive(Debug, Default)]
pub struct InputState {
    keys_pressed: HashSet<KeyCode>,
    keys_just_pressed: HashSet<KeyCode>,
    mouse_delta: (f32, f32),
    cursor_locked: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_key(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                // Auto-repeat arrives as repeated presses; only the first counts as an edge
                if self.keys_pressed.insert(key) {
                    self.keys_just_pressed.insert(key);
                }
            }
            ElementState::Released => {
                self.keys_pressed.remove(&key);
            }
        }
    }

    pub fn process_mouse_motion(&mut self, delta: (f64, f64)) {
        self.mouse_delta.0 += delta.0 as f32;
        self.mouse_delta.1 += delta.1 as f32;
    }

    /// Held this frame
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Went down since the last `end_frame`
    pub fn was_key_just_pressed(&self, key: KeyCode) -> bool {
        self.keys_just_pressed.contains(&key)
    }

    pub fn get_mouse_delta(&self) -> (f32, f32) {
        self.mouse_delta
    }

    pub fn clear_mouse_delta(&mut self) {
        self.mouse_delta = (0.0, 0.0);
    }

    /// Drop per-frame state once the frame has consumed it
    pub fn end_frame(&mut self) {
        self.keys_just_pressed.clear();
        self.clear_mouse_delta();
    }

    pub fn release_all(&mut self) {
        self.keys_pressed.clear();
        self.keys_just_pressed.clear();
        self.clear_mouse_delta();
    }

    pub fn set_cursor_locked(&mut self, locked: bool) {
        self.cursor_locked = locked;
    }

    pub fn is_cursor_locked(&self) -> bool {
        self.cursor_locked
    }
}

/// Yaw/pitch accumulated from mouse motion, in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouseLook {
    pub yaw: f32,
    pub pitch: f32,
    pub sensitivity: f32,
}

impl Default for MouseLook {
    fn default() -> Self {
        Self {
            yaw: -90.0,
            pitch: 0.0,
            sensitivity: MOUSE_SENSITIVITY,
        }
    }
}

impl MouseLook {
    pub fn new(yaw: f32, pitch: f32, sensitivity: f32) -> Self {
        Self {
            yaw,
            pitch: pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            sensitivity,
        }
    }

    /// Apply a raw motion delta (screen y grows downwards). Returns false when
    /// there was no motion, in which case the camera should not be touched.
    pub fn apply_delta(&mut self, dx: f32, dy: f32) -> bool {
        if dx == 0.0 && dy == 0.0 {
            return false;
        }

        self.yaw += dx * self.sensitivity;
        self.pitch = (self.pitch - dy * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_edge_fires_once() {
        let mut input = InputState::new();
        input.process_key(KeyCode::KeyM, ElementState::Pressed);
        assert!(input.was_key_just_pressed(KeyCode::KeyM));
        assert!(input.is_key_pressed(KeyCode::KeyM));

        input.end_frame();
        // Auto-repeat while held
        input.process_key(KeyCode::KeyM, ElementState::Pressed);
        assert!(!input.was_key_just_pressed(KeyCode::KeyM));
        assert!(input.is_key_pressed(KeyCode::KeyM));

        input.process_key(KeyCode::KeyM, ElementState::Released);
        assert!(!input.is_key_pressed(KeyCode::KeyM));
    }

    #[test]
    fn test_mouse_delta_accumulates_until_end_of_frame() {
        let mut input = InputState::new();
        input.process_mouse_motion((3.0, -1.0));
        input.process_mouse_motion((2.0, 4.0));
        assert_eq!(input.get_mouse_delta(), (5.0, 3.0));

        input.end_frame();
        assert_eq!(input.get_mouse_delta(), (0.0, 0.0));
    }

    #[test]
    fn test_pitch_clamps_both_ways() {
        let mut look = MouseLook::default();
        for _ in 0..100 {
            look.apply_delta(0.0, -50.0);
            assert!(look.pitch <= PITCH_LIMIT);
        }
        assert_eq!(look.pitch, PITCH_LIMIT);

        for _ in 0..100 {
            look.apply_delta(0.0, 50.0);
            assert!(look.pitch >= -PITCH_LIMIT);
        }
        assert_eq!(look.pitch, -PITCH_LIMIT);
    }

    #[test]
    fn test_yaw_is_unbounded() {
        let mut look = MouseLook::default();
        for _ in 0..100 {
            look.apply_delta(100.0, 0.0);
        }
        assert!((look.yaw - (-90.0 + 100.0 * 100.0 * MOUSE_SENSITIVITY)).abs() < 1e-2);
    }

    #[test]
    fn test_no_motion_reports_unchanged() {
        let mut look = MouseLook::default();
        assert!(!look.apply_delta(0.0, 0.0));
        assert_eq!(look, MouseLook::default());
    }
}
