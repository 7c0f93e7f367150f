//! Per-object animation strategies
//!
//! Each animated prop is a descriptor (mesh + strategy) instead of a block of
//! hand-written statements. A strategy knows how to advance itself by one frame
//! and how to turn the shared base matrix into the prop's model matrix.

use cgmath::{Matrix4, Rad, Vector3};

/// Value bouncing linearly between two bounds.
///
/// Reflects at the bounds: the value is clamped onto the bound it crossed and
/// the direction flips, so it never leaves `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleWave {
    pub value: f32,
    pub min: f32,
    pub max: f32,
    step: f32,
}

impl TriangleWave {
    pub fn new(start: f32, min: f32, max: f32, step: f32) -> Self {
        Self {
            value: start.clamp(min, max),
            min,
            max,
            step: step.abs(),
        }
    }

    /// Signed per-frame increment
    pub fn step(&self) -> f32 {
        self.step
    }

    pub fn advance(&mut self) {
        if self.value >= self.max {
            self.step = -self.step.abs();
        } else if self.value <= self.min {
            self.step = self.step.abs();
        }

        self.value += self.step;

        if self.value > self.max {
            self.value = self.max;
            self.step = -self.step.abs();
        } else if self.value < self.min {
            self.value = self.min;
            self.step = self.step.abs();
        }
    }
}

/// Index into the renderer's loaded model list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub enum Animation {
    /// Drawn with the base matrix unchanged
    Static,
    /// Uniform scale about `anchor` driven by a triangle wave
    Pulse { anchor: Vector3<f32>, wave: TriangleWave },
    /// Rotation about world Y through `anchor`; the angle only ever grows
    Spin { anchor: Vector3<f32>, angle: Rad<f32>, step: Rad<f32> },
    /// Translation by the wave value on X and Z alike
    Wander { wave: TriangleWave },
}

impl Animation {
    pub fn advance(&mut self) {
        match self {
            Animation::Static => {}
            Animation::Pulse { wave, .. } | Animation::Wander { wave } => wave.advance(),
            Animation::Spin { angle, step, .. } => *angle += *step,
        }
    }

    pub fn model_matrix(&self, base: Matrix4<f32>) -> Matrix4<f32> {
        match self {
            Animation::Static => base,
            Animation::Pulse { anchor, wave } => {
                base * Matrix4::from_translation(*anchor)
                    * Matrix4::from_scale(wave.value)
                    * Matrix4::from_translation(-*anchor)
            }
            Animation::Spin { anchor, angle, .. } => {
                base * Matrix4::from_translation(*anchor)
                    * Matrix4::from_angle_y(*angle)
                    * Matrix4::from_translation(-*anchor)
            }
            Animation::Wander { wave } => {
                base * Matrix4::from_translation(Vector3::new(wave.value, 0.0, wave.value))
            }
        }
    }
}

/// One drawable prop of the scene
#[derive(Debug, Clone, PartialEq)]
pub struct AnimatedObject {
    pub name: &'static str,
    pub mesh: MeshHandle,
    pub animation: Animation,
}

impl AnimatedObject {
    pub fn new(name: &'static str, mesh: MeshHandle, animation: Animation) -> Self {
        Self { name, mesh, animation }
    }
}
