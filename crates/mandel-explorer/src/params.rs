//! Viewport and iteration parameters shared with the compute kernel.

use bytemuck::{Pod, Zeroable};

pub const MIN_ITERATIONS: u32 = 64;
pub const MAX_ITERATIONS: u32 = 2048;
pub const ITERATION_STEP: u32 = 64;

/// Values a reset restores.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ParamDefaults {
    /// World units per pixel, `[x, y]`.
    pub scale: [f32; 2],
    /// Added to the drawable center when placing the initial pan.
    pub pan_offset: [f32; 2],
    pub max_iterations: u32,
}

impl Default for ParamDefaults {
    fn default() -> Self {
        Self {
            scale: [0.002, 0.002],
            pan_offset: [0.0, 0.0],
            max_iterations: MIN_ITERATIONS,
        }
    }
}

/// GPU parameter record.
///
/// Field order and layout must match `struct Parameters` in
/// `shaders/mandelbrot.wgsl`: seven 4-byte fields, 28 bytes, no padding.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Parameters {
    pub width: f32,
    pub height: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub pan_x: f32,
    pub pan_y: f32,
    pub max_iterations: u32,
}

impl Parameters {
    /// Builds defaults for a `width` x `height` drawable.
    pub fn new(defaults: &ParamDefaults, width: u32, height: u32) -> Self {
        let (width, height) = (width as f32, height as f32);
        Self {
            width,
            height,
            scale_x: defaults.scale[0],
            scale_y: defaults.scale[1],
            pan_x: width / 2.0 + defaults.pan_offset[0],
            pan_y: height / 2.0 + defaults.pan_offset[1],
            max_iterations: clamp_iterations(defaults.max_iterations as i64),
        }
    }

    /// Replaces every field with defaults sized to the current drawable.
    pub fn reset(&mut self, defaults: &ParamDefaults) {
        *self = Self::new(defaults, self.width as u32, self.height as u32);
    }

    /// Tracks a new drawable size. Nothing else changes.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width as f32;
        self.height = height as f32;
    }

    /// Multiplies both scales by `factor`.
    pub fn zoom(&mut self, factor: f32) {
        self.scale_x *= factor;
        self.scale_y *= factor;
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Adds `steps` iteration steps (negative to remove), then clamps.
    pub fn step_iterations(&mut self, steps: i64) {
        let next = self.max_iterations as i64 + steps * ITERATION_STEP as i64;
        self.max_iterations = clamp_iterations(next);
    }
}

/// Clamps to `[MIN_ITERATIONS, MAX_ITERATIONS]` and snaps down to a multiple of
/// `ITERATION_STEP`.
pub fn clamp_iterations(value: i64) -> u32 {
    let clamped = value.clamp(MIN_ITERATIONS as i64, MAX_ITERATIONS as i64) as u32;
    clamped - clamped % ITERATION_STEP
}
