//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and Window, and wires them to the GPU layer and
//! the render-loop lifecycle.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeEvent};
