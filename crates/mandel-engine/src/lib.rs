//! Mandel engine crate.
//!
//! Platform + GPU runtime for compute-driven, continuously redrawn windows:
//! device and drawable management, keyboard tracking, lifecycle gating,
//! GPU-completion frame timing and overlay text.

pub mod core;
pub mod device;
pub mod input;
pub mod lifecycle;
pub mod logging;
pub mod render;
pub mod text;
pub mod time;
pub mod window;
