//! Real-time Mandelbrot explorer on top of `mandel-engine`.
//!
//! A compute kernel renders the set into the window every frame; the keyboard
//! pans, zooms and changes the iteration depth; frame timing is measured at
//! GPU completion and shown as an overlay.

pub mod app;
pub mod controls;
pub mod kernel;
pub mod overlay;
pub mod params;

pub use app::ExplorerApp;
