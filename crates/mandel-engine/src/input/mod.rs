//! Input subsystem.
//!
//! Public API is platform-agnostic and does not expose winit types.
//! `platform` translates window-system events into `InputEvent`s.

pub mod platform;

mod tracker;
mod types;

pub use tracker::KeyTracker;
pub use types::{InputEvent, Key, KeyState};
