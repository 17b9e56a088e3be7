//! GPU rendering helpers.
//!
//! A frame has two phases: compute passes write the frame image through a
//! `StorageTarget`, then render passes draw over the presentable surface through
//! a `RenderTarget`. Each renderer owns its GPU resources and creates them lazily.

mod ctx;
mod text;

pub use ctx::{RenderCtx, RenderTarget, StorageTarget};
pub use text::{TextRenderer, TextRun};
