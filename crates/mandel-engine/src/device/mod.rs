//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface (swapchain) with a storage-capable drawable
//! - acquiring frames, resolving offscreen output, presenting
//! - classifying per-frame surface errors

mod blit;
mod error;
mod frame;
mod gpu;
mod init;
mod surface;

pub use error::SurfaceErrorAction;
pub use frame::{DrawablePath, GpuFrame};
pub use gpu::Gpu;
pub use init::{GpuInit, raise_compute_limits};
pub use surface::wgsl_storage_format;
