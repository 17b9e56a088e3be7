/// Represents a single acquired frame.
///
/// This object is short-lived and must be finalized promptly through
/// [`Gpu::submit`](super::Gpu::submit). Holding the surface texture prevents
/// acquisition of subsequent frames.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,

    /// Render-attachment view of the surface texture.
    pub surface_view: wgpu::TextureView,

    /// Storage view compute kernels write to: the surface itself on the direct
    /// path, the offscreen image otherwise.
    pub storage_view: wgpu::TextureView,

    pub encoder: wgpu::CommandEncoder,

    /// Set once the offscreen image has been copied onto the surface.
    pub(crate) resolved: bool,
}

/// Where compute output lands before presentation.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DrawablePath {
    /// Kernels write the surface texture.
    Direct,
    /// Kernels write an offscreen texture that is blitted onto the surface.
    Offscreen,
}
