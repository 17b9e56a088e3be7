/// What the frame loop does after a failed surface acquisition.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// The surface was configured again; the next frame acquires normally.
    Reconfigured,
    /// Drop this frame and carry on.
    SkipFrame,
    /// The device cannot continue; the loop exits.
    Fatal,
}

impl SurfaceErrorAction {
    /// Classifies an acquisition error. `Reconfigured` means the caller still
    /// has to reconfigure the surface.
    pub fn for_error(err: &wgpu::SurfaceError) -> Self {
        match err {
            wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => Self::Reconfigured,
            wgpu::SurfaceError::OutOfMemory => Self::Fatal,
            wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other => Self::SkipFrame,
        }
    }

    #[inline]
    pub fn is_fatal(self) -> bool {
        self == Self::Fatal
    }
}
