/// GPU and surface settings used when a window's `Gpu` is created.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Pick an sRGB surface format on the offscreen path.
    ///
    /// Kernels write display-ready values into a unorm image, so an sRGB
    /// surface would brighten them; off by default.
    pub prefer_srgb: bool,

    /// Bind the surface texture itself as the kernel's storage target when
    /// surface, format and adapter allow it. Otherwise (or when off) kernels
    /// write an offscreen image that is blitted onto the surface.
    pub storage_drawable: bool,

    /// FIFO paces redraws to the display refresh.
    pub present_mode: wgpu::PresentMode,

    /// Requested alpha mode; ignored when the surface does not offer it.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Extra device features. `BGRA8UNORM_STORAGE` is added on its own when a
    /// direct BGRA drawable is chosen.
    pub required_features: wgpu::Features,

    /// Baseline device limits. The compute workgroup limits are raised to
    /// the adapter's when the device is created.
    pub required_limits: wgpu::Limits,

    /// Hint only; backends may clamp it.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: false,
            storage_drawable: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            desired_maximum_frame_latency: 2,
        }
    }
}

/// Raises the compute workgroup limits of `requested` to what `adapter`
/// supports. A device reports the limits it was requested with, not the
/// adapter's.
pub fn raise_compute_limits(requested: wgpu::Limits, adapter: &wgpu::Limits) -> wgpu::Limits {
    wgpu::Limits {
        max_compute_invocations_per_workgroup: requested
            .max_compute_invocations_per_workgroup
            .max(adapter.max_compute_invocations_per_workgroup),
        max_compute_workgroup_size_x: requested
            .max_compute_workgroup_size_x
            .max(adapter.max_compute_workgroup_size_x),
        max_compute_workgroup_size_y: requested
            .max_compute_workgroup_size_y
            .max(adapter.max_compute_workgroup_size_y),
        ..requested
    }
}
