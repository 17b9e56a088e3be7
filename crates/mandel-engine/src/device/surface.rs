use winit::dpi::PhysicalSize;

/// Format of the offscreen image compute kernels write when the surface cannot be
/// a storage target. Storage support for it is guaranteed by WebGPU.
pub(crate) const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Presentable formats a compute kernel can write directly, in preference order.
const STORAGE_CANDIDATES: [wgpu::TextureFormat; 2] = [
    wgpu::TextureFormat::Rgba8Unorm,
    wgpu::TextureFormat::Bgra8Unorm,
];

pub(crate) fn choose_surface_format(
    formats: &[wgpu::TextureFormat],
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if formats.is_empty() {
        return None;
    }

    let preferred: &[wgpu::TextureFormat] = if prefer_srgb {
        &[
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ]
    } else {
        &[
            wgpu::TextureFormat::Bgra8Unorm,
            wgpu::TextureFormat::Rgba8Unorm,
        ]
    };

    preferred
        .iter()
        .copied()
        .find(|f| formats.contains(f))
        .or(Some(formats[0]))
}

/// Picks a surface format compute kernels can write as a storage texture.
///
/// `supports_storage` reports whether the adapter (with any features it would
/// need enabled) allows `STORAGE_BINDING` on a format.
pub(crate) fn choose_storage_format(
    formats: &[wgpu::TextureFormat],
    supports_storage: impl Fn(wgpu::TextureFormat) -> bool,
) -> Option<wgpu::TextureFormat> {
    STORAGE_CANDIDATES
        .iter()
        .copied()
        .find(|f| formats.contains(f) && supports_storage(*f))
}

/// WGSL spelling of a storage texel format.
///
/// Only the formats this module can select are covered.
pub fn wgsl_storage_format(format: wgpu::TextureFormat) -> Option<&'static str> {
    match format {
        wgpu::TextureFormat::Rgba8Unorm => Some("rgba8unorm"),
        wgpu::TextureFormat::Bgra8Unorm => Some("bgra8unorm"),
        _ => None,
    }
}

pub(crate) fn choose_alpha_mode(
    modes: &[wgpu::CompositeAlphaMode],
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| modes.contains(m))
        .or_else(|| modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Updates the tracked size and reconfigures the surface.
///
/// wgpu cannot configure a 0x0 surface; in that case only the tracked size
/// changes and configuration is deferred to the next non-zero resize.
/// Returns whether the surface was reconfigured.
pub(crate) fn apply_resize(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &mut wgpu::SurfaceConfiguration,
    size: &mut PhysicalSize<u32>,
    new_size: PhysicalSize<u32>,
) -> bool {
    *size = new_size;

    if new_size.width == 0 || new_size.height == 0 {
        return false;
    }

    config.width = new_size.width;
    config.height = new_size.height;
    surface.configure(device, config);
    true
}
