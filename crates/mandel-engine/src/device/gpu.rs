use anyhow::{Context, Result};
use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use super::blit::Blitter;
use super::surface::{self, OFFSCREEN_FORMAT};
use super::init::raise_compute_limits;
use super::{DrawablePath, GpuFrame, GpuInit, SurfaceErrorAction};

/// Owns wgpu core objects and the surface configuration.
///
/// This type is the low-level rendering context:
/// - creates and stores Instance/Adapter/Device/Queue
/// - creates and configures the Surface (swapchain), storage-capable when possible
/// - acquires frames, resolves offscreen output and presents
pub struct Gpu<'w> {
    /// Kept alive for the lifetime of the surface.
    _instance: wgpu::Instance,

    /// Surface bound to the window.
    ///
    /// Surface lifetime is tied to the window; the window must outlive the `Gpu`.
    surface: wgpu::Surface<'w>,

    /// Selected adapter.
    _adapter: wgpu::Adapter,

    /// Logical device.
    device: wgpu::Device,

    /// Command queue.
    queue: wgpu::Queue,

    /// Active surface configuration.
    config: wgpu::SurfaceConfiguration,

    /// Current drawable size in physical pixels.
    size: PhysicalSize<u32>,

    path: DrawablePath,

    /// Offscreen target + copy pass; present only on `DrawablePath::Offscreen`.
    blitter: Option<Blitter>,
}

impl<'w> Gpu<'w> {
    /// Creates a GPU context bound to a window.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let GpuInit {
            prefer_srgb,
            storage_drawable,
            present_mode,
            alpha_mode,
            mut required_features,
            required_limits,
            desired_maximum_frame_latency,
        } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let info = adapter.get_info();
        log::info!("using adapter {} ({:?})", info.name, info.backend);

        let required_limits = raise_compute_limits(required_limits, &adapter.limits());
        log::debug!(
            "compute limits: {} invocations per workgroup, {}x{} max size",
            required_limits.max_compute_invocations_per_workgroup,
            required_limits.max_compute_workgroup_size_x,
            required_limits.max_compute_workgroup_size_y
        );

        let surface_caps = surface.get_capabilities(&adapter);

        // Decide the drawable before requesting the device: a BGRA storage
        // drawable needs a device feature.
        let storage_format = if storage_drawable
            && surface_caps.usages.contains(wgpu::TextureUsages::STORAGE_BINDING)
        {
            surface::choose_storage_format(&surface_caps.formats, |f| {
                supports_storage(&adapter, f)
            })
        } else {
            None
        };

        let (format, path) = match storage_format {
            Some(f) => {
                if f == wgpu::TextureFormat::Bgra8Unorm {
                    required_features |= wgpu::Features::BGRA8UNORM_STORAGE;
                }
                (f, DrawablePath::Direct)
            }
            None => {
                let f = surface::choose_surface_format(&surface_caps.formats, prefer_srgb)
                    .context("no supported surface formats")?;
                (f, DrawablePath::Offscreen)
            }
        };

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("mandel-engine device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let alpha_mode = surface::choose_alpha_mode(&surface_caps.alpha_modes, alpha_mode);

        let mut usage = wgpu::TextureUsages::RENDER_ATTACHMENT;
        if path == DrawablePath::Direct {
            usage |= wgpu::TextureUsages::STORAGE_BINDING;
        }

        let config = wgpu::SurfaceConfiguration {
            usage,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency,
        };

        surface.configure(&device, &config);

        let blitter = match path {
            DrawablePath::Direct => None,
            DrawablePath::Offscreen => {
                let mut blitter = Blitter::new(&device, format);
                blitter.resize(&device, size);
                Some(blitter)
            }
        };

        log::info!("drawable {format:?} via {path:?} path, {}x{}", size.width, size.height);

        Ok(Self {
            _instance: instance,
            surface,
            _adapter: adapter,
            device,
            queue,
            config,
            size,
            path,
            blitter,
        })
    }

    /// Returns the active surface format.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Returns the format of the texture compute kernels write.
    pub fn storage_format(&self) -> wgpu::TextureFormat {
        match self.path {
            DrawablePath::Direct => self.config.format,
            DrawablePath::Offscreen => OFFSCREEN_FORMAT,
        }
    }

    /// Returns the current drawable size (physical pixels).
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    /// Returns whether the drawable has a non-zero area.
    pub fn has_drawable(&self) -> bool {
        self.size.width > 0 && self.size.height > 0
    }

    /// Returns a reference to the logical device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// Returns a reference to the command queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Reconfigures the surface (and offscreen target) after a resize.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        surface::apply_resize(
            &self.surface,
            &self.device,
            &mut self.config,
            &mut self.size,
            new_size,
        );

        if let Some(blitter) = self.blitter.as_mut() {
            blitter.resize(&self.device, new_size);
        }
    }

    /// Acquires the next surface texture and creates an encoder.
    pub fn begin_frame(&self) -> std::result::Result<GpuFrame, SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let storage_view = match self.blitter.as_ref() {
            None => surface_texture
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default()),
            Some(blitter) => match blitter.storage_view() {
                Some(view) => view,
                // Size raced to zero between the caller's check and acquisition.
                None => return Err(SurfaceError::Outdated),
            },
        };

        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("mandel frame encoder"),
            });

        Ok(GpuFrame {
            surface_texture,
            surface_view,
            storage_view,
            encoder,
            resolved: false,
        })
    }

    /// Makes compute output visible on the surface view.
    ///
    /// No-op on the direct path and for frames already resolved.
    pub fn resolve(&self, frame: &mut GpuFrame) {
        if frame.resolved {
            return;
        }
        if let Some(blitter) = self.blitter.as_ref() {
            blitter.encode(&mut frame.encoder, &frame.surface_view);
        }
        frame.resolved = true;
    }

    /// Submits the recorded commands, registers `on_complete`, and presents.
    ///
    /// `on_complete` runs once the GPU has finished this submission, on whichever
    /// thread polls the device.
    pub fn submit<F>(&self, mut frame: GpuFrame, on_complete: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.resolve(&mut frame);

        let GpuFrame {
            surface_texture,
            surface_view,
            storage_view,
            encoder,
            ..
        } = frame;

        self.queue.submit(std::iter::once(encoder.finish()));
        self.queue.on_submitted_work_done(on_complete);

        drop(storage_view);
        drop(surface_view);
        surface_texture.present();
    }

    /// Converts a `SurfaceError` into a higher-level action, reconfiguring if needed.
    pub fn handle_surface_error(&mut self, err: SurfaceError) -> SurfaceErrorAction {
        let action = SurfaceErrorAction::for_error(&err);
        if action == SurfaceErrorAction::Reconfigured && self.has_drawable() {
            self.surface.configure(&self.device, &self.config);
        }
        action
    }

    /// Fires pending completion callbacks without blocking.
    pub fn poll(&self) {
        if let Err(e) = self.device.poll(wgpu::PollType::Poll) {
            log::warn!("device poll failed: {e}");
        }
    }
}

fn supports_storage(adapter: &wgpu::Adapter, format: wgpu::TextureFormat) -> bool {
    if format == wgpu::TextureFormat::Bgra8Unorm
        && !adapter.features().contains(wgpu::Features::BGRA8UNORM_STORAGE)
    {
        return false;
    }

    adapter
        .get_texture_format_features(format)
        .allowed_usages
        .contains(wgpu::TextureUsages::STORAGE_BINDING)
}
