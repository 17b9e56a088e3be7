//! Compute pipeline for the Mandelbrot kernel.

use mandel_engine::device::wgsl_storage_format;
use mandel_engine::render::{RenderCtx, StorageTarget};

use crate::params::Parameters;

const SHADER_TEMPLATE: &str = include_str!("shaders/mandelbrot.wgsl");

/// Rows per workgroup.
pub const WORKGROUP_HEIGHT: u32 = 10;

/// Workgroup shape `(x, y)` for `limits`.
///
/// Height is fixed at [`WORKGROUP_HEIGHT`]; width uses the rest of the
/// per-workgroup invocation budget, capped by the per-axis limits.
pub fn workgroup_shape(limits: &wgpu::Limits) -> (u32, u32) {
    let wy = WORKGROUP_HEIGHT.min(limits.max_compute_workgroup_size_y).max(1);
    let wx = (limits.max_compute_invocations_per_workgroup / WORKGROUP_HEIGHT)
        .min(limits.max_compute_workgroup_size_x)
        .max(1);
    (wx, wy)
}

/// Number of workgroups covering a `width` x `height` image with `shape`.
pub fn dispatch_grid((width, height): (u32, u32), (wx, wy): (u32, u32)) -> (u32, u32) {
    (width.div_ceil(wx), height.div_ceil(wy))
}

/// Instantiates the kernel source for a workgroup shape and storage format.
fn shader_source((wx, wy): (u32, u32), storage_format: &str) -> String {
    SHADER_TEMPLATE
        .replace("{{WORKGROUP_X}}", &wx.to_string())
        .replace("{{WORKGROUP_Y}}", &wy.to_string())
        .replace("{{STORAGE_FORMAT}}", storage_format)
}

struct Pipeline {
    storage_format: wgpu::TextureFormat,
    workgroup: (u32, u32),
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

/// Writes one frame of the Mandelbrot set into a storage texture.
///
/// The pipeline is built on first use and rebuilt if the storage format
/// changes. Parameters live in a read-only storage buffer rewritten every
/// frame.
#[derive(Default)]
pub struct MandelbrotKernel {
    pipeline: Option<Pipeline>,
    params_buffer: Option<wgpu::Buffer>,
}

impl MandelbrotKernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads `params` and records the dispatch into `target`.
    pub fn encode(&mut self, ctx: &RenderCtx<'_>, target: &mut StorageTarget<'_>, params: &Parameters) {
        if ctx.width == 0 || ctx.height == 0 {
            return;
        }

        self.ensure_pipeline(ctx);
        self.ensure_params_buffer(ctx);

        let Some(pipeline) = self.pipeline.as_ref() else { return };
        let Some(params_buffer) = self.params_buffer.as_ref() else { return };

        ctx.queue.write_buffer(params_buffer, 0, bytemuck::bytes_of(params));

        // The storage view changes every frame on the direct path.
        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mandelbrot bind group"),
            layout: &pipeline.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(target.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: params_buffer.as_entire_binding(),
                },
            ],
        });

        let (gx, gy) = dispatch_grid((ctx.width, ctx.height), pipeline.workgroup);

        let mut pass = target.encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
            label: Some("mandelbrot pass"),
            timestamp_writes: None,
        });
        pass.set_pipeline(&pipeline.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.dispatch_workgroups(gx, gy, 1);
    }

    fn ensure_pipeline(&mut self, ctx: &RenderCtx<'_>) {
        if self
            .pipeline
            .as_ref()
            .is_some_and(|p| p.storage_format == ctx.storage_format)
        {
            return;
        }

        let Some(format_name) = wgsl_storage_format(ctx.storage_format) else {
            log::error!("storage format {:?} has no WGSL spelling", ctx.storage_format);
            self.pipeline = None;
            return;
        };

        let workgroup = workgroup_shape(&ctx.device.limits());
        log::info!(
            "mandelbrot kernel: workgroup {}x{}, storage {format_name}",
            workgroup.0,
            workgroup.1
        );

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mandelbrot shader"),
            source: wgpu::ShaderSource::Wgsl(shader_source(workgroup, format_name).into()),
        });

        let bind_group_layout = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("mandelbrot bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: ctx.storage_format,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<Parameters>() as u64,
                        ),
                    },
                    count: None,
                },
            ],
        });

        let layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mandelbrot pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = ctx.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("mandelbrot pipeline"),
            layout: Some(&layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        self.pipeline = Some(Pipeline {
            storage_format: ctx.storage_format,
            workgroup,
            pipeline,
            bind_group_layout,
        });
    }

    fn ensure_params_buffer(&mut self, ctx: &RenderCtx<'_>) {
        if self.params_buffer.is_some() {
            return;
        }
        self.params_buffer = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("mandelbrot params"),
            size: std::mem::size_of::<Parameters>() as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mandel_engine::device::raise_compute_limits;

    fn limits(invocations: u32, max_x: u32, max_y: u32) -> wgpu::Limits {
        wgpu::Limits {
            max_compute_invocations_per_workgroup: invocations,
            max_compute_workgroup_size_x: max_x,
            max_compute_workgroup_size_y: max_y,
            ..wgpu::Limits::default()
        }
    }

    // ── workgroup shape ───────────────────────────────────────────────────

    #[test]
    fn shape_splits_invocation_budget_by_rows() {
        assert_eq!(workgroup_shape(&limits(1024, 1024, 1024)), (102, 10));
        assert_eq!(workgroup_shape(&limits(256, 256, 256)), (25, 10));
    }

    #[test]
    fn shape_respects_axis_limit() {
        assert_eq!(workgroup_shape(&limits(1024, 64, 1024)), (64, 10));
    }

    #[test]
    fn shape_never_exceeds_budget() {
        for inv in [16, 64, 128, 256, 512, 1024] {
            let (wx, wy) = workgroup_shape(&limits(inv, 1024, 1024));
            assert!(wx * wy <= inv, "{inv}: {wx}x{wy}");
        }
    }

    #[test]
    fn shape_follows_the_adapter_not_the_defaults() {
        let device = raise_compute_limits(wgpu::Limits::default(), &limits(1024, 1024, 64));
        assert_eq!(workgroup_shape(&device), (102, 10));

        let device = raise_compute_limits(wgpu::Limits::default(), &limits(512, 1024, 64));
        assert_eq!(workgroup_shape(&device), (51, 10));
    }

    #[test]
    fn default_limits_fit() {
        let l = wgpu::Limits::default();
        let (wx, wy) = workgroup_shape(&l);
        assert!(wx * wy <= l.max_compute_invocations_per_workgroup);
        assert!(wx <= l.max_compute_workgroup_size_x);
    }

    // ── dispatch grid ─────────────────────────────────────────────────────

    #[test]
    fn grid_covers_every_pixel() {
        assert_eq!(dispatch_grid((800, 600), (25, 10)), (32, 60));
        assert_eq!(dispatch_grid((801, 601), (25, 10)), (33, 61));
        assert_eq!(dispatch_grid((1, 1), (102, 10)), (1, 1));
    }

    #[test]
    fn grid_is_minimal() {
        let shape = (102, 10);
        for (w, h) in [(800, 600), (1920, 1080), (333, 7)] {
            let (gx, gy) = dispatch_grid((w, h), shape);
            assert!(gx * shape.0 >= w && (gx - 1) * shape.0 < w);
            assert!(gy * shape.1 >= h && (gy - 1) * shape.1 < h);
        }
    }

    // ── shader source ─────────────────────────────────────────────────────

    #[test]
    fn template_is_fully_substituted() {
        let src = shader_source((102, 10), "bgra8unorm");
        assert!(!src.contains("{{"));
        assert!(src.contains("@workgroup_size(102, 10, 1)"));
        assert!(src.contains("texture_storage_2d<bgra8unorm, write>"));
    }

    #[test]
    fn wgsl_struct_matches_rust_layout() {
        let body = SHADER_TEMPLATE
            .split("struct Parameters {")
            .nth(1)
            .and_then(|rest| rest.split('}').next())
            .expect("Parameters struct in kernel source");

        let fields: Vec<(&str, &str)> = body
            .split(',')
            .filter_map(|f| f.trim().split_once(':'))
            .map(|(name, ty)| (name.trim(), ty.trim()))
            .collect();

        assert_eq!(
            fields,
            [
                ("width", "f32"),
                ("height", "f32"),
                ("scale_x", "f32"),
                ("scale_y", "f32"),
                ("pan_x", "f32"),
                ("pan_y", "f32"),
                ("max_iterations", "u32"),
            ]
        );
        assert_eq!(fields.len() * 4, std::mem::size_of::<Parameters>());
    }
}
