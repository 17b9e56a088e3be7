use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use fontdue::layout::{CoordinateSystem, GlyphRasterConfig, Layout, LayoutSettings, TextStyle};
use wgpu::util::DeviceExt;

use crate::render::{RenderCtx, RenderTarget};
use crate::text::{FontId, FontSystem};

const ATLAS_SIZE: u32 = 1024;
/// Empty pixels around each glyph in the atlas.
const GLYPH_PADDING: u32 = 1;

/// A block of text to draw, in physical pixels.
///
/// `text` may contain `\n` line breaks.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub font: FontId,
    /// Font size in physical pixels.
    pub size: f32,
    /// Linear premultiplied RGBA.
    pub color: [f32; 4],
    /// Top-left of the block in physical pixels.
    pub origin: [f32; 2],
}

/// Atlas rectangle of a rasterized glyph, in normalized coordinates.
#[derive(Debug, Copy, Clone, PartialEq)]
struct GlyphUv {
    min: [f32; 2],
    max: [f32; 2],
}

/// Row-by-row packing cursor for the glyph atlas.
#[derive(Debug, Copy, Clone, PartialEq)]
struct Shelf {
    x: u32,
    y: u32,
    row_height: u32,
}

impl Shelf {
    fn new() -> Self {
        Self {
            x: GLYPH_PADDING,
            y: GLYPH_PADDING,
            row_height: 0,
        }
    }

    /// Reserves a `w` x `h` slot and returns its origin. Moves to a new row
    /// when the current one is too short; `None` once the atlas is full.
    fn place(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        if self.x + w + GLYPH_PADDING > ATLAS_SIZE {
            self.x = GLYPH_PADDING;
            self.y += self.row_height + GLYPH_PADDING;
            self.row_height = 0;
        }
        if self.x + w + GLYPH_PADDING > ATLAS_SIZE || self.y + h + GLYPH_PADDING > ATLAS_SIZE {
            return None;
        }

        let origin = (self.x, self.y);
        self.x += w + GLYPH_PADDING;
        self.row_height = self.row_height.max(h);
        Some(origin)
    }
}

struct Atlas {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    shelf: Shelf,
    full: bool,
}

impl Atlas {
    fn new(device: &wgpu::Device) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("mandel text atlas"),
            size: wgpu::Extent3d {
                width: ATLAS_SIZE,
                height: ATLAS_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            shelf: Shelf::new(),
            full: false,
        }
    }

    /// Uploads an 8-bit coverage bitmap and returns where it landed.
    fn insert(&mut self, queue: &wgpu::Queue, bitmap: &[u8], w: u32, h: u32) -> Option<GlyphUv> {
        if self.full {
            return None;
        }
        let Some((x, y)) = self.shelf.place(w, h) else {
            log::warn!("text atlas is full ({ATLAS_SIZE}x{ATLAS_SIZE}); glyph dropped");
            self.full = true;
            return None;
        };

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x, y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            bitmap,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(w),
                rows_per_image: Some(h),
            },
            wgpu::Extent3d { width: w, height: h, depth_or_array_layers: 1 },
        );

        let size = ATLAS_SIZE as f32;
        Some(GlyphUv {
            min: [x as f32 / size, y as f32 / size],
            max: [(x + w) as f32 / size, (y + h) as f32 / size],
        })
    }
}

/// Render pipeline and the bindings that go with it, for one surface format.
struct Pipeline {
    format: wgpu::TextureFormat,
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    viewport: wgpu::Buffer,
}

impl Pipeline {
    fn new(ctx: &RenderCtx<'_>, atlas: &wgpu::TextureView) -> Self {
        let device = ctx.device;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mandel text shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/text.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("mandel text bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<ViewportUniform>() as u64,
                        ),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let viewport = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("mandel text viewport"),
            size: std::mem::size_of::<ViewportUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("mandel text sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("mandel text bind group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: viewport.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(atlas),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mandel text pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mandel text pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[TextVertex::layout()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format,
                    blend: Some(wgpu::BlendState::PREMULTIPLIED_ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Self {
            format: ctx.surface_format,
            pipeline,
            bind_group,
            viewport,
        }
    }
}

/// Draws [`TextRun`]s over the frame.
///
/// Glyphs are rasterized with fontdue the first time they are drawn and kept
/// in an R8 atlas for the renderer's lifetime. Nothing is evicted; overlay
/// text uses a handful of glyphs at one or two sizes.
pub struct TextRenderer {
    atlas: Option<Atlas>,
    pipeline: Option<Pipeline>,
    glyphs: HashMap<GlyphRasterConfig, GlyphUv>,
    layout: Layout<()>,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self {
            atlas: None,
            pipeline: None,
            glyphs: HashMap::new(),
            layout: Layout::new(CoordinateSystem::PositiveYDown),
        }
    }
}

impl TextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws `runs` onto `target`, loading (not clearing) its contents.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        runs: &[TextRun],
        fonts: &FontSystem,
    ) {
        let vertices = self.layout_runs(ctx, runs, fonts);
        if vertices.is_empty() {
            return;
        }

        let Some(atlas) = self.atlas.as_ref() else { return };
        if self.pipeline.as_ref().is_none_or(|p| p.format != ctx.surface_format) {
            self.pipeline = Some(Pipeline::new(ctx, &atlas.view));
        }
        let Some(pipeline) = self.pipeline.as_ref() else { return };

        let viewport = ViewportUniform {
            size: [(ctx.width as f32).max(1.0), (ctx.height as f32).max(1.0)],
            _pad: [0.0; 2],
        };
        ctx.queue.write_buffer(&pipeline.viewport, 0, bytemuck::bytes_of(&viewport));

        let vertex_buffer = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("mandel text vertices"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("mandel text pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&pipeline.pipeline);
        rpass.set_bind_group(0, &pipeline.bind_group, &[]);
        rpass.set_vertex_buffer(0, vertex_buffer.slice(..));
        rpass.draw(0..vertices.len() as u32, 0..1);
    }

    /// Lays out every run and returns its glyph triangles, rasterizing glyphs
    /// not yet in the atlas.
    fn layout_runs(
        &mut self,
        ctx: &RenderCtx<'_>,
        runs: &[TextRun],
        fonts: &FontSystem,
    ) -> Vec<TextVertex> {
        let mut vertices = Vec::new();
        if runs.is_empty() {
            return vertices;
        }
        let atlas = self.atlas.get_or_insert_with(|| Atlas::new(ctx.device));

        for run in runs {
            let Some(font) = fonts.get(run.font) else {
                log::warn!("text run uses unknown {:?}; skipped", run.font);
                continue;
            };

            self.layout.reset(&LayoutSettings {
                x: run.origin[0],
                y: run.origin[1],
                ..LayoutSettings::default()
            });
            self.layout.append(&[font], &TextStyle::new(&run.text, run.size, 0));

            for g in self.layout.glyphs() {
                if !g.char_data.rasterize() || g.width == 0 || g.height == 0 {
                    continue;
                }

                let uv = match self.glyphs.get(&g.key) {
                    Some(uv) => *uv,
                    None => {
                        let (metrics, bitmap) = font.rasterize_config(g.key);
                        let Some(uv) = atlas.insert(
                            ctx.queue,
                            &bitmap,
                            metrics.width as u32,
                            metrics.height as u32,
                        ) else {
                            continue;
                        };
                        self.glyphs.insert(g.key, uv);
                        uv
                    }
                };

                let min = [g.x, g.y];
                let max = [g.x + g.width as f32, g.y + g.height as f32];
                vertices.extend(glyph_quad(min, max, uv, run.color));
            }
        }

        vertices
    }
}

/// Two triangles covering `min..max` on screen and `uv` in the atlas.
fn glyph_quad(min: [f32; 2], max: [f32; 2], uv: GlyphUv, color: [f32; 4]) -> [TextVertex; 6] {
    let corner = |x: usize, y: usize| TextVertex {
        pos: [[min[0], max[0]][x], [min[1], max[1]][y]],
        uv: [[uv.min[0], uv.max[0]][x], [uv.min[1], uv.max[1]][y]],
        color,
    };
    let (tl, tr, br, bl) = (corner(0, 0), corner(1, 0), corner(1, 1), corner(0, 1));
    [tl, tr, br, tl, br, bl]
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ViewportUniform {
    size: [f32; 2],
    _pad: [f32; 2],
}

/// One corner of a glyph quad (32 bytes).
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
struct TextVertex {
    /// Physical pixels, origin top-left.
    pos: [f32; 2],
    uv: [f32; 2],
    color: [f32; 4],
}

impl TextVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2, 2 => Float32x4];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<TextVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_records_match_the_shader() {
        assert_eq!(std::mem::size_of::<TextVertex>(), 32);
        assert_eq!(std::mem::size_of::<ViewportUniform>(), 16);
    }

    #[test]
    fn shelf_fills_a_row_left_to_right() {
        let mut shelf = Shelf::new();
        assert_eq!(shelf.place(10, 12), Some((1, 1)));
        assert_eq!(shelf.place(8, 20), Some((12, 1)));
        assert_eq!(shelf.row_height, 20);
    }

    #[test]
    fn shelf_starts_a_new_row_below_the_tallest_glyph() {
        let mut shelf = Shelf {
            x: ATLAS_SIZE - 5,
            y: 1,
            row_height: 14,
        };
        assert_eq!(shelf.place(10, 12), Some((GLYPH_PADDING, 1 + 14 + GLYPH_PADDING)));
        assert_eq!(shelf.row_height, 12);
    }

    #[test]
    fn shelf_reports_a_full_atlas() {
        let mut shelf = Shelf {
            x: 1,
            y: ATLAS_SIZE - 5,
            row_height: 0,
        };
        assert_eq!(shelf.place(10, 12), None);
        assert_eq!(Shelf::new().place(ATLAS_SIZE, 12), None);
    }

    #[test]
    fn quad_spans_the_glyph_box() {
        let uv = GlyphUv {
            min: [0.0, 0.5],
            max: [0.25, 0.75],
        };
        let quad = glyph_quad([10.0, 20.0], [18.0, 32.0], uv, [1.0; 4]);

        assert_eq!(quad[0].pos, [10.0, 20.0]);
        assert_eq!(quad[0].uv, [0.0, 0.5]);
        assert_eq!(quad[2].pos, [18.0, 32.0]);
        assert_eq!(quad[2].uv, [0.25, 0.75]);
        assert_eq!(quad[5].pos, [10.0, 32.0]);
        assert_eq!(quad[3], quad[0]);
        assert_eq!(quad[4], quad[2]);
    }
}
