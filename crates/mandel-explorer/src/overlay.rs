//! Frame diagnostics shown over the fractal.

use mandel_engine::core::WindowCtx;
use mandel_engine::render::{RenderCtx, RenderTarget, TextRenderer, TextRun};
use mandel_engine::text::{FontId, FontSystem, SYSTEM_FONT_PATHS};
use mandel_engine::time::FrameSample;

/// Logical font size of the on-screen overlay.
const FONT_SIZE: f32 = 16.0;
/// Logical distance from the top-left corner.
const MARGIN: f32 = 12.0;

const TEXT_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
const SHADOW_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 0.8];

/// Values reported for one completed frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OverlayText {
    pub fps: f64,
    pub frame_ms: f64,
    pub max_iterations: u32,
}

impl OverlayText {
    pub fn new(sample: &FrameSample, max_iterations: u32) -> Self {
        Self {
            fps: sample.fps(),
            frame_ms: sample.elapsed_ms(),
            max_iterations,
        }
    }

    pub fn lines(&self) -> [String; 3] {
        [
            format!("FPS: {:.0}", self.fps),
            format!("Time: {:.3} ms", self.frame_ms),
            format!("Max Iterations: {}", self.max_iterations),
        ]
    }

    /// Screen layout: one value per line.
    pub fn multiline(&self) -> String {
        self.lines().join("\n")
    }

    /// Title layout: all values on one line.
    pub fn single_line(&self) -> String {
        self.lines().join("  |  ")
    }
}

/// Where the overlay is displayed.
pub enum OverlaySink {
    /// Drawn over the frame with a system font.
    Screen {
        renderer: TextRenderer,
        fonts: FontSystem,
        font: FontId,
    },
    /// Written into the window title after `base`.
    Title { base: String },
}

impl OverlaySink {
    /// Uses the screen sink when a system font loads, otherwise the title.
    pub fn detect(title: &str) -> Self {
        let mut fonts = FontSystem::new();
        match fonts.load_first_available(&SYSTEM_FONT_PATHS) {
            Ok(font) => Self::Screen {
                renderer: TextRenderer::new(),
                fonts,
                font,
            },
            Err(e) => {
                log::warn!("overlay font unavailable ({e}); showing stats in the window title");
                Self::Title {
                    base: title.to_string(),
                }
            }
        }
    }
}

/// Latest diagnostics and the sink that shows them.
pub struct Overlay {
    sink: OverlaySink,
    text: Option<OverlayText>,
}

impl Overlay {
    pub fn new(sink: OverlaySink) -> Self {
        Self { sink, text: None }
    }

    /// Stores new values. The title sink updates the window immediately; the
    /// screen sink shows them from the next frame on.
    pub fn update(&mut self, text: OverlayText, window: &WindowCtx<'_>) {
        if let OverlaySink::Title { base } = &self.sink {
            window.set_title(&title_with_stats(base, &text));
        }
        self.text = Some(text);
    }

    /// Draws the latest values on the screen sink. Nothing is drawn before
    /// the first update.
    pub fn draw(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, scale_factor: f32) {
        let Some(text) = self.text.as_ref() else { return };
        let OverlaySink::Screen { renderer, fonts, font } = &mut self.sink else { return };

        let runs = screen_runs(text, *font, scale_factor);
        renderer.render(ctx, target, &runs, fonts);
    }
}

fn title_with_stats(base: &str, text: &OverlayText) -> String {
    format!("{base}  {}", text.single_line())
}

/// Physical-pixel placement of the screen overlay.
#[derive(Debug, Copy, Clone, PartialEq)]
struct Placement {
    size: f32,
    origin: [f32; 2],
    shadow_origin: [f32; 2],
}

impl Placement {
    fn for_scale(scale_factor: f32) -> Self {
        let margin = MARGIN * scale_factor;
        let offset = scale_factor.max(1.0);
        Self {
            size: FONT_SIZE * scale_factor,
            origin: [margin, margin],
            shadow_origin: [margin + offset, margin + offset],
        }
    }
}

/// Shadow then text.
fn screen_runs(text: &OverlayText, font: FontId, scale_factor: f32) -> [TextRun; 2] {
    let placement = Placement::for_scale(scale_factor);
    let body = text.multiline();

    [
        TextRun {
            text: body.clone(),
            font,
            size: placement.size,
            color: SHADOW_COLOR,
            origin: placement.shadow_origin,
        },
        TextRun {
            text: body,
            font,
            size: placement.size,
            color: TEXT_COLOR,
            origin: placement.origin,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sample(ms: u64) -> FrameSample {
        FrameSample {
            elapsed: Duration::from_millis(ms),
            index: 1,
        }
    }

    // ── formatting ────────────────────────────────────────────────────────

    #[test]
    fn formats_three_lines() {
        let text = OverlayText::new(&sample(25), 128);
        assert_eq!(
            text.lines(),
            [
                "FPS: 40".to_string(),
                "Time: 25.000 ms".to_string(),
                "Max Iterations: 128".to_string(),
            ]
        );
        assert_eq!(text.multiline(), "FPS: 40\nTime: 25.000 ms\nMax Iterations: 128");
    }

    #[test]
    fn fps_is_inverse_of_frame_time() {
        let text = OverlayText::new(&sample(20), 64);
        assert_eq!(text.lines()[0], "FPS: 50");
        assert_eq!(text.lines()[1], "Time: 20.000 ms");
    }

    #[test]
    fn title_carries_all_values() {
        let text = OverlayText {
            fps: 59.6,
            frame_ms: 16.7772,
            max_iterations: 2048,
        };
        assert_eq!(
            title_with_stats("Mandelbrot Set", &text),
            "Mandelbrot Set  FPS: 60  |  Time: 16.777 ms  |  Max Iterations: 2048"
        );
    }

    // ── sinks ─────────────────────────────────────────────────────────────

    #[test]
    fn nothing_to_show_before_first_update() {
        let overlay = Overlay::new(OverlaySink::Title {
            base: "Mandelbrot Set".into(),
        });
        assert!(overlay.text.is_none());
        assert!(matches!(overlay.sink, OverlaySink::Title { .. }));
    }

    #[test]
    fn placement_scales_with_the_display() {
        let p = Placement::for_scale(2.0);
        assert_eq!(p.size, 32.0);
        assert_eq!(p.origin, [24.0, 24.0]);
        assert_eq!(p.shadow_origin, [26.0, 26.0]);

        let p = Placement::for_scale(1.0);
        assert_eq!(p.origin, [12.0, 12.0]);
        assert_eq!(p.shadow_origin, [13.0, 13.0]);
    }
}
