use std::time::Instant;

use winit::dpi::PhysicalSize;

use mandel_engine::core::{AppControl, FrameCtx, RenderLoop, WindowCtx};
use mandel_engine::input::{Key, KeyState};
use mandel_engine::lifecycle::LoopState;
use mandel_engine::time::CompletionClock;

use crate::controls::{self, Action, KeyBindings};
use crate::kernel::MandelbrotKernel;
use crate::overlay::{Overlay, OverlaySink, OverlayText};
use crate::params::{ParamDefaults, Parameters};

/// Interactive Mandelbrot explorer.
pub struct ExplorerApp {
    params: Parameters,
    /// Set once `params` has been built for a non-empty drawable.
    sized: bool,
    defaults: ParamDefaults,
    bindings: KeyBindings,
    kernel: MandelbrotKernel,
    clock: CompletionClock,
    overlay: Overlay,
}

impl ExplorerApp {
    /// Default bindings and parameters; the overlay picks its sink from the
    /// fonts available on this system.
    pub fn new(title: &str) -> Self {
        Self::with_config(
            ParamDefaults::default(),
            KeyBindings::default(),
            OverlaySink::detect(title),
        )
    }

    pub fn with_config(defaults: ParamDefaults, bindings: KeyBindings, sink: OverlaySink) -> Self {
        Self {
            // Rebuilt by the first non-empty `on_resize`.
            params: Parameters::new(&defaults, 0, 0),
            sized: false,
            defaults,
            bindings,
            kernel: MandelbrotKernel::new(),
            clock: CompletionClock::new(),
            overlay: Overlay::new(sink),
        }
    }

    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Turns a GPU completion into overlay values. The first completion after
    /// startup or resume yields nothing.
    fn record_completion(&mut self, at: Instant) -> Option<OverlayText> {
        let sample = self.clock.record(at)?;
        Some(OverlayText::new(&sample, self.params.max_iterations))
    }
}

impl RenderLoop for ExplorerApp {
    fn on_resize(&mut self, size: PhysicalSize<u32>) {
        if !self.sized && size.width > 0 && size.height > 0 {
            // The initial pan is centred on the first real drawable.
            self.params = Parameters::new(&self.defaults, size.width, size.height);
            self.sized = true;
            return;
        }
        self.params.resize(size.width, size.height);
    }

    fn on_key(
        &mut self,
        _window: &WindowCtx<'_>,
        key: Key,
        state: KeyState,
        _repeat: bool,
    ) -> AppControl {
        if state != KeyState::Pressed {
            return AppControl::Continue;
        }

        match controls::on_key_pressed(&mut self.params, &self.bindings, key) {
            Some(Action::Quit) => AppControl::Exit,
            Some(Action::MoreIterations | Action::FewerIterations) => {
                log::debug!("max iterations {}", self.params.max_iterations);
                AppControl::Continue
            }
            _ => AppControl::Continue,
        }
    }

    fn on_frame_requested(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let keys = ctx.keys;
        let scale_factor = ctx.window.scale_factor() as f32;
        let (params, bindings, defaults) = (&mut self.params, &self.bindings, &self.defaults);
        let (kernel, overlay) = (&mut self.kernel, &mut self.overlay);

        // Held keys are sampled only for frames that acquired a drawable.
        ctx.render(
            |rctx, target| {
                controls::apply_held(params, keys, bindings, defaults);
                kernel.encode(rctx, target, params);
            },
            |rctx, target| overlay.draw(rctx, target, scale_factor),
        )
    }

    fn on_frame_completed(&mut self, window: &WindowCtx<'_>, at: Instant) {
        if let Some(text) = self.record_completion(at) {
            self.overlay.update(text, window);
        }
    }

    fn on_loop_state(&mut self, state: LoopState) {
        // Time spent paused is not a frame time.
        if state == LoopState::Running {
            self.clock.rearm();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn app() -> ExplorerApp {
        let mut app = unsized_app();
        app.on_resize(PhysicalSize::new(800, 600));
        app
    }

    fn unsized_app() -> ExplorerApp {
        ExplorerApp::with_config(
            ParamDefaults::default(),
            KeyBindings::default(),
            OverlaySink::Title {
                base: "Mandelbrot Set".into(),
            },
        )
    }

    #[test]
    fn first_resize_sizes_the_defaults() {
        let app = app();
        assert_eq!(*app.params(), Parameters::new(&ParamDefaults::default(), 800, 600));
    }

    #[test]
    fn startup_centres_the_view_once() {
        let mut app = unsized_app();
        app.on_resize(PhysicalSize::new(800, 600));
        assert_eq!((app.params().pan_x, app.params().pan_y), (400.0, 300.0));

        app.on_resize(PhysicalSize::new(1600, 1200));
        assert_eq!((app.params().pan_x, app.params().pan_y), (400.0, 300.0));
        assert_eq!((app.params().width, app.params().height), (1600.0, 1200.0));
    }

    #[test]
    fn empty_drawable_does_not_count_as_first_size() {
        let mut app = unsized_app();
        app.on_resize(PhysicalSize::new(0, 0));
        app.on_resize(PhysicalSize::new(1024, 768));
        assert_eq!((app.params().pan_x, app.params().pan_y), (512.0, 384.0));
    }

    #[test]
    fn startup_keeps_configured_defaults() {
        let defaults = ParamDefaults {
            scale: [0.004, 0.004],
            pan_offset: [10.0, 0.0],
            max_iterations: 256,
        };
        let mut app = ExplorerApp::with_config(
            defaults,
            KeyBindings::default(),
            OverlaySink::Title {
                base: "Mandelbrot Set".into(),
            },
        );
        app.on_resize(PhysicalSize::new(800, 600));
        assert_eq!(*app.params(), Parameters::new(&defaults, 800, 600));
        assert_eq!(app.params().pan_x, 410.0);
    }

    #[test]
    fn first_completion_shows_nothing() {
        let mut app = app();
        let t0 = Instant::now();
        assert_eq!(app.record_completion(t0), None);

        let text = app.record_completion(t0 + Duration::from_millis(20));
        assert_eq!(
            text,
            Some(OverlayText {
                fps: 50.0,
                frame_ms: 20.0,
                max_iterations: 64,
            })
        );
    }

    #[test]
    fn resume_does_not_report_the_pause() {
        let mut app = app();
        let t0 = Instant::now();
        app.record_completion(t0);
        app.record_completion(t0 + Duration::from_millis(16));

        app.on_loop_state(LoopState::Paused);
        app.on_loop_state(LoopState::Running);

        let after = t0 + Duration::from_secs(30);
        assert_eq!(app.record_completion(after), None);
        let text = app.record_completion(after + Duration::from_millis(10));
        assert_eq!(text.map(|t| t.frame_ms), Some(10.0));
    }

    #[test]
    fn completion_reports_current_iterations() {
        let mut app = app();
        app.params.step_iterations(3);
        let t0 = Instant::now();
        app.record_completion(t0);
        let text = app.record_completion(t0 + Duration::from_millis(5));
        assert_eq!(text.map(|t| t.max_iterations), Some(256));
    }

    #[test]
    fn held_keys_move_the_view_only_in_the_frame_step() {
        let mut app = app();
        let mut keys = mandel_engine::input::KeyTracker::new();
        keys.press(Key::E);
        keys.press(Key::D);
        let before = *app.params();

        // Resizes and completions between frames never sample held keys.
        app.on_resize(PhysicalSize::new(800, 600));
        let t0 = Instant::now();
        app.record_completion(t0);
        app.record_completion(t0 + Duration::from_millis(16));
        assert_eq!(*app.params(), before);

        controls::apply_held(&mut app.params, &keys, &app.bindings, &app.defaults);
        assert_eq!(app.params().pan_x, 300.0);
        assert!(app.params().scale_x < before.scale_x);
    }

    #[test]
    fn resize_keeps_navigation() {
        let mut app = app();
        app.params.zoom(0.5);
        app.on_resize(PhysicalSize::new(1024, 768));
        assert_eq!(app.params().scale_x, 0.001);
        assert_eq!(app.params().pan_x, 400.0);
        assert_eq!(app.params().width, 1024.0);
    }
}
