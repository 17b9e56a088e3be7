use std::time::Instant;

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::window::{Window, WindowId};

use crate::core::{AppControl, FrameCtx, RenderLoop, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::input::platform::winit::translate_window_event;
use crate::input::{InputEvent, KeyTracker};
use crate::lifecycle::{LifecycleManager, LifecycleSignal, LoopState, SignalHub};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "mandel".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Events delivered to the event loop from other threads.
#[derive(Debug, Copy, Clone)]
pub enum RuntimeEvent {
    /// The GPU finished a submitted frame at the given instant.
    FrameCompleted(Instant),
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window and drives `app` until the window closes or the app
    /// asks to exit.
    ///
    /// Window or GPU initialization failures end the loop and are returned.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + RenderLoop,
    {
        let event_loop = EventLoop::<RuntimeEvent>::with_user_event()
            .build()
            .context("failed to create winit EventLoop")?;

        let proxy = event_loop.create_proxy();
        let mut state = AppState::new(config, gpu_init, app, proxy);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.fatal.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    tracker: KeyTracker,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: RenderLoop + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,
    proxy: EventLoopProxy<RuntimeEvent>,

    entry: Option<WindowEntry>,

    // Declared before `hub` so the subscription is released first.
    lifecycle: LifecycleManager,
    hub: SignalHub,
    /// State last reported to the app.
    reported: LoopState,

    fatal: Option<anyhow::Error>,
    exit_requested: bool,
}

impl<A> AppState<A>
where
    A: RenderLoop + 'static,
{
    fn new(
        config: RuntimeConfig,
        gpu_init: GpuInit,
        app: A,
        proxy: EventLoopProxy<RuntimeEvent>,
    ) -> Self {
        let hub = SignalHub::new();
        let lifecycle = LifecycleManager::attach(&hub, LoopState::Paused);

        Self {
            config,
            gpu_init,
            app,
            proxy,
            entry: None,
            lifecycle,
            hub,
            reported: LoopState::Paused,
            fatal: None,
            exit_requested: false,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();

        let entry = WindowEntryTryBuilder {
            tracker: KeyTracker::new(),
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed for window")?;

        let size = entry.with_gpu(|gpu| gpu.size());
        self.app.on_resize(size);
        self.entry = Some(entry);
        Ok(())
    }

    /// Emits `signal` and reports a resulting state change to the app.
    fn signal(&mut self, signal: LifecycleSignal) {
        self.hub.emit(signal);

        let state = self.lifecycle.state();
        if state == self.reported {
            return;
        }
        self.reported = state;
        self.app.on_loop_state(state);

        if state == LoopState::Running {
            if let Some(entry) = self.entry.as_ref() {
                entry.with_window(|w| w.request_redraw());
            }
        }
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        let Some(entry) = self.entry.as_mut() else { return };

        log::debug!("drawable resized to {}x{}", size.width, size.height);
        entry.with_gpu_mut(|gpu| gpu.resize(size));
        self.app.on_resize(size);

        if self.lifecycle.admit_frame() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId) {
        if !self.lifecycle.admit_frame() {
            log::debug!("redraw dropped: render loop paused");
            return;
        }

        let (app, proxy) = (&mut self.app, &self.proxy);
        let Some(entry) = self.entry.as_mut() else { return };

        let control = entry.with_mut(|fields| {
            let mut ctx = FrameCtx {
                window: WindowCtx {
                    id: window_id,
                    window: fields.window,
                },
                gpu: fields.gpu,
                keys: fields.tracker,
                proxy,
            };
            app.on_frame_requested(&mut ctx)
        });

        if control == AppControl::Exit {
            self.request_exit(event_loop);
        }
    }

    fn input(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, ev: InputEvent) {
        let app = &mut self.app;
        let Some(entry) = self.entry.as_mut() else { return };

        let control = entry.with_mut(|fields| {
            fields.tracker.apply_event(&ev);

            match ev {
                InputEvent::Key { key, state, repeat, .. } => {
                    let window = WindowCtx {
                        id: window_id,
                        window: fields.window,
                    };
                    app.on_key(&window, key, state, repeat)
                }
                InputEvent::Focused(_) => AppControl::Continue,
            }
        });

        if control == AppControl::Exit {
            self.request_exit(event_loop);
        }
    }
}

impl<A> ApplicationHandler<RuntimeEvent> for AppState<A>
where
    A: RenderLoop + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_none() {
            if let Err(e) = self.create_window_entry(event_loop) {
                self.fatal = Some(e);
                self.request_exit(event_loop);
                return;
            }
        }

        self.signal(LifecycleSignal::ViewAppeared);
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        self.signal(LifecycleSignal::ViewDisappeared);
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: RuntimeEvent) {
        match event {
            RuntimeEvent::FrameCompleted(at) => {
                let app = &mut self.app;
                if let Some(entry) = self.entry.as_ref() {
                    entry.with_window(|w| {
                        let window = WindowCtx { id: w.id(), window: w };
                        app.on_frame_completed(&window, at);
                    });
                }
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        let Some(entry) = self.entry.as_ref() else { return };

        entry.with_gpu(|gpu| gpu.poll());

        // Redraws are paced by the FIFO present mode; nothing is scheduled while paused.
        if self.lifecycle.admit_frame() {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if let Some(ev) = translate_window_event(&event) {
            self.input(event_loop, window_id, ev);
        }

        match event {
            WindowEvent::CloseRequested => {
                self.request_exit(event_loop);
            }

            WindowEvent::Resized(new_size) => self.resize(new_size),

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.entry.as_ref().map(|e| e.with_window(|w| w.inner_size())) {
                    self.resize(size);
                }
            }

            WindowEvent::Focused(true) => self.signal(LifecycleSignal::WindowFocused),
            WindowEvent::Focused(false) => self.signal(LifecycleSignal::WindowUnfocused),

            WindowEvent::Occluded(true) => self.signal(LifecycleSignal::ViewDisappeared),
            WindowEvent::Occluded(false) => self.signal(LifecycleSignal::ViewAppeared),

            WindowEvent::RedrawRequested => self.redraw(event_loop, window_id),

            _ => {}
        }
    }
}
