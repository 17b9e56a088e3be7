use std::time::Instant;

use winit::dpi::PhysicalSize;
use winit::event_loop::EventLoopProxy;
use winit::window::{Window, WindowId};

use crate::device::Gpu;
use crate::input::KeyTracker;
use crate::render::{RenderCtx, RenderTarget, StorageTarget};
use crate::window::RuntimeEvent;

use super::app::AppControl;

/// Per-window handles and immutable window metadata.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// Returns the drawable size in physical pixels.
    pub fn inner_size(&self) -> PhysicalSize<u32> {
        self.window.inner_size()
    }

    pub fn scale_factor(&self) -> f64 {
        self.window.scale_factor()
    }

    pub fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }
}

/// Per-frame context passed to `core::RenderLoop::on_frame_requested`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub keys: &'a KeyTracker,
    pub(crate) proxy: &'a EventLoopProxy<RuntimeEvent>,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Acquires the drawable, records `compute` against its storage view, makes
    /// the result visible on the surface, records `overlay` on top, then
    /// submits and presents.
    ///
    /// GPU completion of the submission is delivered later through
    /// `RenderLoop::on_frame_completed`. Frames are skipped (not retried) when
    /// the drawable is zero-sized or cannot be acquired.
    pub fn render<C, O>(&mut self, compute: C, overlay: O) -> AppControl
    where
        C: FnOnce(&RenderCtx<'_>, &mut StorageTarget<'_>),
        O: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>),
    {
        if !self.gpu.has_drawable() {
            log::debug!("skipping frame: zero-sized drawable");
            return AppControl::Continue;
        }

        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                log::debug!("skipping frame: {err}");
                if self.gpu.handle_surface_error(err).is_fatal() {
                    log::error!("surface acquisition failed fatally");
                    return AppControl::Exit;
                }
                return AppControl::Continue;
            }
        };

        let size = self.gpu.size();
        let rctx = RenderCtx::new(
            self.gpu.device(),
            self.gpu.queue(),
            self.gpu.surface_format(),
            self.gpu.storage_format(),
            (size.width, size.height),
        );

        // Targets borrow frame.encoder; each is dropped before the next use of frame.
        {
            let mut target = StorageTarget::new(&mut frame.encoder, &frame.storage_view);
            compute(&rctx, &mut target);
        }

        self.gpu.resolve(&mut frame);

        {
            let mut target = RenderTarget::new(&mut frame.encoder, &frame.surface_view);
            overlay(&rctx, &mut target);
        }

        self.window.window.pre_present_notify();

        let proxy = self.proxy.clone();
        self.gpu.submit(frame, move || {
            let at = Instant::now();
            // Fails only once the event loop is gone, when nobody is listening.
            let _ = proxy.send_event(RuntimeEvent::FrameCompleted(at));
        });

        AppControl::Continue
    }
}
