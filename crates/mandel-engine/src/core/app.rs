use std::time::Instant;

use winit::dpi::PhysicalSize;

use crate::input::{Key, KeyState};
use crate::lifecycle::LoopState;

use super::ctx::{FrameCtx, WindowCtx};

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Contract between the runtime and the application driving the window.
///
/// All callbacks run on the event-loop thread.
pub trait RenderLoop {
    /// Called once the GPU context exists and again whenever the drawable
    /// size changes. The size may be zero while the window is minimized.
    fn on_resize(&mut self, size: PhysicalSize<u32>);

    /// Called once per admitted redraw. Never called while the loop is paused.
    fn on_frame_requested(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Called for every key press and release, after the key tracker has been
    /// updated. `repeat` marks OS auto-repeat presses.
    fn on_key(
        &mut self,
        window: &WindowCtx<'_>,
        key: Key,
        state: KeyState,
        repeat: bool,
    ) -> AppControl {
        let _ = (window, key, state, repeat);
        AppControl::Continue
    }

    /// Called when the GPU has finished a submitted frame. `at` was captured
    /// on the thread that observed completion.
    fn on_frame_completed(&mut self, window: &WindowCtx<'_>, at: Instant) {
        let _ = (window, at);
    }

    /// Called on every pause/resume transition.
    fn on_loop_state(&mut self, state: LoopState) {
        let _ = state;
    }
}
