/// Visibility and focus transitions reported by the window runtime.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LifecycleSignal {
    /// The view became visible (window created, un-occluded, app resumed).
    ViewAppeared,
    /// The view is no longer visible (occluded, app suspended).
    ViewDisappeared,
    /// The window became the focused window.
    WindowFocused,
    /// The window lost focus.
    WindowUnfocused,
}

impl LifecycleSignal {
    /// Loop state the render loop must be in after this signal.
    #[inline]
    pub fn target_state(self) -> LoopState {
        match self {
            LifecycleSignal::ViewAppeared | LifecycleSignal::WindowFocused => LoopState::Running,
            LifecycleSignal::ViewDisappeared | LifecycleSignal::WindowUnfocused => {
                LoopState::Paused
            }
        }
    }
}

/// Whether the render loop may produce frames.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopState {
    Running,
    Paused,
}

impl LoopState {
    #[inline]
    pub fn is_paused(self) -> bool {
        self == LoopState::Paused
    }
}
