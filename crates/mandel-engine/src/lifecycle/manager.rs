use std::cell::Cell;
use std::rc::Rc;

use super::hub::{SignalHub, Subscription};
use super::signal::LoopState;

/// Pauses and resumes frame production from lifecycle signals.
///
/// The latest signal decides the state. The manager owns its subscription, so
/// dropping it detaches from the hub.
pub struct LifecycleManager {
    state: Rc<Cell<LoopState>>,
    _subscription: Subscription,
}

impl LifecycleManager {
    /// Subscribes to `hub`, starting in `initial`.
    pub fn attach(hub: &SignalHub, initial: LoopState) -> Self {
        let state = Rc::new(Cell::new(initial));
        let sink = Rc::clone(&state);

        let subscription = hub.subscribe(move |signal| {
            let next = signal.target_state();
            if sink.replace(next) != next {
                log::info!("render loop {next:?} ({signal:?})");
            }
        });

        Self {
            state,
            _subscription: subscription,
        }
    }

    #[inline]
    pub fn state(&self) -> LoopState {
        self.state.get()
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.state().is_paused()
    }

    /// Returns whether a redraw trigger may produce a frame right now.
    #[inline]
    pub fn admit_frame(&self) -> bool {
        !self.is_paused()
    }
}
