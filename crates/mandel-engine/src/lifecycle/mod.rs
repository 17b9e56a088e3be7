//! Render-loop lifecycle.
//!
//! The runtime translates window visibility and focus changes into
//! `LifecycleSignal`s and emits them through a `SignalHub`. Observers hold a
//! `Subscription` handle; dropping it unregisters the observer.
//!
//! `LifecycleManager` is the observer that gates frame production.

mod hub;
mod manager;
mod signal;

pub use hub::{SignalHub, Subscription};
pub use manager::LifecycleManager;
pub use signal::{LifecycleSignal, LoopState};
