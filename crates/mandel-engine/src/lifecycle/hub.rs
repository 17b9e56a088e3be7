use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::signal::LifecycleSignal;

type Listener = Box<dyn FnMut(LifecycleSignal)>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,

    /// Set while `emit` has the listener list checked out.
    emitting: bool,
    /// Subscriptions dropped by a listener during `emit`.
    dropped_during_emit: Vec<u64>,
}

/// Single-threaded signal fan-out with explicit, disposable subscriptions.
///
/// Listeners run on the thread that calls [`emit`](Self::emit), in
/// subscription order. A listener may subscribe or drop subscriptions while it
/// runs; the changes apply from the next emission on.
#[derive(Default)]
pub struct SignalHub {
    registry: Rc<RefCell<Registry>>,
}

impl SignalHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener`. It stays registered until the returned handle is dropped.
    #[must_use = "dropping the Subscription unregisters the listener immediately"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(LifecycleSignal) + 'static,
    {
        let mut reg = self.registry.borrow_mut();
        let id = reg.next_id;
        reg.next_id = reg.next_id.wrapping_add(1);
        reg.listeners.push((id, Box::new(listener)));

        Subscription {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Delivers `signal` to every registered listener.
    pub fn emit(&self, signal: LifecycleSignal) {
        let mut active = {
            let mut reg = self.registry.borrow_mut();
            if reg.emitting {
                log::warn!("nested lifecycle emit of {signal:?} ignored");
                return;
            }
            reg.emitting = true;
            std::mem::take(&mut reg.listeners)
        };

        for (_, listener) in active.iter_mut() {
            listener(signal);
        }

        let mut reg = self.registry.borrow_mut();
        let dropped = std::mem::take(&mut reg.dropped_during_emit);
        // Listeners subscribed during this emission go after the existing ones.
        active.append(&mut reg.listeners);
        active.retain(|(id, _)| !dropped.contains(id));
        reg.listeners = active;
        reg.emitting = false;
    }

    pub fn listener_count(&self) -> usize {
        self.registry.borrow().listeners.len()
    }
}

/// Handle for a registered listener. Dropping it unregisters the listener.
pub struct Subscription {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut reg = registry.borrow_mut();
        if reg.emitting {
            reg.dropped_during_emit.push(self.id);
        } else {
            reg.listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn counter(hub: &SignalHub) -> (Rc<Cell<u32>>, Subscription) {
        let count = Rc::new(Cell::new(0));
        let sink = Rc::clone(&count);
        let sub = hub.subscribe(move |_| sink.set(sink.get() + 1));
        (count, sub)
    }

    #[test]
    fn emit_reaches_every_listener() {
        let hub = SignalHub::new();
        let (a, _sa) = counter(&hub);
        let (b, _sb) = counter(&hub);

        hub.emit(LifecycleSignal::WindowFocused);
        assert_eq!(a.get(), 1);
        assert_eq!(b.get(), 1);
    }

    #[test]
    fn dropping_the_handle_unsubscribes() {
        let hub = SignalHub::new();
        let (count, sub) = counter(&hub);
        assert_eq!(hub.listener_count(), 1);

        drop(sub);
        assert_eq!(hub.listener_count(), 0);

        hub.emit(LifecycleSignal::ViewAppeared);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn handle_outliving_the_hub_is_harmless() {
        let hub = SignalHub::new();
        let (_count, sub) = counter(&hub);
        drop(hub);
        drop(sub);
    }

    #[test]
    fn listener_can_drop_its_own_subscription() {
        let hub = SignalHub::new();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let calls = Rc::new(Cell::new(0));

        let slot_in = Rc::clone(&slot);
        let calls_in = Rc::clone(&calls);
        let sub = hub.subscribe(move |_| {
            calls_in.set(calls_in.get() + 1);
            slot_in.borrow_mut().take();
        });
        *slot.borrow_mut() = Some(sub);

        hub.emit(LifecycleSignal::WindowUnfocused);
        hub.emit(LifecycleSignal::WindowUnfocused);
        assert_eq!(calls.get(), 1);
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn listeners_run_in_subscription_order() {
        let hub = SignalHub::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let o1 = Rc::clone(&order);
        let _s1 = hub.subscribe(move |_| o1.borrow_mut().push(1));
        let o2 = Rc::clone(&order);
        let _s2 = hub.subscribe(move |_| o2.borrow_mut().push(2));

        hub.emit(LifecycleSignal::ViewDisappeared);
        assert_eq!(*order.borrow(), vec![1, 2]);
    }
}
