use std::collections::HashMap;

use super::types::{InputEvent, Key, KeyState};

/// Held-key table for a single window.
///
/// An entry is created the first time a key is pressed and flipped to `false`
/// on release; entries are never removed. Keys without an entry are not held.
#[derive(Debug, Default)]
pub struct KeyTracker {
    pressed: HashMap<Key, bool>,
}

impl KeyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a platform-agnostic input event.
    pub fn apply_event(&mut self, ev: &InputEvent) {
        match ev {
            InputEvent::Key { key, state, .. } => match state {
                KeyState::Pressed => self.press(*key),
                KeyState::Released => self.release(*key),
            },

            // Release notifications are not delivered to unfocused windows.
            InputEvent::Focused(false) => self.release_all(),
            InputEvent::Focused(true) => {}
        }
    }

    pub fn press(&mut self, key: Key) {
        self.pressed.insert(key, true);
    }

    pub fn release(&mut self, key: Key) {
        self.pressed.insert(key, false);
    }

    /// Marks every tracked key as released.
    pub fn release_all(&mut self) {
        for held in self.pressed.values_mut() {
            *held = false;
        }
    }

    /// Returns whether `key` is currently held. Unknown keys are not held.
    #[inline]
    pub fn is_held(&self, key: Key) -> bool {
        self.pressed.get(&key).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_event(key: Key, state: KeyState) -> InputEvent {
        InputEvent::Key { key, state, repeat: false }
    }

    #[test]
    fn unknown_keys_default_to_released() {
        let tracker = KeyTracker::new();
        assert!(!tracker.is_held(Key::Q));
        assert!(!tracker.is_held(Key::Unknown(0xdead)));
    }

    #[test]
    fn press_then_release() {
        let mut tracker = KeyTracker::new();
        tracker.apply_event(&key_event(Key::W, KeyState::Pressed));
        assert!(tracker.is_held(Key::W));

        tracker.apply_event(&key_event(Key::W, KeyState::Released));
        assert!(!tracker.is_held(Key::W));
    }

    #[test]
    fn release_keeps_the_entry() {
        let mut tracker = KeyTracker::new();
        tracker.apply_event(&key_event(Key::A, KeyState::Pressed));
        tracker.apply_event(&key_event(Key::A, KeyState::Released));
        assert_eq!(tracker.pressed.get(&Key::A), Some(&false));
        assert!(!tracker.pressed.contains_key(&Key::D));
    }

    #[test]
    fn release_without_press_is_not_held() {
        let mut tracker = KeyTracker::new();
        tracker.apply_event(&key_event(Key::S, KeyState::Released));
        assert!(!tracker.is_held(Key::S));
    }

    #[test]
    fn keys_are_independent() {
        let mut tracker = KeyTracker::new();
        tracker.apply_event(&key_event(Key::Q, KeyState::Pressed));
        tracker.apply_event(&key_event(Key::E, KeyState::Pressed));
        tracker.apply_event(&key_event(Key::Q, KeyState::Released));
        assert!(!tracker.is_held(Key::Q));
        assert!(tracker.is_held(Key::E));
    }

    #[test]
    fn focus_loss_releases_everything() {
        let mut tracker = KeyTracker::new();
        tracker.apply_event(&InputEvent::Focused(true));
        tracker.apply_event(&key_event(Key::Q, KeyState::Pressed));
        tracker.apply_event(&key_event(Key::D, KeyState::Pressed));

        tracker.apply_event(&InputEvent::Focused(false));
        assert!(!tracker.is_held(Key::Q));
        assert!(!tracker.is_held(Key::D));
    }

    #[test]
    fn unknown_key_display_shows_code() {
        assert_eq!(Key::Unknown(0x2a).to_string(), "Unknown(0x2a)");
        assert_eq!(Key::Z.to_string(), "Z");
    }
}
