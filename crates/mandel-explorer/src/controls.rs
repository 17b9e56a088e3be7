//! Keyboard controls.
//!
//! Zoom, pan and reset are level-triggered: their held state is sampled once
//! per frame. Iteration depth and quit are edge-triggered on key press.

use mandel_engine::input::{Key, KeyTracker};

use crate::params::{ParamDefaults, Parameters};

pub const ZOOM_OUT_FACTOR: f32 = 1.01;
pub const ZOOM_IN_FACTOR: f32 = 0.99;
/// Pan distance per frame, in pixels of pan offset.
pub const PAN_STEP: f32 = 100.0;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Action {
    ZoomOut,
    ZoomIn,
    PanUp,
    PanDown,
    PanLeft,
    PanRight,
    Reset,
    MoreIterations,
    FewerIterations,
    Quit,
}

/// Physical key bound to each action.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct KeyBindings {
    pub zoom_out: Key,
    pub zoom_in: Key,
    pub pan_up: Key,
    pub pan_down: Key,
    pub pan_left: Key,
    pub pan_right: Key,
    pub reset: Key,
    pub more_iterations: Key,
    pub fewer_iterations: Key,
    pub quit: Key,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            zoom_out: Key::Q,
            zoom_in: Key::E,
            pan_up: Key::W,
            pan_down: Key::S,
            pan_left: Key::A,
            pan_right: Key::D,
            reset: Key::R,
            more_iterations: Key::Z,
            fewer_iterations: Key::X,
            quit: Key::Escape,
        }
    }
}

impl KeyBindings {
    /// Returns the action bound to `key`, if any.
    pub fn action_for(&self, key: Key) -> Option<Action> {
        let table = [
            (self.zoom_out, Action::ZoomOut),
            (self.zoom_in, Action::ZoomIn),
            (self.pan_up, Action::PanUp),
            (self.pan_down, Action::PanDown),
            (self.pan_left, Action::PanLeft),
            (self.pan_right, Action::PanRight),
            (self.reset, Action::Reset),
            (self.more_iterations, Action::MoreIterations),
            (self.fewer_iterations, Action::FewerIterations),
            (self.quit, Action::Quit),
        ];
        table.into_iter().find(|(k, _)| *k == key).map(|(_, a)| a)
    }
}

/// Applies one frame of held zoom, pan and reset keys to `params`.
///
/// Zoom-out wins over zoom-in, up over down, left over right. A held reset
/// replaces everything with defaults sized to the current drawable.
pub fn apply_held(
    params: &mut Parameters,
    keys: &KeyTracker,
    bindings: &KeyBindings,
    defaults: &ParamDefaults,
) {
    if keys.is_held(bindings.zoom_out) {
        params.zoom(ZOOM_OUT_FACTOR);
    } else if keys.is_held(bindings.zoom_in) {
        params.zoom(ZOOM_IN_FACTOR);
    }

    if keys.is_held(bindings.pan_up) {
        params.pan(0.0, PAN_STEP);
    } else if keys.is_held(bindings.pan_down) {
        params.pan(0.0, -PAN_STEP);
    }

    if keys.is_held(bindings.pan_left) {
        params.pan(PAN_STEP, 0.0);
    } else if keys.is_held(bindings.pan_right) {
        params.pan(-PAN_STEP, 0.0);
    }

    if keys.is_held(bindings.reset) {
        params.reset(defaults);
    }
}

/// Handles a key press, including OS auto-repeats.
///
/// Adjusts iteration depth for the iteration keys and returns the bound
/// action so the caller can react to the rest (e.g. quit).
pub fn on_key_pressed(params: &mut Parameters, bindings: &KeyBindings, key: Key) -> Option<Action> {
    let action = bindings.action_for(key)?;
    match action {
        Action::MoreIterations => params.step_iterations(1),
        Action::FewerIterations => params.step_iterations(-1),
        _ => {}
    }
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Parameters, ParamDefaults, KeyBindings) {
        let defaults = ParamDefaults::default();
        (Parameters::new(&defaults, 800, 600), defaults, KeyBindings::default())
    }

    fn holding(keys: &[Key]) -> KeyTracker {
        let mut tracker = KeyTracker::new();
        for &k in keys {
            tracker.press(k);
        }
        tracker
    }

    fn frames(n: usize, params: &mut Parameters, keys: &KeyTracker, defaults: &ParamDefaults) {
        let bindings = KeyBindings::default();
        for _ in 0..n {
            apply_held(params, keys, &bindings, defaults);
        }
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() <= b.abs() * 1e-4
    }

    // ── zoom ──────────────────────────────────────────────────────────────

    #[test]
    fn fifty_frames_of_zoom_in() {
        let (mut p, d, _) = setup();
        frames(50, &mut p, &holding(&[Key::E]), &d);

        let expected = 0.002 * 0.99f32.powi(50);
        assert!(approx(p.scale_x, expected), "{}", p.scale_x);
        assert!(approx(p.scale_x, 0.00121), "{}", p.scale_x);
        assert_eq!(p.scale_x, p.scale_y);
    }

    #[test]
    fn zoom_out_wins_over_zoom_in() {
        let (mut p, d, _) = setup();
        frames(1, &mut p, &holding(&[Key::Q, Key::E]), &d);
        assert!(approx(p.scale_x, 0.002 * 1.01));
    }

    #[test]
    fn zoom_keeps_scales_positive_and_square() {
        let (mut p, d, _) = setup();
        let patterns: [&[Key]; 4] = [&[Key::E], &[Key::Q], &[Key::Q, Key::E], &[]];
        for (i, keys) in patterns.iter().cycle().take(400).enumerate() {
            frames(i % 7, &mut p, &holding(keys), &d);
            assert!(p.scale_x > 0.0 && p.scale_y > 0.0);
            assert_eq!(p.scale_x / p.scale_y, 1.0);
        }
    }

    // ── pan ───────────────────────────────────────────────────────────────

    #[test]
    fn pan_directions() {
        let (mut p, d, _) = setup();
        frames(1, &mut p, &holding(&[Key::W]), &d);
        assert_eq!(p.pan_y, 400.0);
        frames(2, &mut p, &holding(&[Key::S]), &d);
        assert_eq!(p.pan_y, 200.0);
        frames(1, &mut p, &holding(&[Key::A]), &d);
        assert_eq!(p.pan_x, 500.0);
        frames(1, &mut p, &holding(&[Key::D]), &d);
        assert_eq!(p.pan_x, 400.0);
    }

    #[test]
    fn opposite_pans_resolve_to_up_and_left() {
        let (mut p, d, _) = setup();
        frames(1, &mut p, &holding(&[Key::W, Key::S, Key::A, Key::D]), &d);
        assert_eq!((p.pan_x, p.pan_y), (500.0, 400.0));
    }

    // ── reset ─────────────────────────────────────────────────────────────

    #[test]
    fn pan_right_then_reset() {
        let (mut p, d, _) = setup();
        frames(3, &mut p, &holding(&[Key::D]), &d);
        assert_eq!(p.pan_x, 100.0);

        frames(1, &mut p, &holding(&[Key::R]), &d);
        assert_eq!(p.pan_x, 400.0);
    }

    #[test]
    fn reset_overrides_zoom_and_pan_in_the_same_frame() {
        let (mut p, d, b) = setup();
        on_key_pressed(&mut p, &b, Key::Z);
        frames(1, &mut p, &holding(&[Key::R, Key::E, Key::W]), &d);
        assert_eq!(p, Parameters::new(&d, 800, 600));
    }

    #[test]
    fn reset_uses_the_current_drawable_size() {
        let (mut p, d, _) = setup();
        p.resize(1000, 500);
        frames(1, &mut p, &holding(&[Key::R]), &d);
        assert_eq!((p.pan_x, p.pan_y), (500.0, 250.0));
    }

    // ── key presses ───────────────────────────────────────────────────────

    #[test]
    fn iteration_keys_step_on_press() {
        let (mut p, _, b) = setup();
        assert_eq!(on_key_pressed(&mut p, &b, Key::Z), Some(Action::MoreIterations));
        assert_eq!(on_key_pressed(&mut p, &b, Key::Z), Some(Action::MoreIterations));
        assert_eq!(p.max_iterations, 192);
        assert_eq!(on_key_pressed(&mut p, &b, Key::X), Some(Action::FewerIterations));
        assert_eq!(p.max_iterations, 128);
    }

    #[test]
    fn hundred_decreases_from_minimum_stay_at_minimum() {
        let (mut p, _, b) = setup();
        for _ in 0..100 {
            on_key_pressed(&mut p, &b, Key::X);
        }
        assert_eq!(p.max_iterations, 64);
    }

    #[test]
    fn unbound_and_level_keys_leave_iterations_alone() {
        let (mut p, _, b) = setup();
        assert_eq!(on_key_pressed(&mut p, &b, Key::Digit1), None);
        assert_eq!(on_key_pressed(&mut p, &b, Key::E), Some(Action::ZoomIn));
        assert_eq!(p.max_iterations, 64);
        assert_eq!(p.scale_x, 0.002);
    }

    #[test]
    fn escape_quits() {
        let (mut p, _, b) = setup();
        assert_eq!(on_key_pressed(&mut p, &b, Key::Escape), Some(Action::Quit));
    }

    #[test]
    fn held_iteration_keys_do_nothing_per_frame() {
        let (mut p, d, _) = setup();
        frames(10, &mut p, &holding(&[Key::Z]), &d);
        assert_eq!(p.max_iterations, 64);
    }

    #[test]
    fn rebinding_moves_the_action() {
        let (mut p, d, _) = setup();
        let bindings = KeyBindings {
            zoom_in: Key::ArrowUp,
            ..KeyBindings::default()
        };
        apply_held(&mut p, &holding(&[Key::E]), &bindings, &d);
        assert_eq!(p.scale_x, 0.002);
        apply_held(&mut p, &holding(&[Key::ArrowUp]), &bindings, &d);
        assert!(approx(p.scale_x, 0.002 * 0.99));
    }
}
