//! Raw input → command translation
//!
//! Events are buffered between frames and sampled once at the start of each
//! tick. Keys are tracked two ways: level-triggered (held right now) and
//! edge-triggered (went down since the last sample). Auto-repeated key-downs
//! are dropped so holding a key yields a single edge. Pointer movement is
//! coalesced to its latest position.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::sim::TickInput;

/// Longest press that still counts as a tap
pub const TAP_MAX_MS: f64 = 250.0;
/// Furthest a pointer may travel during a tap
pub const TAP_MAX_DISTANCE: f32 = 12.0;

/// The key set the engine reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    Space,
    Enter,
    Escape,
    P,
    F,
    M,
}

impl Key {
    /// Map a DOM `KeyboardEvent.code` (or `key`) to an engine key
    pub fn from_code(code: &str) -> Option<Self> {
        let key = match code {
            "ArrowLeft" | "KeyA" | "a" | "A" => Key::Left,
            "ArrowRight" | "KeyD" | "d" | "D" => Key::Right,
            "ArrowUp" | "KeyW" | "w" | "W" => Key::Up,
            "ArrowDown" | "KeyS" | "s" | "S" => Key::Down,
            "Space" | " " => Key::Space,
            "Enter" | "NumpadEnter" => Key::Enter,
            "Escape" | "Esc" => Key::Escape,
            "KeyP" | "p" | "P" => Key::P,
            "KeyF" | "f" | "F" => Key::F,
            "KeyM" | "m" | "M" => Key::M,
            _ => return None,
        };
        Some(key)
    }
}

/// Host input event, already filtered to the relevant key set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RawInput {
    KeyDown(Key),
    KeyUp(Key),
    PointerDown { x: f32, y: f32, time_ms: f64 },
    PointerMove { x: f32, y: f32 },
    PointerUp { x: f32, y: f32, time_ms: f64 },
}

/// Commands for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Commands {
    /// Keyboard steering in [-1, 1]
    pub move_axis: f32,
    /// Latest pointer x, if the pointer moved since the last sample
    pub pointer_x: Option<f32>,
    pub accelerate: bool,
    pub brake: bool,
    pub fire: bool,
    pub pause: bool,
    pub confirm: bool,
    pub back: bool,
    pub toggle_fullscreen: bool,
    pub toggle_sound: bool,
}

impl Commands {
    /// The gameplay subset consumed by the simulation
    pub fn tick_input(&self) -> TickInput {
        TickInput {
            steer: self.move_axis,
            target_x: self.pointer_x,
            accelerate: self.accelerate,
            brake: self.brake,
            fire: self.fire,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Press {
    x: f32,
    y: f32,
    time_ms: f64,
}

/// Input buffered between samples
#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: BTreeSet<Key>,
    pressed: Vec<Key>,
    pointer_x: Option<f32>,
    press: Option<Press>,
    taps: u32,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: RawInput) {
        match event {
            RawInput::KeyDown(key) => {
                // Auto-repeat: already held, no new edge
                if self.held.insert(key) {
                    self.pressed.push(key);
                }
            }
            RawInput::KeyUp(key) => {
                self.held.remove(&key);
            }
            RawInput::PointerDown { x, y, time_ms } => {
                self.press = Some(Press { x, y, time_ms });
                self.pointer_x = Some(x);
            }
            RawInput::PointerMove { x, .. } => {
                self.pointer_x = Some(x);
            }
            RawInput::PointerUp { x, y, time_ms } => {
                if let Some(press) = self.press.take() {
                    let held_for = time_ms - press.time_ms;
                    let travel = ((x - press.x).powi(2) + (y - press.y).powi(2)).sqrt();
                    if (0.0..=TAP_MAX_MS).contains(&held_for) && travel <= TAP_MAX_DISTANCE {
                        self.taps += 1;
                    }
                }
            }
        }
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    fn was_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    /// Produce this frame's commands and consume the edges
    pub fn sample(&mut self) -> Commands {
        let tapped = self.taps > 0;
        let mut move_axis = 0.0;
        if self.is_held(Key::Left) {
            move_axis -= 1.0;
        }
        if self.is_held(Key::Right) {
            move_axis += 1.0;
        }

        let commands = Commands {
            move_axis,
            pointer_x: self.pointer_x.take(),
            accelerate: self.is_held(Key::Up),
            brake: self.is_held(Key::Down),
            fire: self.is_held(Key::Space) || tapped,
            pause: self.was_pressed(Key::Escape) || self.was_pressed(Key::P),
            confirm: self.was_pressed(Key::Enter) || self.was_pressed(Key::Space) || tapped,
            back: self.was_pressed(Key::Escape),
            toggle_fullscreen: self.was_pressed(Key::F),
            toggle_sound: self.was_pressed(Key::M),
        };
        self.pressed.clear();
        self.taps = 0;
        commands
    }

    /// Forget everything, including held keys (focus loss)
    pub fn clear(&mut self) {
        self.held.clear();
        self.pressed.clear();
        self.pointer_x = None;
        self.press = None;
        self.taps = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_codes() {
        assert_eq!(Key::from_code("ArrowLeft"), Some(Key::Left));
        assert_eq!(Key::from_code(" "), Some(Key::Space));
        assert_eq!(Key::from_code("KeyM"), Some(Key::M));
        assert_eq!(Key::from_code("Tab"), None);
    }

    #[test]
    fn test_held_keys_are_level_triggered() {
        let mut input = InputState::new();
        input.push(RawInput::KeyDown(Key::Left));
        assert_eq!(input.sample().move_axis, -1.0);
        assert_eq!(input.sample().move_axis, -1.0);

        input.push(RawInput::KeyDown(Key::Right));
        assert_eq!(input.sample().move_axis, 0.0);
        input.push(RawInput::KeyUp(Key::Left));
        assert_eq!(input.sample().move_axis, 1.0);
    }

    #[test]
    fn test_edges_fire_once() {
        let mut input = InputState::new();
        input.push(RawInput::KeyDown(Key::P));
        assert!(input.sample().pause);
        assert!(!input.sample().pause);
    }

    #[test]
    fn test_auto_repeat_is_deduplicated() {
        let mut input = InputState::new();
        input.push(RawInput::KeyDown(Key::M));
        input.push(RawInput::KeyDown(Key::M));
        input.push(RawInput::KeyDown(Key::M));
        assert!(input.sample().toggle_sound);
        input.push(RawInput::KeyDown(Key::M));
        assert!(!input.sample().toggle_sound);

        input.push(RawInput::KeyUp(Key::M));
        input.push(RawInput::KeyDown(Key::M));
        assert!(input.sample().toggle_sound);
    }

    #[test]
    fn test_escape_means_pause_and_back() {
        let mut input = InputState::new();
        input.push(RawInput::KeyDown(Key::Escape));
        let commands = input.sample();
        assert!(commands.pause && commands.back);
        assert!(!commands.confirm);
    }

    #[test]
    fn test_pointer_moves_coalesce() {
        let mut input = InputState::new();
        input.push(RawInput::PointerMove { x: 10.0, y: 0.0 });
        input.push(RawInput::PointerMove { x: 30.0, y: 0.0 });
        assert_eq!(input.sample().pointer_x, Some(30.0));
        assert_eq!(input.sample().pointer_x, None);
    }

    #[test]
    fn test_tap_detection() {
        let mut input = InputState::new();
        input.push(RawInput::PointerDown { x: 100.0, y: 100.0, time_ms: 1000.0 });
        input.push(RawInput::PointerUp { x: 105.0, y: 104.0, time_ms: 1200.0 });
        let commands = input.sample();
        assert!(commands.fire && commands.confirm);
        assert!(!input.sample().fire);

        // Too slow
        input.push(RawInput::PointerDown { x: 100.0, y: 100.0, time_ms: 2000.0 });
        input.push(RawInput::PointerUp { x: 100.0, y: 100.0, time_ms: 2300.0 });
        assert!(!input.sample().confirm);

        // Dragged too far
        input.push(RawInput::PointerDown { x: 100.0, y: 100.0, time_ms: 3000.0 });
        input.push(RawInput::PointerUp { x: 150.0, y: 100.0, time_ms: 3100.0 });
        assert!(!input.sample().confirm);
    }

    #[test]
    fn test_clear_releases_held_keys() {
        let mut input = InputState::new();
        input.push(RawInput::KeyDown(Key::Up));
        input.clear();
        assert!(!input.sample().accelerate);
    }

    #[test]
    fn test_tick_input_mapping() {
        let commands = Commands {
            move_axis: 1.0,
            pointer_x: Some(42.0),
            brake: true,
            ..Default::default()
        };
        let tick = commands.tick_input();
        assert_eq!(tick.steer, 1.0);
        assert_eq!(tick.target_x, Some(42.0));
        assert!(tick.brake && !tick.accelerate);
    }
}
