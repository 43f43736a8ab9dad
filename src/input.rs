use std::collections::HashSet;
use std::f32::consts::FRAC_PI_2;

use glam::Vec2;
use serde::{Deserialize, Serialize};

#[cfg(target_arch = "wasm32")]
pub mod wasm;

/// Identifier for a physical keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    Named(NamedKey),
    Character(char),
    Digit(u8),
    Function(u8),
}

impl KeyCode {
    /// Maps a DOM `KeyboardEvent.code` value such as `KeyW` or `ArrowUp`.
    pub fn from_code(code: &str) -> Option<Self> {
        if let Some(key) = parse_named_key(code) {
            return Some(key);
        }
        if let Some(letter) = code.strip_prefix("Key") {
            let mut chars = letter.chars();
            return match (chars.next(), chars.next()) {
                (Some(ch), None) if ch.is_ascii_alphabetic() => {
                    Some(Self::Character(ch.to_ascii_uppercase()))
                }
                _ => None,
            };
        }
        if let Some(digit) = code.strip_prefix("Digit") {
            return digit.parse::<u8>().ok().filter(|d| *d <= 9).map(Self::Digit);
        }
        if let Some(function) = code.strip_prefix('F') {
            if let Ok(index) = function.parse::<u8>() {
                if (1..=24).contains(&index) {
                    return Some(Self::Function(index));
                }
            }
        }
        None
    }
}

fn parse_named_key(code: &str) -> Option<KeyCode> {
    use NamedKey::*;
    let key = match code {
        "Space" => Space,
        "Enter" | "NumpadEnter" => Enter,
        "Tab" => Tab,
        "ArrowLeft" => Left,
        "ArrowRight" => Right,
        "ArrowUp" => Up,
        "ArrowDown" => Down,
        "Escape" => Escape,
        "Backspace" => Backspace,
        "ShiftLeft" => LeftShift,
        "ShiftRight" => RightShift,
        "ControlLeft" => LeftCtrl,
        "ControlRight" => RightCtrl,
        "AltLeft" => LeftAlt,
        "AltRight" => RightAlt,
        _ => return None,
    };
    Some(KeyCode::Named(key))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedKey {
    Space,
    Enter,
    Tab,
    Left,
    Right,
    Up,
    Down,
    Escape,
    Backspace,
    LeftShift,
    RightShift,
    LeftCtrl,
    RightCtrl,
    LeftAlt,
    RightAlt,
}

const FORWARD_KEYS: [KeyCode; 2] = [KeyCode::Character('W'), KeyCode::Named(NamedKey::Up)];
const BACKWARD_KEYS: [KeyCode; 2] = [KeyCode::Character('S'), KeyCode::Named(NamedKey::Down)];
const LEFT_KEYS: [KeyCode; 2] = [KeyCode::Character('A'), KeyCode::Named(NamedKey::Left)];
const RIGHT_KEYS: [KeyCode; 2] = [KeyCode::Character('D'), KeyCode::Named(NamedKey::Right)];

/// Pitch stays a little short of straight up or down.
pub const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.1;

/// Directions requested by the held movement keys.
///
/// Opposite keys held together cancel out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MovementIntent {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

impl MovementIntent {
    pub fn is_idle(&self) -> bool {
        !(self.forward || self.backward || self.left || self.right)
    }

    /// Signed `(right, forward)` axes in `-1..=1`.
    pub fn axes(&self) -> Vec2 {
        let axis = |positive: bool, negative: bool| positive as i8 as f32 - negative as i8 as f32;
        Vec2::new(
            axis(self.right, self.left),
            axis(self.forward, self.backward),
        )
    }
}

/// Held keys and accumulated mouse look.
#[derive(Debug, Clone, PartialEq)]
pub struct InputState {
    keys: HashSet<KeyCode>,
    yaw: f32,
    pitch: f32,
    look_speed: f32,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new(0.002)
    }
}

impl InputState {
    pub fn new(look_speed: f32) -> Self {
        Self {
            keys: HashSet::new(),
            yaw: 0.0,
            pitch: 0.0,
            look_speed,
        }
    }

    pub fn set_key_down(&mut self, key: KeyCode) {
        self.keys.insert(key);
    }

    pub fn set_key_up(&mut self, key: KeyCode) {
        self.keys.remove(&key);
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    pub fn release_all(&mut self) {
        self.keys.clear();
    }

    pub fn movement(&self) -> MovementIntent {
        let any = |keys: &[KeyCode]| keys.iter().any(|key| self.is_key_down(*key));
        MovementIntent {
            forward: any(&FORWARD_KEYS),
            backward: any(&BACKWARD_KEYS),
            left: any(&LEFT_KEYS),
            right: any(&RIGHT_KEYS),
        }
    }

    /// Accumulates a relative mouse motion in pixels.
    pub fn apply_look(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * self.look_speed;
        self.pitch = (self.pitch - dy * self.look_speed).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn reset_look(&mut self) {
        self.yaw = 0.0;
        self.pitch = 0.0;
    }

    pub fn set_look(&mut self, yaw: f32, pitch: f32) {
        self.yaw = yaw;
        self.pitch = pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dom_key_codes() {
        assert_eq!(KeyCode::from_code("KeyW"), Some(KeyCode::Character('W')));
        assert_eq!(
            KeyCode::from_code("ArrowUp"),
            Some(KeyCode::Named(NamedKey::Up))
        );
        assert_eq!(KeyCode::from_code("Digit7"), Some(KeyCode::Digit(7)));
        assert_eq!(KeyCode::from_code("F5"), Some(KeyCode::Function(5)));
        assert_eq!(
            KeyCode::from_code("Escape"),
            Some(KeyCode::Named(NamedKey::Escape))
        );
        assert_eq!(KeyCode::from_code("KeyWW"), None);
        assert_eq!(KeyCode::from_code("MediaPlayPause"), None);
    }

    #[test]
    fn arrows_and_letters_drive_the_same_intent() {
        let mut input = InputState::default();
        input.set_key_down(KeyCode::Named(NamedKey::Up));
        input.set_key_down(KeyCode::Character('D'));
        let intent = input.movement();
        assert!(intent.forward && intent.right);
        assert_eq!(intent.axes(), Vec2::new(1.0, 1.0));

        input.set_key_down(KeyCode::Character('S'));
        assert_eq!(input.movement().axes(), Vec2::new(1.0, 0.0));

        input.release_all();
        assert!(input.movement().is_idle());
    }

    #[test]
    fn pitch_is_clamped() {
        let mut input = InputState::default();
        input.apply_look(0.0, -100_000.0);
        assert!((input.pitch() - PITCH_LIMIT).abs() < 1e-6);
        input.apply_look(0.0, 100_000.0);
        assert!((input.pitch() + PITCH_LIMIT).abs() < 1e-6);
    }

    #[test]
    fn mouse_right_turns_right() {
        let mut input = InputState::default();
        input.apply_look(100.0, 0.0);
        assert!((input.yaw() + 0.2).abs() < 1e-6);
        input.reset_look();
        assert_eq!((input.yaw(), input.pitch()), (0.0, 0.0));
    }
}
