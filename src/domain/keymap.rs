//! Static keyboard bindings.
//!
//! Key identifiers follow the browser `KeyboardEvent.key` naming. The
//! mapping is a plain `match`; there is no name-based handler lookup.

use serde::{Deserialize, Serialize};

use super::mode::ControlMode;

/// Action bound to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyAction {
    /// Walk forward.
    Forward,
    /// Walk backward.
    Backward,
    /// Strafe left.
    StrafeLeft,
    /// Strafe right.
    StrafeRight,
    /// Turn in place to the left.
    TurnLeft,
    /// Turn in place to the right.
    TurnRight,
    /// Stop walking.
    Stop,
    /// Stand posture.
    Stand,
    /// Sit posture.
    Sit,
    /// Kick (subject to cooldown).
    Kick,
    /// Flip autonomous life.
    ToggleAutonomous,
    /// Switch the joystick mode.
    SelectMode(ControlMode),
}

impl KeyAction {
    /// Looks up the action bound to `key`.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        let action = match key {
            "w" | "W" | "ArrowUp" => Self::Forward,
            "s" | "S" | "ArrowDown" => Self::Backward,
            "a" | "A" | "ArrowLeft" => Self::StrafeLeft,
            "d" | "D" | "ArrowRight" => Self::StrafeRight,
            "q" | "Q" => Self::TurnLeft,
            "e" | "E" => Self::TurnRight,
            " " | "Space" | "Spacebar" => Self::Stop,
            "1" => Self::Stand,
            "2" => Self::Sit,
            "k" | "K" => Self::Kick,
            "l" | "L" => Self::ToggleAutonomous,
            "F1" => Self::SelectMode(ControlMode::Walk),
            "F2" => Self::SelectMode(ControlMode::LeftArm),
            "F3" => Self::SelectMode(ControlMode::RightArm),
            "F4" => Self::SelectMode(ControlMode::Head),
            _ => return None,
        };
        Some(action)
    }

    /// Walk direction `(vx, vy)` for the movement keys.
    #[must_use]
    pub const fn walk_direction(&self) -> Option<(f64, f64)> {
        match self {
            Self::Forward => Some((1.0, 0.0)),
            Self::Backward => Some((-1.0, 0.0)),
            Self::StrafeLeft => Some((0.0, 1.0)),
            Self::StrafeRight => Some((0.0, -1.0)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrows_and_letters_share_bindings() {
        assert_eq!(KeyAction::from_key("w"), KeyAction::from_key("ArrowUp"));
        assert_eq!(KeyAction::from_key("d"), Some(KeyAction::StrafeRight));
        assert_eq!(KeyAction::from_key(" "), Some(KeyAction::Stop));
    }

    #[test]
    fn function_keys_select_modes() {
        assert_eq!(
            KeyAction::from_key("F4"),
            Some(KeyAction::SelectMode(ControlMode::Head))
        );
    }

    #[test]
    fn unknown_keys_are_unbound() {
        assert_eq!(KeyAction::from_key("z"), None);
        assert_eq!(KeyAction::from_key("sendCmd"), None);
    }

    #[test]
    fn only_movement_keys_have_a_direction() {
        assert_eq!(KeyAction::Forward.walk_direction(), Some((1.0, 0.0)));
        assert_eq!(KeyAction::StrafeLeft.walk_direction(), Some((0.0, 1.0)));
        assert_eq!(KeyAction::Kick.walk_direction(), None);
    }
}
