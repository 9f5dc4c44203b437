//! Outbound robot commands and their wire encodings.
//!
//! Commands are stateless and fire-and-forget: no sequence numbers, no
//! acknowledgement. The JSON encoding is one object per frame tagged by
//! `action`. The legacy text encoding only knows the walk line.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::mode::{ControlMode, Joint};
use super::vector::JoystickVector;
use crate::error::ControllerError;

/// Robot postures reachable from the control buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Posture {
    /// Upright standing posture.
    Stand,
    /// Seated posture.
    Sit,
}

/// Speed used by the turn buttons.
pub const TURN_SPEED: f64 = 0.2;

/// A single command frame sent to the robot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    /// Locomotion velocity (`vx` forward, `vy` lateral, `wz` rotation).
    Walk {
        /// Forward velocity.
        vx: f64,
        /// Lateral velocity.
        vy: f64,
        /// Rotational velocity.
        wz: f64,
    },
    /// Joint position target.
    Move {
        /// Target joint.
        joint: Joint,
        /// Normalized target in `[-1, 1]`.
        value: f64,
    },
    /// Go to a predefined posture.
    Posture {
        /// Target posture.
        value: Posture,
    },
    /// Text-to-speech.
    Say {
        /// Text to speak.
        text: String,
    },
    /// Text-to-speech language.
    Language {
        /// Language name as understood by the robot (e.g. `"English"`).
        value: String,
    },
    /// Master volume.
    Volume {
        /// Volume percentage, `0..=100`.
        value: u8,
    },
    /// LED group color.
    Led {
        /// Single group name.
        #[serde(skip_serializing_if = "Option::is_none")]
        group: Option<String>,
        /// Several group names.
        #[serde(skip_serializing_if = "Option::is_none")]
        groups: Option<Vec<String>>,
        /// Red, normalized.
        r: f64,
        /// Green, normalized.
        g: f64,
        /// Blue, normalized.
        b: f64,
    },
    /// Enable or disable autonomous life.
    Autonomous {
        /// Requested state.
        enable: bool,
    },
    /// Query the autonomous-life state.
    GetAutonomousLife,
    /// Query general robot info (battery included).
    GetInfo,
    /// Query joint temperatures and angles.
    Stats,
    /// Query the battery charge.
    GetBattery,
    /// Kick (football mode).
    Kick,
    /// Celebration animation (football mode).
    Siu,
    /// Turn in place to the left.
    TurnLeft {
        /// Angular speed.
        speed: f64,
        /// Duration in seconds; `0` turns until the next command.
        duration: f64,
    },
    /// Turn in place to the right.
    TurnRight {
        /// Angular speed.
        speed: f64,
        /// Duration in seconds; `0` turns until the next command.
        duration: f64,
    },
    /// Toggle football mode on the robot side.
    #[serde(rename = "modoFutbol")]
    FootballMode {
        /// Requested state.
        enable: bool,
    },
}

impl Command {
    /// The neutral walk command.
    #[must_use]
    pub const fn stop() -> Self {
        Self::Walk {
            vx: 0.0,
            vy: 0.0,
            wz: 0.0,
        }
    }

    /// Fans a joystick vector out into the commands for `mode`.
    ///
    /// Locomotion swaps the axes: pushing up walks forward (`vx`) and
    /// pushing sideways strafes (`vy`). Joint modes emit the pitch joint
    /// (vertical axis) followed by the roll/yaw joint (horizontal axis).
    #[must_use]
    pub fn for_vector(mode: ControlMode, vector: JoystickVector) -> Vec<Self> {
        match mode.joints() {
            None => vec![Self::Walk {
                vx: vector.y,
                vy: vector.x,
                wz: 0.0,
            }],
            Some((pitch, roll)) => vec![
                Self::Move {
                    joint: pitch,
                    value: vector.y,
                },
                Self::Move {
                    joint: roll,
                    value: vector.x,
                },
            ],
        }
    }

    /// Sets one LED group to `color`.
    #[must_use]
    pub fn led(group: impl Into<String>, color: LedColor) -> Self {
        Self::Led {
            group: Some(group.into()),
            groups: None,
            r: color.r,
            g: color.g,
            b: color.b,
        }
    }

    /// Sets several LED groups to `color` in one frame.
    #[must_use]
    pub fn led_groups(groups: Vec<String>, color: LedColor) -> Self {
        Self::Led {
            group: None,
            groups: Some(groups),
            r: color.r,
            g: color.g,
            b: color.b,
        }
    }

    /// The `action` tag of this command.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::Walk { .. } => "walk",
            Self::Move { .. } => "move",
            Self::Posture { .. } => "posture",
            Self::Say { .. } => "say",
            Self::Language { .. } => "language",
            Self::Volume { .. } => "volume",
            Self::Led { .. } => "led",
            Self::Autonomous { .. } => "autonomous",
            Self::GetAutonomousLife => "getAutonomousLife",
            Self::GetInfo => "getInfo",
            Self::Stats => "stats",
            Self::GetBattery => "getBattery",
            Self::Kick => "kick",
            Self::Siu => "siu",
            Self::TurnLeft { .. } => "turnLeft",
            Self::TurnRight { .. } => "turnRight",
            Self::FootballMode { .. } => "modoFutbol",
        }
    }

    /// Encodes the command for `format`.
    ///
    /// Returns `None` when the format cannot represent the command (the
    /// text protocol only carries walk lines).
    #[must_use]
    pub fn encode(&self, format: WireFormat) -> Option<String> {
        match format {
            WireFormat::Json => serde_json::to_string(self).ok(),
            WireFormat::Text => match self {
                Self::Walk { vx, vy, wz } => Some(format!("walk {vx:.2} {vy:.2} {wz}")),
                _ => None,
            },
        }
    }
}

/// Outbound frame encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// One JSON object per frame.
    #[default]
    Json,
    /// Plain `walk <vx> <vy> <wz>` lines.
    Text,
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Text => f.write_str("text"),
        }
    }
}

impl FromStr for WireFormat {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            other => Err(ControllerError::Config(format!(
                "unknown wire format: {other}"
            ))),
        }
    }
}

/// LED color with channels normalized to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedColor {
    /// Red.
    pub r: f64,
    /// Green.
    pub g: f64,
    /// Blue.
    pub b: f64,
}

impl LedColor {
    /// All channels off.
    pub const OFF: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    /// Parses a `#rrggbb` color picker value.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::InvalidColor`] if `hex` is not a `#`
    /// followed by exactly six hex digits.
    pub fn from_hex(hex: &str) -> Result<Self, ControllerError> {
        let invalid = || ControllerError::InvalidColor(hex.to_string());
        let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| -> Result<f64, ControllerError> {
            let part = digits.get(range).ok_or_else(invalid)?;
            let value = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
            Ok(f64::from(value) / 255.0)
        };
        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }
}
