//! Button action DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request body for `POST /actions`.
///
/// Tagged by `action`, e.g. `{"action": "say", "text": "hola"}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ActionRequest {
    /// Stand posture.
    Stand,
    /// Sit posture.
    Sit,
    /// Text-to-speech.
    Say {
        /// Text to speak.
        text: String,
    },
    /// TTS language.
    Language {
        /// Language name.
        value: String,
    },
    /// Master volume.
    Volume {
        /// Percent, `0..=100`.
        value: u32,
    },
    /// Set LED color on one or several groups.
    Led {
        /// Single group.
        #[serde(default)]
        group: Option<String>,
        /// Several groups.
        #[serde(default)]
        groups: Option<Vec<String>>,
        /// `#rrggbb` color.
        color: String,
    },
    /// Turn an LED group off.
    LedOff {
        /// Group to turn off.
        group: String,
    },
    /// Flip autonomous life.
    Autonomous,
    /// Query autonomous-life state.
    AutonomousState,
    /// Kick (cooldown applies).
    Kick,
    /// Celebration animation.
    Siu,
    /// Turn left in place.
    TurnLeft,
    /// Turn right in place.
    TurnRight,
    /// Football mode on/off.
    Football {
        /// Requested state.
        enable: bool,
    },
    /// Query joint stats.
    Stats,
    /// Query battery.
    Battery,
    /// Query general info.
    Info,
    /// Keyboard key press.
    Key {
        /// `KeyboardEvent.key` identifier.
        key: String,
    },
}

impl ActionRequest {
    /// Short name for logs and responses.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Stand => "stand",
            Self::Sit => "sit",
            Self::Say { .. } => "say",
            Self::Language { .. } => "language",
            Self::Volume { .. } => "volume",
            Self::Led { .. } => "led",
            Self::LedOff { .. } => "ledOff",
            Self::Autonomous => "autonomous",
            Self::AutonomousState => "autonomousState",
            Self::Kick => "kick",
            Self::Siu => "siu",
            Self::TurnLeft => "turnLeft",
            Self::TurnRight => "turnRight",
            Self::Football { .. } => "football",
            Self::Stats => "stats",
            Self::Battery => "battery",
            Self::Info => "info",
            Self::Key { .. } => "key",
        }
    }
}

/// Response body for `POST /actions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResponse {
    /// Echo of the requested action.
    pub action: String,
    /// Whether the command reached an open robot link.
    pub sent: bool,
    /// Handling timestamp.
    pub timestamp: DateTime<Utc>,
}
