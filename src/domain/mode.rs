//! Joystick control modes and the joints they drive.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ControllerError;

/// Robot joints addressable by `move` commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Joint {
    /// Head up/down.
    HeadPitch,
    /// Head left/right.
    HeadYaw,
    /// Left shoulder forward/back.
    LShoulderPitch,
    /// Left shoulder out/in.
    LShoulderRoll,
    /// Right shoulder forward/back.
    RShoulderPitch,
    /// Right shoulder out/in.
    RShoulderRoll,
}

/// What the joystick currently drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ControlMode {
    /// Locomotion: the vector becomes a walk velocity.
    #[default]
    #[serde(rename = "walk")]
    Walk,
    /// Left arm joint targets.
    #[serde(rename = "larm")]
    LeftArm,
    /// Right arm joint targets.
    #[serde(rename = "rarm")]
    RightArm,
    /// Head joint targets.
    #[serde(rename = "head")]
    Head,
}

impl ControlMode {
    /// All modes in panel order.
    pub const ALL: [Self; 4] = [Self::Walk, Self::LeftArm, Self::RightArm, Self::Head];

    /// Wire identifier of the mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Walk => "walk",
            Self::LeftArm => "larm",
            Self::RightArm => "rarm",
            Self::Head => "head",
        }
    }

    /// Whether releasing the stick in this mode must stop the robot.
    #[must_use]
    pub const fn is_locomotion(&self) -> bool {
        matches!(self, Self::Walk)
    }

    /// `(vertical-axis joint, horizontal-axis joint)` for joint modes.
    #[must_use]
    pub const fn joints(&self) -> Option<(Joint, Joint)> {
        match self {
            Self::Walk => None,
            Self::LeftArm => Some((Joint::LShoulderPitch, Joint::LShoulderRoll)),
            Self::RightArm => Some((Joint::RShoulderPitch, Joint::RShoulderRoll)),
            Self::Head => Some((Joint::HeadPitch, Joint::HeadYaw)),
        }
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlMode {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ControllerError::UnknownMode(s.to_string()))
    }
}
