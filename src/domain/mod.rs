//! Domain layer: joystick geometry, control modes, commands, telemetry.
//!
//! Everything here is pure data and arithmetic; sockets and timers live
//! in [`crate::link`] and [`crate::joystick`].

pub mod command;
pub mod keymap;
pub mod mode;
pub mod telemetry;
pub mod vector;

pub use command::{Command, LedColor, Posture, WireFormat};
pub use keymap::KeyAction;
pub use mode::{ControlMode, Joint};
pub use telemetry::{BatteryLevel, RobotStatus, Telemetry};
pub use vector::{JoystickVector, PadGeometry};
