//! Service layer: orchestration of button actions and robot status.
//!
//! The service never owns the socket; it sends through the shared
//! [`crate::link::RobotLink`] and folds inbound telemetry into state.

pub mod controller;

pub use controller::{ControllerService, Preferences, ServiceSettings, StatusSnapshot};
