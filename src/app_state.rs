//! Shared application state injected into all Axum handlers.

use std::time::Duration;

use tokio::sync::watch;

use crate::joystick::SessionConfig;
use crate::link::RobotLink;
use crate::service::ControllerService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Controller service for button actions and status.
    pub controller: ControllerService,
    /// Robot link used by joystick drivers.
    pub link: RobotLink,
    /// Settings for each new joystick session.
    pub session_config: SessionConfig,
    /// Joystick send period.
    pub send_period: Duration,
    /// Flips to `true` when the server is shutting down; pad
    /// connections close and stop their joysticks.
    pub shutdown: watch::Receiver<bool>,
}
