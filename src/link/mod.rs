//! Robot link: the WebSocket connection to the robot control server.
//!
//! [`RobotLink`] owns the socket and its reconnect loop; [`LinkEventBus`]
//! fans inbound frames and open/close transitions out to subscribers.

pub mod event_bus;
pub mod manager;

use tokio::sync::mpsc;

use crate::domain::Command;

pub use event_bus::{LinkEvent, LinkEventBus};
pub use manager::{LinkConfig, LinkState, RobotLink};

/// Destination for outbound commands.
///
/// Fire-and-forget: `send` reports whether the command left, and callers
/// never retry.
pub trait CommandSink: Send + Sync {
    /// Sends one command, returning whether it was delivered.
    fn send(&self, command: &Command) -> bool;
}

impl CommandSink for mpsc::UnboundedSender<Command> {
    fn send(&self, command: &Command) -> bool {
        mpsc::UnboundedSender::send(self, command.clone()).is_ok()
    }
}
