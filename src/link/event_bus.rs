//! Broadcast channel for robot link events.
//!
//! [`LinkEventBus`] wraps a [`tokio::sync::broadcast`] channel. The
//! connection loop publishes a [`LinkEvent`] on every open, close and
//! inbound frame; the controller service and every operator pad
//! connection subscribe.

use serde::Serialize;
use tokio::sync::broadcast;

/// Something that happened on the robot link.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum LinkEvent {
    /// The socket reached the open state.
    Connected,
    /// The socket closed; a reconnect is scheduled.
    Disconnected,
    /// A well-formed JSON frame arrived from the robot.
    Message(serde_json::Value),
}

/// Broadcast bus for [`LinkEvent`]s.
///
/// When the ring buffer is full, the oldest events are dropped for
/// lagging receivers.
#[derive(Debug, Clone)]
pub struct LinkEventBus {
    sender: broadcast::Sender<LinkEvent>,
}

impl LinkEventBus {
    /// Creates a new bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of receivers that received the event.
    /// If there are no active receivers, the event is silently dropped.
    pub fn publish(&self, event: LinkEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Creates a new receiver that will receive all future events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.sender.subscribe()
    }
}
