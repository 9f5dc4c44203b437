//! Robot connection manager.
//!
//! [`RobotLink`] owns the single WebSocket connection to the robot
//! control server. It reconnects after a fixed delay whenever the socket
//! closes or a connection attempt fails, forever, with no backoff growth.
//! Outbound commands are written only while the socket is open; anything
//! sent in another state is dropped, never queued for a later connection.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::event_bus::{LinkEvent, LinkEventBus};
use super::CommandSink;
use crate::config::ControllerConfig;
use crate::domain::{Command, WireFormat};

/// Connection state as seen by the rest of the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    /// A connection attempt is in flight.
    Connecting,
    /// The socket is open; commands are delivered.
    Open,
    /// The socket closed; waiting out the reconnect delay.
    Reconnecting,
    /// [`RobotLink::shutdown`] was called; no further attempts.
    Stopped,
}

/// Settings for a [`RobotLink`].
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// `ws://host:port` of the robot control server.
    pub url: String,
    /// Delay between a close and the next attempt.
    pub reconnect_delay: Duration,
    /// Outbound encoding.
    pub wire_format: WireFormat,
    /// Capacity of the link event bus.
    pub event_capacity: usize,
}

impl From<&ControllerConfig> for LinkConfig {
    fn from(config: &ControllerConfig) -> Self {
        Self {
            url: config.robot_url(),
            reconnect_delay: config.reconnect_delay(),
            wire_format: config.wire_format,
            event_capacity: config.event_bus_capacity,
        }
    }
}

type RobotSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug)]
struct LinkInner {
    config: LinkConfig,
    state: watch::Sender<LinkState>,
    outbound: watch::Sender<Option<mpsc::UnboundedSender<Message>>>,
    last_message: watch::Sender<Option<serde_json::Value>>,
    shutdown: watch::Sender<bool>,
    events: LinkEventBus,
}

/// Cloneable handle to the robot connection.
///
/// Construct with [`RobotLink::new`], start the background loop with
/// [`RobotLink::spawn`], and stop it with [`RobotLink::shutdown`].
#[derive(Debug, Clone)]
pub struct RobotLink {
    inner: Arc<LinkInner>,
}

impl RobotLink {
    /// Creates an idle link. Nothing connects until [`RobotLink::spawn`].
    #[must_use]
    pub fn new(config: LinkConfig) -> Self {
        let events = LinkEventBus::new(config.event_capacity);
        Self {
            inner: Arc::new(LinkInner {
                config,
                state: watch::Sender::new(LinkState::Connecting),
                outbound: watch::Sender::new(None),
                last_message: watch::Sender::new(None),
                shutdown: watch::Sender::new(false),
                events,
            }),
        }
    }

    /// Target URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.inner.config.url
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> LinkState {
        *self.inner.state.borrow()
    }

    /// Whether commands are currently delivered.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == LinkState::Open
    }

    /// Receiver that observes every state transition.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<LinkState> {
        self.inner.state.subscribe()
    }

    /// The most recent well-formed JSON frame received from the robot.
    #[must_use]
    pub fn last_message(&self) -> Option<serde_json::Value> {
        self.inner.last_message.borrow().clone()
    }

    /// Subscribes to link events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LinkEvent> {
        self.inner.events.subscribe()
    }

    /// Publishes an event as if the socket produced it.
    #[cfg(test)]
    pub(crate) fn publish(&self, event: LinkEvent) {
        self.inner.events.publish(event);
    }

    /// Sends `command` if the socket is open.
    ///
    /// Returns whether the frame was handed to the socket. Dropped
    /// commands are not retried.
    pub fn send(&self, command: &Command) -> bool {
        if !self.is_open() {
            tracing::trace!(action = command.action(), "link not open; command dropped");
            return false;
        }
        let Some(frame) = command.encode(self.inner.config.wire_format) else {
            tracing::debug!(
                action = command.action(),
                format = %self.inner.config.wire_format,
                "command not representable in wire format"
            );
            return false;
        };
        let outbound = self.inner.outbound.borrow();
        outbound
            .as_ref()
            .is_some_and(|tx| tx.send(Message::text(frame)).is_ok())
    }

    /// Starts the connect/reconnect loop on the current runtime.
    pub fn spawn(&self) -> JoinHandle<()> {
        tokio::spawn(self.clone().run())
    }

    /// Stops the reconnect loop and closes the socket if open.
    pub fn shutdown(&self) {
        self.inner.shutdown.send_replace(true);
    }

    /// Runs the connect/reconnect loop until [`RobotLink::shutdown`].
    pub async fn run(self) {
        let mut shutdown = self.inner.shutdown.subscribe();
        let url = self.inner.config.url.clone();
        let delay = self.inner.config.reconnect_delay;

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.set_state(LinkState::Connecting);
            tracing::info!(%url, "connecting to robot");

            let attempt = tokio::select! {
                result = tokio_tungstenite::connect_async(url.as_str()) => Some(result),
                _ = shutdown.changed() => None,
            };

            match attempt {
                None => break,
                Some(Ok((socket, _response))) => self.serve(socket, &mut shutdown).await,
                Some(Err(e)) => tracing::warn!(%url, error = %e, "robot connection failed"),
            }

            if *shutdown.borrow() {
                break;
            }

            self.set_state(LinkState::Reconnecting);
            tracing::warn!(
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "robot link down; reconnecting"
            );

            tokio::select! {
                () = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => break,
            }
        }

        self.set_state(LinkState::Stopped);
        tracing::info!(%url, "robot link stopped");
    }

    /// Pumps one open socket until it closes.
    async fn serve(&self, socket: RobotSocket, shutdown: &mut watch::Receiver<bool>) {
        let (mut ws_tx, mut ws_rx) = socket.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();

        self.inner.outbound.send_replace(Some(out_tx));
        self.set_state(LinkState::Open);
        self.inner.events.publish(LinkEvent::Connected);
        tracing::info!(url = %self.inner.config.url, "robot link open");

        loop {
            tokio::select! {
                frame = ws_rx.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => self.handle_inbound(text.as_str()),
                        Some(Ok(Message::Close(reason))) => {
                            tracing::debug!(?reason, "robot closed the link");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!(error = %e, "robot link error");
                            break;
                        }
                        None => break,
                    }
                }
                outgoing = out_rx.recv() => {
                    let Some(message) = outgoing else { break };
                    if let Err(e) = ws_tx.send(message).await {
                        tracing::warn!(error = %e, "robot link write failed");
                        break;
                    }
                }
                _ = shutdown.changed() => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
            }
        }

        self.inner.outbound.send_replace(None);
        self.inner.events.publish(LinkEvent::Disconnected);
        tracing::info!(url = %self.inner.config.url, "robot link closed");
    }

    /// Parses an inbound text frame; malformed frames are logged and dropped.
    fn handle_inbound(&self, text: &str) {
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(value) => {
                tracing::debug!(frame = %value, "robot frame received");
                self.inner.last_message.send_replace(Some(value.clone()));
                self.inner.events.publish(LinkEvent::Message(value));
            }
            Err(e) => {
                tracing::warn!(error = %e, frame = text, "dropping malformed robot frame");
            }
        }
    }

    fn set_state(&self, state: LinkState) {
        let previous = self.inner.state.send_replace(state);
        if previous != state {
            tracing::debug!(?previous, ?state, "link state changed");
        }
    }
}

impl CommandSink for RobotLink {
    fn send(&self, command: &Command) -> bool {
        Self::send(self, command)
    }
}
