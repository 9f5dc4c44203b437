//! Pad WebSocket connection loop.
//!
//! Each connection is one joystick widget: it gets its own
//! [`JoystickDriver`] for its lifetime. Client frames feed the driver
//! (pointer input, mode changes) or the controller (keys); link events
//! are pushed back so the operator sees connection state and telemetry.

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, watch};

use super::messages::{PadCommand, WsMessage, WsMessageType};
use crate::app_state::AppState;
use crate::domain::KeyAction;
use crate::joystick::{GestureSession, JoystickDriver, PadInput};
use crate::service::ControllerService;

/// Buffered pad inputs per connection before the reader waits.
const PAD_INPUT_CAPACITY: usize = 64;

/// Runs the read/write loop for a single pad connection.
///
/// When the client goes away, or the server shuts down, the driver is
/// torn down, which stops a walk gesture that was still in progress.
pub async fn run_connection(socket: WebSocket, state: AppState) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (pad_tx, pad_rx) = mpsc::channel::<PadInput>(PAD_INPUT_CAPACITY);

    let driver = JoystickDriver::new(
        GestureSession::new(state.session_config),
        state.link.clone(),
        state.send_period,
    );
    let driver_task = tokio::spawn(driver.run(pad_rx));
    let mut link_events = state.link.subscribe();
    let mut shutdown = state.shutdown.clone();

    let snapshot = serde_json::to_value(state.controller.snapshot().await).unwrap_or_default();
    let hello = WsMessage::event(serde_json::json!({ "event": "status", "data": snapshot }));
    let greeted = match hello.to_json() {
        Some(json) => ws_tx.send(Message::text(json)).await.is_ok(),
        None => true,
    };
    if !greeted {
        tracing::debug!("pad client left before greeting");
    } else {
        loop {
            tokio::select! {
                msg = ws_rx.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            let response = handle_text_message(text.as_str(), &pad_tx, &state.controller).await;
                            if let Some(resp_json) = response
                                && ws_tx.send(Message::text(resp_json)).await.is_err() {
                                    break;
                                }
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Err(e)) => {
                            tracing::debug!(error = %e, "pad socket error");
                            break;
                        }
                        _ => {}
                    }
                }
                event = link_events.recv() => {
                    match event {
                        Ok(link_event) => {
                            let payload = serde_json::to_value(&link_event).unwrap_or_default();
                            let Some(json) = WsMessage::event(payload).to_json() else {
                                continue;
                            };
                            if ws_tx.send(Message::text(json)).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!(lagged = n, "pad client lagged behind link events");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                () = server_stopping(&mut shutdown) => {
                    tracing::debug!("server shutting down; closing pad connection");
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    }

    drop(pad_tx);
    if let Err(e) = driver_task.await {
        tracing::warn!(error = %e, "joystick driver task failed");
    }
    tracing::debug!("pad connection closed");
}

/// Resolves once the server starts shutting down; never if it cannot.
async fn server_stopping(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stopping| *stopping).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Handles a text frame from the client, returning an optional JSON response.
///
/// Joystick input gets no response (it arrives at pointer-move rate);
/// keys get a `response` envelope; anything unreadable gets an `error`.
pub async fn handle_text_message(
    text: &str,
    pad_tx: &mpsc::Sender<PadInput>,
    controller: &ControllerService,
) -> Option<String> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return WsMessage::error(String::new(), 400, "malformed JSON").to_json();
    };

    if msg.msg_type != WsMessageType::Command {
        return WsMessage::error(msg.id, 400, "expected a command").to_json();
    }

    let command = match PadCommand::from_payload(&msg.payload) {
        Ok(command) => command,
        Err(e) => {
            tracing::debug!(error = %e, "unreadable pad command");
            return WsMessage::error(msg.id, 404, "unknown command").to_json();
        }
    };

    match command {
        PadCommand::Input(input) => {
            if pad_tx.send(input).await.is_err() {
                return WsMessage::error(msg.id, 500, "joystick driver stopped").to_json();
            }
            None
        }
        PadCommand::Key(key) => {
            let Some(action) = KeyAction::from_key(&key) else {
                return WsMessage::error(msg.id, 404, "unbound key").to_json();
            };
            let result = match action {
                KeyAction::SelectMode(mode) => {
                    if pad_tx.send(PadInput::Mode { mode }).await.is_err() {
                        return WsMessage::error(msg.id, 500, "joystick driver stopped").to_json();
                    }
                    Ok(true)
                }
                other => controller.handle_key(other).await,
            };
            match result {
                Ok(sent) => WsMessage::new(
                    msg.id,
                    WsMessageType::Response,
                    serde_json::json!({ "key": key, "sent": sent }),
                )
                .to_json(),
                Err(e) => {
                    let code = e.error_code();
                    WsMessage::error(msg.id, code, &e.to_string()).to_json()
                }
            }
        }
    }
}
