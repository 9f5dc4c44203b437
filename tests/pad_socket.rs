//! End-to-end tests for the pad WebSocket: operator socket in, robot
//! frames out.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    missing_docs
)]

mod common;

use std::time::Duration;

use axum::Router;
use axum::routing::get;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;

use common::{Script, WAIT, as_json, fake_robot, link, wait_open};
use nao_remote::api;
use nao_remote::app_state::AppState;
use nao_remote::config::ControllerConfig;
use nao_remote::domain::WireFormat;
use nao_remote::joystick::SessionConfig;
use nao_remote::link::RobotLink;
use nao_remote::service::{ControllerService, ServiceSettings};
use nao_remote::ws::handler::pad_ws_handler;

/// Serves the pad endpoint on an ephemeral port.
async fn serve_pad(link: &RobotLink, shutdown: watch::Receiver<bool>) -> String {
    let config = ControllerConfig::default();
    let state = AppState {
        controller: ControllerService::new(link.clone(), ServiceSettings::from(&config)),
        link: link.clone(),
        session_config: SessionConfig::default(),
        send_period: Duration::from_millis(20),
        shutdown,
    };
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws/pad", get(pad_ws_handler))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("ws://{addr}/ws/pad")
}

fn envelope(id: &str, payload: Value) -> Message {
    Message::text(
        json!({
            "id": id,
            "type": "command",
            "timestamp": "2026-01-01T00:00:00Z",
            "payload": payload
        })
        .to_string(),
    )
}

fn press_forward() -> Value {
    json!({
        "op": "press",
        "pointer": "mouse",
        "geometry": {"left": 0.0, "top": 0.0, "base_radius": 60.0, "knob_radius": 20.0},
        "x": 60.0,
        "y": 20.0
    })
}

/// Reads robot frames up to and including the next posture command.
async fn frames_until_posture(robot: &mut common::FakeRobot) -> Vec<Value> {
    let mut frames = Vec::new();
    tokio::time::timeout(WAIT, async {
        loop {
            let (_, frame) = robot.next_frame().await;
            let value = as_json(&frame);
            let is_posture = value.get("action") == Some(&json!("posture"));
            frames.push(value);
            if is_posture {
                break;
            }
        }
    })
    .await
    .expect("a posture command should follow the stop");
    frames
}

fn assert_stop_then_stand(frames: &[Value]) {
    let n = frames.len();
    assert!(n >= 2, "expected stop and stand, got {frames:?}");
    assert_eq!(
        frames[n - 2],
        json!({"action": "walk", "vx": 0.0, "vy": 0.0, "wz": 0.0})
    );
    assert_eq!(frames[n - 1], json!({"action": "posture", "value": "Stand"}));
}

#[tokio::test]
async fn server_shutdown_stops_an_active_walk() {
    let mut robot = fake_robot(Script::Echo).await;
    let link = link(robot.url.clone(), WireFormat::Json);
    let link_task = link.spawn();
    wait_open(&link).await;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let pad_url = serve_pad(&link, shutdown_rx).await;
    let (mut pad, _) = tokio_tungstenite::connect_async(pad_url).await.unwrap();

    pad.send(envelope("p1", press_forward())).await.unwrap();
    let (_, first) = robot.next_frame().await;
    assert_eq!(as_json(&first).get("vx"), Some(&json!(1.0)));

    // The gesture is still held when the server goes down.
    shutdown_tx.send_replace(true);
    assert_stop_then_stand(&frames_until_posture(&mut robot).await);

    // The operator sees the socket close.
    let closed = tokio::time::timeout(WAIT, async {
        while let Some(Ok(msg)) = pad.next().await {
            if msg.is_close() {
                return true;
            }
        }
        true
    })
    .await;
    assert!(closed.is_ok());

    link.shutdown();
    tokio::time::timeout(WAIT, link_task).await.unwrap().unwrap();
}

#[tokio::test]
async fn closing_the_pad_stops_an_active_walk() {
    let mut robot = fake_robot(Script::Echo).await;
    let link = link(robot.url.clone(), WireFormat::Json);
    let link_task = link.spawn();
    wait_open(&link).await;

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let pad_url = serve_pad(&link, shutdown_rx).await;
    let (mut pad, _) = tokio_tungstenite::connect_async(pad_url).await.unwrap();

    pad.send(envelope("p1", press_forward())).await.unwrap();
    let _ = robot.next_frame().await;
    pad.close(None).await.unwrap();

    assert_stop_then_stand(&frames_until_posture(&mut robot).await);

    link.shutdown();
    tokio::time::timeout(WAIT, link_task).await.unwrap().unwrap();
}
