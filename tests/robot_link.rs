//! Integration tests for the robot link against an in-process fake robot.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    missing_docs
)]

mod common;

use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;

use common::{Script, WAIT, as_json, fake_robot, link, link_with_delay, wait_open};
use nao_remote::domain::{Command, ControlMode, PadGeometry, Posture, WireFormat};
use nao_remote::joystick::{GestureSession, JoystickDriver, PadInput, PointerId, SessionConfig};
use nao_remote::link::{LinkEvent, LinkState};

/// Waits until `count` connect/disconnect events have been seen.
async fn lifecycle_events(
    events: &mut tokio::sync::broadcast::Receiver<LinkEvent>,
    count: usize,
) -> Vec<LinkEvent> {
    let mut seen = Vec::new();
    tokio::time::timeout(WAIT, async {
        while seen.len() < count {
            match events.recv().await {
                Ok(event @ (LinkEvent::Connected | LinkEvent::Disconnected)) => seen.push(event),
                Ok(_) => {}
                Err(e) => panic!("event bus failed: {e}"),
            }
        }
    })
    .await
    .unwrap();
    seen
}

#[tokio::test]
async fn commands_reach_the_robot_once_open() {
    let mut robot = fake_robot(Script::Echo).await;
    let link = link(robot.url.clone(), WireFormat::Json);
    let task = link.spawn();

    wait_open(&link).await;
    assert!(link.send(&Command::Posture {
        value: Posture::Sit
    }));

    let (_, frame) = robot.next_frame().await;
    assert_eq!(as_json(&frame), json!({"action": "posture", "value": "Sit"}));

    link.shutdown();
    tokio::time::timeout(WAIT, task).await.unwrap().unwrap();
    assert_eq!(link.state(), LinkState::Stopped);
}

#[tokio::test]
async fn malformed_robot_frames_keep_the_link_up() {
    let mut robot = fake_robot(Script::Greet(&["not json", r#"{"battery": 42}"#])).await;
    let link = link(robot.url.clone(), WireFormat::Json);
    let mut events = link.subscribe();
    let task = link.spawn();

    let message = tokio::time::timeout(WAIT, async {
        loop {
            match events.recv().await {
                Ok(LinkEvent::Message(value)) => break value,
                Ok(_) => {}
                Err(e) => panic!("event bus failed: {e}"),
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(message, json!({"battery": 42}));
    assert_eq!(link.last_message(), Some(json!({"battery": 42})));
    assert!(link.is_open());

    assert!(link.send(&Command::GetBattery));
    let (_, frame) = robot.next_frame().await;
    assert_eq!(as_json(&frame), json!({"action": "getBattery"}));

    link.shutdown();
    tokio::time::timeout(WAIT, task).await.unwrap().unwrap();
}

#[tokio::test]
async fn link_reconnects_after_the_robot_hangs_up() {
    let delay = Duration::from_millis(300);
    let mut robot = fake_robot(Script::HangUpFirst).await;
    let link = link_with_delay(robot.url.clone(), WireFormat::Json, delay);
    let mut events = link.subscribe();
    let task = link.spawn();

    let seen = lifecycle_events(&mut events, 2).await;
    assert_eq!(seen, vec![LinkEvent::Connected, LinkEvent::Disconnected]);

    // Nothing is attempted while the delay is running.
    tokio::time::sleep(delay / 2).await;
    assert_eq!(robot.accept_times().len(), 1);
    assert_eq!(link.state(), LinkState::Reconnecting);
    assert!(!link.send(&Command::stop()));

    let seen = lifecycle_events(&mut events, 1).await;
    assert_eq!(seen, vec![LinkEvent::Connected]);
    let accepts = robot.accept_times();
    assert!(accepts[1] - accepts[0] >= delay);

    wait_open(&link).await;
    assert!(link.send(&Command::stop()));
    let (conn, _) = robot.next_frame().await;
    assert_eq!(conn, 1);

    link.shutdown();
    tokio::time::timeout(WAIT, task).await.unwrap().unwrap();
}

#[tokio::test]
async fn link_keeps_retrying_until_the_robot_is_up() {
    let delay = Duration::from_millis(150);
    let robot = fake_robot(Script::RefuseFirst(3)).await;
    let link = link_with_delay(robot.url.clone(), WireFormat::Json, delay);
    let mut states = link.watch_state();
    let task = link.spawn();

    tokio::time::timeout(WAIT, states.wait_for(|s| *s == LinkState::Reconnecting))
        .await
        .unwrap()
        .unwrap();
    assert!(!link.is_open());

    wait_open(&link).await;
    let accepts = robot.accept_times();
    assert_eq!(accepts.len(), 4, "three failed attempts, then the open one");
    for pair in accepts.windows(2) {
        assert!(
            pair[1] - pair[0] >= delay,
            "attempt came {:?} after the previous one",
            pair[1] - pair[0]
        );
    }

    link.shutdown();
    tokio::time::timeout(WAIT, task).await.unwrap().unwrap();
    assert_eq!(link.state(), LinkState::Stopped);
}

#[tokio::test]
async fn text_format_sends_walk_lines_only() {
    let mut robot = fake_robot(Script::Echo).await;
    let link = link(robot.url.clone(), WireFormat::Text);
    let task = link.spawn();
    wait_open(&link).await;

    assert!(!link.send(&Command::Posture {
        value: Posture::Stand
    }));
    assert!(link.send(&Command::stop()));
    assert!(link.send(&Command::Walk {
        vx: 0.5,
        vy: -0.25,
        wz: 0.0
    }));

    assert_eq!(robot.next_frame().await.1, "walk 0.00 0.00 0");
    assert_eq!(robot.next_frame().await.1, "walk 0.50 -0.25 0");

    link.shutdown();
    tokio::time::timeout(WAIT, task).await.unwrap().unwrap();
}

#[tokio::test]
async fn joystick_release_sends_stop_then_stand() {
    let mut robot = fake_robot(Script::Echo).await;
    let link = link(robot.url.clone(), WireFormat::Json);
    let task = link.spawn();
    wait_open(&link).await;

    let (pad_tx, pad_rx) = mpsc::channel(8);
    let driver = JoystickDriver::new(
        GestureSession::new(SessionConfig::default()),
        link.clone(),
        Duration::from_millis(20),
    );
    let driver_task = tokio::spawn(driver.run(pad_rx));

    let geometry = PadGeometry {
        left: 0.0,
        top: 0.0,
        base_radius: 60.0,
        knob_radius: 20.0,
    };
    pad_tx
        .send(PadInput::Mode {
            mode: ControlMode::Walk,
        })
        .await
        .unwrap();
    // Press straight above the centre at the clamp limit: full forward.
    pad_tx
        .send(PadInput::Press {
            pointer: PointerId::Mouse,
            geometry,
            x: 60.0,
            y: 20.0,
        })
        .await
        .unwrap();

    let (_, first) = robot.next_frame().await;
    let walk = as_json(&first);
    assert_eq!(walk.get("action"), Some(&json!("walk")));
    assert_eq!(walk.get("vx"), Some(&json!(1.0)));
    assert_eq!(walk.get("vy"), Some(&json!(0.0)));

    pad_tx
        .send(PadInput::Release {
            pointer: PointerId::Mouse,
        })
        .await
        .unwrap();
    drop(pad_tx);
    tokio::time::timeout(WAIT, driver_task).await.unwrap().unwrap();

    // Ticks sent before the release are still in flight; the tail is what matters.
    let mut tail = Vec::new();
    while let Ok(Some((_, frame))) =
        tokio::time::timeout(Duration::from_millis(300), robot.frames.recv()).await
    {
        tail.push(as_json(&frame));
    }
    let n = tail.len();
    assert!(n >= 2, "expected stop and stand, got {tail:?}");
    assert_eq!(
        tail[n - 2],
        json!({"action": "walk", "vx": 0.0, "vy": 0.0, "wz": 0.0})
    );
    assert_eq!(tail[n - 1], json!({"action": "posture", "value": "Stand"}));

    link.shutdown();
    tokio::time::timeout(WAIT, task).await.unwrap().unwrap();
}
