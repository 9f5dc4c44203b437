//! In-process fake robot control server shared by the integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;

use nao_remote::domain::WireFormat;
use nao_remote::link::{LinkConfig, LinkState, RobotLink};

pub const WAIT: Duration = Duration::from_secs(5);

/// What the fake robot does with each incoming TCP connection.
#[derive(Debug, Clone, Copy)]
pub enum Script {
    /// Forward every text frame to the test.
    Echo,
    /// Send a list of frames right after the handshake, then forward.
    Greet(&'static [&'static str]),
    /// Complete the first handshake and close at once; forward on later ones.
    HangUpFirst,
    /// Drop the first `n` TCP connections before the handshake.
    RefuseFirst(usize),
}

/// Handle to a running fake robot.
#[derive(Debug)]
pub struct FakeRobot {
    /// `ws://` URL to connect to.
    pub url: String,
    /// `(connection index, text frame)` pairs received from clients.
    pub frames: mpsc::UnboundedReceiver<(usize, String)>,
    /// When each TCP connection was accepted.
    pub accepts: Arc<Mutex<Vec<Instant>>>,
}

impl FakeRobot {
    pub fn accept_times(&self) -> Vec<Instant> {
        self.accepts.lock().unwrap().clone()
    }

    pub async fn next_frame(&mut self) -> (usize, String) {
        tokio::time::timeout(WAIT, self.frames.recv())
            .await
            .expect("robot should receive a frame")
            .expect("fake robot alive")
    }
}

pub async fn fake_robot(script: Script) -> FakeRobot {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, frames) = mpsc::unbounded_channel();
    let accepts = Arc::new(Mutex::new(Vec::new()));
    let accepted = Arc::clone(&accepts);

    tokio::spawn(async move {
        let mut attempt = 0usize;
        let mut index = 0usize;
        while let Ok((stream, _)) = listener.accept().await {
            accepted.lock().unwrap().push(Instant::now());
            attempt += 1;

            if let Script::RefuseFirst(n) = script
                && attempt <= n
            {
                drop(stream);
                continue;
            }

            let Ok(mut socket) = tokio_tungstenite::accept_async(stream).await else {
                continue;
            };
            let conn = index;
            index += 1;

            if matches!(script, Script::HangUpFirst) && conn == 0 {
                let _ = socket.close(None).await;
                continue;
            }
            if let Script::Greet(greeting) = script {
                for frame in greeting {
                    socket.send(Message::text(*frame)).await.unwrap();
                }
            }

            let tx = tx.clone();
            tokio::spawn(async move {
                while let Some(Ok(msg)) = socket.next().await {
                    if let Message::Text(text) = msg {
                        let _ = tx.send((conn, text.as_str().to_owned()));
                    }
                }
            });
        }
    });

    FakeRobot {
        url: format!("ws://{addr}"),
        frames,
        accepts,
    }
}

pub fn link_with_delay(url: String, wire_format: WireFormat, delay: Duration) -> RobotLink {
    RobotLink::new(LinkConfig {
        url,
        reconnect_delay: delay,
        wire_format,
        event_capacity: 64,
    })
}

pub fn link(url: String, wire_format: WireFormat) -> RobotLink {
    link_with_delay(url, wire_format, Duration::from_millis(50))
}

pub async fn wait_open(link: &RobotLink) {
    let mut state = link.watch_state();
    tokio::time::timeout(WAIT, state.wait_for(|s| *s == LinkState::Open))
        .await
        .expect("link should open")
        .expect("state channel alive");
}

pub fn as_json(text: &str) -> Value {
    serde_json::from_str(text).expect("frame should be JSON")
}
