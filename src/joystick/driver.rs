//! Fixed-rate send loop around a [`GestureSession`].
//!
//! The driver owns one session and one optional [`Interval`]. Pointer
//! input and ticks are handled on the same task, so a tick always sends
//! whatever vector the last input produced. The interval exists only
//! while a gesture is active: it is created on `Idle → Active` and
//! dropped exactly once on `Active → Idle`.

use std::time::Duration;

use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use super::session::{GestureSession, PointerId};
use crate::domain::{Command, ControlMode, PadGeometry};
use crate::link::CommandSink;

/// Input events for a joystick widget.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PadInput {
    /// Pointer pressed inside the widget base.
    Press {
        /// Pointer to bind.
        pointer: PointerId,
        /// Widget geometry at press time.
        geometry: PadGeometry,
        /// Pointer x in client coordinates.
        x: f64,
        /// Pointer y in client coordinates.
        y: f64,
    },
    /// Pointer moved.
    Move {
        /// Moving pointer.
        pointer: PointerId,
        /// Pointer x in client coordinates.
        x: f64,
        /// Pointer y in client coordinates.
        y: f64,
    },
    /// Pointer released (mouse-up, touch-end, touch-cancel).
    Release {
        /// Released pointer.
        pointer: PointerId,
    },
    /// Touch points still down after a touch event.
    Touches {
        /// Identifiers of the remaining touches.
        active: Vec<u64>,
    },
    /// Control mode selected.
    Mode {
        /// New mode.
        mode: ControlMode,
    },
}

/// Drives one [`GestureSession`] against a [`CommandSink`].
#[derive(Debug)]
pub struct JoystickDriver<S> {
    session: GestureSession,
    sink: S,
    period: Duration,
    ticker: Option<Interval>,
}

impl<S: CommandSink> JoystickDriver<S> {
    /// Creates a driver sending through `sink` every `period` while active.
    #[must_use]
    pub fn new(session: GestureSession, sink: S, period: Duration) -> Self {
        Self {
            session,
            sink,
            period,
            ticker: None,
        }
    }

    /// The wrapped session.
    #[must_use]
    pub fn session(&self) -> &GestureSession {
        &self.session
    }

    /// Whether the send loop is running.
    #[must_use]
    pub fn is_sending(&self) -> bool {
        self.ticker.is_some()
    }

    /// Applies one input, starting or stopping the send loop as needed.
    pub fn handle(&mut self, input: PadInput) {
        let was_active = self.session.is_active();
        let out = match input {
            PadInput::Press {
                pointer,
                geometry,
                x,
                y,
            } => {
                if let Err(e) = self.session.press(pointer, geometry, x, y) {
                    tracing::warn!(error = %e, "joystick press rejected");
                }
                Vec::new()
            }
            PadInput::Move { pointer, x, y } => {
                self.session.move_to(pointer, x, y);
                Vec::new()
            }
            PadInput::Release { pointer } => self.session.release(pointer),
            PadInput::Touches { active } => self.session.touches_changed(&active),
            PadInput::Mode { mode } => self.session.set_mode(mode),
        };

        match (was_active, self.session.is_active()) {
            (false, true) => self.start_sending(),
            (true, false) => self.stop_sending(),
            _ => {}
        }
        self.dispatch(&out);
    }

    /// Ends any gesture (sending the release commands) and stops the loop.
    pub fn shutdown(&mut self) {
        let out = self.session.cancel();
        self.stop_sending();
        self.dispatch(&out);
    }

    /// Sends the periodic commands for the current vector.
    pub fn tick(&mut self) {
        let out = self.session.tick();
        self.dispatch(&out);
        let v = self.session.vector();
        tracing::trace!(mode = %self.session.mode(), x = v.x, y = v.y, "joystick tick");
    }

    /// Consumes inputs until the channel closes, then shuts down.
    pub async fn run(mut self, mut inputs: mpsc::Receiver<PadInput>) {
        loop {
            tokio::select! {
                input = inputs.recv() => match input {
                    Some(input) => self.handle(input),
                    None => break,
                },
                () = next_tick(&mut self.ticker) => self.tick(),
            }
        }
        self.shutdown();
        tracing::debug!("joystick driver stopped");
    }

    fn start_sending(&mut self) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.ticker = Some(ticker);
    }

    fn stop_sending(&mut self) {
        self.ticker = None;
    }

    fn dispatch(&self, commands: &[Command]) {
        for command in commands {
            if !self.sink.send(command) {
                tracing::trace!(action = command.action(), "joystick command not sent");
            }
        }
    }
}

/// Resolves on the next tick, or never when no gesture is active.
async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
