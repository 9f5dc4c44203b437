//! WebSocket layer for the operator pad.
//!
//! The endpoint at `/ws/pad` carries joystick input and key presses from
//! the operator and pushes link events (connection state, telemetry) back.

pub mod connection;
pub mod handler;
pub mod messages;
