//! # nao-remote
//!
//! Remote controller for a NAO humanoid robot.
//!
//! The robot runs a WebSocket control server (port 6671 by default).
//! This crate keeps a self-healing connection to it and turns operator
//! input into robot commands: a virtual joystick that streams walk or
//! joint-move commands at a fixed rate, keyboard bindings, and one-shot
//! actions (postures, speech, LEDs, volume).
//!
//! ## Architecture
//!
//! ```text
//! Operator (HTTP, WebSocket pad)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── Pad WS Handler (ws/)
//!     │       └── JoystickDriver + GestureSession (joystick/)
//!     │
//!     ├── ControllerService (service/)
//!     │
//!     ├── RobotLink + LinkEventBus (link/)
//!     │
//!     └── Robot control server (ws://host:6671)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod joystick;
pub mod link;
pub mod service;
pub mod ws;
