//! Joystick transport: gesture state machine plus its fixed-rate driver.
//!
//! One [`GestureSession`] and one [`JoystickDriver`] exist per joystick
//! widget. They are constructed when the widget attaches and torn down
//! with it; nothing here is global.

pub mod driver;
pub mod session;

pub use driver::{JoystickDriver, PadInput};
pub use session::{GestureSession, PointerId, SessionConfig};
