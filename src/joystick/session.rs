//! Gesture session: the `Idle → Active → Idle` joystick state machine.
//!
//! A [`GestureSession`] belongs to exactly one joystick widget. It is
//! synchronous and owns no timer: each input returns the commands that
//! must go out in response, and [`GestureSession::tick`] yields the
//! periodic command for the latest vector. The async
//! [`super::JoystickDriver`] supplies the clock.
//!
//! Transitions:
//!
//! - press while `Idle` binds the pointer and computes the first vector;
//!   press while `Active` is ignored (the original binding is kept).
//! - move from the bound pointer recomputes the vector; any other
//!   pointer is ignored.
//! - release of the bound pointer, or a touch list that no longer holds
//!   the bound touch, returns to `Idle`. In locomotion the vector is
//!   zeroed and a stop (plus, optionally, a `Stand` posture) is emitted;
//!   joint modes hold their last targets.
//! - a mode change while `Active` ends the gesture under the old mode
//!   before switching.

use serde::{Deserialize, Serialize};

use crate::domain::vector::DEFAULT_DEAD_ZONE;
use crate::domain::{Command, ControlMode, JoystickVector, PadGeometry, Posture};
use crate::error::ControllerError;

/// Identifies the pointer driving a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerId {
    /// The mouse (there is only one).
    Mouse,
    /// A touch point, by its platform identifier.
    Touch(u64),
}

/// Behavior knobs for a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionConfig {
    /// Per-axis dead-zone threshold.
    pub dead_zone: f64,
    /// Send `posture: Stand` right after the stop on a walk release.
    pub stand_on_release: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dead_zone: DEFAULT_DEAD_ZONE,
            stand_on_release: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GestureState {
    Idle,
    Active {
        pointer: PointerId,
        geometry: PadGeometry,
    },
}

/// Joystick state for one widget.
#[derive(Debug, Clone)]
pub struct GestureSession {
    config: SessionConfig,
    mode: ControlMode,
    state: GestureState,
    vector: JoystickVector,
    knob: (f64, f64),
}

impl GestureSession {
    /// Creates an idle session in walk mode.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            mode: ControlMode::Walk,
            state: GestureState::Idle,
            vector: JoystickVector::ZERO,
            knob: (0.0, 0.0),
        }
    }

    /// Whether a gesture is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.state, GestureState::Active { .. })
    }

    /// Pointer bound to the current gesture.
    #[must_use]
    pub fn pointer(&self) -> Option<PointerId> {
        match self.state {
            GestureState::Idle => None,
            GestureState::Active { pointer, .. } => Some(pointer),
        }
    }

    /// Current control mode.
    #[must_use]
    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    /// Most recently computed vector.
    #[must_use]
    pub fn vector(&self) -> JoystickVector {
        self.vector
    }

    /// Knob displacement from the base centre, in pixels, for rendering.
    #[must_use]
    pub fn knob_offset(&self) -> (f64, f64) {
        self.knob
    }

    /// Starts a gesture at `(x, y)`.
    ///
    /// A press while a gesture is already active is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::InvalidGeometry`] if `geometry` leaves
    /// the knob no room to move; the session stays idle.
    pub fn press(
        &mut self,
        pointer: PointerId,
        geometry: PadGeometry,
        x: f64,
        y: f64,
    ) -> Result<(), ControllerError> {
        if let GestureState::Active { pointer: bound, .. } = self.state {
            tracing::debug!(?bound, ?pointer, "press ignored; gesture already active");
            return Ok(());
        }
        let geometry = geometry.validated()?;
        self.state = GestureState::Active { pointer, geometry };
        self.update(geometry, x, y);
        tracing::debug!(?pointer, mode = %self.mode, "gesture started");
        Ok(())
    }

    /// Moves the bound pointer to `(x, y)`.
    ///
    /// Returns `false` if no gesture is active or `pointer` is not the
    /// bound one.
    pub fn move_to(&mut self, pointer: PointerId, x: f64, y: f64) -> bool {
        match self.state {
            GestureState::Active {
                pointer: bound,
                geometry,
            } if bound == pointer => {
                self.update(geometry, x, y);
                true
            }
            _ => false,
        }
    }

    /// Releases `pointer`. Ignored unless it is the bound pointer.
    pub fn release(&mut self, pointer: PointerId) -> Vec<Command> {
        if self.pointer() == Some(pointer) {
            self.end()
        } else {
            Vec::new()
        }
    }

    /// Reports the touch points still down. A touch gesture whose
    /// identifier is missing ends as if released.
    pub fn touches_changed(&mut self, active: &[u64]) -> Vec<Command> {
        match self.pointer() {
            Some(PointerId::Touch(id)) if !active.contains(&id) => self.end(),
            _ => Vec::new(),
        }
    }

    /// Ends any active gesture regardless of pointer (widget teardown).
    pub fn cancel(&mut self) -> Vec<Command> {
        if self.is_active() {
            self.end()
        } else {
            Vec::new()
        }
    }

    /// Switches the control mode, ending an active gesture first.
    pub fn set_mode(&mut self, mode: ControlMode) -> Vec<Command> {
        if mode == self.mode {
            return Vec::new();
        }
        let out = self.cancel();
        tracing::info!(from = %self.mode, to = %mode, "control mode changed");
        self.mode = mode;
        out
    }

    /// Commands for one send tick; empty while idle.
    #[must_use]
    pub fn tick(&self) -> Vec<Command> {
        if self.is_active() {
            Command::for_vector(self.mode, self.vector)
        } else {
            Vec::new()
        }
    }

    fn update(&mut self, geometry: PadGeometry, x: f64, y: f64) {
        let lim = geometry.limit();
        let (dx, dy) = geometry.offset_of(x, y);
        self.knob = crate::domain::vector::clamp_to_disk(dx, dy, lim);
        self.vector = JoystickVector::from_offset(dx, dy, lim, self.config.dead_zone);
    }

    fn end(&mut self) -> Vec<Command> {
        self.state = GestureState::Idle;
        self.knob = (0.0, 0.0);

        if !self.mode.is_locomotion() {
            tracing::debug!(mode = %self.mode, "gesture ended; holding position");
            return Vec::new();
        }

        self.vector = JoystickVector::ZERO;
        let mut out = vec![Command::stop()];
        if self.config.stand_on_release {
            out.push(Command::Posture {
                value: Posture::Stand,
            });
        }
        tracing::debug!(stand = self.config.stand_on_release, "walk stopped");
        out
    }
}

impl Default for GestureSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::Joint;

    const EPS: f64 = 1e-9;

    // Base at (0, 0) with R = 60, Rk = 20: centre (60, 60), LIM = 40.
    fn geometry() -> PadGeometry {
        PadGeometry {
            left: 0.0,
            top: 0.0,
            base_radius: 60.0,
            knob_radius: 20.0,
        }
    }

    fn pressed(mode: ControlMode, stand_on_release: bool) -> GestureSession {
        let mut session = GestureSession::new(SessionConfig {
            stand_on_release,
            ..SessionConfig::default()
        });
        let _ = session.set_mode(mode);
        let Ok(()) = session.press(PointerId::Mouse, geometry(), 60.0, 60.0) else {
            panic!("press must succeed");
        };
        session
    }

    #[test]
    fn centre_press_is_neutral_and_active() {
        let session = pressed(ControlMode::Walk, true);
        assert!(session.is_active());
        assert_eq!(session.vector(), JoystickVector::ZERO);
        assert_eq!(session.tick(), vec![Command::stop()]);
    }

    #[test]
    fn drag_right_walks_sideways() {
        let mut session = pressed(ControlMode::Walk, true);
        assert!(session.move_to(PointerId::Mouse, 120.0, 60.0));
        assert!((session.vector().x - 1.0).abs() < EPS);
        assert_eq!(
            session.tick(),
            vec![Command::Walk {
                vx: 0.0,
                vy: 1.0,
                wz: 0.0
            }]
        );
        let (kx, ky) = session.knob_offset();
        assert!((kx - 40.0).abs() < EPS && ky.abs() < EPS);
    }

    #[test]
    fn drag_far_up_is_clamped() {
        let mut session = pressed(ControlMode::Walk, true);
        session.move_to(PointerId::Mouse, 60.0, -500.0);
        assert!((session.vector().y - 1.0).abs() < EPS);
        assert!((session.vector().magnitude() - 1.0).abs() < EPS);
    }

    #[test]
    fn walk_release_stops_then_stands() {
        let mut session = pressed(ControlMode::Walk, true);
        session.move_to(PointerId::Mouse, 60.0, 20.0);
        let out = session.release(PointerId::Mouse);
        assert_eq!(
            out,
            vec![
                Command::stop(),
                Command::Posture {
                    value: Posture::Stand
                }
            ]
        );
        assert!(!session.is_active());
        assert_eq!(session.vector(), JoystickVector::ZERO);
        assert_eq!(session.knob_offset(), (0.0, 0.0));
        assert!(session.tick().is_empty());
    }

    #[test]
    fn walk_release_without_stand_policy() {
        let mut session = pressed(ControlMode::Walk, false);
        assert_eq!(session.release(PointerId::Mouse), vec![Command::stop()]);
    }

    #[test]
    fn joint_release_holds_targets() {
        let mut session = pressed(ControlMode::Head, true);
        session.move_to(PointerId::Mouse, 80.0, 40.0);
        let held = session.vector();
        assert!(!held.is_zero());

        let before = session.tick();
        assert_eq!(
            before,
            vec![
                Command::Move {
                    joint: Joint::HeadPitch,
                    value: held.y
                },
                Command::Move {
                    joint: Joint::HeadYaw,
                    value: held.x
                },
            ]
        );

        assert!(session.release(PointerId::Mouse).is_empty());
        assert_eq!(session.vector(), held);
        assert_eq!(session.knob_offset(), (0.0, 0.0));
    }

    #[test]
    fn reentrant_press_keeps_binding() {
        let mut session = pressed(ControlMode::Walk, true);
        let Ok(()) = session.press(PointerId::Touch(7), geometry(), 0.0, 0.0) else {
            panic!("re-press is a no-op, not an error");
        };
        assert_eq!(session.pointer(), Some(PointerId::Mouse));
        assert_eq!(session.vector(), JoystickVector::ZERO);
    }

    #[test]
    fn foreign_pointer_is_ignored() {
        let mut session = GestureSession::default();
        let Ok(()) = session.press(PointerId::Touch(1), geometry(), 60.0, 60.0) else {
            panic!("press must succeed");
        };
        assert!(!session.move_to(PointerId::Touch(2), 100.0, 60.0));
        assert!(session.release(PointerId::Mouse).is_empty());
        assert!(session.is_active());
    }

    #[test]
    fn losing_bound_touch_releases() {
        let mut session = GestureSession::default();
        let Ok(()) = session.press(PointerId::Touch(3), geometry(), 60.0, 60.0) else {
            panic!("press must succeed");
        };
        assert!(session.touches_changed(&[3, 4]).is_empty());
        assert!(session.is_active());
        let out = session.touches_changed(&[4]);
        assert_eq!(out.first(), Some(&Command::stop()));
        assert!(!session.is_active());
    }

    #[test]
    fn mode_change_mid_gesture_stops_walk_first() {
        let mut session = pressed(ControlMode::Walk, false);
        session.move_to(PointerId::Mouse, 60.0, 0.0);
        let out = session.set_mode(ControlMode::LeftArm);
        assert_eq!(out, vec![Command::stop()]);
        assert_eq!(session.mode(), ControlMode::LeftArm);
        assert!(!session.is_active());
    }

    #[test]
    fn bad_geometry_keeps_session_idle() {
        let mut session = GestureSession::default();
        let geo = PadGeometry {
            knob_radius: 60.0,
            ..geometry()
        };
        assert!(session.press(PointerId::Mouse, geo, 0.0, 0.0).is_err());
        assert!(!session.is_active());
    }

    #[test]
    fn cancel_when_idle_sends_nothing() {
        let mut session = GestureSession::default();
        assert!(session.cancel().is_empty());
    }
}
