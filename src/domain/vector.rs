//! Joystick geometry and the pointer-offset to velocity-vector transform.
//!
//! The widget is a circular base of radius `R` with a circular knob of
//! radius `Rk`. The knob centre may travel anywhere inside the disk of
//! radius `LIM = R - Rk`. Pointer offsets outside that disk are pulled
//! back radially onto its boundary, then normalized into `[-1, 1]` with
//! the vertical axis flipped so that "up" is positive.

use serde::{Deserialize, Serialize};

use crate::error::ControllerError;

/// Default per-axis dead-zone threshold.
pub const DEFAULT_DEAD_ZONE: f64 = 0.05;

/// On-screen geometry of a joystick widget, captured at press time.
///
/// Coordinates are in the same space as pointer positions (client
/// pixels): `left`/`top` locate the bounding box of the base.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PadGeometry {
    /// Left edge of the base's bounding box.
    pub left: f64,
    /// Top edge of the base's bounding box.
    pub top: f64,
    /// Radius of the base (`R`).
    pub base_radius: f64,
    /// Radius of the knob (`Rk`).
    pub knob_radius: f64,
}

impl PadGeometry {
    /// Validates the geometry.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::InvalidGeometry`] when any value is not
    /// finite or the knob is at least as large as the base.
    pub fn validated(self) -> Result<Self, ControllerError> {
        let finite = [self.left, self.top, self.base_radius, self.knob_radius]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(ControllerError::InvalidGeometry(
                "non-finite coordinate".to_string(),
            ));
        }
        if self.limit() <= 0.0 {
            return Err(ControllerError::InvalidGeometry(format!(
                "knob radius {} leaves no travel inside base radius {}",
                self.knob_radius, self.base_radius
            )));
        }
        Ok(self)
    }

    /// Movable limit of the knob centre (`LIM = R - Rk`).
    #[must_use]
    pub fn limit(&self) -> f64 {
        self.base_radius - self.knob_radius
    }

    /// Offset of `(x, y)` from the centre of the base.
    #[must_use]
    pub fn offset_of(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x - self.left - self.base_radius,
            y - self.top - self.base_radius,
        )
    }
}

/// Clamps an offset to the disk of radius `lim`.
///
/// Radial, not per-axis: when the distance exceeds `lim` both components
/// are scaled by `lim / distance`, preserving direction.
#[must_use]
pub fn clamp_to_disk(dx: f64, dy: f64, lim: f64) -> (f64, f64) {
    let distance = dx.hypot(dy);
    if distance > lim && distance > 0.0 {
        let factor = lim / distance;
        (dx * factor, dy * factor)
    } else {
        (dx, dy)
    }
}

/// Zeroes a component whose magnitude is within the dead zone.
fn apply_dead_zone(component: f64, dead_zone: f64) -> f64 {
    if component.abs() > dead_zone {
        component
    } else {
        0.0
    }
}

/// Normalized joystick output, each axis in `[-1, 1]`.
///
/// `x` grows to the right, `y` grows upwards.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct JoystickVector {
    /// Horizontal axis.
    pub x: f64,
    /// Vertical axis, up positive.
    pub y: f64,
}

impl JoystickVector {
    /// The neutral vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Computes the vector for a raw pointer offset (screen space, `dy`
    /// growing downwards).
    ///
    /// Each axis is dead-zoned independently: a component with absolute
    /// value `<= dead_zone` comes out as exactly `0.0`.
    #[must_use]
    pub fn from_offset(dx: f64, dy: f64, lim: f64, dead_zone: f64) -> Self {
        if lim <= 0.0 {
            return Self::ZERO;
        }
        let (cx, cy) = clamp_to_disk(dx, dy, lim);
        let nx = cx / lim;
        let ny = -cy / lim;
        Self {
            x: apply_dead_zone(nx, dead_zone),
            y: apply_dead_zone(ny, dead_zone),
        }
    }

    /// Euclidean length.
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Whether both axes are exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}
