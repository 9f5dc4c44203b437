//! Inbound telemetry frames and the aggregated robot status.
//!
//! The robot pushes loosely shaped JSON objects. Nothing is enforced:
//! every field is read on its own, so a frame carrying only
//! `{"battery": 80}` and one carrying only joint maps are both valid
//! telemetry, and a mistyped field never hides the others.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

/// One telemetry frame as pushed by the robot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Telemetry {
    /// Battery charge percentage.
    pub battery: Option<f64>,
    /// Low-battery flag.
    pub low: bool,
    /// Fully-charged flag.
    pub full: bool,
    /// Joint name to temperature in °C.
    pub temperatures: Option<BTreeMap<String, f64>>,
    /// Joint name to angle in radians.
    pub angles: Option<BTreeMap<String, f64>>,
    /// Autonomous-life state.
    pub autonomous_life_enabled: Option<bool>,
    /// Message kind, used by `{"type": "stats", "data": {...}}` frames.
    pub kind: Option<String>,
    /// Payload of a `stats` frame.
    pub data: Option<Value>,
}

impl Telemetry {
    /// Reads telemetry from an already-parsed JSON value.
    ///
    /// Returns `None` only for non-object values. Fields with the wrong
    /// type are skipped; `low` and `full` follow JSON truthiness; joint
    /// entries that are not numbers are dropped from their map.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            battery: obj.get("battery").and_then(Value::as_f64),
            low: obj.get("low").is_some_and(truthy),
            full: obj.get("full").is_some_and(truthy),
            temperatures: joint_map(obj, "temperatures"),
            angles: joint_map(obj, "angles"),
            autonomous_life_enabled: obj.get("autonomousLifeEnabled").and_then(Value::as_bool),
            kind: obj.get("type").and_then(Value::as_str).map(str::to_owned),
            data: obj.get("data").cloned(),
        })
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn joint_map(obj: &Map<String, Value>, key: &str) -> Option<BTreeMap<String, f64>> {
    let joints = obj.get(key)?.as_object()?;
    Some(
        joints
            .iter()
            .filter_map(|(name, v)| v.as_f64().map(|f| (name.clone(), f)))
            .collect(),
    )
}

/// Battery display classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatteryLevel {
    /// No reading received yet.
    Unknown,
    /// Robot reports a full battery.
    Full,
    /// Robot reports a low battery.
    Low,
    /// 60 % or more.
    High,
    /// 40–59 %.
    Medium,
    /// 20–39 %.
    MediumLow,
    /// Below 20 %.
    Critical,
}

/// Aggregated robot state built from successive telemetry frames.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RobotStatus {
    /// Last battery percentage.
    pub battery: Option<f64>,
    /// Low-battery flag from the last battery frame.
    pub battery_low: bool,
    /// Full-battery flag from the last battery frame.
    pub battery_full: bool,
    /// Last joint temperatures.
    pub temperatures: BTreeMap<String, f64>,
    /// Last joint angles.
    pub angles: BTreeMap<String, f64>,
    /// Last reported autonomous-life state.
    pub autonomous_life_enabled: Option<bool>,
}

impl RobotStatus {
    /// Merges a frame into the status.
    ///
    /// Returns `true` if anything changed.
    pub fn apply(&mut self, frame: &Telemetry) -> bool {
        let before = self.clone();

        if let Some(battery) = frame.battery {
            self.battery = Some(battery);
            self.battery_low = frame.low;
            self.battery_full = frame.full;
        }

        if let (Some(temperatures), Some(angles)) = (&frame.temperatures, &frame.angles) {
            self.temperatures.clone_from(temperatures);
            self.angles.clone_from(angles);
        }

        if let Some(enabled) = frame.autonomous_life_enabled {
            self.autonomous_life_enabled = Some(enabled);
        }

        if frame.kind.as_deref() == Some("stats")
            && let Some(nested) = frame.data.as_ref().and_then(Telemetry::from_value)
        {
            self.apply(&nested);
        }

        *self != before
    }

    /// Classifies the battery for display.
    #[must_use]
    pub fn battery_level(&self) -> BatteryLevel {
        let Some(charge) = self.battery else {
            return BatteryLevel::Unknown;
        };
        if self.battery_full {
            BatteryLevel::Full
        } else if self.battery_low {
            BatteryLevel::Low
        } else if charge >= 60.0 {
            BatteryLevel::High
        } else if charge >= 40.0 {
            BatteryLevel::Medium
        } else if charge >= 20.0 {
            BatteryLevel::MediumLow
        } else {
            BatteryLevel::Critical
        }
    }
}
