//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Every key has a default matching the
//! stock robot setup, so an empty environment yields a working gateway
//! pointed at a robot on `127.0.0.1:6671`.

use std::net::SocketAddr;
use std::time::Duration;

use crate::domain::WireFormat;
use crate::error::ControllerError;

/// Port the robot-side control server listens on.
pub const DEFAULT_ROBOT_PORT: u16 = 6671;

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`ControllerConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Socket address the operator-facing HTTP server binds to.
    pub listen_addr: SocketAddr,

    /// Hostname or IP of the robot.
    pub robot_host: String,

    /// WebSocket port of the robot control server.
    pub robot_port: u16,

    /// Fixed delay between a socket close and the next connection attempt.
    pub reconnect_delay_ms: u64,

    /// Joystick command rate while a gesture is active.
    pub send_rate_hz: u32,

    /// Per-axis dead-zone threshold on the normalized joystick vector.
    pub dead_zone: f64,

    /// Outbound encoding (`json` or the legacy `text` walk line).
    pub wire_format: WireFormat,

    /// Whether releasing a walk gesture also sends a `Stand` posture.
    pub stand_on_release: bool,

    /// Seconds between battery polls while connected.
    pub battery_poll_secs: u64,

    /// Seconds between autonomous-life state polls while connected.
    pub autonomous_poll_secs: u64,

    /// Seconds the kick button stays disabled after a kick.
    pub kick_cooldown_secs: u64,

    /// Capacity of the link event broadcast channel.
    pub event_bus_capacity: usize,

    /// Emit logs as JSON lines instead of the human-readable format.
    pub log_json: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            robot_host: "127.0.0.1".to_string(),
            robot_port: DEFAULT_ROBOT_PORT,
            reconnect_delay_ms: 3000,
            send_rate_hz: 15,
            dead_zone: 0.05,
            wire_format: WireFormat::Json,
            stand_on_release: true,
            battery_poll_secs: 10,
            autonomous_poll_secs: 30,
            kick_cooldown_secs: 20,
            event_bus_capacity: 1024,
            log_json: false,
        }
    }
}

impl ControllerConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to the defaults of [`ControllerConfig::default`] when a
    /// variable is not set. Calls `dotenvy::dotenv().ok()` to optionally
    /// load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Config`] if `LISTEN_ADDR` or
    /// `WIRE_FORMAT` is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ControllerError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::Config`] if `LISTEN_ADDR` or
    /// `WIRE_FORMAT` is present but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let listen_addr = match lookup("LISTEN_ADDR") {
            Some(raw) => raw
                .parse()
                .map_err(|e| ControllerError::Config(format!("LISTEN_ADDR={raw}: {e}")))?,
            None => defaults.listen_addr,
        };

        let wire_format = match lookup("WIRE_FORMAT") {
            Some(raw) => raw.parse()?,
            None => defaults.wire_format,
        };

        let dead_zone = parse_key(&lookup, "DEAD_ZONE", defaults.dead_zone);
        let dead_zone = if (0.0..1.0).contains(&dead_zone) {
            dead_zone
        } else {
            tracing::warn!(dead_zone, "DEAD_ZONE outside [0, 1); using default");
            defaults.dead_zone
        };

        Ok(Self {
            listen_addr,
            robot_host: lookup("ROBOT_HOST").unwrap_or(defaults.robot_host),
            robot_port: parse_key(&lookup, "ROBOT_PORT", defaults.robot_port),
            reconnect_delay_ms: parse_key(&lookup, "RECONNECT_DELAY_MS", defaults.reconnect_delay_ms),
            send_rate_hz: parse_key(&lookup, "SEND_RATE_HZ", defaults.send_rate_hz).max(1),
            dead_zone,
            wire_format,
            stand_on_release: parse_key_bool(&lookup, "STAND_ON_RELEASE", defaults.stand_on_release),
            battery_poll_secs: parse_key(&lookup, "BATTERY_POLL_SECS", defaults.battery_poll_secs),
            autonomous_poll_secs: parse_key(
                &lookup,
                "AUTONOMOUS_POLL_SECS",
                defaults.autonomous_poll_secs,
            ),
            kick_cooldown_secs: parse_key(&lookup, "KICK_COOLDOWN_SECS", defaults.kick_cooldown_secs),
            event_bus_capacity: parse_key(&lookup, "EVENT_BUS_CAPACITY", defaults.event_bus_capacity)
                .max(1),
            log_json: wants_json_logs(&lookup),
        })
    }

    /// `ws://` URL of the robot control server.
    #[must_use]
    pub fn robot_url(&self) -> String {
        format!("ws://{}:{}", self.robot_host, self.robot_port)
    }

    /// Reconnect delay as a [`Duration`].
    #[must_use]
    pub const fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    /// Period of the joystick send loop.
    #[must_use]
    pub fn send_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.send_rate_hz.max(1)))
    }
}

/// Whether `LOG_FORMAT` asks for JSON log lines.
///
/// Read on its own so logging can be set up before the rest of the
/// configuration is parsed (and its warnings emitted).
pub fn wants_json_logs<F>(lookup: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup("LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json"))
}

/// Parses `key` as `T`, returning `default` on missing or invalid values.
fn parse_key<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    lookup(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Parses `key` as a boolean. Accepts `"true"`, `"1"`, `"false"`, `"0"`
/// (case-insensitive). Returns `default` otherwise.
fn parse_key_bool<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).map(|v| v.to_ascii_lowercase()).as_deref() {
        Some("true" | "1") => true,
        Some("false" | "0") => false,
        _ => default,
    }
}
