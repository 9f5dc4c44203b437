//! Controller service: button actions, polling and robot status.
//!
//! Everything the operator can trigger besides the joystick lands here.
//! Each action builds one [`Command`] and hands it to the [`RobotLink`];
//! the boolean results report whether the frame left (fire-and-forget,
//! so `false` simply means the link was down).

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::ControllerConfig;
use crate::domain::command::TURN_SPEED;
use crate::domain::{BatteryLevel, Command, KeyAction, LedColor, Posture, RobotStatus, Telemetry};
use crate::error::ControllerError;
use crate::link::{LinkEvent, LinkState, RobotLink};

/// LED groups the robot understands.
pub const LED_GROUPS: [&str; 10] = [
    "AllLeds",
    "EarLeds",
    "LeftEarLeds",
    "RightEarLeds",
    "FaceLeds",
    "LeftFaceLeds",
    "RightFaceLeds",
    "FeetLeds",
    "LeftFootLeds",
    "RightFootLeds",
];

/// Walk speed used by the movement keys.
pub const KEY_WALK_SPEED: f64 = 0.5;

/// Delay before re-querying autonomous life after toggling it.
const AUTONOMOUS_REQUERY_DELAY: Duration = Duration::from_millis(500);

/// Upper bound on the kick cooldown.
pub const MAX_KICK_COOLDOWN: Duration = Duration::from_secs(86_400);

/// Timing knobs for the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceSettings {
    /// Minimum spacing between kicks.
    pub kick_cooldown: Duration,
    /// Battery poll period while connected.
    pub battery_poll: Duration,
    /// Autonomous-life poll period while connected.
    pub autonomous_poll: Duration,
}

impl From<&ControllerConfig> for ServiceSettings {
    fn from(config: &ControllerConfig) -> Self {
        Self {
            kick_cooldown: Duration::from_secs(config.kick_cooldown_secs).min(MAX_KICK_COOLDOWN),
            battery_poll: Duration::from_secs(config.battery_poll_secs.max(1)),
            autonomous_poll: Duration::from_secs(config.autonomous_poll_secs.max(1)),
        }
    }
}

/// Operator preferences re-applied on every reconnect. In memory only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Preferences {
    /// Last volume set, percent.
    pub volume: Option<u8>,
    /// Last TTS language set.
    pub language: Option<String>,
}

#[derive(Debug, Default)]
struct ControllerState {
    robot: RobotStatus,
    autonomous_enabled: bool,
    football_mode: bool,
    kick_ready_at: Option<Instant>,
    preferences: Preferences,
}

/// Point-in-time view of the controller for status displays.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    /// Robot link state.
    pub connection: LinkState,
    /// Robot link target.
    pub robot_url: String,
    /// Aggregated telemetry.
    pub robot: RobotStatus,
    /// Battery classification.
    pub battery_level: BatteryLevel,
    /// Autonomous life as last known.
    pub autonomous_enabled: bool,
    /// Football UI active.
    pub football_mode: bool,
    /// Seconds until the next kick is accepted (0 when ready).
    pub kick_cooldown_secs: u64,
    /// Preferences re-applied on reconnect.
    pub preferences: Preferences,
}

/// Orchestration layer for all non-joystick actions.
///
/// Cheap to clone: the link is a handle and the state is shared.
#[derive(Debug, Clone)]
pub struct ControllerService {
    link: RobotLink,
    settings: ServiceSettings,
    state: Arc<RwLock<ControllerState>>,
}

impl ControllerService {
    /// Creates a new `ControllerService`.
    #[must_use]
    pub fn new(link: RobotLink, settings: ServiceSettings) -> Self {
        Self {
            link,
            settings,
            state: Arc::new(RwLock::new(ControllerState::default())),
        }
    }

    /// Returns a reference to the inner [`RobotLink`].
    #[must_use]
    pub fn link(&self) -> &RobotLink {
        &self.link
    }

    fn send(&self, command: &Command) -> bool {
        let sent = self.link.send(command);
        if sent {
            tracing::info!(action = command.action(), "command sent");
        } else {
            tracing::debug!(action = command.action(), "command dropped; link not open");
        }
        sent
    }

    /// Sends the `Stand` posture.
    pub fn stand(&self) -> bool {
        self.send(&Command::Posture {
            value: Posture::Stand,
        })
    }

    /// Sends the `Sit` posture.
    pub fn sit(&self) -> bool {
        self.send(&Command::Posture {
            value: Posture::Sit,
        })
    }

    /// Speaks `text`.
    pub fn say(&self, text: &str) -> bool {
        self.send(&Command::Say {
            text: text.to_string(),
        })
    }

    /// Sets the TTS language and remembers it for reconnects.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::InvalidRequest`] for a blank language.
    pub async fn set_language(&self, language: &str) -> Result<bool, ControllerError> {
        let language = language.trim();
        if language.is_empty() {
            return Err(ControllerError::InvalidRequest(
                "language must not be empty".to_string(),
            ));
        }
        self.state.write().await.preferences.language = Some(language.to_string());
        Ok(self.send(&Command::Language {
            value: language.to_string(),
        }))
    }

    /// Sets the master volume and remembers it for reconnects.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::InvalidRequest`] if `volume > 100`.
    pub async fn set_volume(&self, volume: u32) -> Result<bool, ControllerError> {
        let value = u8::try_from(volume)
            .ok()
            .filter(|v| *v <= 100)
            .ok_or_else(|| {
                ControllerError::InvalidRequest(format!("volume {volume} outside 0..=100"))
            })?;
        self.state.write().await.preferences.volume = Some(value);
        Ok(self.send(&Command::Volume { value }))
    }

    /// Sets an LED group to a `#rrggbb` color.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::InvalidRequest`] for an unknown group and
    /// [`ControllerError::InvalidColor`] for a malformed color.
    pub fn set_led(&self, group: &str, hex: &str) -> Result<bool, ControllerError> {
        check_led_group(group)?;
        let color = LedColor::from_hex(hex)?;
        Ok(self.send(&Command::led(group, color)))
    }

    /// Sets several LED groups to one color in a single frame.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::InvalidRequest`] for an empty list or an
    /// unknown group and [`ControllerError::InvalidColor`] for a malformed
    /// color.
    pub fn set_led_groups(&self, groups: &[String], hex: &str) -> Result<bool, ControllerError> {
        if groups.is_empty() {
            return Err(ControllerError::InvalidRequest(
                "at least one LED group is required".to_string(),
            ));
        }
        for group in groups {
            check_led_group(group)?;
        }
        let color = LedColor::from_hex(hex)?;
        Ok(self.send(&Command::led_groups(groups.to_vec(), color)))
    }

    /// Turns an LED group off.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::InvalidRequest`] for an unknown group.
    pub fn led_off(&self, group: &str) -> Result<bool, ControllerError> {
        check_led_group(group)?;
        Ok(self.send(&Command::led(group, LedColor::OFF)))
    }

    /// Flips autonomous life and re-queries the robot shortly after.
    pub async fn toggle_autonomous(&self) -> bool {
        let enable = {
            let mut state = self.state.write().await;
            state.autonomous_enabled = !state.autonomous_enabled;
            state.autonomous_enabled
        };
        let sent = self.send(&Command::Autonomous { enable });
        if sent {
            let link = self.link.clone();
            tokio::spawn(async move {
                tokio::time::sleep(AUTONOMOUS_REQUERY_DELAY).await;
                link.send(&Command::GetAutonomousLife);
            });
        }
        sent
    }

    /// Asks the robot for its autonomous-life state.
    pub fn request_autonomous_state(&self) -> bool {
        self.send(&Command::GetAutonomousLife)
    }

    /// Asks the robot for joint temperatures and angles.
    pub fn request_stats(&self) -> bool {
        self.send(&Command::Stats)
    }

    /// Asks the robot for its battery charge.
    pub fn request_battery(&self) -> bool {
        self.send(&Command::GetBattery)
    }

    /// Asks the robot for general info.
    pub fn request_info(&self) -> bool {
        self.send(&Command::GetInfo)
    }

    /// Kicks, subject to the cooldown.
    ///
    /// The cooldown starts even if the frame could not be sent.
    ///
    /// # Errors
    ///
    /// Returns [`ControllerError::KickCoolingDown`] while the previous
    /// kick's cooldown is running.
    pub async fn kick(&self) -> Result<bool, ControllerError> {
        let now = Instant::now();
        {
            let mut state = self.state.write().await;
            if let Some(ready_at) = state.kick_ready_at
                && ready_at > now
            {
                return Err(ControllerError::KickCoolingDown {
                    remaining_secs: ceil_secs(ready_at - now),
                });
            }
            let cooldown = self.settings.kick_cooldown.min(MAX_KICK_COOLDOWN);
            state.kick_ready_at = Some(now.checked_add(cooldown).unwrap_or(now));
        }
        Ok(self.send(&Command::Kick))
    }

    /// Celebration animation.
    pub fn siu(&self) -> bool {
        self.send(&Command::Siu)
    }

    /// Starts turning left in place.
    pub fn turn_left(&self) -> bool {
        self.send(&Command::TurnLeft {
            speed: TURN_SPEED,
            duration: 0.0,
        })
    }

    /// Starts turning right in place.
    pub fn turn_right(&self) -> bool {
        self.send(&Command::TurnRight {
            speed: TURN_SPEED,
            duration: 0.0,
        })
    }

    /// Switches football mode on or off.
    pub async fn set_football_mode(&self, enable: bool) -> bool {
        self.state.write().await.football_mode = enable;
        tracing::info!(enable, "football mode changed");
        self.send(&Command::FootballMode { enable })
    }

    /// Runs the service side of a key binding.
    ///
    /// Mode selection belongs to the joystick and is not handled here.
    ///
    /// # Errors
    ///
    /// Propagates [`ControllerError::KickCoolingDown`] from [`Self::kick`].
    pub async fn handle_key(&self, action: KeyAction) -> Result<bool, ControllerError> {
        if let Some((vx, vy)) = action.walk_direction() {
            return Ok(self.send(&Command::Walk {
                vx: vx * KEY_WALK_SPEED,
                vy: vy * KEY_WALK_SPEED,
                wz: 0.0,
            }));
        }
        let sent = match action {
            KeyAction::TurnLeft => self.turn_left(),
            KeyAction::TurnRight => self.turn_right(),
            KeyAction::Stop => self.send(&Command::stop()),
            KeyAction::Stand => self.stand(),
            KeyAction::Sit => self.sit(),
            KeyAction::Kick => self.kick().await?,
            KeyAction::ToggleAutonomous => self.toggle_autonomous().await,
            KeyAction::Forward
            | KeyAction::Backward
            | KeyAction::StrafeLeft
            | KeyAction::StrafeRight
            | KeyAction::SelectMode(_) => false,
        };
        Ok(sent)
    }

    /// Folds a link event into the service state.
    pub async fn ingest(&self, event: &LinkEvent) {
        match event {
            LinkEvent::Connected => self.on_connected().await,
            LinkEvent::Disconnected => {
                tracing::info!("robot disconnected; status kept until reconnect");
            }
            LinkEvent::Message(value) => {
                let Some(frame) = Telemetry::from_value(value) else {
                    tracing::debug!(frame = %value, "non-telemetry frame ignored");
                    return;
                };
                let mut state = self.state.write().await;
                if state.robot.apply(&frame) {
                    tracing::debug!(battery = ?state.robot.battery, "robot status updated");
                }
                if let Some(enabled) = frame.autonomous_life_enabled {
                    state.autonomous_enabled = enabled;
                }
            }
        }
    }

    async fn on_connected(&self) {
        let preferences = self.state.read().await.preferences.clone();
        if let Some(volume) = preferences.volume {
            self.send(&Command::Volume { value: volume });
        }
        if let Some(language) = preferences.language {
            self.send(&Command::Language { value: language });
        }
        self.request_autonomous_state();
        self.request_battery();
    }

    /// Current status for display.
    pub async fn snapshot(&self) -> StatusSnapshot {
        let state = self.state.read().await;
        let kick_cooldown_secs = state
            .kick_ready_at
            .map(|ready_at| ceil_secs(ready_at.saturating_duration_since(Instant::now())))
            .unwrap_or(0);
        StatusSnapshot {
            connection: self.link.state(),
            robot_url: self.link.url().to_string(),
            robot: state.robot.clone(),
            battery_level: state.robot.battery_level(),
            autonomous_enabled: state.autonomous_enabled,
            football_mode: state.football_mode,
            kick_cooldown_secs,
            preferences: state.preferences.clone(),
        }
    }

    /// Spawns the telemetry ingestion and polling tasks.
    ///
    /// The link subscription is taken before returning, so events
    /// published right after this call are not missed.
    pub fn spawn_background(&self) -> Vec<JoinHandle<()>> {
        let events = self.link.subscribe();
        vec![
            tokio::spawn(self.clone().ingest_loop(events)),
            tokio::spawn(self.clone().poll_loop()),
        ]
    }

    async fn ingest_loop(self, mut events: broadcast::Receiver<LinkEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => self.ingest(&event).await,
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "controller lagged behind link events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    async fn poll_loop(self) {
        let mut battery = tokio::time::interval(self.settings.battery_poll);
        let mut autonomous = tokio::time::interval(self.settings.autonomous_poll);
        battery.set_missed_tick_behavior(MissedTickBehavior::Delay);
        autonomous.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // Both fire immediately; on_connected covers the first request.
        battery.tick().await;
        autonomous.tick().await;
        loop {
            tokio::select! {
                _ = battery.tick() => {
                    if self.link.is_open() {
                        self.request_battery();
                    }
                }
                _ = autonomous.tick() => {
                    if self.link.is_open() {
                        self.request_autonomous_state();
                    }
                }
            }
        }
    }
}

fn check_led_group(group: &str) -> Result<(), ControllerError> {
    if LED_GROUPS.contains(&group) {
        Ok(())
    } else {
        Err(ControllerError::InvalidRequest(format!(
            "unknown LED group: {group}"
        )))
    }
}

/// Rounds a duration up to whole seconds.
fn ceil_secs(d: Duration) -> u64 {
    let secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        secs.saturating_add(1)
    } else {
        secs
    }
}
