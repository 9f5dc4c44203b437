//! Button action handler.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{ActionRequest, ActionResponse};
use crate::app_state::AppState;
use crate::domain::KeyAction;
use crate::error::ControllerError;

/// `POST /actions` — Trigger a button action on the robot.
///
/// Responds `200` with `sent: false` when the robot link is down; the
/// command is dropped, not queued.
///
/// # Errors
///
/// Returns [`ControllerError`] on invalid input or an active kick cooldown.
pub async fn post_action(
    State(state): State<AppState>,
    Json(req): Json<ActionRequest>,
) -> Result<impl IntoResponse, ControllerError> {
    let name = req.name();
    let svc = &state.controller;

    let sent = match req {
        ActionRequest::Stand => svc.stand(),
        ActionRequest::Sit => svc.sit(),
        ActionRequest::Say { text } => svc.say(&text),
        ActionRequest::Language { value } => svc.set_language(&value).await?,
        ActionRequest::Volume { value } => svc.set_volume(value).await?,
        ActionRequest::Led {
            group,
            groups,
            color,
        } => match (group, groups) {
            (Some(group), None) => svc.set_led(&group, &color)?,
            (None, Some(groups)) => svc.set_led_groups(&groups, &color)?,
            _ => {
                return Err(ControllerError::InvalidRequest(
                    "exactly one of `group` or `groups` is required".to_string(),
                ));
            }
        },
        ActionRequest::LedOff { group } => svc.led_off(&group)?,
        ActionRequest::Autonomous => svc.toggle_autonomous().await,
        ActionRequest::AutonomousState => svc.request_autonomous_state(),
        ActionRequest::Kick => svc.kick().await?,
        ActionRequest::Siu => svc.siu(),
        ActionRequest::TurnLeft => svc.turn_left(),
        ActionRequest::TurnRight => svc.turn_right(),
        ActionRequest::Football { enable } => svc.set_football_mode(enable).await,
        ActionRequest::Stats => svc.request_stats(),
        ActionRequest::Battery => svc.request_battery(),
        ActionRequest::Info => svc.request_info(),
        ActionRequest::Key { key } => {
            let action =
                KeyAction::from_key(&key).ok_or_else(|| ControllerError::UnboundKey(key.clone()))?;
            if let KeyAction::SelectMode(mode) = action {
                return Err(ControllerError::InvalidRequest(format!(
                    "key {key} selects joystick mode {mode}; send it on the pad socket"
                )));
            }
            svc.handle_key(action).await?
        }
    };

    tracing::debug!(action = name, sent, "action handled");

    Ok((
        StatusCode::OK,
        Json(ActionResponse {
            action: name.to_string(),
            sent,
            timestamp: Utc::now(),
        }),
    ))
}

/// Action routes, mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/actions", post(post_action))
}
