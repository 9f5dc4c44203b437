//! nao-remote server entry point.
//!
//! Connects to the robot and starts the Axum HTTP server with the REST
//! and pad WebSocket endpoints.

use std::time::Duration;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use nao_remote::api;
use nao_remote::app_state::AppState;
use nao_remote::config::{self, ControllerConfig};
use nao_remote::joystick::SessionConfig;
use nao_remote::link::{LinkConfig, RobotLink};
use nao_remote::service::{ControllerService, ServiceSettings};
use nao_remote::ws::handler::pad_ws_handler;

/// How long pad connections get to stop their joysticks on shutdown.
const PAD_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing before the config so its warnings are visible
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config::wants_json_logs(|key| std::env::var(key).ok()) {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = ControllerConfig::from_env()?;

    tracing::info!(
        addr = %config.listen_addr,
        robot = %config.robot_url(),
        "starting nao-remote"
    );

    // Robot link; the service subscribes before the first connect
    let link = RobotLink::new(LinkConfig::from(&config));
    let controller = ControllerService::new(link.clone(), ServiceSettings::from(&config));
    let background = controller.spawn_background();
    let link_task = link.spawn();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let app_state = AppState {
        controller,
        link: link.clone(),
        session_config: SessionConfig {
            dead_zone: config.dead_zone,
            stand_on_release: config.stand_on_release,
        },
        send_period: config.send_period(),
        shutdown: shutdown_rx,
    };

    let app = Router::new()
        .merge(api::build_router())
        .route("/ws/pad", get(pad_ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx.clone()))
        .await?;

    // Pad connections hold the state; once all are gone their
    // joysticks have sent their final stop.
    shutdown_tx.send_replace(true);
    if tokio::time::timeout(PAD_DRAIN_TIMEOUT, shutdown_tx.closed())
        .await
        .is_err()
    {
        tracing::warn!("pad connections still open at shutdown");
    }

    link.shutdown();
    for task in background {
        task.abort();
    }
    if let Err(e) = link_task.await {
        tracing::warn!(error = %e, "robot link task failed");
    }
    tracing::info!("nao-remote stopped");

    Ok(())
}

async fn shutdown_signal(pads: watch::Sender<bool>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
    pads.send_replace(true);
}
