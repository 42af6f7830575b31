//! # webthingd — Web Thing server daemon
//!
//! Composition root that wires the virtual things to the HTTP adapter.
//!
//! ## Responsibilities
//! - Load configuration (`webthing.toml`, env vars)
//! - Initialise `tracing` with the configured filter
//! - Build the virtual things and pick the addressing mode
//! - Build the axum router and serve it
//! - Drive the simulated sensor readings in the background
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no thing logic belongs here.

mod config;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use webthing_adapter_http_axum::state::AppState;
use webthing_adapter_virtual::VirtualIntegration;
use webthing_app::addressing::Addressing;
use webthing_app::container::ThingsType;

use crate::config::{Config, Mode};

/// Server name reported when several things are served.
const SERVER_NAME: &str = "WebThing Server";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.filter).context("invalid logging filter")?,
        )
        .init();

    let integration = VirtualIntegration::new().context("failed to build virtual things")?;
    let things = match config.things.mode {
        Mode::Single => ThingsType::single(integration.lamp().clone()),
        Mode::Multiple => ThingsType::multiple(integration.things(), SERVER_NAME),
    };
    if let Some(ui_href) = &config.things.ui_href {
        for thing in things.things() {
            thing.set_ui_href(ui_href.clone());
        }
    }
    tracing::info!(
        integration = integration.name(),
        mode = ?config.things.mode,
        things = things.things().len(),
        "things ready"
    );

    let addressing = Addressing::new(&config.server.base_path, things);
    let app = webthing_adapter_http_axum::router::build(AppState::new(addressing));

    let sensor = integration.start_background(config.sensor_interval());

    let bind_addr = config.bind_addr();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(
        address = %bind_addr,
        base_path = %config.server.base_path,
        "webthingd listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    sensor.abort();
    tracing::info!("webthingd stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown requested");
}
