//! # farmhubd, the hub daemon
//!
//! Composition root that wires the adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialize logging
//! - Connect the MQTT transport and drive its event loop
//! - Construct the correlation engine, broadcaster, and device registry
//! - Build the axum router, injecting the application state
//! - Bind to a TCP port and serve
//! - Handle graceful shutdown (SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

use std::future::Future;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use farmhub_adapter_http_axum::state::AppState;
use farmhub_adapter_mqtt::MqttTransport;
use farmhub_app::broadcaster::Broadcaster;
use farmhub_app::correlation::CorrelationEngine;
use farmhub_app::ports::ActionRecorder;
use farmhub_app::registry::DeviceRegistry;
use farmhub_app::snapshot::SnapshotState;
use farmhub_domain::device::{DeviceName, DeviceState};
use farmhub_domain::error::FarmHubError;

mod config;

use config::Config;

/// How many undelivered frames each observer connection may buffer before
/// it is considered unresponsive and dropped.
const BROADCAST_CAPACITY: usize = 64;

/// Records actions and readings to the log.
///
/// Stands in for a database-backed recorder; the action history is then
/// whatever log retention keeps.
struct LogRecorder;

impl ActionRecorder for LogRecorder {
    fn record_action(
        &self,
        target: &DeviceName,
        action: &str,
        state: DeviceState,
    ) -> impl Future<Output = Result<(), FarmHubError>> + Send {
        tracing::info!(target = %target, action, state = %state, "action recorded");
        async { Ok(()) }
    }

    fn record_reading(
        &self,
        sensor: &str,
        value: f64,
    ) -> impl Future<Output = Result<(), FarmHubError>> + Send {
        tracing::debug!(sensor, value, "reading recorded");
        async { Ok(()) }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Shared application state
    let broadcaster = Arc::new(Broadcaster::new(BROADCAST_CAPACITY));
    let snapshot = Arc::new(SnapshotState::default());
    let registry = Arc::new(DeviceRegistry::new(config.device_names()?));

    // MQTT transport
    let (transport, event_loop) = MqttTransport::connect(&config.mqtt);
    let engine = Arc::new(CorrelationEngine::new(
        transport.clone(),
        LogRecorder,
        Arc::clone(&broadcaster),
        Arc::clone(&snapshot),
    ));

    // Background tasks
    tokio::spawn(farmhub_adapter_mqtt::run_event_loop(
        event_loop,
        transport.client(),
        Arc::clone(&engine),
    ));
    tokio::spawn(Arc::clone(&engine).run_sweeper());

    // HTTP
    let state = AppState::new(engine, broadcaster, snapshot, registry);
    let app = farmhub_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    tracing::info!(%bind_addr, "farmhubd listening");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to install shutdown signal handler");
        return;
    }
    tracing::info!("shutdown signal received");
}
