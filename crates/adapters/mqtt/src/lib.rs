//! # farmhub-adapter-mqtt
//!
//! MQTT transport adapter. Wraps the pub/sub connection behind the
//! `CommandTransport` port and runs the single inbound consumer.
//!
//! ## Responsibilities
//! - Connect to the MQTT broker ([`MqttTransport::connect`])
//! - Publish commands on `control/<device>` (best-effort; errors surface as
//!   `FarmHubError::Transport`, never as panics)
//! - Subscribe to `sensor/#`, `control/+/status`, and `device/state/sync`
//! - Classify inbound messages ([`topic::classify`]) and feed them to the
//!   correlation engine **strictly in arrival order**
//!
//! ## Dependency rule
//! Depends on `farmhub-app` (port traits and engine) and `farmhub-domain`.
//! Never leaks rumqttc types across the port boundary.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};

use farmhub_app::correlation::CorrelationEngine;
use farmhub_app::ports::{ActionRecorder, CommandTransport};
use farmhub_domain::error::FarmHubError;

pub mod config;
pub mod error;
pub mod topic;

pub use config::MqttConfig;
pub use error::MqttError;

/// Wait between reconnect attempts after a broker connection error.
const RECONNECT_PAUSE: Duration = Duration::from_secs(5);

/// Publish side of the MQTT connection.
///
/// Cheap to clone; all clones share the underlying rumqttc request channel.
#[derive(Clone)]
pub struct MqttTransport {
    client: AsyncClient,
}

impl MqttTransport {
    /// Open a broker connection.
    ///
    /// Returns the transport plus the [`EventLoop`] that must be driven by
    /// [`run_event_loop`] for anything (including publishes) to make
    /// progress.
    #[must_use]
    pub fn connect(config: &MqttConfig) -> (Self, EventLoop) {
        let mut options = MqttOptions::new(
            config.client_id.clone(),
            config.broker_host.clone(),
            config.broker_port,
        );
        options.set_keep_alive(Duration::from_secs(u64::from(config.keep_alive_secs)));

        let (client, event_loop) = AsyncClient::new(options, config.channel_capacity);
        (Self { client }, event_loop)
    }

    /// Access the underlying client, e.g. for subscriptions.
    #[must_use]
    pub fn client(&self) -> AsyncClient {
        self.client.clone()
    }
}

impl CommandTransport for MqttTransport {
    fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<(), FarmHubError>> + Send {
        let client = self.client.clone();
        let topic = topic.to_string();
        async move {
            client
                .publish(topic, QoS::AtLeastOnce, false, payload)
                .await
                .map_err(|err| MqttError::Client(err).into_domain())
        }
    }
}

/// Drive the MQTT event loop until the process shuts down.
///
/// The inbound stream is processed by this single task, so the engine sees
/// messages in arrival order. Subscriptions are (re)established on every
/// `ConnAck`, which also covers broker reconnects. Connection errors are
/// logged and retried after a pause; they never propagate.
pub async fn run_event_loop<T, R>(
    mut event_loop: EventLoop,
    client: AsyncClient,
    engine: Arc<CorrelationEngine<T, R>>,
) where
    T: CommandTransport + Send + Sync,
    R: ActionRecorder + Send + Sync,
{
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                tracing::info!("connected to MQTT broker");
                for topic in ["sensor/#", "control/+/status", "device/state/sync"] {
                    if let Err(err) = client.subscribe(topic, QoS::AtLeastOnce).await {
                        tracing::error!(topic, %err, "failed to subscribe");
                    }
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                match topic::classify(&publish.topic, &publish.payload) {
                    Some(message) => engine.handle_inbound(message).await,
                    None => {
                        tracing::warn!(
                            topic = %publish.topic,
                            "dropped unclassifiable MQTT message"
                        );
                    }
                }
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(%err, "MQTT connection error; retrying");
                tokio::time::sleep(RECONNECT_PAUSE).await;
            }
        }
    }
}
