//! Connection runtime: owns the WebSocket and the reconnect loop.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;

use crate::listener::{EventTag, ListenerRegistry};
use crate::state::{ConnectionState, ConnectionTracker};

/// Default pause between reconnect attempts.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(5);

const INITIAL_DATA_REQUEST: &str = r#"{"action":"get_initial_data"}"#;

/// Connection settings for an [`ObserverClient`].
#[derive(Debug, Clone)]
pub struct ObserverConfig {
    /// WebSocket URL of the hub, e.g. `ws://localhost:3000/ws`.
    pub url: String,
    /// Pause between reconnect attempts.
    pub reconnect_interval: Duration,
}

impl ObserverConfig {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_reconnect_interval(mut self, interval: Duration) -> Self {
        self.reconnect_interval = interval;
        self
    }
}

/// Long-lived observer connection to the hub.
///
/// Spawns a background task that keeps one WebSocket alive: on every
/// successful connect it requests the current snapshot, and whenever the
/// socket drops it schedules exactly one reconnect attempt per outage.
/// Frames are dispatched to the [`ListenerRegistry`] by their `type` tag.
pub struct ObserverClient {
    registry: Arc<ListenerRegistry>,
    tracker: Arc<ConnectionTracker>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ObserverClient {
    /// Start the connection runtime.
    #[must_use]
    pub fn spawn(config: ObserverConfig) -> Self {
        let registry = Arc::new(ListenerRegistry::new());
        let tracker = Arc::new(ConnectionTracker::new());
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run_loop(
            config,
            Arc::clone(&registry),
            Arc::clone(&tracker),
            cancel.clone(),
        ));

        Self {
            registry,
            tracker,
            cancel,
            task,
        }
    }

    /// The listener registry; register callbacks here.
    #[must_use]
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.registry
    }

    /// Current connection lifecycle state.
    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.tracker.state()
    }

    /// Tear the connection down and wait for the runtime task to finish.
    pub async fn disconnect(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

async fn run_loop(
    config: ObserverConfig,
    registry: Arc<ListenerRegistry>,
    tracker: Arc<ConnectionTracker>,
    cancel: CancellationToken,
) {
    loop {
        tracker.set(ConnectionState::Connecting);
        let connecting = connect_async(config.url.as_str());
        tokio::select! {
            () = cancel.cancelled() => break,
            connected = connecting => match connected {
                Ok((socket, _response)) => {
                    tracker.set(ConnectionState::Connected);
                    tracing::info!(url = %config.url, "connected to hub");
                    drive_socket(socket, &registry, &cancel).await;
                }
                Err(err) => {
                    tracing::warn!(url = %config.url, %err, "failed to connect to hub");
                }
            }
        }

        if cancel.is_cancelled() {
            break;
        }
        if tracker.schedule_reconnect() {
            tracing::info!(
                seconds = config.reconnect_interval.as_secs(),
                "scheduling reconnect"
            );
        }
        tokio::select! {
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(config.reconnect_interval) => {}
        }
    }
    tracker.set(ConnectionState::Disconnected);
}

/// Pump one established socket until it drops or the client shuts down.
async fn drive_socket(
    mut socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    registry: &ListenerRegistry,
    cancel: &CancellationToken,
) {
    if let Err(err) = socket
        .send(Message::text(INITIAL_DATA_REQUEST.to_string()))
        .await
    {
        tracing::warn!(%err, "failed to request initial data");
        return;
    }

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                let _ = socket.close(None).await;
                return;
            }
            frame = socket.next() => match frame {
                Some(Ok(Message::Text(text))) => dispatch_frame(registry, text.as_str()),
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!("hub closed the connection");
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    tracing::warn!(%err, "socket error");
                    return;
                }
            }
        }
    }
}

fn dispatch_frame(registry: &ListenerRegistry, text: &str) {
    let payload: serde_json::Value = match serde_json::from_str(text) {
        Ok(payload) => payload,
        Err(err) => {
            tracing::warn!(%err, "dropping unparseable frame");
            return;
        }
    };
    let Some(tag) = payload["type"].as_str() else {
        tracing::warn!("dropping frame without a type tag");
        return;
    };
    match tag.parse::<EventTag>() {
        Ok(tag) => registry.dispatch(tag, &payload),
        Err(unknown) => {
            tracing::debug!(tag = %unknown.0, "ignoring frame with unknown type tag");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_five_second_reconnect_interval() {
        let config = ObserverConfig::new("ws://localhost:3000/ws");
        assert_eq!(config.reconnect_interval, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn should_shut_down_cleanly_while_unreachable() {
        // Port 1 refuses immediately, so the runtime sits in its reconnect
        // pause when we cancel it.
        let config = ObserverConfig::new("ws://127.0.0.1:1/ws")
            .with_reconnect_interval(Duration::from_secs(60));
        let client = ObserverClient::spawn(config);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_ne!(client.connection_state(), ConnectionState::Connected);

        client.disconnect().await;
    }
}
