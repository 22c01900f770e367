//! Shared application state for axum handlers.

use std::sync::Arc;
use std::time::Duration;

use farmhub_app::broadcaster::Broadcaster;
use farmhub_app::correlation::CorrelationEngine;
use farmhub_app::ports::{ActionRecorder, CommandTransport};
use farmhub_app::registry::DeviceRegistry;
use farmhub_app::snapshot::SnapshotState;

/// How long the command gateway waits for a confirmation before answering
/// `408`. The engine's waiter outlives this by its grace period, so a
/// confirmation racing the response is still matched, not misclassified as
/// unsolicited.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Application state shared across all axum handlers.
///
/// Generic over the transport and recorder types to avoid dynamic dispatch.
/// `Clone` is implemented manually so the underlying types themselves do not
/// need to be `Clone`; only the `Arc` wrappers are cloned.
pub struct AppState<T, R> {
    /// Correlation engine issuing commands and matching confirmations.
    pub engine: Arc<CorrelationEngine<T, R>>,
    /// Fan-out broadcaster over live observer connections.
    pub broadcaster: Arc<Broadcaster>,
    /// Latest readings and device states, served as `initial_data`.
    pub snapshot: Arc<SnapshotState>,
    /// The set of devices the gateway accepts commands for.
    pub registry: Arc<DeviceRegistry>,
    /// Per-request confirmation budget.
    pub command_timeout: Duration,
}

impl<T, R> Clone for AppState<T, R> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            broadcaster: Arc::clone(&self.broadcaster),
            snapshot: Arc::clone(&self.snapshot),
            registry: Arc::clone(&self.registry),
            command_timeout: self.command_timeout,
        }
    }
}

impl<T, R> AppState<T, R>
where
    T: CommandTransport + Send + Sync + 'static,
    R: ActionRecorder + Send + Sync + 'static,
{
    /// Create application state with the default command timeout.
    pub fn new(
        engine: Arc<CorrelationEngine<T, R>>,
        broadcaster: Arc<Broadcaster>,
        snapshot: Arc<SnapshotState>,
        registry: Arc<DeviceRegistry>,
    ) -> Self {
        Self {
            engine,
            broadcaster,
            snapshot,
            registry,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    /// Override the confirmation budget, mainly for tests.
    #[must_use]
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }
}
