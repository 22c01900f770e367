//! Correlation engine: turns fire-and-forget pub/sub exchanges into
//! bounded request/response.
//!
//! Every issued command gets a fresh correlation id and a registered
//! waiter. The single inbound consumer resolves waiters as confirmations
//! arrive; the issuing future resolves them on deadline. Whichever side
//! removes the map entry first owns the waiter's oneshot sender, so
//! resolution is exactly-once by construction.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;

use farmhub_domain::command::{Command, Confirmation};
use farmhub_domain::device::{DeviceName, DeviceState};
use farmhub_domain::error::{FarmHubError, TimeoutError};
use farmhub_domain::event::DomainEvent;
use farmhub_domain::id::CorrelationId;

use crate::broadcaster::Broadcaster;
use crate::ports::{ActionRecorder, CommandTransport, InboundMessage};
use crate::snapshot::SnapshotState;

/// How much longer a registered waiter outlives the caller's own deadline
/// before the sweeper may reclaim it. Keeps engine-side cleanup strictly
/// after the gateway's budget, so a confirmation racing the gateway timeout
/// is still classified against a live waiter.
pub const WAITER_GRACE: Duration = Duration::from_secs(1);

/// How often the sweeper checks for abandoned waiters.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

struct PendingWaiter {
    tx: oneshot::Sender<Confirmation>,
    deadline: Instant,
}

/// Issues commands, matches confirmations back to them, and feeds every
/// state transition to the fan-out broadcaster.
pub struct CorrelationEngine<T, R> {
    transport: T,
    recorder: R,
    broadcaster: Arc<Broadcaster>,
    snapshot: Arc<SnapshotState>,
    pending: Mutex<HashMap<CorrelationId, PendingWaiter>>,
}

impl<T, R> CorrelationEngine<T, R>
where
    T: CommandTransport + Send + Sync,
    R: ActionRecorder + Send + Sync,
{
    /// Create an engine publishing through `transport` and fanning events
    /// out through `broadcaster`.
    pub fn new(
        transport: T,
        recorder: R,
        broadcaster: Arc<Broadcaster>,
        snapshot: Arc<SnapshotState>,
    ) -> Self {
        Self {
            transport,
            recorder,
            broadcaster,
            snapshot,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Issue a command and wait for its confirmation, bounded by `timeout`.
    ///
    /// Publish failure does not abort the wait: delivery failure and
    /// silence are observationally identical to a caller expecting a
    /// bounded answer, so both end in the same timeout path.
    ///
    /// # Errors
    ///
    /// Returns [`FarmHubError::Timeout`] when no confirmation arrives
    /// before the deadline. The timed-out device is treated as OFF: a
    /// forced-off `device_error` event is broadcast exactly once and an
    /// `auto_off` action is recorded (fail-safe posture: an unresponsive
    /// actuator is assumed to not be running).
    #[tracing::instrument(skip(self, target, timeout), fields(target = %target))]
    pub async fn issue(
        &self,
        target: &DeviceName,
        desired_state: DeviceState,
        timeout: Duration,
    ) -> Result<Confirmation, FarmHubError> {
        let (correlation_id, mut rx) = self.register_waiter(timeout);
        let command = Command::new(correlation_id, target.clone(), desired_state);

        match serde_json::to_vec(&command) {
            Ok(payload) => {
                if let Err(err) = self.transport.publish(&command.topic(), payload).await {
                    tracing::warn!(
                        %correlation_id,
                        %err,
                        "command publish failed; still waiting for a confirmation"
                    );
                }
            }
            Err(err) => {
                tracing::error!(%correlation_id, %err, "failed to encode command payload");
            }
        }

        match tokio::time::timeout(timeout, &mut rx).await {
            Ok(Ok(confirmation)) => {
                tracing::debug!(%correlation_id, status = %confirmation.result_state, "command confirmed");
                Ok(confirmation)
            }
            // Sender dropped: the sweeper reclaimed an abandoned waiter.
            Ok(Err(_)) => {
                self.fail_safe(target, correlation_id, timeout).await;
                Err(TimeoutError {
                    correlation_id,
                    target: target.clone(),
                }
                .into())
            }
            Err(_elapsed) => {
                let claimed = self
                    .pending
                    .lock()
                    .expect("pending map lock poisoned")
                    .remove(&correlation_id)
                    .is_some();
                if !claimed {
                    // The confirmation won the race: the inbound consumer
                    // removed the waiter and sent before we took the lock,
                    // so the value is already in the channel.
                    if let Ok(confirmation) = rx.await {
                        return Ok(confirmation);
                    }
                }
                self.fail_safe(target, correlation_id, timeout).await;
                Err(TimeoutError {
                    correlation_id,
                    target: target.clone(),
                }
                .into())
            }
        }
    }

    /// Process one classified inbound message.
    ///
    /// Called by the transport adapter's single consumer strictly in
    /// arrival order, which keeps waiter resolution linearizable per
    /// correlation id.
    pub async fn handle_inbound(&self, message: InboundMessage) {
        match message {
            InboundMessage::SensorReading {
                sensor,
                value,
                timestamp,
            } => {
                self.snapshot.record_reading(&sensor, value, timestamp);
                if let Err(err) = self.recorder.record_reading(&sensor, value).await {
                    tracing::warn!(sensor, %err, "failed to record sensor reading");
                }
                self.broadcaster
                    .broadcast(&DomainEvent::SensorUpdate {
                        sensor,
                        value,
                        timestamp,
                    })
                    .await;
            }
            InboundMessage::StatusConfirmation {
                device,
                confirmation,
            } => {
                let resolved = self.resolve_waiter(confirmation);
                if !resolved {
                    // Late arrival after timeout, or unsolicited. Dropped by
                    // the waiter map, still forwarded to observers below.
                    tracing::debug!(
                        correlation_id = %confirmation.correlation_id,
                        device = %device,
                        "unmatched confirmation"
                    );
                }
                self.snapshot
                    .record_device_state(&device, confirmation.result_state);
                self.broadcaster
                    .broadcast(&DomainEvent::DeviceStatus {
                        device,
                        status: confirmation.result_state,
                        correlation_id: confirmation.correlation_id,
                        success: confirmation.success,
                    })
                    .await;
            }
            InboundMessage::StateSync { states } => {
                for (device, state) in &states {
                    self.snapshot.record_device_state(device, *state);
                    if *state == DeviceState::Off {
                        if let Err(err) = self
                            .recorder
                            .record_action(device, "auto_off", DeviceState::Off)
                            .await
                        {
                            tracing::warn!(device = %device, %err, "failed to record auto_off action");
                        }
                    }
                }
                self.broadcaster
                    .broadcast(&DomainEvent::DeviceSync {
                        states,
                        message: "hardware reconnected - all devices synchronized".to_string(),
                    })
                    .await;
            }
        }
    }

    /// Drop waiters whose deadline (caller timeout + grace) has passed.
    ///
    /// Waiters are normally claimed by the issuing future itself; the
    /// sweeper only reclaims entries whose caller was cancelled before its
    /// own timeout fired (e.g. a dropped HTTP request). Returns the number
    /// of reclaimed waiters.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut pending = self.pending.lock().expect("pending map lock poisoned");
        let before = pending.len();
        pending.retain(|id, waiter| {
            let keep = waiter.deadline > now;
            if !keep {
                tracing::debug!(correlation_id = %id, "reclaimed abandoned waiter");
            }
            keep
        });
        before - pending.len()
    }

    /// Periodically run [`sweep_expired`](Self::sweep_expired) until the
    /// engine is dropped by all other holders.
    pub async fn run_sweeper(self: Arc<Self>) {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            if Arc::strong_count(&self) == 1 {
                return;
            }
            self.sweep_expired();
        }
    }

    /// Number of commands currently awaiting confirmation.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().expect("pending map lock poisoned").len()
    }

    fn register_waiter(
        &self,
        timeout: Duration,
    ) -> (CorrelationId, oneshot::Receiver<Confirmation>) {
        let (tx, rx) = oneshot::channel();
        let deadline = Instant::now() + timeout + WAITER_GRACE;
        let mut pending = self.pending.lock().expect("pending map lock poisoned");
        let mut id = CorrelationId::new();
        // Random ids collide with vanishing probability, but uniqueness
        // among pending commands is an invariant, not a likelihood.
        while pending.contains_key(&id) {
            id = CorrelationId::new();
        }
        pending.insert(id, PendingWaiter { tx, deadline });
        (id, rx)
    }

    /// Claim and resolve the waiter for `confirmation`, if one is pending.
    ///
    /// The send happens under the map lock so that once a correlation id is
    /// absent from the map, its confirmation is already observable in the
    /// waiter's channel.
    fn resolve_waiter(&self, confirmation: Confirmation) -> bool {
        let mut pending = self.pending.lock().expect("pending map lock poisoned");
        match pending.remove(&confirmation.correlation_id) {
            Some(waiter) => {
                // Receiver may be gone if the caller was cancelled.
                let _ = waiter.tx.send(confirmation);
                true
            }
            None => false,
        }
    }

    async fn fail_safe(&self, target: &DeviceName, correlation_id: CorrelationId, timeout: Duration) {
        tracing::warn!(
            %correlation_id,
            target = %target,
            "no confirmation before deadline; treating device as off"
        );
        self.snapshot.record_device_state(target, DeviceState::Off);
        if let Err(err) = self
            .recorder
            .record_action(target, "auto_off", DeviceState::Off)
            .await
        {
            tracing::warn!(target = %target, %err, "failed to record auto_off action");
        }
        self.broadcaster
            .broadcast(&DomainEvent::DeviceError {
                device: target.clone(),
                status: DeviceState::Off,
                error: format!("device timeout after {}s", timeout.as_secs()),
                correlation_id,
            })
            .await;
    }
}
