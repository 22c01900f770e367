//! Transport port: publish side of the pub/sub channel, plus the typed
//! classification of its inbound stream.

use std::collections::BTreeMap;
use std::future::Future;

use chrono::{DateTime, Utc};

use farmhub_domain::command::Confirmation;
use farmhub_domain::device::{DeviceName, DeviceState};
use farmhub_domain::error::FarmHubError;

/// Publishes payloads onto the pub/sub transport.
///
/// Publishing is best-effort: an `Err` means "delivery not guaranteed", and
/// callers must treat it that way: the correlation engine still starts its
/// timeout-bound wait, because silence and delivery failure look identical
/// to anyone expecting a bounded answer.
pub trait CommandTransport {
    /// Publish `payload` on `topic`.
    fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<(), FarmHubError>> + Send;
}

impl<T: CommandTransport + Send + Sync> CommandTransport for std::sync::Arc<T> {
    fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
    ) -> impl Future<Output = Result<(), FarmHubError>> + Send {
        (**self).publish(topic, payload)
    }
}

/// A classified inbound pub/sub message, produced by the transport adapter
/// and consumed, strictly in arrival order, by the correlation engine.
///
/// Malformed payloads never reach this type; the adapter logs and drops
/// them before classification.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// `sensor/<type>`: a new reading.
    SensorReading {
        sensor: String,
        value: f64,
        timestamp: DateTime<Utc>,
    },
    /// `control/<device>/status`: confirmation of an issued command.
    StatusConfirmation {
        device: DeviceName,
        confirmation: Confirmation,
    },
    /// `device/state/sync`: full-state resync after a hardware reconnect.
    StateSync {
        states: BTreeMap<DeviceName, DeviceState>,
    },
}
