//! Topic taxonomy: classifies raw `(topic, payload)` pairs into typed
//! inbound messages.
//!
//! | Topic pattern             | Classified as       |
//! |---------------------------|---------------------|
//! | `sensor/<type>`           | `SensorReading`     |
//! | `control/<device>/status` | `StatusConfirmation`|
//! | `device/state/sync`       | `StateSync`         |
//!
//! Anything else (unknown topics, malformed JSON, invalid device names)
//! classifies to `None` and is dropped by the caller after logging; a bad
//! payload never crashes the stream.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use farmhub_app::ports::InboundMessage;
use farmhub_domain::command::Confirmation;
use farmhub_domain::device::{DeviceName, DeviceState};

const SYNC_TOPIC: &str = "device/state/sync";

#[derive(Deserialize)]
struct SensorPayload {
    value: f64,
    #[serde(default)]
    time: Option<DateTime<Utc>>,
}

/// Classify one inbound message, or `None` when it should be dropped.
#[must_use]
pub fn classify(topic: &str, payload: &[u8]) -> Option<InboundMessage> {
    if let Some(sensor) = topic.strip_prefix("sensor/") {
        let parsed: SensorPayload = serde_json::from_slice(payload).ok()?;
        return Some(InboundMessage::SensorReading {
            sensor: sensor.to_string(),
            value: parsed.value,
            timestamp: parsed.time.unwrap_or_else(Utc::now),
        });
    }

    if topic == SYNC_TOPIC {
        let states: BTreeMap<DeviceName, DeviceState> = serde_json::from_slice(payload).ok()?;
        return Some(InboundMessage::StateSync { states });
    }

    if let Some(device) = topic
        .strip_prefix("control/")
        .and_then(|rest| rest.strip_suffix("/status"))
    {
        let device: DeviceName = device.parse().ok()?;
        let confirmation: Confirmation = serde_json::from_slice(payload).ok()?;
        return Some(InboundMessage::StatusConfirmation {
            device,
            confirmation,
        });
    }

    None
}
