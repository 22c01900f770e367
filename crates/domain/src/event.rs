//! Domain events: the tagged union fanned out to every live observer.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::device::{DeviceName, DeviceState};
use crate::id::CorrelationId;

/// An immutable, short-lived record of something that happened on the
/// pub/sub side.
///
/// Serializes with a `type` tag matching the observer wire envelope
/// (`sensor_update`, `device_status`, `device_error`, `device_sync`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A new sensor reading arrived on `sensor/<type>`.
    SensorUpdate {
        sensor: String,
        value: f64,
        timestamp: DateTime<Utc>,
    },
    /// A device acknowledged a command (or reported a state unprompted).
    DeviceStatus {
        device: DeviceName,
        status: DeviceState,
        #[serde(rename = "correlationId")]
        correlation_id: CorrelationId,
        success: bool,
    },
    /// A command went unanswered; the device is treated as off (fail-safe).
    DeviceError {
        device: DeviceName,
        status: DeviceState,
        error: String,
        #[serde(rename = "correlationId")]
        correlation_id: CorrelationId,
    },
    /// Full-state resync published by the hardware after it reconnects.
    DeviceSync {
        states: BTreeMap<DeviceName, DeviceState>,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(name: &str) -> DeviceName {
        DeviceName::new(name).unwrap()
    }

    #[test]
    fn should_tag_sensor_update() {
        let event = DomainEvent::SensorUpdate {
            sensor: "temperature".to_string(),
            value: 27.5,
            timestamp: Utc::now(),
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "sensor_update");
        assert_eq!(json["sensor"], "temperature");
        assert!((json["value"].as_f64().unwrap() - 27.5).abs() < f64::EPSILON);
    }

    #[test]
    fn should_tag_device_status_with_camel_case_correlation_id() {
        let id = CorrelationId::new();
        let event = DomainEvent::DeviceStatus {
            device: device("cooling-fan"),
            status: DeviceState::On,
            correlation_id: id,
            success: true,
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "device_status");
        assert_eq!(json["status"], "on");
        assert_eq!(json["correlationId"], id.to_string());
    }

    #[test]
    fn should_tag_device_error_as_forced_off() {
        let event = DomainEvent::DeviceError {
            device: device("water-pump"),
            status: DeviceState::Off,
            error: "device timeout after 10s".to_string(),
            correlation_id: CorrelationId::new(),
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "device_error");
        assert_eq!(json["status"], "off");
    }

    #[test]
    fn should_carry_sync_states_verbatim() {
        let mut states = BTreeMap::new();
        states.insert(device("cooling_fan"), DeviceState::Off);
        states.insert(device("water_pump"), DeviceState::On);
        let event = DomainEvent::DeviceSync {
            states,
            message: "hardware reconnected".to_string(),
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "device_sync");
        assert_eq!(json["states"]["cooling_fan"], "off");
        assert_eq!(json["states"]["water_pump"], "on");
    }

    #[test]
    fn should_roundtrip_through_serde() {
        let event = DomainEvent::SensorUpdate {
            sensor: "humidity".to_string(),
            value: 61.0,
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: DomainEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
