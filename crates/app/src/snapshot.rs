//! In-memory view of the latest readings and device states, served to
//! observers as `initial_data` on (re)connect.
//!
//! Populated from live traffic only: a client connecting before any message
//! has arrived receives empty maps (no stale-event replay is promised).

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

use farmhub_domain::device::{DeviceName, DeviceState};

/// Latest reading for one sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorReading {
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

/// Serializable point-in-time view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub sensors: BTreeMap<String, SensorReading>,
    pub devices: BTreeMap<DeviceName, DeviceState>,
}

/// Shared snapshot state, kept current by the correlation engine's inbound
/// consumer.
#[derive(Debug, Default)]
pub struct SnapshotState {
    inner: Mutex<Snapshot>,
}

impl SnapshotState {
    /// Record the latest reading for `sensor`.
    pub fn record_reading(&self, sensor: &str, value: f64, timestamp: DateTime<Utc>) {
        let mut inner = self.inner.lock().expect("snapshot lock poisoned");
        inner
            .sensors
            .insert(sensor.to_string(), SensorReading { value, timestamp });
    }

    /// Record the latest known state for `device`.
    pub fn record_device_state(&self, device: &DeviceName, state: DeviceState) {
        let mut inner = self.inner.lock().expect("snapshot lock poisoned");
        inner.devices.insert(device.clone(), state);
    }

    /// Clone out the current view.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.inner.lock().expect("snapshot lock poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_start_empty() {
        let state = SnapshotState::default();
        let snapshot = state.snapshot();
        assert!(snapshot.sensors.is_empty());
        assert!(snapshot.devices.is_empty());
    }

    #[test]
    fn should_keep_latest_reading_per_sensor() {
        let state = SnapshotState::default();
        state.record_reading("temperature", 20.0, Utc::now());
        state.record_reading("temperature", 24.5, Utc::now());

        let snapshot = state.snapshot();
        assert_eq!(snapshot.sensors.len(), 1);
        assert!((snapshot.sensors["temperature"].value - 24.5).abs() < f64::EPSILON);
    }

    #[test]
    fn should_keep_latest_state_per_device() {
        let state = SnapshotState::default();
        let fan = DeviceName::new("cooling-fan").unwrap();
        state.record_device_state(&fan, DeviceState::On);
        state.record_device_state(&fan, DeviceState::Off);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.devices[&fan], DeviceState::Off);
    }

    #[test]
    fn should_serialize_snapshot_with_sensor_and_device_maps() {
        let state = SnapshotState::default();
        state.record_reading("humidity", 61.0, Utc::now());
        state.record_device_state(&DeviceName::new("light").unwrap(), DeviceState::On);

        let json: serde_json::Value = serde_json::to_value(state.snapshot()).unwrap();
        assert!((json["sensors"]["humidity"]["value"].as_f64().unwrap() - 61.0).abs() < f64::EPSILON);
        assert_eq!(json["devices"]["light"], "on");
    }
}
