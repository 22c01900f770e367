//! Commands and their asynchronous confirmations.

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

use crate::device::{DeviceName, DeviceState};
use crate::id::CorrelationId;

/// A requested state change addressed to a single actuator.
///
/// Immutable after creation. Owned by the correlation engine until the
/// matching [`Confirmation`] arrives or the deadline elapses, then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub correlation_id: CorrelationId,
    pub target: DeviceName,
    pub desired_state: DeviceState,
    pub issued_at: DateTime<Utc>,
}

impl Command {
    /// Create a command stamped with the current time.
    #[must_use]
    pub fn new(correlation_id: CorrelationId, target: DeviceName, desired_state: DeviceState) -> Self {
        Self {
            correlation_id,
            target,
            desired_state,
            issued_at: Utc::now(),
        }
    }

    /// The MQTT topic this command is published on.
    #[must_use]
    pub fn topic(&self) -> String {
        format!("control/{}", self.target)
    }
}

// Wire form: `{"command":"ON","correlationId":"…","targetId":"…"}`.
// `issued_at` is engine-side metadata and never leaves the process.
impl Serialize for Command {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Command", 3)?;
        s.serialize_field("command", self.desired_state.as_command())?;
        s.serialize_field("correlationId", &self.correlation_id)?;
        s.serialize_field("targetId", &self.target)?;
        s.end()
    }
}

/// Asynchronous acknowledgement parsed from a `control/<device>/status`
/// payload.
///
/// Transient: exists only long enough to be matched against a pending
/// waiter; never retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Confirmation {
    #[serde(rename = "correlationId")]
    pub correlation_id: CorrelationId,
    #[serde(rename = "status")]
    pub result_state: DeviceState,
    pub success: bool,
}
