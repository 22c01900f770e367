//! Addressable actuators and their binary state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Name of an addressable actuator (fan, pump, light, …).
///
/// Device names appear in MQTT topic segments (`control/<device>`), so they
/// are restricted to lowercase alphanumerics plus `-` and `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceName(String);

impl DeviceName {
    /// Validate and wrap a device name.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyDeviceName`] for an empty string and
    /// [`ValidationError::InvalidDeviceName`] when the name contains
    /// characters outside `[a-z0-9_-]`.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::EmptyDeviceName);
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(ValidationError::InvalidDeviceName(name));
        }
        Ok(Self(name))
    }

    /// Access the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DeviceName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Binary actuator state.
///
/// Serializes lowercase (`"on"` / `"off"`) everywhere except the outbound
/// command payload, which uses the uppercase form from [`as_command`].
///
/// [`as_command`]: DeviceState::as_command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceState {
    On,
    Off,
}

impl DeviceState {
    /// The uppercase wire form used in `control/<device>` command payloads.
    #[must_use]
    pub fn as_command(self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
        }
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
        }
    }
}
