//! Registry of addressable devices; unknown targets are rejected before a
//! command is ever issued.

use std::collections::BTreeSet;

use farmhub_domain::device::DeviceName;
use farmhub_domain::error::UnknownTargetError;

/// The set of actuators the hub is allowed to command, fixed at startup
/// from configuration.
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    devices: BTreeSet<DeviceName>,
}

impl DeviceRegistry {
    /// Build a registry from the configured device names.
    #[must_use]
    pub fn new(devices: impl IntoIterator<Item = DeviceName>) -> Self {
        Self {
            devices: devices.into_iter().collect(),
        }
    }

    /// Check that `target` is a known device.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownTargetError`] when the device is not registered.
    pub fn ensure_known(&self, target: &DeviceName) -> Result<(), UnknownTargetError> {
        if self.devices.contains(target) {
            Ok(())
        } else {
            Err(UnknownTargetError {
                target: target.to_string(),
            })
        }
    }

    /// Iterate over the registered device names.
    pub fn names(&self) -> impl Iterator<Item = &DeviceName> {
        self.devices.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> DeviceRegistry {
        DeviceRegistry::new([
            DeviceName::new("cooling-fan").unwrap(),
            DeviceName::new("water-pump").unwrap(),
        ])
    }

    #[test]
    fn should_accept_registered_device() {
        let registry = registry();
        let fan = DeviceName::new("cooling-fan").unwrap();
        assert!(registry.ensure_known(&fan).is_ok());
    }

    #[test]
    fn should_reject_unknown_device() {
        let registry = registry();
        let heater = DeviceName::new("heater").unwrap();
        let err = registry.ensure_known(&heater).unwrap_err();
        assert_eq!(err.target, "heater");
    }

    #[test]
    fn should_list_registered_names_in_order() {
        let names: Vec<_> = registry().names().map(ToString::to_string).collect();
        assert_eq!(names, ["cooling-fan", "water-pump"]);
    }
}
