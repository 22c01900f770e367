//! Record-store port: persistence of readings and actions is an external
//! collaborator; only the interface lives in the core.

use std::future::Future;

use farmhub_domain::device::{DeviceName, DeviceState};
use farmhub_domain::error::FarmHubError;

/// Records historical readings and actions.
///
/// The engine treats recording as fire-and-forget bookkeeping: a failing
/// recorder is logged at the call site and never disturbs waiter
/// resolution or event fan-out.
pub trait ActionRecorder {
    /// Record an action taken against a device (`turn_on`, `turn_off`,
    /// `auto_off`) together with the resulting state.
    fn record_action(
        &self,
        target: &DeviceName,
        action: &str,
        state: DeviceState,
    ) -> impl Future<Output = Result<(), FarmHubError>> + Send;

    /// Record a sensor reading.
    fn record_reading(
        &self,
        sensor: &str,
        value: f64,
    ) -> impl Future<Output = Result<(), FarmHubError>> + Send;
}

impl<T: ActionRecorder + Send + Sync> ActionRecorder for std::sync::Arc<T> {
    fn record_action(
        &self,
        target: &DeviceName,
        action: &str,
        state: DeviceState,
    ) -> impl Future<Output = Result<(), FarmHubError>> + Send {
        (**self).record_action(target, action, state)
    }

    fn record_reading(
        &self,
        sensor: &str,
        value: f64,
    ) -> impl Future<Output = Result<(), FarmHubError>> + Send {
        (**self).record_reading(sensor, value)
    }
}
