//! MQTT adapter error types.

use farmhub_domain::error::FarmHubError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// The rumqttc client returned an error.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// Failed to parse an incoming MQTT payload as JSON.
    #[error("failed to parse MQTT payload")]
    PayloadParse(#[source] serde_json::Error),
}

impl MqttError {
    /// Convert into a [`FarmHubError::Transport`] for propagation across
    /// port boundaries.
    #[must_use]
    pub fn into_domain(self) -> FarmHubError {
        FarmHubError::Transport(Box::new(self))
    }
}

impl From<MqttError> for FarmHubError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}
