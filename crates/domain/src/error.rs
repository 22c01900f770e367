//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`FarmHubError`]
//! via `#[from]` at the boundary. Adapters wrap their library errors in the
//! opaque [`FarmHubError::Transport`] variant.

use crate::device::DeviceName;
use crate::id::CorrelationId;

/// Top-level error type crossing port boundaries.
#[derive(Debug, thiserror::Error)]
pub enum FarmHubError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The requested target device is not registered.
    #[error("unknown target")]
    UnknownTarget(#[from] UnknownTargetError),

    /// A command was issued but no confirmation arrived before the deadline.
    #[error("command confirmation timed out")]
    Timeout(#[from] TimeoutError),

    /// A transport- or peer-level failure surfaced by an adapter.
    #[error("transport error")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain validation failures.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Device names must be non-empty.
    #[error("device name must not be empty")]
    EmptyDeviceName,

    /// Device names are restricted to `[a-z0-9_-]`.
    #[error("device name contains invalid characters: {0}")]
    InvalidDeviceName(String),

    /// Control requests only accept `turn_on` / `turn_off`.
    #[error("unknown control action: {0}")]
    UnknownAction(String),
}

/// Rejection raised before any command is issued for an unregistered device.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown target device: {target}")]
pub struct UnknownTargetError {
    /// The device name the caller asked for.
    pub target: String,
}

/// Outcome of a waiter whose deadline elapsed without a confirmation.
///
/// Carries the correlation id so the command gateway can still surface it to
/// the caller on the 408 response.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("no confirmation from {target} (correlation {correlation_id})")]
pub struct TimeoutError {
    pub correlation_id: CorrelationId,
    pub target: DeviceName,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_unknown_target_with_name() {
        let err = UnknownTargetError {
            target: "heater".to_string(),
        };
        assert_eq!(err.to_string(), "unknown target device: heater");
    }

    #[test]
    fn should_convert_timeout_into_top_level_error() {
        let err: FarmHubError = TimeoutError {
            correlation_id: CorrelationId::new(),
            target: DeviceName::new("water-pump").unwrap(),
        }
        .into();
        assert!(matches!(err, FarmHubError::Timeout(_)));
    }

    #[test]
    fn should_keep_source_chain_for_transport_errors() {
        let io = std::io::Error::other("broker unreachable");
        let err = FarmHubError::Transport(Box::new(io));
        let source = std::error::Error::source(&err).expect("source should be preserved");
        assert_eq!(source.to_string(), "broker unreachable");
    }
}
