//! Connection lifecycle tracking.

use std::sync::Mutex;

/// Lifecycle of the client's single WebSocket connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

/// Shared view of the connection lifecycle.
///
/// The one subtle transition is into `Reconnecting`: it must be claimed, so
/// that overlapping failure signals (a close frame racing a socket error)
/// schedule exactly one reconnect attempt.
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    state: Mutex<ConnectionState>,
}

impl ConnectionTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.state.lock().expect("connection state lock poisoned")
    }

    /// Whether the connection is currently established.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Move to an unconditional state.
    pub fn set(&self, state: ConnectionState) {
        *self.state.lock().expect("connection state lock poisoned") = state;
    }

    /// Claim the `Reconnecting` state.
    ///
    /// Returns `true` for the caller that performed the transition; a second
    /// caller observing `Reconnecting` already in place gets `false` and must
    /// not schedule another attempt.
    pub fn schedule_reconnect(&self) -> bool {
        let mut state = self.state.lock().expect("connection state lock poisoned");
        if *state == ConnectionState::Reconnecting {
            false
        } else {
            *state = ConnectionState::Reconnecting;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_start_disconnected() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.state(), ConnectionState::Disconnected);
        assert!(!tracker.is_connected());
    }

    #[test]
    fn should_report_connected_after_set() {
        let tracker = ConnectionTracker::new();
        tracker.set(ConnectionState::Connected);
        assert!(tracker.is_connected());
    }

    #[test]
    fn should_claim_reconnect_exactly_once() {
        let tracker = ConnectionTracker::new();
        tracker.set(ConnectionState::Connected);

        assert!(tracker.schedule_reconnect());
        assert!(!tracker.schedule_reconnect());
        assert_eq!(tracker.state(), ConnectionState::Reconnecting);
    }

    #[test]
    fn should_allow_reconnect_claim_after_new_connection() {
        let tracker = ConnectionTracker::new();
        assert!(tracker.schedule_reconnect());
        tracker.set(ConnectionState::Connected);
        assert!(tracker.schedule_reconnect());
    }
}
