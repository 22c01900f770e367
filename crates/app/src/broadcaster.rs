//! Event fan-out to all live observer connections.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{RwLock, mpsc};

use farmhub_domain::event::DomainEvent;
use farmhub_domain::id::ConnectionId;

/// Fan-out broadcaster over the set of live observer connections.
///
/// Each registered connection owns a bounded mpsc channel; events are
/// serialized once and pushed to every channel, so each connection receives
/// events in the order [`broadcast`](Broadcaster::broadcast) was called
/// (per-connection FIFO). A connection whose channel is closed or full is
/// removed without affecting delivery to the rest.
///
/// Membership in the internal map *is* the OPEN set: a connection is never
/// handed an event after removal.
pub struct Broadcaster {
    connections: RwLock<HashMap<ConnectionId, mpsc::Sender<Arc<str>>>>,
    // Avoids read-locking for count queries.
    active_count: AtomicUsize,
    capacity: usize,
}

impl Broadcaster {
    /// Create a broadcaster whose per-connection channels hold `capacity`
    /// undelivered frames.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            active_count: AtomicUsize::new(0),
            capacity,
        }
    }

    /// Register a new observer connection.
    ///
    /// Returns the connection id and the receiving half the transport layer
    /// drains into the peer.
    pub async fn register(&self) -> (ConnectionId, mpsc::Receiver<Arc<str>>) {
        let (tx, rx) = mpsc::channel(self.capacity);
        let id = ConnectionId::new();
        let mut conns = self.connections.write().await;
        conns.insert(id, tx);
        self.active_count.fetch_add(1, Ordering::Relaxed);
        (id, rx)
    }

    /// Remove a connection. Idempotent: removing an unknown or
    /// already-removed id is a no-op.
    pub async fn unregister(&self, id: ConnectionId) {
        let mut conns = self.connections.write().await;
        if conns.remove(&id).is_some() {
            self.active_count.fetch_sub(1, Ordering::Relaxed);
        }
    }

    /// Deliver `event` to every currently-registered connection.
    ///
    /// A failing send (peer gone, or channel full because the peer stopped
    /// draining) removes that connection only; the remaining peers still
    /// receive the event.
    pub async fn broadcast(&self, event: &DomainEvent) {
        let json: Arc<str> = match serde_json::to_string(event) {
            Ok(json) => json.into(),
            Err(err) => {
                tracing::warn!(%err, "failed to serialize domain event for broadcast");
                return;
            }
        };

        let mut to_remove = Vec::new();
        {
            let conns = self.connections.read().await;
            for (id, tx) in conns.iter() {
                if tx.try_send(Arc::clone(&json)).is_err() {
                    tracing::warn!(connection_id = %id, "dropping unresponsive observer connection");
                    to_remove.push(*id);
                }
            }
            tracing::debug!(
                recipients = conns.len() - to_remove.len(),
                "broadcast domain event"
            );
        }

        if !to_remove.is_empty() {
            let mut conns = self.connections.write().await;
            for id in to_remove {
                if conns.remove(&id).is_some() {
                    self.active_count.fetch_sub(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// Number of live connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.active_count.load(Ordering::Relaxed)
    }
}
