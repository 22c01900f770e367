//! # farmhub-client
//!
//! Observer-side client for the hub's WebSocket fan-out.
//!
//! ## Responsibilities
//! - Maintain a single WebSocket connection to the hub, reconnecting on a
//!   fixed interval whenever it drops ([`runtime::ObserverClient`])
//! - Request the current snapshot (`get_initial_data`) on every successful
//!   (re)connect, so observers converge after an outage
//! - Dispatch inbound frames to listeners registered by event type or as
//!   wildcards ([`listener::ListenerRegistry`])
//!
//! The client never interprets event payloads; they are handed to listeners
//! as raw JSON values.

pub mod listener;
pub mod runtime;
pub mod state;

pub use listener::{EventTag, ListenerHandle, ListenerRegistry};
pub use runtime::{ObserverClient, ObserverConfig};
pub use state::{ConnectionState, ConnectionTracker};
