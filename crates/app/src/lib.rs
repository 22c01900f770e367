//! # farmhub-app
//!
//! Application layer: the correlation engine, the fan-out broadcaster, and
//! **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound):
//!   - `CommandTransport`: best-effort publish onto the pub/sub channel
//!   - `ActionRecorder`: record-store collaborator (out of scope, interface only)
//! - Turn fire-and-forget pub/sub exchanges into bounded request/response
//!   (`CorrelationEngine`)
//! - Fan every domain event out to all live observer connections
//!   (`Broadcaster`)
//! - Keep the in-memory snapshot observers fetch on (re)connect
//!
//! ## Dependency rule
//! Depends on `farmhub-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the
//! reverse.

pub mod broadcaster;
pub mod correlation;
pub mod ports;
pub mod registry;
pub mod snapshot;
