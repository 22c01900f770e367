//! # farmhub-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the **command gateway**: `POST /control/{target}` issues a
//!   command through the correlation engine and answers with the
//!   confirmed state, or `408` when the actuator stays silent
//! - Serve the **observer WebSocket** at `GET /ws`: registers the
//!   connection with the fan-out broadcaster and answers the
//!   `get_initial_data` request with the current snapshot
//! - Map HTTP requests into application calls (driving adapter)
//! - Map application errors into HTTP responses
//!
//! ## Dependency rule
//! Depends on `farmhub-app` (for the engine and broadcaster) and
//! `farmhub-domain` (for types used in request/response mapping). Never
//! leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
