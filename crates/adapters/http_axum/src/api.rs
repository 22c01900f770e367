//! HTTP and WebSocket handlers.

pub mod control;
pub mod dashboard;
pub mod ws;
