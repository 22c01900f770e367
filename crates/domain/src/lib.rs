//! # farmhub-domain
//!
//! Pure domain model for the farmhub actuator control system.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions
//! - Define **Commands** (requested state changes addressed to an actuator)
//! - Define **Confirmations** (asynchronous acknowledgements matched back to
//!   a command by correlation id)
//! - Define **Domain events** (the tagged union fanned out to observers)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod command;
pub mod device;
pub mod error;
pub mod event;
pub mod id;
