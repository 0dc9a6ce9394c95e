//! # homedash-domain
//!
//! Pure domain model for the homedash client.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Devices** as the remote service reports them (lights, thermostats, cameras, …)
//! - Define **Scheduled tasks** and the date + time combination used to create them
//! - Define **Notifications** (recent system events)
//! - Define **Integrations** (external assistants and their connection state)
//! - Define the **Session context** threaded through every gateway call
//! - Contain all invariant enforcement and input validation
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod device;
pub mod integration;
pub mod notification;
pub mod session;
pub mod task;
