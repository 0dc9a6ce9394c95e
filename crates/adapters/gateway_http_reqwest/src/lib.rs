//! # homedash-adapter-gateway-http
//!
//! Outbound HTTP adapter built on [reqwest](https://docs.rs/reqwest).
//!
//! ## Responsibilities
//! - Implement every gateway port of `homedash-app` (`DeviceGateway`,
//!   `TaskGateway`, `NotificationGateway`, `IntegrationGateway`,
//!   `AuthGateway`) against the REST service
//! - Attach the caller's `session_id` to every authenticated request
//! - Turn `{"detail": ...}` error bodies into `ServiceError`s and
//!   network / decoding failures into transport errors
//!
//! ## Dependency rule
//! Depends on `homedash-app` (for port traits) and `homedash-domain` (for the
//! types carried on the wire). Never leaks reqwest types past the port
//! boundary.

mod client;
mod config;
mod error;
mod wire;

pub use client::HttpGateway;
pub use config::GatewayConfig;
pub use error::HttpGatewayError;
