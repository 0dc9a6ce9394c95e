//! # homedash-app
//!
//! Application layer — **port definitions** (traits), state-synchronization
//! primitives and the view-model services built on top of them.
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `DeviceGateway`, `TaskGateway`, `NotificationGateway`,
//!     `IntegrationGateway`, `AuthGateway` — the remote service
//!   - `ConfirmationPrompt` — yes/no question before destructive commands
//! - Provide **synchronization primitives** that need no IO of their own:
//!   - `PollingSynchronizer` — fixed-rate polling into a `Resource`
//!   - `DebouncedDispatcher` — per-key coalescing of writes
//!   - `Reconciler` — optimistic control values over device snapshots
//! - Define **driving/inbound** view-model services:
//!   - `DeviceControls` — device list, brightness, toggle, create, delete
//!   - `TaskRegistry` — scheduled tasks with derived display fields
//!   - `NotificationFeed` — recent events, polled only while visible
//!   - `IntegrationCatalog` — integrations and their skills
//!   - `SessionService` — login / logout
//!
//! ## Dependency rule
//! Depends on `homedash-domain` only (plus `tokio` for timers and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod reconciler;
pub mod services;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;
