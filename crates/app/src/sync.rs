//! State-synchronization primitives.
//!
//! - [`Resource`] — the published snapshot of one remote collection
//! - [`PollingSynchronizer`] — keeps a [`Resource`] fresh on a fixed-rate timer
//! - [`DebouncedDispatcher`] — coalesces rapid intents into one deferred write
//!
//! None of these know about concrete resource kinds; the services in
//! [`crate::services`] wire them to gateway calls.

pub mod debounce;
pub mod poller;
pub mod resource;

pub use debounce::{DebouncedDispatcher, Settlement};
pub use poller::{PollOptions, PollingSynchronizer, StalenessPolicy};
pub use resource::Resource;
