//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the synchronization layer and
//! the adapter layer can depend on them without creating circular dependencies.

pub mod gateway;
pub mod prompt;

pub use gateway::{
    AuthGateway, DeviceGateway, IntegrationGateway, NotificationGateway, RemoteStateGateway,
    TaskGateway,
};
pub use prompt::{AlwaysConfirm, ConfirmationPrompt};
