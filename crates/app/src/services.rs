//! View-model services — what the dashboard screens talk to.
//!
//! Each service struct accepts a gateway implementation via a generic
//! parameter (constructor injection), keeping this layer decoupled from
//! concrete transports. Failures are returned to the caller *and* written to
//! the service's error banner, so a screen can render either.

pub mod device_controls;
pub mod integration_catalog;
pub mod notification_feed;
pub mod session_service;
pub mod task_registry;

pub use device_controls::{DeviceControls, DeviceControlsOptions};
pub use integration_catalog::{CatalogSnapshot, IntegrationCatalog};
pub use notification_feed::NotificationFeed;
pub use session_service::SessionService;
pub use task_registry::{TaskRegistry, TaskView};
