//! Remote state gateway — the IO boundary to the home-automation service.
//!
//! Every operation takes the caller's [`SessionContext`] explicitly and
//! returns either the decoded payload or a [`HomeDashError`]. Implementations
//! hold no client-side state beyond their connection pool.

use std::future::Future;

use homedash_domain::device::{Brightness, Device, NewDevice, ToggleOutcome};
use homedash_domain::error::HomeDashError;
use homedash_domain::id::{DeviceId, TaskId};
use homedash_domain::integration::{Integration, IntegrationStats, NewIntegration};
use homedash_domain::notification::Notification;
use homedash_domain::session::{Credentials, LoginOutcome, SessionContext};
use homedash_domain::task::{NewTask, ScheduledTask};

/// Device listing and device mutations.
pub trait DeviceGateway: Send + Sync + 'static {
    /// List all devices, in server order.
    fn list_devices(
        &self,
        session: &SessionContext,
    ) -> impl Future<Output = Result<Vec<Device>, HomeDashError>> + Send;

    /// Register a new device.
    fn create_device(
        &self,
        session: &SessionContext,
        device: &NewDevice,
    ) -> impl Future<Output = Result<Device, HomeDashError>> + Send;

    /// Set a light's brightness. Returns the updated device.
    fn set_brightness(
        &self,
        session: &SessionContext,
        id: &DeviceId,
        brightness: Brightness,
    ) -> impl Future<Output = Result<Device, HomeDashError>> + Send;

    /// Flip a device's power state. Returns the state the server settled on.
    fn toggle_device(
        &self,
        session: &SessionContext,
        id: &DeviceId,
    ) -> impl Future<Output = Result<ToggleOutcome, HomeDashError>> + Send;

    fn delete_device(
        &self,
        session: &SessionContext,
        id: &DeviceId,
    ) -> impl Future<Output = Result<(), HomeDashError>> + Send;
}

/// Scheduled task listing, creation and cancellation.
pub trait TaskGateway: Send + Sync + 'static {
    fn list_tasks(
        &self,
        session: &SessionContext,
    ) -> impl Future<Output = Result<Vec<ScheduledTask>, HomeDashError>> + Send;

    fn create_task(
        &self,
        session: &SessionContext,
        task: &NewTask,
    ) -> impl Future<Output = Result<ScheduledTask, HomeDashError>> + Send;

    fn cancel_task(
        &self,
        session: &SessionContext,
        id: &TaskId,
    ) -> impl Future<Output = Result<(), HomeDashError>> + Send;
}

/// Recent system events.
pub trait NotificationGateway: Send + Sync + 'static {
    /// Fetch at most `limit` notifications, most recent first.
    fn list_notifications(
        &self,
        session: &SessionContext,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Notification>, HomeDashError>> + Send;
}

/// Integration catalog. Integrations are addressed by their unique name.
pub trait IntegrationGateway: Send + Sync + 'static {
    fn list_integrations(
        &self,
        session: &SessionContext,
    ) -> impl Future<Output = Result<Vec<Integration>, HomeDashError>> + Send;

    fn integration_stats(
        &self,
        session: &SessionContext,
    ) -> impl Future<Output = Result<IntegrationStats, HomeDashError>> + Send;

    fn get_integration(
        &self,
        session: &SessionContext,
        name: &str,
    ) -> impl Future<Output = Result<Integration, HomeDashError>> + Send;

    fn create_integration(
        &self,
        session: &SessionContext,
        integration: &NewIntegration,
    ) -> impl Future<Output = Result<Integration, HomeDashError>> + Send;

    /// Flip the `connected` flag.
    fn toggle_integration(
        &self,
        session: &SessionContext,
        name: &str,
    ) -> impl Future<Output = Result<Integration, HomeDashError>> + Send;

    fn activate_integration(
        &self,
        session: &SessionContext,
        name: &str,
    ) -> impl Future<Output = Result<Integration, HomeDashError>> + Send;

    fn deactivate_integration(
        &self,
        session: &SessionContext,
        name: &str,
    ) -> impl Future<Output = Result<Integration, HomeDashError>> + Send;

    fn list_skills(
        &self,
        session: &SessionContext,
        name: &str,
    ) -> impl Future<Output = Result<Vec<String>, HomeDashError>> + Send;

    fn add_skill(
        &self,
        session: &SessionContext,
        name: &str,
        skill: &str,
    ) -> impl Future<Output = Result<(), HomeDashError>> + Send;
}

/// Session issuance and teardown.
pub trait AuthGateway: Send + Sync + 'static {
    /// Submit credentials. A rejected login is an `Ok` outcome with
    /// `success = false`.
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<LoginOutcome, HomeDashError>> + Send;

    fn logout(
        &self,
        session: &SessionContext,
    ) -> impl Future<Output = Result<(), HomeDashError>> + Send;
}

/// Every capability of the remote service behind one bound.
pub trait RemoteStateGateway:
    DeviceGateway + TaskGateway + NotificationGateway + IntegrationGateway + AuthGateway
{
}

impl<T> RemoteStateGateway for T where
    T: DeviceGateway + TaskGateway + NotificationGateway + IntegrationGateway + AuthGateway
{
}
