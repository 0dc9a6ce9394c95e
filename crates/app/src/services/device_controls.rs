//! Device controls — the device list with its interactive light controls.
//!
//! Owns the device synchronizer, the brightness dispatcher and the
//! reconciler, and wires them together:
//!
//! ```text
//! set_brightness ──► reconciler (Pending) ──► dispatcher ──► gateway
//!                                                   │
//!            reconciler (Confirmed / Failed) ◄──────┘──► refetch devices
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use homedash_domain::device::{Brightness, Device, DeviceType, NewDevice, ToggleOutcome};
use homedash_domain::error::HomeDashError;
use homedash_domain::id::DeviceId;
use homedash_domain::session::SessionContext;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::ports::{ConfirmationPrompt, DeviceGateway};
use crate::reconciler::{DeviceView, Reconciler};
use crate::sync::debounce::DEFAULT_QUIET_PERIOD;
use crate::sync::{DebouncedDispatcher, PollOptions, PollingSynchronizer, Resource, Settlement};

/// Question asked before deleting a device.
pub const DELETE_DEVICE_PROMPT: &str = "Are you sure you want to delete this device?";

/// Timing of the device screen.
#[derive(Debug, Clone, Copy)]
pub struct DeviceControlsOptions {
    pub poll_interval: Duration,
    /// Quiet period before a brightness change is sent.
    pub debounce: Duration,
}

impl Default for DeviceControlsOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(5_000),
            debounce: DEFAULT_QUIET_PERIOD,
        }
    }
}

fn lock(reconciler: &Mutex<Reconciler>) -> MutexGuard<'_, Reconciler> {
    reconciler.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Device list plus brightness / power controls.
pub struct DeviceControls<G: DeviceGateway> {
    gateway: Arc<G>,
    session: SessionContext,
    devices: Arc<PollingSynchronizer<Device>>,
    reconciler: Arc<Mutex<Reconciler>>,
    brightness: DebouncedDispatcher<DeviceId, Brightness, Device>,
}

impl<G: DeviceGateway> DeviceControls<G> {
    /// Start polling devices for `session`.
    ///
    /// Must be called inside a tokio runtime.
    pub fn mount(gateway: Arc<G>, session: SessionContext, options: DeviceControlsOptions) -> Self {
        let devices = Arc::new(PollingSynchronizer::spawn(
            PollOptions::new("devices", options.poll_interval),
            {
                let gateway = Arc::clone(&gateway);
                let session = session.clone();
                move || {
                    let gateway = Arc::clone(&gateway);
                    let session = session.clone();
                    async move { gateway.list_devices(&session).await }
                }
            },
        ));
        let reconciler = Arc::new(Mutex::new(Reconciler::new()));

        let brightness = DebouncedDispatcher::new(
            options.debounce,
            {
                let gateway = Arc::clone(&gateway);
                let session = session.clone();
                move |id: DeviceId, level: Brightness| {
                    let gateway = Arc::clone(&gateway);
                    let session = session.clone();
                    async move { gateway.set_brightness(&session, &id, level).await }
                }
            },
            {
                let devices = Arc::downgrade(&devices);
                let reconciler = Arc::clone(&reconciler);
                move |settlement: Settlement<DeviceId, Brightness, Device>| {
                    let Some(devices) = devices.upgrade() else {
                        return;
                    };
                    let Settlement {
                        key,
                        value,
                        outcome,
                    } = settlement;
                    match outcome {
                        Ok(_) => {
                            lock(&reconciler).brightness_confirmed(&key, value, devices.revision());
                            devices.spawn_refetch();
                        }
                        Err(err) => {
                            let message = err.display_message("Failed to set brightness");
                            lock(&reconciler).brightness_failed(
                                &key,
                                value,
                                message.clone(),
                                devices.revision(),
                            );
                            devices.report_error(message);
                        }
                    }
                }
            },
        );

        Self {
            gateway,
            session,
            devices,
            reconciler,
            brightness,
        }
    }

    /// Show `level` immediately and send it once the slider has been quiet
    /// for the debounce period.
    #[tracing::instrument(skip(self, id), fields(device_id = %id))]
    pub fn set_brightness(&self, id: &DeviceId, level: Brightness) {
        lock(&self.reconciler).brightness_requested(id, level, self.devices.revision());
        self.brightness.dispatch(id.clone(), level);
    }

    /// Flip a device's power state. The displayed state follows the server's
    /// answer, with brightness shown as 100 or 0.
    ///
    /// # Errors
    ///
    /// Returns the gateway error; its message is also shown in the banner.
    #[tracing::instrument(skip(self, id), fields(device_id = %id))]
    pub async fn toggle(&self, id: &DeviceId) -> Result<ToggleOutcome, HomeDashError> {
        let outcome = self
            .gateway
            .toggle_device(&self.session, id)
            .await
            .map_err(|err| self.surface(err, "Failed to toggle device"))?;
        lock(&self.reconciler).toggle_confirmed(id, outcome.is_on, self.devices.revision());
        self.devices.spawn_refetch();
        Ok(outcome)
    }

    /// Register a device and refresh the list.
    ///
    /// # Errors
    ///
    /// Returns [`HomeDashError::Validation`] for a blank name (nothing is
    /// sent), or the gateway error.
    #[tracing::instrument(skip(self))]
    pub async fn create_device(
        &self,
        kind: DeviceType,
        name: &str,
    ) -> Result<Device, HomeDashError> {
        let request =
            NewDevice::new(kind, name).map_err(|err| self.surface(err.into(), "Failed to add device"))?;
        let device = self
            .gateway
            .create_device(&self.session, &request)
            .await
            .map_err(|err| self.surface(err, "Failed to add device"))?;
        tracing::info!(device_id = %device.id, "device created");
        self.devices.refetch().await;
        Ok(device)
    }

    /// Delete a device once `prompt` accepts. Returns `false` when the user
    /// declined.
    ///
    /// # Errors
    ///
    /// Returns the gateway error; its message is also shown in the banner.
    #[tracing::instrument(skip(self, id, prompt), fields(device_id = %id))]
    pub async fn delete_device(
        &self,
        id: &DeviceId,
        prompt: &impl ConfirmationPrompt,
    ) -> Result<bool, HomeDashError> {
        if !prompt.confirm(DELETE_DEVICE_PROMPT) {
            return Ok(false);
        }
        self.gateway
            .delete_device(&self.session, id)
            .await
            .map_err(|err| self.surface(err, "Failed to delete device"))?;
        self.devices.refetch().await;
        Ok(true)
    }

    /// Devices as they should be rendered right now.
    #[must_use]
    pub fn views(&self) -> Vec<DeviceView> {
        let snapshot = self.devices.snapshot();
        let mut reconciler = lock(&self.reconciler);
        reconciler.prune(&snapshot);
        reconciler.render(&snapshot)
    }

    /// `true` while a brightness write for `id` is on the wire.
    #[must_use]
    pub fn is_updating(&self, id: &DeviceId) -> bool {
        self.brightness.is_busy(id)
    }

    #[must_use]
    pub fn snapshot(&self) -> Resource<Device> {
        self.devices.snapshot()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Resource<Device>> {
        self.devices.subscribe()
    }

    #[must_use]
    pub fn updates(&self) -> WatchStream<Resource<Device>> {
        self.devices.updates()
    }

    #[must_use]
    pub fn error_banner(&self) -> Option<String> {
        self.devices.snapshot().last_error().map(str::to_string)
    }

    pub fn dismiss_error(&self) {
        self.devices.dismiss_error();
    }

    pub async fn refresh(&self) {
        self.devices.refetch().await;
    }

    /// Stop polling and drop brightness changes that were not sent yet.
    pub fn shutdown(&self) {
        self.brightness.cancel_all();
        self.devices.shutdown();
    }

    fn surface(&self, err: HomeDashError, fallback: &str) -> HomeDashError {
        self.devices.report_error(err.display_message(fallback));
        err
    }
}
