//! Device view-state reconciler.
//!
//! Merges the optimistic state of each light's controls with the latest
//! device snapshot. The reconciler is pure bookkeeping: it never talks to the
//! gateway and never spawns anything, so every rule below is testable
//! without a runtime.
//!
//! Rules, per control:
//! - [`ControlValue::Pending`] always wins over the snapshot
//! - [`ControlValue::Confirmed`] wins only while the snapshot is the one that
//!   was current when the confirmation arrived; the next applied poll is
//!   authoritative and the overlay is dropped
//! - [`ControlValue::Failed`] keeps showing the value the user asked for
//!   (no rollback) until the next applied poll or a newer input supersedes it

use std::collections::HashMap;

use homedash_domain::device::{Brightness, Device};
use homedash_domain::id::DeviceId;

use crate::sync::Resource;

/// Optimistic state of one control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlValue<V> {
    /// Acknowledged by the server.
    Confirmed(V),
    /// Sent (or about to be sent), no answer yet.
    Pending(V),
    /// Rejected by the server; `value` is what the user asked for.
    Failed { value: V, error: String },
}

impl<V: Copy> ControlValue<V> {
    #[must_use]
    pub fn value(&self) -> V {
        match self {
            Self::Confirmed(value) | Self::Pending(value) | Self::Failed { value, .. } => *value,
        }
    }
}

/// A control value plus the resource revision it was recorded at.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Tracked<V> {
    state: ControlValue<V>,
    revision: u64,
}

impl<V: Copy> Tracked<V> {
    fn visible_at(&self, revision: u64) -> Option<V> {
        match &self.state {
            ControlValue::Pending(value) => Some(*value),
            ControlValue::Confirmed(value) | ControlValue::Failed { value, .. } => {
                (self.revision == revision).then_some(*value)
            }
        }
    }

    /// Settled values last until a newer snapshot is applied.
    fn is_expired_at(&self, revision: u64) -> bool {
        !matches!(self.state, ControlValue::Pending(_)) && self.revision != revision
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Overlay {
    power: Option<Tracked<bool>>,
    brightness: Option<Tracked<Brightness>>,
}

impl Overlay {
    fn is_empty(&self) -> bool {
        self.power.is_none() && self.brightness.is_none()
    }

    fn error(&self) -> Option<&str> {
        failure(self.brightness.as_ref()).or_else(|| failure(self.power.as_ref()))
    }
}

fn failure<V>(tracked: Option<&Tracked<V>>) -> Option<&str> {
    match &tracked?.state {
        ControlValue::Failed { error, .. } => Some(error.as_str()),
        _ => None,
    }
}

/// What a device card renders.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceView {
    /// The snapshot as delivered by the last applied poll.
    pub device: Device,
    pub is_on: bool,
    pub brightness: Brightness,
    /// A brightness value has not been acknowledged yet.
    pub is_pending: bool,
    /// Last write failure for this device, if it has not been superseded.
    pub error: Option<String>,
}

/// Per-device overlay of optimistic control values.
#[derive(Debug, Default)]
pub struct Reconciler {
    overlays: HashMap<DeviceId, Overlay>,
}

impl Reconciler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The user picked a brightness; show it right away.
    pub fn brightness_requested(&mut self, id: &DeviceId, level: Brightness, revision: u64) {
        let overlay = self.overlays.entry(id.clone()).or_default();
        overlay.brightness = Some(Tracked {
            state: ControlValue::Pending(level),
            revision,
        });
    }

    /// The server acknowledged `level`. Ignored when a newer value is still
    /// pending for the same control.
    pub fn brightness_confirmed(&mut self, id: &DeviceId, level: Brightness, revision: u64) {
        let Some(overlay) = self.overlays.get_mut(id) else {
            return;
        };
        if !Self::settles(overlay.brightness.as_ref(), level) {
            tracing::debug!(device_id = %id, %level, "newer brightness pending, ignoring confirmation");
            return;
        }
        overlay.brightness = Some(Tracked {
            state: ControlValue::Confirmed(level),
            revision,
        });
        if level.is_positive() {
            overlay.power = Some(Tracked {
                state: ControlValue::Confirmed(true),
                revision,
            });
        }
    }

    /// The server rejected `level`. The requested value stays on screen until
    /// a snapshot newer than `revision` is applied.
    pub fn brightness_failed(
        &mut self,
        id: &DeviceId,
        level: Brightness,
        error: String,
        revision: u64,
    ) {
        let Some(overlay) = self.overlays.get_mut(id) else {
            return;
        };
        let Some(tracked) = overlay.brightness.as_mut() else {
            return;
        };
        if !Self::settles(Some(&*tracked), level) {
            return;
        }
        *tracked = Tracked {
            state: ControlValue::Failed {
                value: level,
                error,
            },
            revision,
        };
    }

    /// A toggle was confirmed with power state `is_on`. Brightness follows
    /// as 100 or 0. Confirmations apply in arrival order.
    pub fn toggle_confirmed(&mut self, id: &DeviceId, is_on: bool, revision: u64) {
        let overlay = self.overlays.entry(id.clone()).or_default();
        overlay.power = Some(Tracked {
            state: ControlValue::Confirmed(is_on),
            revision,
        });
        overlay.brightness = Some(Tracked {
            state: ControlValue::Confirmed(if is_on {
                Brightness::FULL
            } else {
                Brightness::OFF
            }),
            revision,
        });
    }

    /// Current optimistic state of a device's brightness control.
    #[must_use]
    pub fn brightness_state(&self, id: &DeviceId) -> Option<&ControlValue<Brightness>> {
        self.overlays
            .get(id)
            .and_then(|overlay| overlay.brightness.as_ref())
            .map(|tracked| &tracked.state)
    }

    /// Current optimistic state of a device's power control.
    #[must_use]
    pub fn power_state(&self, id: &DeviceId) -> Option<&ControlValue<bool>> {
        self.overlays
            .get(id)
            .and_then(|overlay| overlay.power.as_ref())
            .map(|tracked| &tracked.state)
    }

    /// Drop overlays the snapshot has made obsolete: devices that vanished
    /// and settled values older than the snapshot.
    pub fn prune(&mut self, snapshot: &Resource<Device>) {
        let revision = snapshot.revision();
        self.overlays.retain(|id, overlay| {
            if !snapshot.items().iter().any(|device| &device.id == id) {
                return false;
            }
            if overlay.power.as_ref().is_some_and(|t| t.is_expired_at(revision)) {
                overlay.power = None;
            }
            if overlay
                .brightness
                .as_ref()
                .is_some_and(|t| t.is_expired_at(revision))
            {
                overlay.brightness = None;
            }
            !overlay.is_empty()
        });
    }

    /// Render every device of `snapshot`, in server order.
    #[must_use]
    pub fn render(&self, snapshot: &Resource<Device>) -> Vec<DeviceView> {
        let revision = snapshot.revision();
        snapshot
            .items()
            .iter()
            .map(|device| self.render_one(device, revision))
            .collect()
    }

    fn render_one(&self, device: &Device, revision: u64) -> DeviceView {
        let Some(overlay) = self.overlays.get(&device.id) else {
            return DeviceView {
                device: device.clone(),
                is_on: device.reported_on(),
                brightness: device.reported_brightness(),
                is_pending: false,
                error: None,
            };
        };
        let is_on = overlay
            .power
            .as_ref()
            .and_then(|tracked| tracked.visible_at(revision))
            .unwrap_or_else(|| device.reported_on());
        let brightness = overlay
            .brightness
            .as_ref()
            .and_then(|tracked| tracked.visible_at(revision))
            .unwrap_or_else(|| device.reported_brightness());
        let is_pending = matches!(
            overlay.brightness.as_ref().map(|tracked| &tracked.state),
            Some(ControlValue::Pending(_))
        );
        DeviceView {
            device: device.clone(),
            is_on,
            brightness,
            is_pending,
            error: overlay.error().map(str::to_string),
        }
    }

    /// Whether a settlement for `level` resolves the current state, i.e. no
    /// different value has been requested since.
    fn settles(current: Option<&Tracked<Brightness>>, level: Brightness) -> bool {
        match current.map(|tracked| &tracked.state) {
            Some(ControlValue::Pending(pending)) => *pending == level,
            Some(_) | None => true,
        }
    }
}
