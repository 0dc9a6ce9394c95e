//! Notification — a recent system event reported by the server.
//!
//! Notifications arrive most-recent-first and are displayed in that order.

use serde::{Deserialize, Serialize};

use crate::id::DeviceId;

/// Default number of notifications requested per fetch.
pub const DEFAULT_FEED_LIMIT: usize = 20;

/// A single system event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub event_type: String,
    pub message: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<DeviceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Display category derived from the open-ended `event_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    DeviceAdded,
    DeviceToggled,
    BrightnessChanged,
    TaskScheduled,
    Other,
}

impl EventKind {
    #[must_use]
    pub fn classify(event_type: &str) -> Self {
        match event_type {
            "device_added" => Self::DeviceAdded,
            "device_toggled" => Self::DeviceToggled,
            "brightness_changed" => Self::BrightnessChanged,
            "task_scheduled" => Self::TaskScheduled,
            _ => Self::Other,
        }
    }

    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::DeviceAdded => "\u{2795}",
            Self::DeviceToggled => "\u{1F504}",
            Self::BrightnessChanged => "\u{1F4A1}",
            Self::TaskScheduled => "\u{23F0}",
            Self::Other => "\u{1F4E2}",
        }
    }
}

impl Notification {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        EventKind::classify(&self.event_type)
    }
}
