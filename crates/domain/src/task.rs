//! Scheduled task — a device action the server will execute at a given time.

use std::fmt;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::device::Brightness;
use crate::error::ValidationError;
use crate::id::{DeviceId, TaskId};
use crate::time::{self, Timestamp};

/// Action performed when a task fires. Unknown actions are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskAction {
    TurnOn,
    TurnOff,
    SetBrightness,
    Other(String),
}

impl TaskAction {
    /// Actions offered by the scheduling form, in display order.
    pub const CHOICES: [Self; 3] = [Self::TurnOn, Self::TurnOff, Self::SetBrightness];

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::TurnOn => "turn_on",
            Self::TurnOff => "turn_off",
            Self::SetBrightness => "set_brightness",
            Self::Other(raw) => raw,
        }
    }

    /// Human label; unknown actions show their raw value.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::TurnOn => "Turn On",
            Self::TurnOff => "Turn Off",
            Self::SetBrightness => "Set Brightness",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for TaskAction {
    fn from(value: String) -> Self {
        match value.as_str() {
            "turn_on" => Self::TurnOn,
            "turn_off" => Self::TurnOff,
            "set_brightness" => Self::SetBrightness,
            _ => Self::Other(value),
        }
    }
}

impl From<TaskAction> for String {
    fn from(value: TaskAction) -> Self {
        match value {
            TaskAction::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task as listed by the server.
///
/// `scheduled_time` is kept as delivered; use
/// [`time::parse_instant`] to interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub task_id: TaskId,
    pub device_id: DeviceId,
    pub action: TaskAction,
    pub scheduled_time: String,
    #[serde(default)]
    pub executed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Request payload for scheduling a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTask {
    pub device_id: DeviceId,
    pub action: TaskAction,
    pub scheduled_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<Brightness>,
}

/// Raw scheduling form input, before validation.
#[derive(Debug, Clone, Default)]
pub struct TaskForm {
    pub device_id: String,
    pub action: Option<TaskAction>,
    pub date: String,
    pub time: String,
    pub brightness: Option<i64>,
}

impl TaskForm {
    /// Validate the form and turn it into a request, reading `date` + `time`
    /// as wall-clock time in `offset`.
    ///
    /// A missing action defaults to [`TaskAction::TurnOn`].
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the device is not selected, the
    /// date or time is missing or malformed, or the brightness is out of range.
    pub fn into_request(self, offset: &FixedOffset) -> Result<NewTask, ValidationError> {
        let device_id = self.device_id.trim();
        if device_id.is_empty() {
            return Err(ValidationError::MissingField("device"));
        }
        let instant: Timestamp = time::combine_date_time(&self.date, &self.time, offset)?;
        let brightness = self.brightness.map(Brightness::new).transpose()?;
        Ok(NewTask {
            device_id: DeviceId::from(device_id),
            action: self.action.unwrap_or(TaskAction::TurnOn),
            scheduled_time: time::to_iso(&instant),
            brightness,
        })
    }
}
