//! Device — a controllable thing registered on the remote service.
//!
//! Devices are owned by the server; the client only ever holds snapshots
//! of them, as delivered by the last successful poll.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{HomeDashError, ValidationError};
use crate::id::DeviceId;

/// Kind of device. Unknown kinds are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceType {
    Light,
    Thermostat,
    SecurityCamera,
    Other(String),
}

impl DeviceType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Light => "light",
            Self::Thermostat => "thermostat",
            Self::SecurityCamera => "security_camera",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for DeviceType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "light" => Self::Light,
            "thermostat" => Self::Thermostat,
            "security_camera" => Self::SecurityCamera,
            _ => Self::Other(value),
        }
    }
}

impl From<DeviceType> for String {
    fn from(value: DeviceType) -> Self {
        match value {
            DeviceType::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Power status reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    On,
    Off,
    /// Any status the client does not know (e.g. `created`); rendered as off.
    #[default]
    #[serde(other)]
    Unknown,
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Light brightness percentage, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Brightness(u8);

impl Brightness {
    pub const OFF: Self = Self(0);
    pub const FULL: Self = Self(100);

    /// Validate a raw percentage.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::BrightnessOutOfRange`] outside `0..=100`.
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        u8::try_from(value)
            .ok()
            .filter(|v| *v <= 100)
            .map(Self)
            .ok_or(ValidationError::BrightnessOutOfRange(value))
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Whether this level implies the light is on.
    #[must_use]
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl TryFrom<i64> for Brightness {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Brightness> for u8 {
    fn from(value: Brightness) -> Self {
        value.0
    }
}

impl fmt::Display for Brightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// A device snapshot as delivered by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    #[serde(rename = "device_id")]
    pub id: DeviceId,
    #[serde(rename = "device_type")]
    pub kind: DeviceType,
    #[serde(rename = "device_name")]
    pub name: String,
    #[serde(default)]
    pub status: DeviceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<Brightness>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_on: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_temperature: Option<f64>,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HomeDashError::Validation`] when:
    /// - `name` is empty ([`ValidationError::EmptyName`])
    /// - `brightness` is set on a non-light ([`ValidationError::FieldNotAllowed`])
    /// - a temperature field is set on a non-thermostat ([`ValidationError::FieldNotAllowed`])
    pub fn validate(&self) -> Result<(), HomeDashError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.brightness.is_some() && self.kind != DeviceType::Light {
            return Err(ValidationError::FieldNotAllowed {
                field: "brightness",
                expected: "light",
            }
            .into());
        }
        let has_temperature = self.temperature.is_some() || self.target_temperature.is_some();
        if has_temperature && self.kind != DeviceType::Thermostat {
            return Err(ValidationError::FieldNotAllowed {
                field: "temperature",
                expected: "thermostat",
            }
            .into());
        }
        Ok(())
    }

    /// Only lights expose interactive controls.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        self.kind == DeviceType::Light
    }

    /// Power state implied by the snapshot alone.
    #[must_use]
    pub fn reported_on(&self) -> bool {
        self.is_on.unwrap_or(self.status == DeviceStatus::On)
    }

    /// Brightness implied by the snapshot alone (absent reads as 0).
    #[must_use]
    pub fn reported_brightness(&self) -> Brightness {
        self.brightness.unwrap_or(Brightness::OFF)
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<DeviceId>,
    kind: Option<DeviceType>,
    name: Option<String>,
    status: DeviceStatus,
    brightness: Option<Brightness>,
    is_on: Option<bool>,
    temperature: Option<f64>,
    target_temperature: Option<f64>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<DeviceId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: DeviceType) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn status(mut self, status: DeviceStatus) -> Self {
        self.status = status;
        self
    }

    #[must_use]
    pub fn brightness(mut self, brightness: Brightness) -> Self {
        self.brightness = Some(brightness);
        self
    }

    #[must_use]
    pub fn is_on(mut self, is_on: bool) -> Self {
        self.is_on = Some(is_on);
        self
    }

    #[must_use]
    pub fn temperature(mut self, current: f64, target: f64) -> Self {
        self.temperature = Some(current);
        self.target_temperature = Some(target);
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// # Errors
    ///
    /// Returns [`HomeDashError::Validation`] if the id or name is missing,
    /// or if type-specific fields do not match the device kind.
    pub fn build(self) -> Result<Device, HomeDashError> {
        let id = self
            .id
            .filter(|id| !id.is_empty())
            .ok_or(ValidationError::MissingField("device_id"))?;
        let device = Device {
            id,
            kind: self.kind.unwrap_or(DeviceType::Light),
            name: self.name.unwrap_or_default(),
            status: self.status,
            brightness: self.brightness,
            is_on: self.is_on,
            temperature: self.temperature,
            target_temperature: self.target_temperature,
        };
        device.validate()?;
        Ok(device)
    }
}

/// Request payload for registering a new device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewDevice {
    #[serde(rename = "device_type")]
    pub kind: DeviceType,
    #[serde(rename = "device_name")]
    pub name: String,
}

impl NewDevice {
    /// Validate form input and build the request.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`] when the name is blank.
    pub fn new(kind: DeviceType, name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(Self {
            kind,
            name: trimmed.to_string(),
        })
    }
}

/// Server confirmation of a toggle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleOutcome {
    pub device_id: DeviceId,
    pub is_on: bool,
    #[serde(default)]
    pub status: DeviceStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lamp() -> Device {
        Device::builder()
            .id("light1")
            .kind(DeviceType::Light)
            .name("Living Room Light")
            .build()
            .unwrap()
    }

    #[test]
    fn should_build_light_when_fields_valid() {
        let device = lamp();
        assert_eq!(device.name, "Living Room Light");
        assert_eq!(device.status, DeviceStatus::Unknown);
        assert!(device.is_interactive());
    }

    #[test]
    fn should_reject_brightness_on_thermostat() {
        let result = Device::builder()
            .id("t1")
            .kind(DeviceType::Thermostat)
            .name("Hall")
            .brightness(Brightness::FULL)
            .build();
        assert!(matches!(
            result,
            Err(HomeDashError::Validation(ValidationError::FieldNotAllowed {
                field: "brightness",
                ..
            }))
        ));
    }

    #[test]
    fn should_reject_temperature_on_light() {
        let result = Device::builder()
            .id("l1")
            .kind(DeviceType::Light)
            .name("Desk")
            .temperature(20.0, 21.0)
            .build();
        assert!(matches!(
            result,
            Err(HomeDashError::Validation(ValidationError::FieldNotAllowed {
                field: "temperature",
                ..
            }))
        ));
    }

    #[test]
    fn should_reject_empty_name() {
        let result = Device::builder().id("l1").name("  ").build();
        assert!(matches!(
            result,
            Err(HomeDashError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_reject_missing_id() {
        let result = Device::builder().name("Desk").build();
        assert!(matches!(
            result,
            Err(HomeDashError::Validation(ValidationError::MissingField("device_id")))
        ));
    }

    #[test]
    fn should_validate_brightness_range() {
        assert_eq!(Brightness::new(70).unwrap().value(), 70);
        assert_eq!(Brightness::new(0).unwrap(), Brightness::OFF);
        assert_eq!(
            Brightness::new(101),
            Err(ValidationError::BrightnessOutOfRange(101))
        );
        assert_eq!(
            Brightness::new(-1),
            Err(ValidationError::BrightnessOutOfRange(-1))
        );
    }

    #[test]
    fn should_deserialize_server_payload() {
        let json = r#"{
            "device_id": "light1",
            "device_name": "Living Room Light",
            "device_type": "light",
            "status": "on",
            "brightness": 40,
            "is_on": true
        }"#;
        let device: Device = serde_json::from_str(json).unwrap();
        assert_eq!(device.id.as_str(), "light1");
        assert_eq!(device.kind, DeviceType::Light);
        assert_eq!(device.status, DeviceStatus::On);
        assert_eq!(device.brightness, Some(Brightness::new(40).unwrap()));
        assert!(device.reported_on());
    }

    #[test]
    fn should_keep_unknown_type_and_status() {
        let json = r#"{
            "device_id": "x",
            "device_name": "Speaker",
            "device_type": "voice_controller",
            "status": "created",
            "brightness": null
        }"#;
        let device: Device = serde_json::from_str(json).unwrap();
        assert_eq!(device.kind, DeviceType::Other("voice_controller".to_string()));
        assert_eq!(device.status, DeviceStatus::Unknown);
        assert!(device.brightness.is_none());
        assert!(!device.reported_on());
        assert_eq!(device.reported_brightness(), Brightness::OFF);
    }

    #[test]
    fn should_reject_out_of_range_brightness_in_payload() {
        let json = r#"{"device_id":"l","device_name":"L","device_type":"light","brightness":250}"#;
        assert!(serde_json::from_str::<Device>(json).is_err());
    }

    #[test]
    fn should_prefer_is_on_over_status() {
        let mut device = lamp();
        device.status = DeviceStatus::Off;
        device.is_on = Some(true);
        assert!(device.reported_on());
    }

    #[test]
    fn should_serialize_new_device_with_wire_names() {
        let request = NewDevice::new(DeviceType::SecurityCamera, " Porch ").unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"device_type": "security_camera", "device_name": "Porch"})
        );
    }

    #[test]
    fn should_reject_blank_new_device_name() {
        assert_eq!(
            NewDevice::new(DeviceType::Light, ""),
            Err(ValidationError::EmptyName)
        );
    }
}
