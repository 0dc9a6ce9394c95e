//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `homedash.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use chrono::FixedOffset;
use homedash_adapter_gateway_http::GatewayConfig;
use homedash_app::services::DeviceControlsOptions;
use homedash_domain::time;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote service settings.
    pub gateway: GatewayConfig,
    /// Refresh cadence of each screen.
    pub polling: PollingConfig,
    /// Credentials used to open a session at startup.
    pub auth: AuthConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// How times are shown.
    pub display: DisplayConfig,
}

/// Polling and debounce timings, in milliseconds.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub devices_ms: u64,
    pub tasks_ms: u64,
    pub notifications_ms: u64,
    /// Size of the notification window.
    pub notifications_limit: usize,
    /// Quiet period before a brightness change is sent.
    pub debounce_ms: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Fixed offset used to read and show wall-clock times. Falls back to
    /// the machine's local offset when unset.
    pub utc_offset_minutes: Option<i32>,
}

impl Config {
    /// Load configuration from `homedash.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting values are invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("homedash.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HOMEDASH_BASE_URL") {
            self.gateway.base_url = val;
        }
        if let Ok(val) = std::env::var("HOMEDASH_USERNAME") {
            self.auth.username = val;
        }
        if let Ok(val) = std::env::var("HOMEDASH_PASSWORD") {
            self.auth.password = val;
        }
        if let Ok(val) = std::env::var("HOMEDASH_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway.base_url.trim().is_empty() {
            return Err(ConfigError::Validation("gateway.base_url must not be empty".to_string()));
        }
        if self.gateway.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "gateway.request_timeout_secs must be non-zero".to_string(),
            ));
        }
        let polling = &self.polling;
        for (name, value) in [
            ("devices_ms", polling.devices_ms),
            ("tasks_ms", polling.tasks_ms),
            ("notifications_ms", polling.notifications_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Validation(format!("polling.{name} must be non-zero")));
            }
        }
        if polling.notifications_limit == 0 {
            return Err(ConfigError::Validation(
                "polling.notifications_limit must be non-zero".to_string(),
            ));
        }
        self.display_offset()?;
        Ok(())
    }

    /// Options for the device screen.
    #[must_use]
    pub fn device_controls(&self) -> DeviceControlsOptions {
        DeviceControlsOptions {
            poll_interval: Duration::from_millis(self.polling.devices_ms),
            debounce: Duration::from_millis(self.polling.debounce_ms),
        }
    }

    #[must_use]
    pub fn tasks_interval(&self) -> Duration {
        Duration::from_millis(self.polling.tasks_ms)
    }

    #[must_use]
    pub fn notifications_interval(&self) -> Duration {
        Duration::from_millis(self.polling.notifications_ms)
    }

    /// Offset used to read and show wall-clock times.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when the configured offset is
    /// outside ±24h.
    pub fn display_offset(&self) -> Result<FixedOffset, ConfigError> {
        match self.display.utc_offset_minutes {
            None => Ok(time::local_offset()),
            Some(minutes) => minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or_else(|| {
                    ConfigError::Validation(format!(
                        "display.utc_offset_minutes out of range: {minutes}"
                    ))
                }),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            devices_ms: 5_000,
            tasks_ms: 10_000,
            notifications_ms: 10_000,
            notifications_limit: 20,
            debounce_ms: 300,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "homedashd=info,homedash=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
