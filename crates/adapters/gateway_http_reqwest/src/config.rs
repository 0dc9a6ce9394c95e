//! Gateway configuration.

use std::time::Duration;

use serde::Deserialize;

/// Where the REST service lives and how long to wait for it.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Root URL of the service (e.g. `http://localhost:8000`). A path
    /// prefix such as `/api` is kept.
    pub base_url: String,
    /// Per-request timeout, in seconds.
    pub request_timeout_secs: u64,
}

impl GatewayConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 10,
        }
    }
}
