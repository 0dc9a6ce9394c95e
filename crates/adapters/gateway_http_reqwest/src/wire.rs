//! Request and response bodies that have no domain counterpart.

use homedash_domain::device::Brightness;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct BrightnessBody {
    pub brightness: Brightness,
}

#[derive(Debug, Serialize)]
pub(crate) struct SkillBody<'a> {
    pub skill: &'a str,
}

/// `{"detail": ...}` error body. The detail is usually a string but may be
/// any JSON value (e.g. a list of validation problems).
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: serde_json::Value,
}

impl ErrorBody {
    /// Parse an error body, returning its detail as display text.
    pub fn detail_text(body: &[u8]) -> Option<String> {
        let parsed: Self = serde_json::from_slice(body).ok()?;
        match parsed.detail {
            serde_json::Value::Null => None,
            serde_json::Value::String(text) => Some(text),
            other => Some(other.to_string()),
        }
    }
}
