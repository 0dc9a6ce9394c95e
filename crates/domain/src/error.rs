//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`HomeDashError`] via `From`. Views never propagate these further: they
//! turn them into banner strings with [`HomeDashError::display_message`].

/// Top-level error for every gateway call and local command.
#[derive(Debug, thiserror::Error)]
pub enum HomeDashError {
    /// Malformed local input, rejected before any network call.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// Structured failure returned by the remote service.
    #[error("service error")]
    Service(#[from] ServiceError),

    /// The remote service could not be reached or its answer could not be read.
    #[error("transport failure")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl HomeDashError {
    /// Human-readable message for a banner.
    ///
    /// Uses the service-provided detail when non-empty, the validation message
    /// for local input errors, and `fallback` otherwise.
    #[must_use]
    pub fn display_message(&self, fallback: &str) -> String {
        match self {
            Self::Validation(err) => err.to_string(),
            Self::Service(ServiceError {
                detail: Some(detail),
                ..
            }) if !detail.is_empty() => detail.clone(),
            Self::Service(_) | Self::Transport(_) => fallback.to_string(),
        }
    }
}

/// Failure detail returned by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("remote service rejected the request (status {status:?})")]
pub struct ServiceError {
    /// HTTP-like status code, when the transport exposes one.
    pub status: Option<u16>,
    /// The `detail` string carried by the error body.
    pub detail: Option<String>,
}

impl ServiceError {
    /// Build an error carrying only a detail message.
    #[must_use]
    pub fn with_detail(detail: impl Into<String>) -> Self {
        Self {
            status: None,
            detail: Some(detail.into()),
        }
    }
}

/// Local input validation failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("brightness must be between 0 and 100, got {0}")]
    BrightnessOutOfRange(i64),

    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid time {0:?}, expected HH:MM")]
    InvalidTime(String),

    #[error("{wall_time} does not exist in the display time zone")]
    NonexistentLocalTime { wall_time: String },

    #[error("{field} is only valid for {expected} devices")]
    FieldNotAllowed {
        field: &'static str,
        expected: &'static str,
    },
}
