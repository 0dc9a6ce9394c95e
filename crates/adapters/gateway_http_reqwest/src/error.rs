//! HTTP-gateway-specific error type wrapping reqwest errors.

use homedash_domain::error::{HomeDashError, ServiceError};

/// Errors originating from the HTTP gateway.
#[derive(Debug, thiserror::Error)]
pub enum HttpGatewayError {
    /// The configured base URL cannot be used to build request URLs.
    #[error("invalid base url {0:?}")]
    InvalidBaseUrl(String),

    /// The request could not be sent or its body could not be read.
    #[error("request failed")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("service responded with status {status}")]
    Status {
        status: u16,
        /// Text of the `detail` field, when the body carried one.
        detail: Option<String>,
    },

    /// A success body did not match the expected shape.
    #[error("failed to decode response body")]
    Decode(#[from] serde_json::Error),
}

impl From<HttpGatewayError> for HomeDashError {
    fn from(err: HttpGatewayError) -> Self {
        match err {
            HttpGatewayError::Status { status, detail } => Self::Service(ServiceError {
                status: Some(status),
                detail,
            }),
            other => Self::Transport(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_status_into_service_error() {
        let err: HomeDashError = HttpGatewayError::Status {
            status: 404,
            detail: Some("Device not found".to_string()),
        }
        .into();
        assert!(matches!(
            err,
            HomeDashError::Service(ServiceError {
                status: Some(404),
                ..
            })
        ));
        assert_eq!(err.display_message("Failed to delete device"), "Device not found");
    }

    #[test]
    fn should_convert_decode_failure_into_transport_error() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: HomeDashError = HttpGatewayError::Decode(json_err).into();
        assert!(matches!(err, HomeDashError::Transport(_)));
        assert_eq!(err.display_message("Failed to fetch tasks"), "Failed to fetch tasks");
    }

    #[test]
    fn should_display_invalid_base_url() {
        let err = HttpGatewayError::InvalidBaseUrl("mailto:x".to_string());
        assert_eq!(err.to_string(), "invalid base url \"mailto:x\"");
    }
}
