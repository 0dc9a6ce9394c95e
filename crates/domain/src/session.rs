//! Session context — the credential every gateway call carries.
//!
//! The context is passed explicitly; there is no ambient session state.

use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ValidationError};
use crate::id::SessionId;

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: SessionId,
    pub user_id: Option<String>,
}

impl SessionContext {
    #[must_use]
    pub fn new(session_id: SessionId, user_id: Option<String>) -> Self {
        Self {
            session_id,
            user_id,
        }
    }
}

/// Login form input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] when either field is blank.
    pub fn new(username: &str, password: &str) -> Result<Self, ValidationError> {
        if username.trim().is_empty() {
            return Err(ValidationError::MissingField("username"));
        }
        if password.is_empty() {
            return Err(ValidationError::MissingField("password"));
        }
        Ok(Self {
            username: username.trim().to_string(),
            password: password.to_string(),
        })
    }
}

/// Answer to a login attempt.
///
/// Rejected credentials are reported with `success = false` rather than an
/// error status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginOutcome {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<SessionId>,
}

impl LoginOutcome {
    /// Turn the answer into a session.
    ///
    /// # Errors
    ///
    /// Returns a [`ServiceError`] carrying the server message when the login
    /// was rejected or no session id was issued.
    pub fn into_session(self) -> Result<SessionContext, ServiceError> {
        match self.session_id {
            Some(session_id) if self.success && !session_id.is_empty() => {
                Ok(SessionContext::new(session_id, self.user_id))
            }
            _ => {
                let message = if self.message.is_empty() {
                    "Login failed".to_string()
                } else {
                    self.message
                };
                Err(ServiceError::with_detail(message))
            }
        }
    }
}
