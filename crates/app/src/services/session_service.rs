//! Session service — logging in and out.

use std::sync::Arc;

use homedash_domain::error::HomeDashError;
use homedash_domain::session::{Credentials, SessionContext};

use crate::ports::AuthGateway;

/// Obtains and releases [`SessionContext`]s.
pub struct SessionService<G: AuthGateway> {
    gateway: Arc<G>,
}

impl<G: AuthGateway> SessionService<G> {
    #[must_use]
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Log in and return the session every other call must carry.
    ///
    /// # Errors
    ///
    /// Returns [`HomeDashError::Validation`] when a field is blank (nothing
    /// is sent), [`HomeDashError::Service`] with the server message when the
    /// credentials are rejected, or the transport error.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionContext, HomeDashError> {
        let credentials = Credentials::new(username, password)?;
        let outcome = self.gateway.login(&credentials).await?;
        let session = outcome.into_session()?;
        tracing::info!(user_id = ?session.user_id, "logged in");
        Ok(session)
    }

    /// End `session`. A remote failure is only logged; the caller drops the
    /// session either way.
    #[tracing::instrument(skip_all, fields(user_id = ?session.user_id))]
    pub async fn logout(&self, session: SessionContext) {
        match self.gateway.logout(&session).await {
            Ok(()) => tracing::info!("logged out"),
            Err(err) => tracing::warn!(error = %err, "logout failed, dropping session locally"),
        }
    }
}
