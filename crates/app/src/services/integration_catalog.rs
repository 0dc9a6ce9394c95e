//! Integration catalog — on-demand view of external integrations.
//!
//! Unlike devices and tasks the catalog is not polled: it is fetched on
//! [`refresh`](IntegrationCatalog::refresh) and after every successful
//! mutation.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use homedash_domain::error::{HomeDashError, ValidationError};
use homedash_domain::integration::{Integration, IntegrationStats, NewIntegration};
use homedash_domain::session::SessionContext;
use homedash_domain::time;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::ports::IntegrationGateway;
use crate::sync::Resource;

/// Integrations together with the connected / total counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSnapshot {
    pub integrations: Resource<Integration>,
    pub stats: IntegrationStats,
}

/// Integration catalog with its management commands.
pub struct IntegrationCatalog<G: IntegrationGateway> {
    gateway: Arc<G>,
    session: SessionContext,
    state: watch::Sender<CatalogSnapshot>,
    next_seq: AtomicU64,
}

impl<G: IntegrationGateway> IntegrationCatalog<G> {
    /// Create an empty catalog. Nothing is fetched until
    /// [`refresh`](Self::refresh).
    #[must_use]
    pub fn new(gateway: Arc<G>, session: SessionContext) -> Self {
        let (state, _) = watch::channel(CatalogSnapshot::default());
        Self {
            gateway,
            session,
            state,
            next_seq: AtomicU64::new(0),
        }
    }

    /// Fetch integrations, then stats. On failure the previous data stays
    /// and the banner shows the error.
    #[tracing::instrument(skip(self))]
    pub async fn refresh(&self) {
        let seq = self.next_seq.fetch_add(1, Ordering::AcqRel) + 1;
        self.state.send_modify(|s| s.integrations.begin());

        let result = async {
            let integrations = self.gateway.list_integrations(&self.session).await?;
            let stats = self.gateway.integration_stats(&self.session).await?;
            Ok::<_, HomeDashError>((integrations, stats))
        }
        .await;

        self.state.send_modify(|snapshot| match result {
            Ok((integrations, stats)) => {
                tracing::debug!(count = integrations.len(), "integrations applied");
                snapshot
                    .integrations
                    .apply_success(seq, integrations, time::now());
                snapshot.stats = stats;
            }
            Err(err) => {
                tracing::warn!(error = %err, "integration fetch failed");
                snapshot
                    .integrations
                    .apply_failure(err.display_message("Failed to fetch integrations"));
            }
        });
    }

    /// Register an integration from form input. `features` and `commands`
    /// are comma-separated lists.
    ///
    /// # Errors
    ///
    /// Returns [`HomeDashError::Validation`] for a blank name (nothing is
    /// sent), or the gateway error. Both are also shown in the banner.
    #[tracing::instrument(skip(self, description, features, commands))]
    pub async fn create(
        &self,
        name: &str,
        description: &str,
        features: &str,
        commands: &str,
    ) -> Result<Integration, HomeDashError> {
        let request = NewIntegration::from_form(name, description, features, commands)
            .map_err(|err| self.surface(err.into(), "Failed to create integration"))?;
        let created = self
            .gateway
            .create_integration(&self.session, &request)
            .await
            .map_err(|err| self.surface(err, "Failed to create integration"))?;
        tracing::info!(name = %created.name, "integration created");
        self.refresh().await;
        Ok(created)
    }

    /// Flip the connection of `name`.
    ///
    /// # Errors
    ///
    /// Returns the gateway error; its message is also shown in the banner.
    #[tracing::instrument(skip(self))]
    pub async fn toggle_connection(&self, name: &str) -> Result<Integration, HomeDashError> {
        let updated = self
            .gateway
            .toggle_integration(&self.session, name)
            .await
            .map_err(|err| self.surface(err, "Failed to toggle integration"))?;
        self.refresh().await;
        Ok(updated)
    }

    /// # Errors
    ///
    /// Returns the gateway error; its message is also shown in the banner.
    #[tracing::instrument(skip(self))]
    pub async fn activate(&self, name: &str) -> Result<Integration, HomeDashError> {
        let updated = self
            .gateway
            .activate_integration(&self.session, name)
            .await
            .map_err(|err| self.surface(err, "Failed to activate integration"))?;
        self.refresh().await;
        Ok(updated)
    }

    /// # Errors
    ///
    /// Returns the gateway error; its message is also shown in the banner.
    #[tracing::instrument(skip(self))]
    pub async fn deactivate(&self, name: &str) -> Result<Integration, HomeDashError> {
        let updated = self
            .gateway
            .deactivate_integration(&self.session, name)
            .await
            .map_err(|err| self.surface(err, "Failed to deactivate integration"))?;
        self.refresh().await;
        Ok(updated)
    }

    /// Full record of one integration.
    ///
    /// # Errors
    ///
    /// Returns the gateway error; its message is also shown in the banner.
    pub async fn details(&self, name: &str) -> Result<Integration, HomeDashError> {
        self.gateway
            .get_integration(&self.session, name)
            .await
            .map_err(|err| self.surface(err, "Failed to fetch integration"))
    }

    /// Skills registered for `name`, in server order.
    ///
    /// # Errors
    ///
    /// Returns the gateway error; its message is also shown in the banner.
    pub async fn skills(&self, name: &str) -> Result<Vec<String>, HomeDashError> {
        self.gateway
            .list_skills(&self.session, name)
            .await
            .map_err(|err| self.surface(err, "Failed to fetch skills"))
    }

    /// Add `skill` to `name` and refresh the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] for a blank skill (nothing
    /// is sent), or the gateway error.
    #[tracing::instrument(skip(self))]
    pub async fn add_skill(&self, name: &str, skill: &str) -> Result<(), HomeDashError> {
        let skill = skill.trim();
        if skill.is_empty() {
            return Err(self.surface(
                ValidationError::MissingField("skill").into(),
                "Failed to add skill",
            ));
        }
        self.gateway
            .add_skill(&self.session, name, skill)
            .await
            .map_err(|err| self.surface(err, "Failed to add skill"))?;
        self.refresh().await;
        Ok(())
    }

    #[must_use]
    pub fn snapshot(&self) -> CatalogSnapshot {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CatalogSnapshot> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn updates(&self) -> WatchStream<CatalogSnapshot> {
        WatchStream::new(self.subscribe())
    }

    #[must_use]
    pub fn error_banner(&self) -> Option<String> {
        self.state
            .borrow()
            .integrations
            .last_error()
            .map(str::to_string)
    }

    pub fn dismiss_error(&self) {
        self.state.send_modify(|s| s.integrations.dismiss_error());
    }

    fn surface(&self, err: HomeDashError, fallback: &str) -> HomeDashError {
        let message = err.display_message(fallback);
        self.state
            .send_modify(|s| s.integrations.report_error(message));
        err
    }
}
