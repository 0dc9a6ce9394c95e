//! reqwest-backed implementation of the gateway ports.

use homedash_app::ports::{
    AuthGateway, DeviceGateway, IntegrationGateway, NotificationGateway, TaskGateway,
};
use homedash_domain::device::{Brightness, Device, NewDevice, ToggleOutcome};
use homedash_domain::error::HomeDashError;
use homedash_domain::id::{DeviceId, TaskId};
use homedash_domain::integration::{Integration, IntegrationStats, NewIntegration};
use homedash_domain::notification::Notification;
use homedash_domain::session::{Credentials, LoginOutcome, SessionContext};
use homedash_domain::task::{NewTask, ScheduledTask};
use reqwest::{Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::config::GatewayConfig;
use crate::error::HttpGatewayError;
use crate::wire::{BrightnessBody, ErrorBody, SkillBody};

/// Client for the homedash REST service.
///
/// Cheap to share behind an `Arc`; holds no per-session state. Every
/// authenticated call takes the session explicitly and sends its id as the
/// `session_id` query parameter.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpGateway {
    /// Build a client for the service at `config.base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpGatewayError::InvalidBaseUrl`] when the URL does not
    /// parse or cannot carry a path, or [`HttpGatewayError::Request`] when
    /// the TLS backend cannot be initialised.
    pub fn new(config: &GatewayConfig) -> Result<Self, HttpGatewayError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|_| HttpGatewayError::InvalidBaseUrl(config.base_url.clone()))?;
        if base_url.cannot_be_a_base() {
            return Err(HttpGatewayError::InvalidBaseUrl(config.base_url.clone()));
        }
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { http, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL extended with percent-encoded path `segments`.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, HttpGatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| HttpGatewayError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder, HttpGatewayError> {
        Ok(self.http.request(method, self.endpoint(segments)?))
    }

    fn authed(
        &self,
        method: Method,
        segments: &[&str],
        session: &SessionContext,
    ) -> Result<RequestBuilder, HttpGatewayError> {
        Ok(self
            .request(method, segments)?
            .query(&[("session_id", session.session_id.as_str())]))
    }

    /// Send `request` and return the raw success body.
    async fn execute(&self, request: RequestBuilder) -> Result<Vec<u8>, HttpGatewayError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            let detail = ErrorBody::detail_text(&body);
            tracing::debug!(status = status.as_u16(), ?detail, "request rejected");
            return Err(HttpGatewayError::Status {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(body.to_vec())
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, HttpGatewayError> {
        let body = self.execute(request).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Send `request`, ignoring the acknowledgement body.
    async fn ack(&self, request: RequestBuilder) -> Result<(), HttpGatewayError> {
        self.execute(request).await.map(drop)
    }
}

impl DeviceGateway for HttpGateway {
    #[tracing::instrument(skip_all)]
    async fn list_devices(&self, session: &SessionContext) -> Result<Vec<Device>, HomeDashError> {
        let request = self.authed(Method::GET, &["devices"], session)?;
        Ok(self.fetch(request).await?)
    }

    #[tracing::instrument(skip_all, fields(device_type = %device.kind))]
    async fn create_device(
        &self,
        session: &SessionContext,
        device: &NewDevice,
    ) -> Result<Device, HomeDashError> {
        let request = self.authed(Method::POST, &["devices"], session)?.json(device);
        Ok(self.fetch(request).await?)
    }

    #[tracing::instrument(skip(self, session, id), fields(device_id = %id))]
    async fn set_brightness(
        &self,
        session: &SessionContext,
        id: &DeviceId,
        brightness: Brightness,
    ) -> Result<Device, HomeDashError> {
        let request = self
            .authed(Method::PUT, &["devices", id.as_str(), "light", "brightness"], session)?
            .json(&BrightnessBody { brightness });
        Ok(self.fetch(request).await?)
    }

    #[tracing::instrument(skip(self, session, id), fields(device_id = %id))]
    async fn toggle_device(
        &self,
        session: &SessionContext,
        id: &DeviceId,
    ) -> Result<ToggleOutcome, HomeDashError> {
        let request = self.authed(Method::POST, &["devices", id.as_str(), "toggle"], session)?;
        Ok(self.fetch(request).await?)
    }

    #[tracing::instrument(skip(self, session, id), fields(device_id = %id))]
    async fn delete_device(&self, session: &SessionContext, id: &DeviceId) -> Result<(), HomeDashError> {
        let request = self.authed(Method::DELETE, &["devices", id.as_str()], session)?;
        Ok(self.ack(request).await?)
    }
}

impl TaskGateway for HttpGateway {
    #[tracing::instrument(skip_all)]
    async fn list_tasks(&self, session: &SessionContext) -> Result<Vec<ScheduledTask>, HomeDashError> {
        let request = self.authed(Method::GET, &["schedule"], session)?;
        Ok(self.fetch(request).await?)
    }

    #[tracing::instrument(skip_all, fields(device_id = %task.device_id, action = %task.action))]
    async fn create_task(
        &self,
        session: &SessionContext,
        task: &NewTask,
    ) -> Result<ScheduledTask, HomeDashError> {
        let request = self.authed(Method::POST, &["schedule"], session)?.json(task);
        Ok(self.fetch(request).await?)
    }

    #[tracing::instrument(skip(self, session, id), fields(task_id = %id))]
    async fn cancel_task(&self, session: &SessionContext, id: &TaskId) -> Result<(), HomeDashError> {
        let request = self.authed(Method::DELETE, &["schedule", id.as_str()], session)?;
        Ok(self.ack(request).await?)
    }
}

impl NotificationGateway for HttpGateway {
    #[tracing::instrument(skip(self, session))]
    async fn list_notifications(
        &self,
        session: &SessionContext,
        limit: usize,
    ) -> Result<Vec<Notification>, HomeDashError> {
        let request = self
            .authed(Method::GET, &["notifications"], session)?
            .query(&[("limit", limit)]);
        Ok(self.fetch(request).await?)
    }
}

impl IntegrationGateway for HttpGateway {
    #[tracing::instrument(skip_all)]
    async fn list_integrations(
        &self,
        session: &SessionContext,
    ) -> Result<Vec<Integration>, HomeDashError> {
        let request = self.authed(Method::GET, &["integrations"], session)?;
        Ok(self.fetch(request).await?)
    }

    #[tracing::instrument(skip_all)]
    async fn integration_stats(
        &self,
        session: &SessionContext,
    ) -> Result<IntegrationStats, HomeDashError> {
        let request = self.authed(Method::GET, &["integrations", "stats"], session)?;
        Ok(self.fetch(request).await?)
    }

    #[tracing::instrument(skip(self, session))]
    async fn get_integration(
        &self,
        session: &SessionContext,
        name: &str,
    ) -> Result<Integration, HomeDashError> {
        let request = self.authed(Method::GET, &["integrations", name], session)?;
        Ok(self.fetch(request).await?)
    }

    #[tracing::instrument(skip_all, fields(name = %integration.name))]
    async fn create_integration(
        &self,
        session: &SessionContext,
        integration: &NewIntegration,
    ) -> Result<Integration, HomeDashError> {
        let request = self
            .authed(Method::POST, &["integrations"], session)?
            .json(integration);
        Ok(self.fetch(request).await?)
    }

    #[tracing::instrument(skip(self, session))]
    async fn toggle_integration(
        &self,
        session: &SessionContext,
        name: &str,
    ) -> Result<Integration, HomeDashError> {
        let request = self.authed(Method::POST, &["integrations", name, "toggle"], session)?;
        Ok(self.fetch(request).await?)
    }

    #[tracing::instrument(skip(self, session))]
    async fn activate_integration(
        &self,
        session: &SessionContext,
        name: &str,
    ) -> Result<Integration, HomeDashError> {
        let request = self.authed(Method::POST, &["integrations", name, "activate"], session)?;
        Ok(self.fetch(request).await?)
    }

    #[tracing::instrument(skip(self, session))]
    async fn deactivate_integration(
        &self,
        session: &SessionContext,
        name: &str,
    ) -> Result<Integration, HomeDashError> {
        let request = self.authed(Method::POST, &["integrations", name, "deactivate"], session)?;
        Ok(self.fetch(request).await?)
    }

    #[tracing::instrument(skip(self, session))]
    async fn list_skills(&self, session: &SessionContext, name: &str) -> Result<Vec<String>, HomeDashError> {
        let request = self.authed(Method::GET, &["integrations", name, "skills"], session)?;
        Ok(self.fetch(request).await?)
    }

    #[tracing::instrument(skip(self, session))]
    async fn add_skill(
        &self,
        session: &SessionContext,
        name: &str,
        skill: &str,
    ) -> Result<(), HomeDashError> {
        let request = self
            .authed(Method::POST, &["integrations", name, "skills"], session)?
            .json(&SkillBody { skill });
        Ok(self.ack(request).await?)
    }
}

impl AuthGateway for HttpGateway {
    #[tracing::instrument(skip_all, fields(username = %credentials.username))]
    async fn login(&self, credentials: &Credentials) -> Result<LoginOutcome, HomeDashError> {
        let request = self.request(Method::POST, &["auth", "login"])?.json(credentials);
        Ok(self.fetch(request).await?)
    }

    #[tracing::instrument(skip_all)]
    async fn logout(&self, session: &SessionContext) -> Result<(), HomeDashError> {
        let request = self.authed(Method::POST, &["auth", "logout"], session)?;
        Ok(self.ack(request).await?)
    }
}
