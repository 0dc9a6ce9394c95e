//! # homedashd — homedash daemon
//!
//! Composition root that wires the HTTP gateway into the dashboard services
//! and keeps them synchronized until interrupted.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Install the tracing subscriber
//! - Build the HTTP gateway and open a session
//! - Mount the device, task and notification synchronizers and load the
//!   integration catalog, injecting the gateway via the port traits
//! - Log every applied snapshot and banner change
//! - Handle graceful shutdown (SIGINT): tear the synchronizers down, then
//!   log out
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no synchronization logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use homedash_adapter_gateway_http::HttpGateway;
use homedash_app::reconciler::DeviceView;
use homedash_app::services::{
    DeviceControls, IntegrationCatalog, NotificationFeed, SessionService, TaskRegistry, TaskView,
};
use homedash_app::sync::Resource;
use homedash_domain::notification::Notification;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::WatchStream;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Last revision and banner logged for one resource.
#[derive(Default)]
struct Watermark {
    revision: u64,
    error: Option<String>,
}

impl Watermark {
    /// `true` when `resource` carries data or a banner not logged yet.
    fn advance<T>(&mut self, resource: &Resource<T>) -> bool {
        let error = resource.last_error().map(str::to_string);
        let changed = resource.revision() != self.revision || error != self.error;
        if error != self.error
            && let Some(message) = &error
        {
            tracing::warn!(banner = %message, "error banner shown");
        }
        self.revision = resource.revision();
        self.error = error;
        changed
    }
}

fn report_devices(views: &[DeviceView]) {
    for view in views {
        tracing::debug!(
            device_id = %view.device.id,
            name = %view.device.name,
            kind = %view.device.kind,
            is_on = view.is_on,
            brightness = %view.brightness,
            pending = view.is_pending,
            "device"
        );
    }
    tracing::info!(count = views.len(), "devices synced");
}

fn report_tasks(views: &[TaskView]) {
    for view in views {
        tracing::debug!(
            task_id = %view.task.task_id,
            device = %view.device_name,
            action = %view.action_label,
            at = %view.formatted_time,
            executed = view.executed,
            "task"
        );
    }
    tracing::info!(count = views.len(), "tasks synced");
}

fn report_notifications(notifications: &[Notification]) {
    for notification in notifications {
        tracing::debug!(
            icon = notification.kind().icon(),
            at = %notification.timestamp,
            "{}",
            notification.message
        );
    }
    tracing::info!(count = notifications.len(), "notifications synced");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    let offset = config.display_offset()?;
    let gateway = Arc::new(HttpGateway::new(&config.gateway).context("failed to build gateway")?);
    tracing::info!(base_url = %gateway.base_url(), "gateway ready");

    // Session
    let sessions = SessionService::new(Arc::clone(&gateway));
    let session = sessions
        .login(&config.auth.username, &config.auth.password)
        .await
        .map_err(|err| anyhow::anyhow!("login failed: {}", err.display_message("Login failed")))?;

    // Screens
    let devices = DeviceControls::mount(
        Arc::clone(&gateway),
        session.clone(),
        config.device_controls(),
    );
    let tasks = TaskRegistry::mount(
        Arc::clone(&gateway),
        session.clone(),
        config.tasks_interval(),
        offset,
    );
    let mut feed = NotificationFeed::new(Arc::clone(&gateway), session.clone())
        .with_interval(config.notifications_interval())
        .with_limit(config.polling.notifications_limit);
    feed.set_visible(true);

    let catalog = IntegrationCatalog::new(Arc::clone(&gateway), session.clone());
    catalog.refresh().await;
    let integrations = catalog.snapshot();
    match integrations.integrations.last_error() {
        Some(message) => tracing::warn!(banner = %message, "integrations unavailable"),
        None => tracing::info!(
            connected = integrations.stats.connected_count,
            total = integrations.stats.total_count,
            "integrations loaded"
        ),
    }

    // Updates
    let mut device_updates = devices.updates();
    let mut task_updates = tasks.updates();
    let mut notification_updates = feed
        .subscribe()
        .map(WatchStream::new)
        .context("notification feed is hidden")?;
    let mut device_mark = Watermark::default();
    let mut task_mark = Watermark::default();
    let mut notification_mark = Watermark::default();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(snapshot) = device_updates.next() => {
                if device_mark.advance(&snapshot) {
                    report_devices(&devices.views());
                }
            }
            Some(snapshot) = task_updates.next() => {
                if task_mark.advance(&snapshot) {
                    report_tasks(&tasks.views(devices.snapshot().items()));
                }
            }
            Some(snapshot) = notification_updates.next() => {
                if notification_mark.advance(&snapshot) {
                    report_notifications(snapshot.items());
                }
            }
            result = &mut shutdown => {
                result.context("failed to listen for shutdown signal")?;
                break;
            }
        }
    }

    tracing::info!("shutting down");
    devices.shutdown();
    tasks.shutdown();
    feed.set_visible(false);
    sessions.logout(session).await;

    Ok(())
}
