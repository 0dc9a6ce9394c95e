//! Notification feed — the latest system events, polled only while visible.

use std::sync::Arc;
use std::time::Duration;

use homedash_domain::notification::{DEFAULT_FEED_LIMIT, EventKind, Notification};
use homedash_domain::session::SessionContext;
use tokio::sync::watch;

use crate::ports::NotificationGateway;
use crate::sync::{PollOptions, PollingSynchronizer, Resource};

/// Default polling period of the feed.
pub const DEFAULT_FEED_INTERVAL: Duration = Duration::from_millis(10_000);

/// A bounded window of recent notifications.
///
/// Each fetch replaces the window; nothing is accumulated across fetches.
/// Hiding the feed tears its synchronizer down entirely.
pub struct NotificationFeed<G: NotificationGateway> {
    gateway: Arc<G>,
    session: SessionContext,
    interval: Duration,
    limit: usize,
    poller: Option<PollingSynchronizer<Notification>>,
}

impl<G: NotificationGateway> NotificationFeed<G> {
    /// Create a hidden feed. Nothing is fetched until
    /// [`set_visible(true)`](Self::set_visible).
    #[must_use]
    pub fn new(gateway: Arc<G>, session: SessionContext) -> Self {
        Self {
            gateway,
            session,
            interval: DEFAULT_FEED_INTERVAL,
            limit: DEFAULT_FEED_LIMIT,
            poller: None,
        }
    }

    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Show or hide the feed. Showing fetches immediately and starts
    /// polling; hiding stops all fetching.
    ///
    /// Must be called inside a tokio runtime.
    pub fn set_visible(&mut self, visible: bool) {
        match (visible, self.poller.is_some()) {
            (true, false) => {
                tracing::debug!(limit = self.limit, "notification feed shown");
                self.poller = Some(self.spawn_poller());
            }
            (false, true) => {
                tracing::debug!("notification feed hidden");
                if let Some(poller) = self.poller.take() {
                    poller.shutdown();
                }
            }
            _ => {}
        }
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.poller.is_some()
    }

    /// Fetch now. Does nothing while hidden.
    pub async fn refresh(&self) {
        if let Some(poller) = &self.poller {
            poller.refetch().await;
        }
    }

    /// Current window, most recent first. `None` while hidden.
    #[must_use]
    pub fn snapshot(&self) -> Option<Resource<Notification>> {
        self.poller.as_ref().map(PollingSynchronizer::snapshot)
    }

    /// Change notifications for the current window. `None` while hidden.
    #[must_use]
    pub fn subscribe(&self) -> Option<watch::Receiver<Resource<Notification>>> {
        self.poller.as_ref().map(PollingSynchronizer::subscribe)
    }

    pub fn dismiss_error(&self) {
        if let Some(poller) = &self.poller {
            poller.dismiss_error();
        }
    }

    /// Icon shown next to an event of type `event_type`.
    #[must_use]
    pub fn event_icon(event_type: &str) -> &'static str {
        EventKind::classify(event_type).icon()
    }

    fn spawn_poller(&self) -> PollingSynchronizer<Notification> {
        let gateway = Arc::clone(&self.gateway);
        let session = self.session.clone();
        let limit = self.limit;
        PollingSynchronizer::spawn(
            PollOptions::new("notifications", self.interval),
            move || {
                let gateway = Arc::clone(&gateway);
                let session = session.clone();
                async move { gateway.list_notifications(&session, limit).await }
            },
        )
    }
}
