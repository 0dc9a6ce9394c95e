//! Polling synchronizer — keeps a [`Resource`] in step with the server.
//!
//! A ticker task fires on a fixed-rate schedule (measured from the start of
//! each poll, not its end) and spawns one poll per tick, so a slow fetch
//! never delays the next one. Every issued poll gets a sequence number;
//! results are applied according to the configured [`StalenessPolicy`].
//!
//! Tearing the synchronizer down (explicitly or by dropping it) stops the
//! ticker and turns every result still in flight into a no-op: the data is
//! left untouched and only the loading count settles.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use homedash_domain::error::HomeDashError;
use homedash_domain::time;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::WatchStream;

use super::resource::Resource;

type FetchFuture<T> = Pin<Box<dyn Future<Output = Result<Vec<T>, HomeDashError>> + Send>>;
type FetchFn<T> = Arc<dyn Fn() -> FetchFuture<T> + Send + Sync>;
type MergeFn<T> = Box<dyn Fn(&[T], Vec<T>) -> Vec<T> + Send + Sync>;

/// Shortest period handed to the ticker; tokio intervals reject zero.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// How results of overlapping polls are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StalenessPolicy {
    /// Apply every result as it completes; the last one to arrive wins,
    /// even if it was issued earlier.
    #[default]
    ApplyInCompletionOrder,
    /// Discard a result issued before the one currently shown.
    RejectStale,
}

/// Settings for one synchronizer.
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Name used in logs (`devices`, `tasks`, ...).
    pub name: &'static str,
    pub interval: Duration,
    pub policy: StalenessPolicy,
    /// Banner text used when a failure carries no detail.
    pub fallback_error: String,
}

impl PollOptions {
    #[must_use]
    pub fn new(name: &'static str, interval: Duration) -> Self {
        Self {
            name,
            interval,
            policy: StalenessPolicy::default(),
            fallback_error: format!("Failed to fetch {name}"),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: StalenessPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_fallback_error(mut self, message: impl Into<String>) -> Self {
        self.fallback_error = message.into();
        self
    }
}

struct Shared<T> {
    state: watch::Sender<Resource<T>>,
    fetch: FetchFn<T>,
    merge: Option<MergeFn<T>>,
    next_seq: AtomicU64,
    closed: AtomicBool,
    options: PollOptions,
}

impl<T> Shared<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn poll(self: Arc<Self>) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        let seq = self.next_seq.fetch_add(1, Ordering::AcqRel) + 1;
        self.state.send_modify(Resource::begin);

        let result = (self.fetch)().await;

        if self.closed.load(Ordering::Acquire) {
            tracing::debug!(resource = self.options.name, seq, "discarding result after teardown");
            self.state.send_modify(Resource::settle);
            return;
        }
        let policy = self.options.policy;
        self.state.send_modify(|resource| {
            if policy == StalenessPolicy::RejectStale && seq < resource.applied_seq() {
                tracing::debug!(
                    resource = self.options.name,
                    seq,
                    applied = resource.applied_seq(),
                    "discarding stale result"
                );
                resource.settle();
                return;
            }
            match result {
                Ok(items) => {
                    tracing::trace!(resource = self.options.name, seq, count = items.len(), "applied");
                    let items = match &self.merge {
                        Some(merge) => merge(resource.items(), items),
                        None => items,
                    };
                    resource.apply_success(seq, items, time::now());
                }
                Err(err) => {
                    tracing::warn!(resource = self.options.name, seq, error = %err, "poll failed");
                    resource.apply_failure(err.display_message(&self.options.fallback_error));
                }
            }
        });
    }
}

/// Periodically fetches a collection and publishes it as a [`Resource`].
///
/// Must be created inside a tokio runtime.
pub struct PollingSynchronizer<T> {
    shared: Arc<Shared<T>>,
    ticker: JoinHandle<()>,
}

impl<T> PollingSynchronizer<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Start polling: the first fetch is issued immediately, then one every
    /// `options.interval`.
    pub fn spawn<F, Fut>(options: PollOptions, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<T>, HomeDashError>> + Send + 'static,
    {
        Self::start(options, fetch, None)
    }

    /// Like [`spawn`](Self::spawn), but every successful result goes through
    /// `merge(current_items, fetched_items)` right before it is applied.
    /// Discarded results never reach `merge`.
    pub fn spawn_merged<F, Fut, M>(options: PollOptions, fetch: F, merge: M) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<T>, HomeDashError>> + Send + 'static,
        M: Fn(&[T], Vec<T>) -> Vec<T> + Send + Sync + 'static,
    {
        Self::start(options, fetch, Some(Box::new(merge)))
    }

    fn start<F, Fut>(options: PollOptions, fetch: F, merge: Option<MergeFn<T>>) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<T>, HomeDashError>> + Send + 'static,
    {
        let fetch: FetchFn<T> = Arc::new(move || -> FetchFuture<T> { Box::pin(fetch()) });
        let (state, _) = watch::channel(Resource::default());
        let period = options.interval.max(MIN_INTERVAL);
        let shared = Arc::new(Shared {
            state,
            fetch,
            merge,
            next_seq: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            options,
        });

        let ticker = tokio::spawn({
            let shared = Arc::clone(&shared);
            async move {
                let mut interval = tokio::time::interval(period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    interval.tick().await;
                    tokio::spawn(Arc::clone(&shared).poll());
                }
            }
        });
        tracing::debug!(resource = shared.options.name, ?period, "synchronizer mounted");

        Self { shared, ticker }
    }

    /// Fetch now and wait for the result to be applied. The periodic
    /// schedule keeps its phase.
    pub async fn refetch(&self) {
        Arc::clone(&self.shared).poll().await;
    }

    /// Like [`refetch`](Self::refetch), without waiting.
    pub fn spawn_refetch(&self) {
        tokio::spawn(Arc::clone(&self.shared).poll());
    }

    /// Clone of the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Resource<T> {
        self.shared.state.borrow().clone()
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.shared.state.borrow().revision()
    }

    /// Receiver notified on every change of the snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Resource<T>> {
        self.shared.state.subscribe()
    }

    /// Stream of snapshots, starting with the current one.
    #[must_use]
    pub fn updates(&self) -> WatchStream<Resource<T>> {
        WatchStream::new(self.subscribe())
    }

    pub fn dismiss_error(&self) {
        self.shared.state.send_modify(Resource::dismiss_error);
    }

    /// Show `message` in this resource's error banner.
    pub fn report_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.shared
            .state
            .send_modify(|resource| resource.report_error(message));
    }

    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Stop polling. Results still in flight are discarded. Idempotent.
    pub fn shutdown(&self) {
        if !self.shared.closed.swap(true, Ordering::AcqRel) {
            self.ticker.abort();
            tracing::debug!(resource = self.shared.options.name, "synchronizer torn down");
        }
    }
}

impl<T> Drop for PollingSynchronizer<T> {
    fn drop(&mut self) {
        self.shared.closed.store(true, Ordering::Release);
        self.ticker.abort();
    }
}
