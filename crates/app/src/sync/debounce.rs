//! Debounced command dispatcher — turns a burst of intents into one write.
//!
//! Each key (e.g. one device's brightness control) owns at most one armed
//! timer, one in-flight write and one queued value:
//!
//! - `dispatch` re-arms the key's timer; only the last value of a quiet
//!   window reaches the gateway
//! - a timer that fires while a write is in flight parks its value in the
//!   queue slot (replacing any older one), which is sent as soon as the
//!   in-flight write settles
//! - every settled write is reported through the `on_settled` callback

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use homedash_domain::error::HomeDashError;
use tokio::task::JoinHandle;

/// Quiet period used by the dashboard's sliders.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

type WriteFuture<O> = Pin<Box<dyn Future<Output = Result<O, HomeDashError>> + Send>>;
type WriteFn<K, V, O> = Box<dyn Fn(K, V) -> WriteFuture<O> + Send + Sync>;
type SettledFn<K, V, O> = Box<dyn Fn(Settlement<K, V, O>) + Send + Sync>;

/// Result of one write, handed to the `on_settled` callback.
#[derive(Debug)]
pub struct Settlement<K, V, O> {
    pub key: K,
    /// The value that was sent.
    pub value: V,
    pub outcome: Result<O, HomeDashError>,
}

struct Slot<V> {
    timer: Option<JoinHandle<()>>,
    generation: u64,
    in_flight: bool,
    queued: Option<V>,
}

impl<V> Default for Slot<V> {
    fn default() -> Self {
        Self {
            timer: None,
            generation: 0,
            in_flight: false,
            queued: None,
        }
    }
}

impl<V> Slot<V> {
    fn is_idle(&self) -> bool {
        self.timer.is_none() && !self.in_flight && self.queued.is_none()
    }
}

struct Inner<K, V, O> {
    quiet: Duration,
    slots: Mutex<HashMap<K, Slot<V>>>,
    write: WriteFn<K, V, O>,
    on_settled: SettledFn<K, V, O>,
}

impl<K, V, O> Inner<K, V, O>
where
    K: Clone + Eq + Hash + Debug + Send + Sync + 'static,
    V: Clone + Debug + Send + 'static,
    O: Send + 'static,
{
    fn slots(&self) -> MutexGuard<'_, HashMap<K, Slot<V>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Timer expiry for `key`. Ignored when a newer dispatch re-armed the slot.
    fn fire(self: &Arc<Self>, key: K, generation: u64, value: V) {
        let mut slots = self.slots();
        let Some(slot) = slots.get_mut(&key) else {
            return;
        };
        if slot.generation != generation {
            return;
        }
        slot.timer = None;
        if slot.in_flight {
            tracing::debug!(?key, ?value, "write in flight, queueing");
            slot.queued = Some(value);
            return;
        }
        slot.in_flight = true;
        drop(slots);
        tokio::spawn(Arc::clone(self).send(key, value));
    }

    async fn send(self: Arc<Self>, key: K, first: V) {
        let mut value = first;
        loop {
            tracing::debug!(?key, ?value, "sending write");
            let outcome = (self.write)(key.clone(), value.clone()).await;
            if let Err(err) = &outcome {
                tracing::warn!(?key, ?value, error = %err, "write failed");
            }
            (self.on_settled)(Settlement {
                key: key.clone(),
                value,
                outcome,
            });

            match self.take_queued(&key) {
                Some(next) => value = next,
                None => return,
            }
        }
    }

    /// Pop the value queued behind the write that just settled, or mark the
    /// key idle when there is none.
    fn take_queued(&self, key: &K) -> Option<V> {
        let mut slots = self.slots();
        let slot = slots.get_mut(key)?;
        let next = slot.queued.take();
        if next.is_none() {
            slot.in_flight = false;
            if slot.is_idle() {
                slots.remove(key);
            }
        }
        next
    }
}

/// Per-key debouncer in front of an asynchronous write.
///
/// Must be used inside a tokio runtime. Dropping the dispatcher cancels
/// armed timers; writes already in flight run to completion.
pub struct DebouncedDispatcher<K, V, O>
where
    K: Clone + Eq + Hash + Debug + Send + Sync + 'static,
    V: Clone + Debug + Send + 'static,
    O: Send + 'static,
{
    inner: Arc<Inner<K, V, O>>,
}

impl<K, V, O> DebouncedDispatcher<K, V, O>
where
    K: Clone + Eq + Hash + Debug + Send + Sync + 'static,
    V: Clone + Debug + Send + 'static,
    O: Send + 'static,
{
    /// Create a dispatcher sending through `write` after `quiet` without new
    /// input, reporting each result to `on_settled`.
    pub fn new<W, Fut, S>(quiet: Duration, write: W, on_settled: S) -> Self
    where
        W: Fn(K, V) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, HomeDashError>> + Send + 'static,
        S: Fn(Settlement<K, V, O>) + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                quiet,
                slots: Mutex::new(HashMap::new()),
                write: Box::new(move |key: K, value: V| -> WriteFuture<O> {
                    Box::pin(write(key, value))
                }),
                on_settled: Box::new(on_settled),
            }),
        }
    }

    /// Schedule `value` for `key`, superseding any value still waiting for
    /// its quiet period.
    pub fn dispatch(&self, key: K, value: V) {
        let mut slots = self.inner.slots();
        let slot = slots.entry(key.clone()).or_default();
        if let Some(timer) = slot.timer.take() {
            timer.abort();
        }
        slot.generation += 1;
        let generation = slot.generation;
        let inner = Arc::clone(&self.inner);
        let quiet = self.inner.quiet;
        slot.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(quiet).await;
            inner.fire(key, generation, value);
        }));
    }

    /// `true` while a write for `key` is in flight.
    #[must_use]
    pub fn is_busy(&self, key: &K) -> bool {
        self.inner
            .slots()
            .get(key)
            .is_some_and(|slot| slot.in_flight)
    }

    /// `true` while anything for `key` is armed, queued or in flight.
    #[must_use]
    pub fn has_pending(&self, key: &K) -> bool {
        self.inner
            .slots()
            .get(key)
            .is_some_and(|slot| !slot.is_idle())
    }

    /// Abort every armed timer and drop queued values.
    pub fn cancel_all(&self) {
        let mut slots = self.inner.slots();
        for slot in slots.values_mut() {
            if let Some(timer) = slot.timer.take() {
                timer.abort();
            }
            slot.queued = None;
        }
        slots.retain(|_, slot| slot.in_flight);
    }
}

impl<K, V, O> Drop for DebouncedDispatcher<K, V, O>
where
    K: Clone + Eq + Hash + Debug + Send + Sync + 'static,
    V: Clone + Debug + Send + 'static,
    O: Send + 'static,
{
    fn drop(&mut self) {
        self.cancel_all();
    }
}
