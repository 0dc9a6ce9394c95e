//! Resource — the client's view of one remote collection.

use homedash_domain::time::Timestamp;

/// Latest known state of a remote collection, plus its fetch status.
///
/// `items` are kept in server order and only ever replaced wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource<T> {
    items: Vec<T>,
    in_flight: usize,
    last_error: Option<String>,
    last_synced_at: Option<Timestamp>,
    revision: u64,
    applied_seq: u64,
}

impl<T> Default for Resource<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            in_flight: 0,
            last_error: None,
            last_synced_at: None,
            revision: 0,
            applied_seq: 0,
        }
    }
}

impl<T> Resource<T> {
    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// `true` between issuing a fetch and receiving its settlement.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Message for the error banner, if the last settlement failed.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[must_use]
    pub fn last_synced_at(&self) -> Option<Timestamp> {
        self.last_synced_at
    }

    /// Number of successful applies so far. Starts at 0 before the first one.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Sequence number of the poll whose result is currently shown.
    #[must_use]
    pub fn applied_seq(&self) -> u64 {
        self.applied_seq
    }

    pub(crate) fn begin(&mut self) {
        self.in_flight += 1;
    }

    /// Settle a fetch without touching the data (discarded result).
    pub(crate) fn settle(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    pub(crate) fn apply_success(&mut self, seq: u64, items: Vec<T>, at: Timestamp) {
        self.settle();
        self.items = items;
        self.last_error = None;
        self.last_synced_at = Some(at);
        self.revision += 1;
        self.applied_seq = seq;
    }

    pub(crate) fn apply_failure(&mut self, message: String) {
        self.settle();
        self.last_error = Some(message);
    }

    /// Clear the error banner.
    pub fn dismiss_error(&mut self) {
        self.last_error = None;
    }

    /// Surface a failure that did not come from fetching (e.g. a rejected
    /// write) in the same banner.
    pub fn report_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }
}
