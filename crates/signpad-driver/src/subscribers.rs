//! Ordered callback registry with unsubscribe tokens.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Token returned by [`SubscriberList::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(u64);

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

pub struct SubscriberList<T> {
    next_id: AtomicU64,
    entries: Mutex<Vec<(SubscriptionId, Callback<T>)>>,
}

impl<T> SubscriberList<T> {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.lock().push((id, Arc::new(callback)));
        id
    }

    /// Returns `false` if `id` was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    /// Deliver `value` to every subscriber in registration order.
    ///
    /// Callbacks run outside the registry lock, so they may subscribe or
    /// unsubscribe. Returns the number of callbacks invoked.
    pub fn publish(&self, value: &T) -> usize {
        let snapshot: Vec<Callback<T>> = self
            .entries
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in &snapshot {
            callback(value);
        }
        snapshot.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl<T> Default for SubscriberList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for SubscriberList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberList")
            .field("subscribers", &self.len())
            .finish()
    }
}
