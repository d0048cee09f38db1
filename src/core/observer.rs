use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::core::state::FetchState;

/// Identifies one registered observer for later removal.
pub type SubscriptionId = u64;

/// Notification that the provider's state moved from `old` to `new`.
#[derive(Debug, Clone)]
pub struct StateChange {
    pub old: FetchState,
    pub new: FetchState,
}

/// Notification that the content snapshot was replaced.
///
/// Carries no item-level diff; consumers re-read the snapshot through
/// the provider's accessors.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentChange;

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Multi-subscriber callback list.
///
/// Dispatch clones the current subscriber list before invoking anyone,
/// so handlers may subscribe or unsubscribe (including themselves) while
/// a notification is being delivered. A removal takes effect from the
/// next dispatch onward.
pub struct Subscribers<E: 'static> {
    entries: Mutex<Vec<(SubscriptionId, Callback<E>)>>,
    next_id: AtomicU64,
}

impl<E> Subscribers<E> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self, callback: impl Fn(&E) + Send + Sync + 'static) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().push((id, Arc::new(callback)));
        id
    }

    /// Returns false when the id was already removed or never existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    pub fn notify(&self, event: &E) {
        let callbacks: Vec<Callback<E>> = self
            .entries
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in callbacks {
            callback(event);
        }
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.entries.lock().len()
    }
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self::new()
    }
}
