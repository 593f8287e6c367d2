//! Multi-subscriber publish/subscribe channel.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Handle returned by [`Observable::add`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Fan-out event stream.
///
/// Notification runs over a snapshot of the subscriber list, so callbacks may
/// add or remove observers (including themselves) while being notified.
pub struct Observable<T> {
    observers: Mutex<Vec<(ObserverId, Callback<T>)>>,
    next_id: AtomicU64,
}

impl<T> Observable<T> {
    /// Create a stream with no subscribers.
    pub fn new() -> Self {
        Self {
            observers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Subscribe `callback`.
    pub fn add(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(callback)));
        id
    }

    /// Unsubscribe. Returns false if `id` was not subscribed.
    pub fn remove(&self, id: ObserverId) -> bool {
        let mut observers = self.lock();
        let before = observers.len();
        observers.retain(|(observer, _)| *observer != id);
        observers.len() != before
    }

    /// Deliver `value` to every subscriber. Returns how many were called.
    pub fn notify(&self, value: &T) -> usize {
        let snapshot: Vec<Callback<T>> = self.lock().iter().map(|(_, cb)| Arc::clone(cb)).collect();
        for callback in &snapshot {
            callback(value);
        }
        snapshot.len()
    }

    /// Remove every subscriber.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of subscribers.
    pub fn observer_count(&self) -> usize {
        self.lock().len()
    }

    /// Returns true when at least one subscriber is registered.
    pub fn has_observers(&self) -> bool {
        self.observer_count() > 0
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(ObserverId, Callback<T>)>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for Observable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("observers", &self.observer_count())
            .finish()
    }
}
