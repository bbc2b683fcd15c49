//! Per-instance observer registries.
//!
//! Listeners run synchronously on the thread that emits. A panicking
//! listener is logged and skipped; the remaining listeners still run.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

pub(crate) struct ListenerRegistry<T> {
    name: &'static str,
    next_id: AtomicU64,
    listeners: Mutex<BTreeMap<u64, Listener<T>>>,
}

impl<T: 'static> ListenerRegistry<T> {
    pub(crate) fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            next_id: AtomicU64::new(0),
            listeners: Mutex::new(BTreeMap::new()),
        })
    }

    pub(crate) fn subscribe<F>(self: &Arc<Self>, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(id, Arc::new(listener));

        let registry: Weak<Self> = Arc::downgrade(self);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(registry) = registry.upgrade() {
                    registry.lock().remove(&id);
                }
            })),
        }
    }

    /// Call every listener in registration order.
    pub(crate) fn emit(&self, value: &T) {
        // Snapshot first so listeners may subscribe or unsubscribe while running.
        let listeners: Vec<Listener<T>> = self.lock().values().cloned().collect();
        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(value))).is_err() {
                tracing::error!(registry = self.name, "Listener panicked; continuing");
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<u64, Listener<T>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle for one registered listener.
///
/// Dropping the handle does NOT remove the listener. Call `unsubscribe()`
/// explicitly.
#[must_use = "keep the subscription to be able to unsubscribe later"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Remove this listener only; other listeners keep running.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Tie the listener to a scope: it is removed when the guard drops,
    /// including when the owning future is cancelled.
    pub(crate) fn into_guard(mut self) -> SubscriptionGuard {
        SubscriptionGuard {
            cancel: self.cancel.take(),
        }
    }
}

/// Scoped form of [`Subscription`] for internal waits.
pub(crate) struct SubscriptionGuard {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
