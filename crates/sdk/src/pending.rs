//! Correlation tables for in-flight actions and screenshot requests.
//!
//! Each entry is a one-shot sender keyed by its correlation id. An entry is
//! settled at most once: by its response, by its waiter giving up, or by a
//! flush when the connection drops.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;

use crate::error::SdkError;

type Outcome<T> = Result<T, SdkError>;

pub(crate) struct PendingTable<T> {
    name: &'static str,
    inner: Mutex<HashMap<String, oneshot::Sender<Outcome<T>>>>,
}

impl<T> PendingTable<T> {
    pub(crate) fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            inner: Mutex::new(HashMap::new()),
        })
    }

    /// Register `id` and return the guard its caller awaits on.
    pub(crate) fn register(self: &Arc<Self>, id: String) -> PendingGuard<T> {
        let (tx, rx) = oneshot::channel();
        self.lock().insert(id.clone(), tx);
        PendingGuard {
            id,
            rx,
            table: Arc::clone(self),
        }
    }

    /// Settle and remove an entry.
    ///
    /// Returns false if no entry exists for this id (e.g. it already timed out).
    pub(crate) fn resolve(&self, id: &str, outcome: Outcome<T>) -> bool {
        let Some(tx) = self.lock().remove(id) else {
            tracing::debug!(
                table = self.name,
                id = %id,
                "Response for unknown id - request may have timed out"
            );
            return false;
        };
        let _ = tx.send(outcome);
        true
    }

    /// Settle the only outstanding entry. Does nothing when zero or several
    /// entries are outstanding.
    pub(crate) fn resolve_sole(&self, outcome: Outcome<T>) -> bool {
        let tx = {
            let mut inner = self.lock();
            if inner.len() != 1 {
                return false;
            }
            let Some(id) = inner.keys().next().cloned() else {
                return false;
            };
            inner.remove(&id)
        };
        match tx {
            Some(tx) => {
                let _ = tx.send(outcome);
                true
            }
            None => false,
        }
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    pub(crate) fn remove(&self, id: &str) -> bool {
        self.lock().remove(id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, oneshot::Sender<Outcome<T>>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fail every outstanding entry with `error`; returns how many there were.
    pub(crate) fn fail_all(&self, error: &SdkError) -> usize {
        let drained: Vec<_> = self.lock().drain().collect();
        let count = drained.len();
        for (_, tx) in drained {
            let _ = tx.send(Err(error.clone()));
        }
        if count > 0 {
            tracing::debug!(table = self.name, count, "Failed pending entries");
        }
        count
    }
}

/// Waiter side of one pending entry. Dropping it removes the entry.
pub(crate) struct PendingGuard<T> {
    id: String,
    rx: oneshot::Receiver<Outcome<T>>,
    table: Arc<PendingTable<T>>,
}

impl<T> PendingGuard<T> {
    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    /// Wait for the entry to be settled, or fail with `on_timeout`.
    pub(crate) async fn wait(mut self, timeout: Duration, on_timeout: SdkError) -> Outcome<T> {
        match tokio::time::timeout(timeout, &mut self.rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(SdkError::ConnectionClosed),
            Err(_) => {
                tracing::debug!(
                    table = self.table.name,
                    id = %self.id,
                    timeout_ms = timeout.as_millis() as u64,
                    "Request timed out - removing pending entry"
                );
                Err(on_timeout)
            }
        }
    }
}

impl<T> Drop for PendingGuard<T> {
    fn drop(&mut self) {
        self.table.remove(&self.id);
    }
}
