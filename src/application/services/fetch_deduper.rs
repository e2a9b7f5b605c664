//! Coalesces concurrent duplicate requests by logical key.
//!
//! Each key moves through `Idle -> InFlight -> settled -> Idle`. While a key is
//! in flight, further callers join the pending result instead of starting a new
//! operation. Settled results are not cached: the next call after settlement
//! performs a fresh operation.
//!
//! Operations run on their own task, so a key settles and leaves the in-flight
//! map even when every caller has gone away.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, trace};

use super::error_classifier::classify_failure;
use crate::domain::entities::RequestKey;
use crate::domain::errors::{ClassifiedError, RawFailure};

type SharedOutcome<T> = Shared<BoxFuture<'static, Result<T, ClassifiedError>>>;

struct InFlight<T> {
    id: u64,
    outcome: SharedOutcome<T>,
}

/// Single-flight executor keyed by [`RequestKey`].
pub struct FetchDeduper<T> {
    in_flight: Arc<Mutex<HashMap<RequestKey, InFlight<T>>>>,
    next_id: Arc<AtomicU64>,
}

impl<T> Clone for FetchDeduper<T> {
    fn clone(&self) -> Self {
        Self {
            in_flight: Arc::clone(&self.in_flight),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl<T> Default for FetchDeduper<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::create()
    }
}

impl<T> FetchDeduper<T>
where
    T: Clone + Send + Sync + 'static,
{
    #[must_use]
    pub fn create() -> Self {
        Self {
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Runs `operation` unless the same key is already in flight, in which case
    /// the pending result is shared.
    ///
    /// Dropping the returned future stops consuming the result but leaves the
    /// operation alive for other callers.
    ///
    /// # Errors
    /// Returns the operation's error, shared with every joined caller.
    pub async fn run<F, Fut>(&self, key: RequestKey, operation: F) -> Result<T, ClassifiedError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClassifiedError>> + Send + 'static,
    {
        if let Some(outcome) = self.joinable(&key) {
            debug!(key = %key, "Joining in-flight request");
            return outcome.await;
        }

        let pending = operation();
        let outcome = self.register(key, pending);
        outcome.await
    }

    /// Like [`run`](Self::run), but marks `key` as the caller's current key and
    /// returns `None` when a newer key replaced it before the result arrived.
    ///
    /// # Errors
    /// Returns the operation's error when the key is still current.
    pub async fn run_latest<F, Fut>(
        &self,
        current: &CurrentKey,
        key: RequestKey,
        operation: F,
    ) -> Option<Result<T, ClassifiedError>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClassifiedError>> + Send + 'static,
    {
        current.set(key.clone());
        let result = self.run(key.clone(), operation).await;

        if current.is_current(&key) {
            Some(result)
        } else {
            debug!(key = %key, "Discarding result for stale key");
            None
        }
    }

    /// Returns whether `key` has an operation in flight.
    #[must_use]
    pub fn is_in_flight(&self, key: &RequestKey) -> bool {
        self.in_flight.lock().contains_key(key)
    }

    #[must_use]
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().len()
    }

    /// Forgets every in-flight entry. Running operations finish for their
    /// current callers; new callers start fresh ones.
    pub fn dispose(&self) {
        self.in_flight.lock().clear();
    }

    fn joinable(&self, key: &RequestKey) -> Option<SharedOutcome<T>> {
        self.in_flight
            .lock()
            .get(key)
            .map(|entry| entry.outcome.clone())
    }

    fn register<Fut>(&self, key: RequestKey, pending: Fut) -> SharedOutcome<T>
    where
        Fut: Future<Output = Result<T, ClassifiedError>> + Send + 'static,
    {
        let mut in_flight = self.in_flight.lock();
        if let Some(existing) = in_flight.get(&key) {
            return existing.outcome.clone();
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let registry = Arc::clone(&self.in_flight);
        let settle_key = key.clone();

        let task = tokio::spawn(async move {
            let result = pending.await;
            {
                let mut in_flight = registry.lock();
                if in_flight
                    .get(&settle_key)
                    .is_some_and(|entry| entry.id == id)
                {
                    in_flight.remove(&settle_key);
                }
            }
            trace!(key = %settle_key, ok = result.is_ok(), "Request settled");
            result
        });

        let outcome = async move {
            task.await.unwrap_or_else(|e| {
                Err(classify_failure(RawFailure::application(format!(
                    "request task failed: {e}"
                ))))
            })
        }
        .boxed()
        .shared();

        in_flight.insert(
            key,
            InFlight {
                id,
                outcome: outcome.clone(),
            },
        );
        outcome
    }
}

/// The key a caller currently wants results for.
///
/// Capture the key when issuing a request and compare it with
/// [`is_current`](Self::is_current) before applying the result.
#[derive(Debug, Clone, Default)]
pub struct CurrentKey {
    key: Arc<RwLock<Option<RequestKey>>>,
}

impl CurrentKey {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: RequestKey) {
        *self.key.write() = Some(key);
    }

    #[must_use]
    pub fn get(&self) -> Option<RequestKey> {
        self.key.read().clone()
    }

    #[must_use]
    pub fn is_current(&self, key: &RequestKey) -> bool {
        self.key.read().as_ref() == Some(key)
    }
}
