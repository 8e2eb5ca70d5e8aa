//! TTL memoization of completed searches with single-flight semantics.
//!
//! Concurrent callers for the same [`SearchRequest`] share one upstream
//! pipeline execution: the first caller installs a shared future, later
//! callers await it, and everyone observes the same outcome, success or
//! failure. Successes are kept until the TTL elapses; failures are shared
//! only with the callers that were already waiting and are never memoized.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;
use tokio::time::Instant;

use asearch_core::{ProductRecord, SearchRequest};

use crate::error::SearchError;

/// Outcome shared between concurrent callers of one in-flight search.
pub type SharedOutcome = Result<Arc<Vec<ProductRecord>>, Arc<SearchError>>;

type InFlight = Shared<BoxFuture<'static, SharedOutcome>>;

enum CacheEntry {
    Ready {
        at: Instant,
        records: Arc<Vec<ProductRecord>>,
    },
    InFlight(InFlight),
}

/// In-memory, process-lifetime request cache keyed by [`SearchRequest`].
pub struct SearchCache {
    ttl: Duration,
    entries: Arc<Mutex<HashMap<SearchRequest, CacheEntry>>>,
}

impl SearchCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the cached result for `request`, or runs `compute` exactly
    /// once to produce it.
    ///
    /// A `Ready` entry younger than the TTL is returned as-is. Otherwise
    /// the caller either joins an in-flight computation or starts one; the
    /// computation itself writes the entry back on completion (success) or
    /// clears it (failure), so a fresh request after a failure recomputes.
    ///
    /// # Errors
    ///
    /// Propagates the pipeline failure, wrapped in `Arc` so every waiter
    /// of the same execution receives it.
    pub async fn get_or_compute<F>(&self, request: SearchRequest, compute: F) -> SharedOutcome
    where
        F: Future<Output = Result<Vec<ProductRecord>, SearchError>> + Send + 'static,
    {
        let shared = {
            let mut entries = self.entries.lock().await;
            match entries.get(&request) {
                Some(CacheEntry::Ready { at, records }) if at.elapsed() < self.ttl => {
                    return Ok(Arc::clone(records));
                }
                Some(CacheEntry::InFlight(shared)) => shared.clone(),
                _ => {
                    let map = Arc::clone(&self.entries);
                    let key = request.clone();
                    let shared: InFlight = async move {
                        let outcome: SharedOutcome = match compute.await {
                            Ok(records) => Ok(Arc::new(records)),
                            Err(e) => Err(Arc::new(e)),
                        };
                        let mut entries = map.lock().await;
                        match &outcome {
                            Ok(records) => {
                                entries.insert(
                                    key,
                                    CacheEntry::Ready {
                                        at: Instant::now(),
                                        records: Arc::clone(records),
                                    },
                                );
                            }
                            Err(_) => {
                                entries.remove(&key);
                            }
                        }
                        outcome
                    }
                    .boxed()
                    .shared();
                    entries.insert(request, CacheEntry::InFlight(shared.clone()));
                    shared
                }
            }
        };

        shared.await
    }
}

#[cfg(test)]
#[path = "cache_test.rs"]
mod tests;
