use std::cell::RefCell;
use std::collections::BTreeMap;
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};
use tracing::{debug, warn};

use crate::error::AssetError;

type SharedLoad<T> = Shared<LocalBoxFuture<'static, Result<T, AssetError>>>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AssetState {
    Loading,
    Ready,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests served from the ready tier.
    pub hits: u64,
    /// Requests that started a load.
    pub loads: u64,
    /// Requests that joined a load already in flight.
    pub joined: u64,
    pub failures: u64,
}

struct Inner<T> {
    ready: BTreeMap<String, T>,
    in_flight: BTreeMap<String, SharedLoad<T>>,
    epoch: u64,
    stats: CacheStats,
}

/// Two-tier asset cache shared by every viewer instance.
///
/// Finished assets live in the ready tier. A first request for a key starts
/// the load and parks it in the in-flight tier, so concurrent requests for
/// the same key await one shared future instead of fetching twice.
/// Failures are handed to every waiter and then forgotten, so the next
/// request retries.
///
/// Cloning yields another handle to the same cache.
pub struct AssetCache<T> {
    inner: Rc<RefCell<Inner<T>>>,
}

impl<T> Clone for AssetCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + 'static> Default for AssetCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + 'static> AssetCache<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                ready: BTreeMap::new(),
                in_flight: BTreeMap::new(),
                epoch: 0,
                stats: CacheStats::default(),
            })),
        }
    }

    pub fn state(&self, key: &str) -> Option<AssetState> {
        let inner = self.inner.borrow();
        if inner.ready.contains_key(key) {
            Some(AssetState::Ready)
        } else if inner.in_flight.contains_key(key) {
            Some(AssetState::Loading)
        } else {
            None
        }
    }

    /// Ready value for `key`, without starting a load.
    pub fn peek(&self, key: &str) -> Option<T> {
        self.inner.borrow().ready.get(key).cloned()
    }

    pub fn ready_len(&self) -> usize {
        self.inner.borrow().ready.len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.inner.borrow().in_flight.len()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.borrow().stats
    }

    /// Drops both tiers. Loads still running complete for their waiters but
    /// are not stored.
    pub fn clear(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.ready.clear();
        inner.in_flight.clear();
        inner.epoch += 1;
    }

    /// Returns the asset for `key`, calling `load` only when neither tier has it.
    pub async fn get_or_load<F, Fut>(&self, key: &str, load: F) -> Result<T, AssetError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<T, AssetError>> + 'static,
    {
        let (shared, epoch) = {
            let mut inner = self.inner.borrow_mut();
            if let Some(value) = inner.ready.get(key).cloned() {
                inner.stats.hits += 1;
                return Ok(value);
            }
            let epoch = inner.epoch;
            match inner.in_flight.get(key).cloned() {
                Some(shared) => {
                    inner.stats.joined += 1;
                    (shared, epoch)
                }
                None => {
                    inner.stats.loads += 1;
                    debug!(key, "asset load started");
                    let shared = load(key.to_string()).boxed_local().shared();
                    inner.in_flight.insert(key.to_string(), shared.clone());
                    (shared, epoch)
                }
            }
        };

        let result = shared.clone().await;

        let mut inner = self.inner.borrow_mut();
        if inner.epoch != epoch {
            return result;
        }
        // Every waiter reaches this point; only the first one settles the tiers,
        // and never on behalf of a newer load for the same key.
        let settles = inner
            .in_flight
            .get(key)
            .is_some_and(|current| current.ptr_eq(&shared));
        if settles {
            inner.in_flight.remove(key);
            match &result {
                Ok(value) => {
                    inner.ready.insert(key.to_string(), value.clone());
                }
                Err(err) => {
                    inner.stats.failures += 1;
                    warn!(key, error = %err, "asset load failed");
                }
            }
        }
        result
    }
}

impl<T> std::fmt::Debug for AssetCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("AssetCache")
            .field("ready", &inner.ready.len())
            .field("in_flight", &inner.in_flight.len())
            .field("stats", &inner.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use futures::channel::oneshot;
    use futures::future::join;
    use std::cell::Cell;

    #[test]
    fn ready_values_are_served_without_loading() {
        let cache: AssetCache<u32> = AssetCache::new();
        let calls = Rc::new(Cell::new(0));

        for _ in 0..3 {
            let calls = Rc::clone(&calls);
            let value = pollster::block_on(cache.get_or_load("a.svg", move |_| {
                calls.set(calls.get() + 1);
                async { Ok(7) }
            }));
            assert_eq!(value, Ok(7));
        }
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.state("a.svg"), Some(AssetState::Ready));
        assert_eq!(cache.stats().hits, 2);
    }

    #[test]
    fn concurrent_first_requests_share_one_load() {
        let cache: AssetCache<u32> = AssetCache::new();
        let (tx, rx) = oneshot::channel::<u32>();
        let calls = Rc::new(Cell::new(0));

        let first = {
            let calls = Rc::clone(&calls);
            cache.get_or_load("icon", move |_| {
                calls.set(calls.get() + 1);
                async move { rx.await.map_err(|_| AssetError::Cancelled) }
            })
        };
        let second = {
            let calls = Rc::clone(&calls);
            cache.get_or_load("icon", move |_| {
                calls.set(calls.get() + 1);
                async { Ok(0) }
            })
        };
        let resolve = async move {
            let _ = tx.send(42);
        };

        let ((a, b), ()) = pollster::block_on(join(join(first, second), resolve));
        assert_eq!(a, Ok(42));
        assert_eq!(b, Ok(42));
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.stats().joined, 1);
        assert_eq!(cache.in_flight_len(), 0);
    }

    #[test]
    fn failures_are_not_cached() {
        let cache: AssetCache<u32> = AssetCache::new();
        let failed = pollster::block_on(cache.get_or_load("x", |url| async move {
            Err(AssetError::Http { url, status: 404 })
        }));
        assert!(failed.is_err());
        assert_eq!(cache.state("x"), None);

        let retried = pollster::block_on(cache.get_or_load("x", |_| async { Ok(1) }));
        assert_eq!(retried, Ok(1));
        assert_eq!(cache.stats().failures, 1);
        assert_eq!(cache.stats().loads, 2);
    }

    #[test]
    fn late_waiter_of_a_failed_load_keeps_the_retry_in_flight() {
        let cache: AssetCache<u32> = AssetCache::new();
        let (fail_tx, fail_rx) = oneshot::channel::<Result<u32, AssetError>>();
        let (retry_tx, retry_rx) = oneshot::channel::<u32>();

        let mut first = cache
            .get_or_load("k", move |_| async move {
                fail_rx.await.unwrap_or(Err(AssetError::Cancelled))
            })
            .boxed_local();
        let mut late = cache.get_or_load("k", |_| async { Ok(0) }).boxed_local();
        assert!((&mut first).now_or_never().is_none());
        assert!((&mut late).now_or_never().is_none());

        let _ = fail_tx.send(Err(AssetError::Http {
            url: "k".into(),
            status: 500,
        }));
        assert!(matches!((&mut first).now_or_never(), Some(Err(_))));
        assert_eq!(cache.in_flight_len(), 0);

        let mut retry = cache
            .get_or_load("k", move |_| async move {
                retry_rx.await.map_err(|_| AssetError::Cancelled)
            })
            .boxed_local();
        assert!((&mut retry).now_or_never().is_none());

        assert!(matches!((&mut late).now_or_never(), Some(Err(_))));
        assert_eq!(cache.state("k"), Some(AssetState::Loading));

        let _ = retry_tx.send(9);
        assert_eq!((&mut retry).now_or_never(), Some(Ok(9)));
        assert_eq!(cache.peek("k"), Some(9));
        assert_eq!(cache.stats().loads, 2);
        assert_eq!(cache.stats().failures, 1);
    }

    #[test]
    fn clear_discards_results_of_running_loads() {
        let cache: AssetCache<u32> = AssetCache::new();
        let (tx, rx) = oneshot::channel::<u32>();
        let pending = cache.get_or_load("p", move |_| async move {
            rx.await.map_err(|_| AssetError::Cancelled)
        });
        let clear_then_resolve = {
            let cache = cache.clone();
            async move {
                cache.clear();
                let _ = tx.send(5);
            }
        };
        let (value, ()) = pollster::block_on(join(pending, clear_then_resolve));
        assert_eq!(value, Ok(5));
        assert_eq!(cache.ready_len(), 0);
        assert_eq!(cache.peek("p"), None);
    }
}
