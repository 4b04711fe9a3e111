//! Read-Through Wrapper Module
//!
//! Composes the key space and the store into the one entry point external
//! callers use: ask for a key, and on a miss the supplied fetch function is
//! invoked, its result cached, and the value returned along with a flag
//! telling whether it came from cache.
//!
//! Concurrent misses for the same key are de-duplicated: a per-key guard
//! ensures at most one fetch is in flight, and callers that lose the race
//! re-read the cache once the winner has populated it. A failed fetch is
//! reported only to the caller that ran it; waiters then fetch themselves
//! in turn.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::cache::{CacheStats, CacheStore, Ttl};

// == Shared Cache Alias ==
/// Thread-safe handle to a [`CacheStore`] shared across concurrent tasks.
pub type SharedCache<V> = Arc<RwLock<CacheStore<V>>>;

// == Read-Through Wrapper ==
/// Read-through front for a shared [`CacheStore`].
pub struct ReadThrough<V> {
    store: SharedCache<V>,
    /// Per-key guards serializing the miss path (single-flight)
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<V: Clone> ReadThrough<V> {
    // == Constructor ==
    /// Wraps an existing shared store.
    pub fn new(store: SharedCache<V>) -> Self {
        Self {
            store,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the underlying shared store handle.
    pub fn store(&self) -> &SharedCache<V> {
        &self.store
    }

    // == Get Or Populate ==
    /// Returns the cached value for `key`, or invokes `fetch` to produce,
    /// cache, and return it.
    ///
    /// The boolean in the result is `true` when the value was served from
    /// cache. A fetch failure is propagated unchanged and leaves the store
    /// untouched for `key`. A successful fetch is cached even when the
    /// fetched value is application-level "empty" (e.g. an empty page of
    /// results); absence is signalled only by the store's own miss, never
    /// by inspecting the value.
    ///
    /// No store lock is held while `fetch` runs.
    pub async fn get_or_populate<F, Fut, E>(
        &self,
        key: &str,
        ttl: Ttl,
        fetch: F,
    ) -> Result<(V, bool), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.store.write().await.get(key) {
            debug!("Cache HIT: {}", key);
            return Ok((value, true));
        }

        // Miss path: serialize fetches for this key
        let guard_lock = {
            let mut inflight = self.inflight.lock().await;
            inflight
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _guard = guard_lock.lock().await;

        // Lost the race: the winning fetch already populated the store
        if let Some(value) = self.store.write().await.get(key) {
            debug!("Cache HIT after wait: {}", key);
            self.release_guard(key, &guard_lock).await;
            return Ok((value, true));
        }

        debug!("Cache MISS: {}", key);
        let result = fetch().await;

        match result {
            Ok(value) => {
                self.store.write().await.set(key, value.clone(), ttl);
                self.release_guard(key, &guard_lock).await;
                Ok((value, false))
            }
            Err(err) => {
                self.release_guard(key, &guard_lock).await;
                Err(err)
            }
        }
    }

    /// Drops the per-key guard once no other caller is waiting on it.
    ///
    /// A guard still shared with waiting callers stays in the map so they
    /// keep serializing among themselves; the last one out removes it.
    async fn release_guard(&self, key: &str, guard_lock: &Arc<Mutex<()>>) {
        let mut inflight = self.inflight.lock().await;
        if let Some(current) = inflight.get(key) {
            // map + our clone = 2 strong refs when nobody else waits
            if Arc::ptr_eq(current, guard_lock) && Arc::strong_count(guard_lock) <= 2 {
                inflight.remove(key);
            }
        }
    }

    // == Invalidation Passthroughs ==
    /// Removes a single key; returns the number of entries removed (0 or 1).
    pub async fn invalidate(&self, key: &str) -> usize {
        self.store.write().await.delete(key)
    }

    /// Removes every key containing `pattern` as a literal substring.
    ///
    /// Used to bulk-invalidate an entity family after a write, e.g.
    /// `invalidate_pattern("lessons")` after a lesson mutation.
    pub async fn invalidate_pattern(&self, pattern: &str) -> usize {
        let removed = self.store.write().await.delete_by_pattern(pattern);
        if removed > 0 {
            info!("Cache invalidated: {} keys matching {:?}", removed, pattern);
        }
        removed
    }

    /// Removes all entries unconditionally.
    pub async fn clear_all(&self) {
        self.store.write().await.clear();
    }

    /// Returns cumulative store statistics.
    pub async fn stats(&self) -> CacheStats {
        self.store.read().await.stats()
    }
}
