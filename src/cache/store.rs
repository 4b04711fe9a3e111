//! Cache Store Module
//!
//! Main cache engine: a HashMap keyed by string with per-entry TTL expiry.
//! There is no capacity limit and no eviction policy; entries leave the
//! store only through explicit deletes, pattern invalidation, clear, or TTL
//! expiry. Expiry is checked lazily on every read, so correctness never
//! depends on the background sweep having run.

use std::collections::HashMap;
use std::sync::Arc;

use crate::cache::{CacheEntry, CacheObserver, CacheStats, Ttl};

// == Cache Store ==
/// In-memory TTL store mapping string keys to values of type `V`.
///
/// The store owns its entries exclusively; shared use goes through
/// `Arc<RwLock<CacheStore<V>>>` (see [`SharedCache`](super::SharedCache)).
/// `get` takes `&mut self` because reads update statistics and purge
/// lazily-discovered expired entries.
pub struct CacheStore<V> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Performance statistics
    stats: CacheStats,
    /// Default TTL in seconds for entries set with `Ttl::Default`
    default_ttl: u64,
    /// Mutation observer, notified synchronously after each change
    observer: Option<Arc<dyn CacheObserver>>,
}

impl<V> std::fmt::Debug for CacheStore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("key_count", &self.entries.len())
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

impl<V: Clone> CacheStore<V> {
    // == Constructors ==
    /// Creates a new CacheStore with the given default TTL in seconds.
    pub fn new(default_ttl: u64) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            default_ttl,
            observer: None,
        }
    }

    /// Creates a new CacheStore that notifies `observer` on every mutation.
    pub fn with_observer(default_ttl: u64, observer: Arc<dyn CacheObserver>) -> Self {
        Self {
            observer: Some(observer),
            ..Self::new(default_ttl)
        }
    }

    fn resolve_ttl(&self, ttl: Ttl) -> Option<u64> {
        match ttl {
            Ttl::Default | Ttl::Seconds(0) => Some(self.default_ttl),
            Ttl::Seconds(secs) => Some(secs),
            Ttl::Never => None,
        }
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Returns `None` if the key is missing or its entry has expired. An
    /// entry discovered expired here is purged immediately and reported via
    /// `on_expired`, so expired values are never returned even if the sweep
    /// has not run yet.
    pub fn get(&mut self, key: &str) -> Option<V> {
        match self.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                self.entries.remove(key);
                self.stats.record_expired();
                self.stats.record_miss();
                self.stats.set_key_count(self.entries.len());
                if let Some(obs) = &self.observer {
                    obs.on_expired(key);
                }
                None
            }
            Some(entry) => {
                self.stats.record_hit();
                Some(entry.value.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Stores a key-value pair with the given TTL.
    ///
    /// If the key already exists, the value is overwritten and the TTL is
    /// reset. `Ttl::Default` and `Ttl::Seconds(0)` resolve to the store's
    /// default TTL; `Ttl::Never` disables expiry for this entry.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Ttl) {
        let key = key.into();
        let entry = CacheEntry::new(value, self.resolve_ttl(ttl));
        self.entries.insert(key.clone(), entry);

        self.stats.record_set();
        self.stats.set_key_count(self.entries.len());
        if let Some(obs) = &self.observer {
            obs.on_set(&key);
        }
    }

    // == Delete ==
    /// Removes an entry by key.
    ///
    /// Returns the number of entries removed (0 or 1).
    pub fn delete(&mut self, key: &str) -> usize {
        if self.entries.remove(key).is_some() {
            self.stats.record_delete();
            self.stats.set_key_count(self.entries.len());
            if let Some(obs) = &self.observer {
                obs.on_delete(key);
            }
            1
        } else {
            0
        }
    }

    // == Delete By Pattern ==
    /// Removes every entry whose key contains `pattern` as a literal
    /// substring (not a glob or regex).
    ///
    /// Returns the number of entries removed. The key list is snapshotted
    /// before mutating so no entry is skipped mid-iteration.
    pub fn delete_by_pattern(&mut self, pattern: &str) -> usize {
        let matching: Vec<String> = self
            .entries
            .keys()
            .filter(|key| key.contains(pattern))
            .cloned()
            .collect();

        for key in &matching {
            self.entries.remove(key);
            self.stats.record_delete();
            if let Some(obs) = &self.observer {
                obs.on_delete(key);
            }
        }

        self.stats.set_key_count(self.entries.len());
        matching.len()
    }

    // == Clear ==
    /// Removes all entries unconditionally. A no-op on an empty store.
    pub fn clear(&mut self) {
        let removed = self.entries.len();
        self.entries.clear();
        self.stats.set_key_count(0);
        if let Some(obs) = &self.observer {
            obs.on_clear(removed);
        }
    }

    // == Keys ==
    /// Returns all non-expired keys at the instant of the call.
    ///
    /// Expired entries discovered while enumerating are purged, the same as
    /// a lazy `get` would do.
    pub fn keys(&mut self) -> Vec<String> {
        self.purge_expired();
        self.entries.keys().cloned().collect()
    }

    // == TTL Remaining ==
    /// Returns the remaining TTL in seconds for a live entry.
    ///
    /// # Returns
    /// - `None` if the key is missing or expired
    /// - `Some(None)` if the entry never expires
    /// - `Some(Some(secs))` for an entry with time left
    pub fn ttl_remaining(&mut self, key: &str) -> Option<Option<u64>> {
        match self.entries.get(key) {
            Some(entry) if entry.is_expired() => {
                self.entries.remove(key);
                self.stats.record_expired();
                self.stats.set_key_count(self.entries.len());
                if let Some(obs) = &self.observer {
                    obs.on_expired(key);
                }
                None
            }
            Some(entry) => Some(entry.ttl_remaining()),
            None => None,
        }
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_key_count(self.entries.len());
        stats
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Called by the background sweep task; returns the number of entries
    /// removed.
    pub fn cleanup_expired(&mut self) -> usize {
        self.purge_expired()
    }

    fn purge_expired(&mut self) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.entries.remove(key);
            self.stats.record_expired();
            if let Some(obs) = &self.observer {
                obs.on_expired(key);
            }
        }

        self.stats.set_key_count(self.entries.len());
        expired_keys.len()
    }

    // == Length ==
    /// Returns the current number of entries, expired-but-unpurged included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
