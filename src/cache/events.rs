//! Cache Events Module
//!
//! Observer interface invoked synchronously after each store mutation.
//! Keeps the store decoupled from any specific logging mechanism: the
//! default `TracingObserver` forwards events to `tracing`, while tests can
//! plug in recording observers.

use tracing::{debug, info};

// == Observer Trait ==
/// Callbacks fired by [`CacheStore`](super::CacheStore) after mutations.
///
/// All methods default to no-ops so implementors only override the events
/// they care about. Callbacks run synchronously under the store's lock and
/// must not block.
pub trait CacheObserver: Send + Sync {
    /// An entry was inserted or overwritten.
    fn on_set(&self, _key: &str) {}

    /// An entry was removed by explicit delete or pattern invalidation.
    fn on_delete(&self, _key: &str) {}

    /// An entry was purged because its TTL elapsed.
    fn on_expired(&self, _key: &str) {}

    /// The store was cleared; `removed` is the number of entries dropped.
    fn on_clear(&self, _removed: usize) {}
}

// == Tracing Observer ==
/// Default observer that emits tracing events for every mutation.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl CacheObserver for TracingObserver {
    fn on_set(&self, key: &str) {
        debug!("Cache SET: {}", key);
    }

    fn on_delete(&self, key: &str) {
        debug!("Cache DELETE: {}", key);
    }

    fn on_expired(&self, key: &str) {
        debug!("Cache EXPIRED: {}", key);
    }

    fn on_clear(&self, removed: usize) {
        info!("Cache cleared: {} keys removed", removed);
    }
}
