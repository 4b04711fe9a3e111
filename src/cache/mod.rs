//! Cache Module
//!
//! Provides in-memory read-through caching with TTL expiration, substring
//! pattern invalidation, and mutation observer hooks.

mod entry;
mod events;
mod key;
mod read_through;
mod stats;
mod store;


// Re-export public types
pub use entry::{CacheEntry, Ttl};
pub use events::{CacheObserver, TracingObserver};
pub use key::{build_key, KeyPart, KEY_DELIMITER};
pub use read_through::{ReadThrough, SharedCache};
pub use stats::CacheStats;
pub use store::CacheStore;
