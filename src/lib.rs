//! Coursecache - in-process read-through cache for a course-platform backend
//!
//! Provides TTL-expiring key-value storage, deterministic cache-key
//! construction, substring pattern invalidation, and a read-through wrapper
//! with single-flight fetch de-duplication. A second instantiation of the
//! same store backs short-lived verification codes.

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;
pub mod verify;

pub use cache::{
    build_key, CacheEntry, CacheObserver, CacheStats, CacheStore, KeyPart, ReadThrough,
    SharedCache, TracingObserver, Ttl,
};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_sweep_task;
pub use verify::{VerificationCode, VerificationStore, VerifyOutcome};
