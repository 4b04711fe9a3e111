//! Error types for the cache library
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache key construction.
///
/// The store itself is in-process memory and cannot fail to respond, so the
/// only fallible surface owned by this crate is key building. Fetch-function
/// failures are propagated verbatim by the read-through wrapper and never
/// appear here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Key prefix is empty or contains the delimiter
    #[error("Invalid key prefix: {0:?}")]
    InvalidPrefix(String),

    /// Key part is empty or contains the delimiter
    #[error("Invalid key part: {0:?}")]
    InvalidKeyPart(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache library.
pub type Result<T> = std::result::Result<T, CacheError>;
