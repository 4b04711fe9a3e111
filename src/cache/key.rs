//! Cache Key Module
//!
//! Deterministic construction of cache keys from a prefix and an ordered
//! list of scalar parts.
//!
//! Keys must be reconstructible from the same logical request parameters
//! (entity kind, identifier, pagination) so that invalidation-by-substring
//! can target all keys for an entity family, e.g. every key with prefix
//! `"modules"`.

use std::fmt;

use crate::error::{CacheError, Result};

// == Constants ==
/// Delimiter joining the prefix and key parts.
pub const KEY_DELIMITER: char = ':';

// == Key Part ==
/// A single scalar component of a cache key.
///
/// `Absent` parts are silently dropped during key construction, mirroring
/// optional request parameters (e.g. a pagination cursor that was not
/// supplied).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPart {
    Str(String),
    Int(i64),
    UInt(u64),
    Bool(bool),
    /// Placeholder for an omitted parameter; skipped when joining
    Absent,
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPart::Str(s) => write!(f, "{}", s),
            KeyPart::Int(n) => write!(f, "{}", n),
            KeyPart::UInt(n) => write!(f, "{}", n),
            KeyPart::Bool(b) => write!(f, "{}", b),
            KeyPart::Absent => Ok(()),
        }
    }
}

impl From<&str> for KeyPart {
    fn from(s: &str) -> Self {
        KeyPart::Str(s.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(s: String) -> Self {
        KeyPart::Str(s)
    }
}

impl From<i32> for KeyPart {
    fn from(n: i32) -> Self {
        KeyPart::Int(n as i64)
    }
}

impl From<i64> for KeyPart {
    fn from(n: i64) -> Self {
        KeyPart::Int(n)
    }
}

impl From<u32> for KeyPart {
    fn from(n: u32) -> Self {
        KeyPart::UInt(n as u64)
    }
}

impl From<u64> for KeyPart {
    fn from(n: u64) -> Self {
        KeyPart::UInt(n)
    }
}

impl From<usize> for KeyPart {
    fn from(n: usize) -> Self {
        KeyPart::UInt(n as u64)
    }
}

impl From<bool> for KeyPart {
    fn from(b: bool) -> Self {
        KeyPart::Bool(b)
    }
}

impl<T: Into<KeyPart>> From<Option<T>> for KeyPart {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => KeyPart::Absent,
        }
    }
}

// == Build Key ==
/// Builds a cache key by joining `prefix` and the non-absent `parts` with
/// the delimiter, preserving input order.
///
/// Pure function: deterministic and idempotent for identical inputs. An
/// empty `parts` sequence yields just the prefix.
///
/// # Errors
/// Fails fast on inputs that would produce an ambiguous key: an empty
/// prefix, or any prefix/string part containing the delimiter itself.
///
/// # Example
/// ```
/// use coursecache::cache::build_key;
///
/// let key = build_key(
///     "lessons",
///     &["module".into(), "m1".into(), true.into(), 1u64.into(), 10u64.into()],
/// )
/// .unwrap();
/// assert_eq!(key, "lessons:module:m1:true:1:10");
/// ```
pub fn build_key(prefix: &str, parts: &[KeyPart]) -> Result<String> {
    if prefix.is_empty() || prefix.contains(KEY_DELIMITER) {
        return Err(CacheError::InvalidPrefix(prefix.to_string()));
    }

    let mut key = String::from(prefix);
    for part in parts {
        if let KeyPart::Str(s) = part {
            if s.is_empty() || s.contains(KEY_DELIMITER) {
                return Err(CacheError::InvalidKeyPart(s.clone()));
            }
        }
        if matches!(part, KeyPart::Absent) {
            continue;
        }
        key.push(KEY_DELIMITER);
        key.push_str(&part.to_string());
    }

    Ok(key)
}
