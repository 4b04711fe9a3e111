//! Verification Code Module
//!
//! Short-lived verification codes (e.g. for confirming an email change)
//! built on top of a second, independent instantiation of the generic TTL
//! store under the `verify` key namespace. The store itself knows nothing
//! about codes or attempts: lifetime comes from the entry TTL, and the
//! attempt limit is enforced here with explicit deletes.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::{build_key, SharedCache, Ttl};
use crate::error::Result;

// == Constants ==
/// Key namespace for verification-code records.
pub const VERIFY_NAMESPACE: &str = "verify";

/// Default lifetime of an issued code, in seconds.
pub const DEFAULT_CODE_TTL: u64 = 600;

/// Default number of wrong submissions before the code is revoked.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

// == Verification Code Record ==
/// Pending verification state for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCode {
    /// The code the user must submit back
    pub code: String,
    /// The value to apply once the code is confirmed
    pub pending_value: String,
    /// Number of wrong submissions so far
    pub attempts: u32,
}

// == Verify Outcome ==
/// Result of checking a submitted code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Code matched; carries the pending value to apply
    Confirmed(String),
    /// Code did not match; `remaining` attempts are left (0 = revoked)
    Mismatch { remaining: u32 },
    /// No live record for this user (never issued, expired, or revoked)
    NotFound,
}

// == Verification Store ==
/// Issues and checks verification codes for users.
pub struct VerificationStore {
    cache: SharedCache<VerificationCode>,
    code_ttl: u64,
    max_attempts: u32,
}

impl VerificationStore {
    // == Constructor ==
    /// Creates a VerificationStore over the given shared cache.
    pub fn new(cache: SharedCache<VerificationCode>, code_ttl: u64, max_attempts: u32) -> Self {
        Self {
            cache,
            code_ttl,
            max_attempts,
        }
    }

    /// Creates a VerificationStore with default TTL and attempt limit.
    pub fn with_defaults(cache: SharedCache<VerificationCode>) -> Self {
        Self::new(cache, DEFAULT_CODE_TTL, DEFAULT_MAX_ATTEMPTS)
    }

    fn record_key(user_id: &str) -> Result<String> {
        build_key(VERIFY_NAMESPACE, &[user_id.into()])
    }

    // == Issue ==
    /// Issues a code for `user_id`, replacing any previous pending record.
    ///
    /// The record lives for the configured TTL and is then dropped by the
    /// store like any other expired entry.
    pub async fn issue(&self, user_id: &str, code: &str, pending_value: &str) -> Result<()> {
        let key = Self::record_key(user_id)?;
        let record = VerificationCode {
            code: code.to_string(),
            pending_value: pending_value.to_string(),
            attempts: 0,
        };

        self.cache
            .write()
            .await
            .set(key, record, Ttl::Seconds(self.code_ttl));
        debug!("Verification code issued for user {}", user_id);
        Ok(())
    }

    // == Verify ==
    /// Checks `submitted` against the pending code for `user_id`.
    ///
    /// On a match the record is consumed and the pending value returned.
    /// On a mismatch the attempt counter is bumped without extending the
    /// record's remaining lifetime; once the limit is reached the record is
    /// revoked outright.
    pub async fn verify(&self, user_id: &str, submitted: &str) -> Result<VerifyOutcome> {
        let key = Self::record_key(user_id)?;
        let mut store = self.cache.write().await;

        let Some(record) = store.get(&key) else {
            return Ok(VerifyOutcome::NotFound);
        };

        if record.code == submitted {
            store.delete(&key);
            info!("Verification confirmed for user {}", user_id);
            return Ok(VerifyOutcome::Confirmed(record.pending_value));
        }

        let attempts = record.attempts + 1;
        if attempts >= self.max_attempts {
            store.delete(&key);
            info!(
                "Verification code revoked for user {} after {} failed attempts",
                user_id, attempts
            );
            return Ok(VerifyOutcome::Mismatch { remaining: 0 });
        }

        // Preserve the remaining lifetime when re-writing the bumped record
        let ttl = match store.ttl_remaining(&key) {
            Some(Some(secs)) => Ttl::Seconds(secs.max(1)),
            Some(None) => Ttl::Never,
            None => return Ok(VerifyOutcome::NotFound),
        };
        store.set(key, VerificationCode { attempts, ..record }, ttl);

        Ok(VerifyOutcome::Mismatch {
            remaining: self.max_attempts - attempts,
        })
    }

    // == Cancel ==
    /// Drops any pending record for `user_id`; returns entries removed.
    pub async fn cancel(&self, user_id: &str) -> Result<usize> {
        let key = Self::record_key(user_id)?;
        Ok(self.cache.write().await.delete(&key))
    }
}
