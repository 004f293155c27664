//! Lock and cache service contracts.
//!
//! Both services share the same dual-backend design: a shared store (Redis)
//! when reachable, an in-process table otherwise. The in-process fallback
//! preserves the atomic semantics within a single process only - a
//! documented deployment constraint, not a bug. Because of that degradation
//! policy, neither trait surfaces infrastructure errors: a lock that cannot
//! be taken reads as "not acquired", a cache that cannot answer reads as a
//! miss.
//!
//! # Lock ownership
//!
//! Every successful acquire hands back a random [`LockToken`]. Release and
//! extend are conditional on the token still matching the stored value, so
//! a holder that outlives its TTL (long pause, stalled I/O) cannot delete a
//! lock that has since been granted to someone else.

use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use uuid::Uuid;

/// Ownership token for a held lock.
///
/// Opaque random value written as the lock's stored value; release and
/// extend succeed only while the stored value still matches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockToken(String);

impl LockToken {
    /// Generates a fresh random token.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Named, time-bounded mutual-exclusion lock.
///
/// The TTL is the crash/timeout safety net: a request that dies mid-critical
///-section leaves its lock to expire rather than leaking it forever. It must
/// exceed the worst-case critical section (store read + validation + store
/// write + cache write + event publish) or a second acquirer can slip in
/// before the first finishes.
pub trait LockService: Send + Sync {
    /// Atomically create the lock if and only if it does not already exist.
    ///
    /// Never blocks: returns `Some(token)` on success, `None` if the lock is
    /// already held *or* the backend errored (errors must read as "not
    /// acquired", never corrupt the mutual-exclusion invariant).
    fn acquire(
        &self,
        key: &str,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = Option<LockToken>> + Send + '_>>;

    /// Delete the lock if the stored value still matches `token`.
    ///
    /// A mismatch (lock expired and re-acquired by someone else) is a no-op.
    fn release(
        &self,
        key: &str,
        token: &LockToken,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;

    /// Reset the TTL if the lock exists and is still owned by `token`.
    ///
    /// Returns whether the extension applied.
    fn extend(
        &self,
        key: &str,
        token: &LockToken,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}

/// Key/value cache with per-entry TTL.
///
/// Values are generically-typed JSON; the read path owns reconstructing any
/// semantically-typed fields (timestamps in particular) when deserializing.
/// Cache failures must never fail an otherwise-successful operation, so the
/// API is infallible: backend errors are logged by implementations and read
/// as misses / dropped writes.
pub trait CacheService: Send + Sync {
    /// Fetch a value, or `None` on miss, expired entry or backend error.
    fn get(&self, key: &str) -> Pin<Box<dyn Future<Output = Option<Value>> + Send + '_>>;

    /// Store a value. `ttl = None` means no expiry.
    fn set(
        &self,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;

    /// Remove a single entry.
    fn delete(&self, key: &str) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;

    /// Flush everything. Rarely used outside tests.
    fn clear(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique() {
        assert_ne!(LockToken::generate(), LockToken::generate());
    }
}
