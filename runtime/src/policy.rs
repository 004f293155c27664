//! Tuning constants for the cart subsystem.
//!
//! These are correctness-relevant, not arbitrary:
//!
//! - [`CART_LOCK_TTL`] must exceed the worst-case critical section (store
//!   read + validation + store write + cache write + event publish) or the
//!   lock can expire mid-operation and admit a second mutator.
//! - The retry schedule bounds how long a contending request waits before
//!   surfacing a busy error to the client.

use crate::retry::RetryPolicy;
use std::time::Duration;

/// TTL for the per-customer mutation lock.
pub const CART_LOCK_TTL: Duration = Duration::from_secs(10);

/// Lifetime of a newly created cart, in minutes (reservation-style expiry).
pub const CART_LIFETIME_MINUTES: i64 = 15;

/// Cache TTL for carts with no `expires_at` (reconstructed empty carts).
///
/// Never-expiring carts must not produce unbounded cache entries that could
/// outlive a later explicit clear, so they get this short bound instead.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Lifetime of a newly created cart.
#[must_use]
pub fn cart_lifetime() -> chrono::Duration {
    chrono::Duration::minutes(CART_LIFETIME_MINUTES)
}

/// Retry schedule for lock acquisition: 5 attempts, backoff 50ms doubling,
/// capped at 500ms. Sleeps happen between attempts only, so a fully
/// contended acquire spends 50 + 100 + 200 + 400 = 750ms backing off before
/// it fails.
#[must_use]
pub fn lock_retry_policy() -> RetryPolicy {
    RetryPolicy::builder()
        .max_attempts(5)
        .initial_delay(Duration::from_millis(50))
        .max_delay(Duration::from_millis(500))
        .build()
}

/// Retry schedule for must-deliver events (order creation): 4 attempts,
/// backoff 1s doubling, capped at 8s, then dead-letter.
#[must_use]
pub fn event_retry_policy() -> RetryPolicy {
    RetryPolicy::builder()
        .max_attempts(4)
        .initial_delay(Duration::from_secs(1))
        .max_delay(Duration::from_secs(8))
        .build()
}
