//! Lock acquisition with retry.
//!
//! A failed `acquire` on the lock service returns immediately; contended
//! callers poll it under an exponential backoff schedule instead. The loop
//! never proceeds without the lock and never waits past the policy's
//! budget - exhaustion surfaces as `None` and the caller maps it to a
//! client-visible busy error.

use crate::retry::RetryPolicy;
use cartwheel_core::services::{LockService, LockToken};
use std::time::Duration;
use tokio::time::sleep;

/// Lock key for a customer's cart: `cart:{customer_id}`.
#[must_use]
pub fn cart_lock_key(customer_id: &cartwheel_core::customer::CustomerId) -> String {
    format!("cart:{customer_id}")
}

/// Try to acquire `key` up to `policy.max_attempts` times.
///
/// Sleeps `policy.delay_for_attempt(n)` between attempts; the final attempt
/// has no trailing delay. Returns the ownership token on success, `None`
/// once the budget is exhausted.
pub async fn acquire_lock_with_retry(
    locks: &dyn LockService,
    key: &str,
    ttl: Duration,
    policy: &RetryPolicy,
) -> Option<LockToken> {
    for attempt in 0..policy.max_attempts {
        if let Some(token) = locks.acquire(key, ttl).await {
            if attempt > 0 {
                tracing::debug!(key, attempt, "lock acquired after retry");
            }
            return Some(token);
        }

        if attempt + 1 < policy.max_attempts {
            let delay = policy.delay_for_attempt(attempt);
            tracing::debug!(
                key,
                attempt,
                delay_ms = delay.as_millis(),
                "lock busy, backing off"
            );
            sleep(delay).await;
        }
    }

    tracing::warn!(
        key,
        attempts = policy.max_attempts,
        "lock not acquired after exhausting retries"
    );
    None
}
