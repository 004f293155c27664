//! Cart cache plumbing shared by the mutation use cases and the read path.
//!
//! Carts are cached as JSON under `cart:{customer_id}` with a TTL equal to
//! the cart's remaining lifetime, so a cache entry can never outlive the
//! cart it describes. Deserialization reconstructs the timestamp fields
//! from their serialized form; an undecodable entry is treated as a miss
//! and evicted.

use crate::policy::DEFAULT_CACHE_TTL;
use cartwheel_core::cart::Cart;
use cartwheel_core::customer::CustomerId;
use cartwheel_core::error::RepositoryError;
use cartwheel_core::repository::CartRepository;
use cartwheel_core::services::CacheService;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Cache key for a customer's cart: `cart:{customer_id}`.
#[must_use]
pub fn cart_cache_key(customer_id: &CustomerId) -> String {
    format!("cart:{customer_id}")
}

/// Write a cart through to the cache.
///
/// TTL policy:
/// - cart with `expires_at` → remaining whole seconds; if already `0` the
///   cart is not cached at all (it is logically absent);
/// - cart without `expires_at` → [`DEFAULT_CACHE_TTL`], never an unbounded
///   entry.
///
/// Serialization failures are logged and swallowed - cache trouble must
/// never fail a successful mutation.
pub async fn write_through(cache: &dyn CacheService, cart: &Cart, now: DateTime<Utc>) {
    let ttl = if cart.expires_at.is_some() {
        let seconds = cart.remaining_ttl_seconds(now);
        if seconds == 0 {
            tracing::debug!(cart_id = %cart.id, "skipping cache write for expired cart");
            return;
        }
        Duration::from_secs(seconds)
    } else {
        DEFAULT_CACHE_TTL
    };

    match serde_json::to_value(cart) {
        Ok(value) => {
            cache
                .set(&cart_cache_key(&cart.customer_id), value, Some(ttl))
                .await;
        }
        Err(err) => {
            tracing::warn!(cart_id = %cart.id, error = %err, "failed to serialize cart for cache");
        }
    }
}

/// Load a cached cart, or `None` on miss or undecodable entry.
pub async fn load_cached(cache: &dyn CacheService, customer_id: &CustomerId) -> Option<Cart> {
    let key = cart_cache_key(customer_id);
    let value = cache.get(&key).await?;

    match serde_json::from_value::<Cart>(value) {
        Ok(cart) => Some(cart),
        Err(err) => {
            tracing::warn!(customer_id = %customer_id, error = %err, "evicting undecodable cart cache entry");
            cache.delete(&key).await;
            None
        }
    }
}

/// Physically remove a customer's cart from both the store and the cache.
///
/// Used whenever an expired cart is detected: an expired cart is logically
/// absent, and every path clears it before proceeding.
///
/// # Errors
///
/// Propagates store failures; the cache delete is infallible by contract.
pub async fn clear_everywhere(
    carts: &dyn CartRepository,
    cache: &dyn CacheService,
    customer_id: &CustomerId,
) -> Result<(), RepositoryError> {
    carts.clear(customer_id).await?;
    cache.delete(&cart_cache_key(customer_id)).await;
    Ok(())
}
