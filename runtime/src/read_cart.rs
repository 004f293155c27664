//! The cache-aside cart read path.
//!
//! Reads never take the per-customer lock and never fail on an absent
//! cart: callers always get a snapshot, possibly the empty one. The cache
//! is consulted first; a store hit repopulates it on the way out.

use crate::cart_cache::{clear_everywhere, load_cached, write_through};
use cartwheel_core::cart::CartSnapshot;
use cartwheel_core::customer::CustomerId;
use cartwheel_core::environment::Clock;
use cartwheel_core::error::CartError;
use cartwheel_core::repository::CartRepository;
use cartwheel_core::services::CacheService;
use std::sync::Arc;

/// Read-only cart query service.
pub struct CartReader {
    carts: Arc<dyn CartRepository>,
    cache: Arc<dyn CacheService>,
    clock: Arc<dyn Clock>,
}

impl CartReader {
    /// Wire the reader with its collaborators.
    #[must_use]
    pub fn new(
        carts: Arc<dyn CartRepository>,
        cache: Arc<dyn CacheService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            carts,
            cache,
            clock,
        }
    }

    /// Fetch the customer's cart snapshot.
    ///
    /// An absent or expired cart yields [`CartSnapshot::empty`]; expired
    /// carts are additionally cleared from the store and the cache so the
    /// next mutation starts fresh.
    ///
    /// # Errors
    ///
    /// [`CartError::Storage`] if the persistent store fails. Cache trouble
    /// is absorbed by the cache layer and reads fall through to the store.
    pub async fn cart_for_customer(
        &self,
        customer_id: &CustomerId,
    ) -> Result<CartSnapshot, CartError> {
        let now = self.clock.now();

        if let Some(cart) = load_cached(&*self.cache, customer_id).await {
            if cart.is_expired(now) {
                // The cache TTL should have evicted this already; heal the
                // stale entry and the store copy behind it.
                clear_everywhere(&*self.carts, &*self.cache, customer_id).await?;
                return Ok(CartSnapshot::empty(customer_id.clone(), now));
            }
            tracing::debug!(customer_id = %customer_id, "cart read served from cache");
            return Ok(CartSnapshot::from(cart));
        }

        match self.carts.find_by_customer_id(customer_id).await? {
            None => Ok(CartSnapshot::empty(customer_id.clone(), now)),
            Some(cart) if cart.is_expired(now) => {
                tracing::debug!(
                    customer_id = %customer_id,
                    cart_id = %cart.id,
                    "clearing expired cart on read"
                );
                clear_everywhere(&*self.carts, &*self.cache, customer_id).await?;
                Ok(CartSnapshot::empty(customer_id.clone(), now))
            }
            Some(cart) => {
                write_through(&*self.cache, &cart, now).await;
                tracing::debug!(customer_id = %customer_id, "cart read repopulated cache");
                Ok(CartSnapshot::from(cart))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart_cache::cart_cache_key;
    use cartwheel_core::cart::{Cart, CartId};
    use cartwheel_core::product::ProductId;
    use cartwheel_testing::mocks::{FixedClock, InMemoryCacheService, InMemoryCartRepository};
    use chrono::Duration as ChronoDuration;

    struct Env {
        carts: Arc<InMemoryCartRepository>,
        cache: Arc<InMemoryCacheService>,
        clock: Arc<FixedClock>,
        reader: CartReader,
    }

    fn env() -> Env {
        let carts = Arc::new(InMemoryCartRepository::new());
        let cache = Arc::new(InMemoryCacheService::new());
        let clock = Arc::new(FixedClock::default());

        let reader = CartReader::new(
            Arc::clone(&carts) as Arc<dyn CartRepository>,
            Arc::clone(&cache) as Arc<dyn CacheService>,
            Arc::clone(&clock) as Arc<dyn Clock>,
        );

        Env {
            carts,
            cache,
            clock,
            reader,
        }
    }

    fn live_cart(env: &Env) -> Cart {
        let mut cart = Cart::new(
            CartId::new("CART-1".into()),
            CustomerId::new("C1".into()),
            env.clock.now(),
            Some(env.clock.now() + ChronoDuration::minutes(15)),
        );
        cart.add_item(ProductId::new("P1".into()), 2);
        cart
    }

    fn customer() -> CustomerId {
        CustomerId::new("C1".into())
    }

    #[tokio::test]
    async fn absent_cart_reads_as_empty_snapshot() {
        let env = env();

        let snapshot = env.reader.cart_for_customer(&customer()).await.unwrap();

        assert!(snapshot.id.is_none());
        assert!(snapshot.items.is_empty());
        // The synthetic empty cart is not cached.
        assert!(!env.cache.contains("cart:C1"));
    }

    #[tokio::test]
    async fn store_hit_repopulates_the_cache() {
        let env = env();
        let cart = live_cart(&env);
        env.carts.insert(cart.clone());

        let snapshot = env.reader.cart_for_customer(&customer()).await.unwrap();

        assert_eq!(snapshot.id, Some(cart.id));
        assert_eq!(snapshot.items, cart.items);
        assert!(env.cache.contains(&cart_cache_key(&customer())));
    }

    #[tokio::test]
    async fn cache_hit_skips_the_store() {
        let env = env();
        let cart = live_cart(&env);
        env.cache
            .set(
                &cart_cache_key(&customer()),
                serde_json::to_value(&cart).unwrap(),
                None,
            )
            .await;
        // Nothing in the store: a hit must come from the cache alone.

        let snapshot = env.reader.cart_for_customer(&customer()).await.unwrap();

        assert_eq!(snapshot.id, Some(cart.id));
    }

    #[tokio::test]
    async fn expired_store_cart_is_cleared_and_reads_empty() {
        let env = env();
        let cart = live_cart(&env);
        env.carts.insert(cart);
        env.clock.advance(ChronoDuration::minutes(16));

        let snapshot = env.reader.cart_for_customer(&customer()).await.unwrap();

        assert!(snapshot.id.is_none());
        assert!(env.carts.get(&customer()).is_none());
    }

    #[tokio::test]
    async fn stale_cached_cart_is_healed_everywhere() {
        let env = env();
        let cart = live_cart(&env);
        env.carts.insert(cart.clone());
        env.cache
            .set(
                &cart_cache_key(&customer()),
                serde_json::to_value(&cart).unwrap(),
                None,
            )
            .await;
        env.clock.advance(ChronoDuration::minutes(16));

        let snapshot = env.reader.cart_for_customer(&customer()).await.unwrap();

        assert!(snapshot.id.is_none());
        assert!(env.carts.get(&customer()).is_none());
        assert!(!env.cache.contains("cart:C1"));
    }

    #[tokio::test]
    async fn undecodable_cache_entry_falls_through_to_the_store() {
        let env = env();
        let cart = live_cart(&env);
        env.carts.insert(cart.clone());
        env.cache
            .set("cart:C1", serde_json::json!("not a cart"), None)
            .await;

        let snapshot = env.reader.cart_for_customer(&customer()).await.unwrap();

        assert_eq!(snapshot.id, Some(cart.id));
    }
}
