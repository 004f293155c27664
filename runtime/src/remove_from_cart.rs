//! The remove-from-cart mutation use case.
//!
//! Same locking discipline as the add path: acquire the per-customer lock
//! with retry, mutate, persist, write-through, publish, release. Removal
//! never creates a cart; an absent or expired cart surfaces as not-found.

use crate::cart_cache::{clear_everywhere, write_through};
use crate::lock::{acquire_lock_with_retry, cart_lock_key};
use crate::policy::{lock_retry_policy, CART_LOCK_TTL};
use crate::publish::publish_best_effort;
use cartwheel_core::cart::Cart;
use cartwheel_core::customer::CustomerId;
use cartwheel_core::environment::Clock;
use cartwheel_core::error::CartError;
use cartwheel_core::events::{EventPublisher, CART_UPDATED};
use cartwheel_core::product::ProductId;
use cartwheel_core::repository::CartRepository;
use cartwheel_core::services::{CacheService, LockService};
use serde_json::json;
use std::sync::Arc;

/// Input for [`RemoveFromCart::execute`].
#[derive(Clone, Debug)]
pub struct RemoveFromCartRequest {
    /// Customer performing the mutation.
    pub customer_id: CustomerId,
    /// Product to remove entirely.
    pub product_id: ProductId,
}

/// Remove-from-cart use case.
pub struct RemoveFromCart {
    carts: Arc<dyn CartRepository>,
    cache: Arc<dyn CacheService>,
    locks: Arc<dyn LockService>,
    events: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl RemoveFromCart {
    /// Wire the use case with its collaborators.
    #[must_use]
    pub fn new(
        carts: Arc<dyn CartRepository>,
        cache: Arc<dyn CacheService>,
        locks: Arc<dyn LockService>,
        events: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            carts,
            cache,
            locks,
            events,
            clock,
        }
    }

    /// Execute the mutation, removing every unit of the product.
    ///
    /// # Errors
    ///
    /// - [`CartError::CartBusy`] if the per-customer lock stays contended
    ///   through the whole retry budget
    /// - [`CartError::CartNotFound`] if the customer has no live cart
    ///   (including a cart that expired, which is cleared on the way out)
    /// - [`CartError::ItemNotFound`] if the cart has no such product
    /// - [`CartError::Storage`] if the persistent store fails
    pub async fn execute(&self, request: RemoveFromCartRequest) -> Result<Cart, CartError> {
        let lock_key = cart_lock_key(&request.customer_id);
        let token =
            acquire_lock_with_retry(&*self.locks, &lock_key, CART_LOCK_TTL, &lock_retry_policy())
                .await
                .ok_or(CartError::CartBusy)?;

        let result = self.mutate(&request).await;
        self.locks.release(&lock_key, &token).await;
        result
    }

    async fn mutate(&self, request: &RemoveFromCartRequest) -> Result<Cart, CartError> {
        let now = self.clock.now();

        let cart = self
            .carts
            .find_by_customer_id(&request.customer_id)
            .await?
            .ok_or(CartError::CartNotFound)?;

        if cart.is_expired(now) {
            tracing::debug!(
                customer_id = %request.customer_id,
                cart_id = %cart.id,
                "clearing expired cart on remove"
            );
            clear_everywhere(&*self.carts, &*self.cache, &request.customer_id).await?;
            return Err(CartError::CartNotFound);
        }

        if !cart.contains(&request.product_id) {
            return Err(CartError::ItemNotFound(request.product_id.clone()));
        }

        // Identity and expiry survive the removal; only items and
        // updated_at change.
        let mut updated = cart;
        updated.items = updated.remove_item(&request.product_id);
        updated.updated_at = now;

        self.carts.save(&updated).await?;
        write_through(&*self.cache, &updated, now).await;

        publish_best_effort(
            &*self.events,
            CART_UPDATED,
            json!({
                "cartId": &updated.id,
                "customerId": &updated.customer_id,
                "productId": &request.product_id,
                "action": "remove",
                "expiresAt": updated.expires_at,
            }),
        )
        .await;

        tracing::info!(
            customer_id = %request.customer_id,
            cart_id = %updated.id,
            product_id = %request.product_id,
            "item removed from cart"
        );

        Ok(updated)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart_cache::cart_cache_key;
    use cartwheel_core::cart::CartId;
    use cartwheel_testing::mocks::{
        FixedClock, InMemoryCacheService, InMemoryCartRepository, InMemoryLockService,
        RecordingEventPublisher,
    };
    use chrono::Duration as ChronoDuration;

    struct Env {
        carts: Arc<InMemoryCartRepository>,
        cache: Arc<InMemoryCacheService>,
        locks: Arc<InMemoryLockService>,
        events: Arc<RecordingEventPublisher>,
        clock: Arc<FixedClock>,
        use_case: RemoveFromCart,
    }

    fn env() -> Env {
        let carts = Arc::new(InMemoryCartRepository::new());
        let cache = Arc::new(InMemoryCacheService::new());
        let locks = Arc::new(InMemoryLockService::new());
        let events = Arc::new(RecordingEventPublisher::new());
        let clock = Arc::new(FixedClock::default());

        let use_case = RemoveFromCart::new(
            Arc::clone(&carts) as Arc<dyn CartRepository>,
            Arc::clone(&cache) as Arc<dyn CacheService>,
            Arc::clone(&locks) as Arc<dyn LockService>,
            Arc::clone(&events) as Arc<dyn EventPublisher>,
            Arc::clone(&clock) as Arc<dyn Clock>,
        );

        Env {
            carts,
            cache,
            locks,
            events,
            clock,
            use_case,
        }
    }

    fn seeded_cart(env: &Env) -> Cart {
        let mut cart = Cart::new(
            CartId::new("CART-1".into()),
            CustomerId::new("C1".into()),
            env.clock.now(),
            Some(env.clock.now() + ChronoDuration::minutes(15)),
        );
        cart.add_item(ProductId::new("P1".into()), 2);
        cart.add_item(ProductId::new("P2".into()), 1);
        env.carts.insert(cart.clone());
        cart
    }

    fn request(product: &str) -> RemoveFromCartRequest {
        RemoveFromCartRequest {
            customer_id: CustomerId::new("C1".into()),
            product_id: ProductId::new(product.into()),
        }
    }

    #[tokio::test]
    async fn removes_product_and_preserves_cart_identity() {
        let env = env();
        let original = seeded_cart(&env);

        let updated = env.use_case.execute(request("P1")).await.unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.expires_at, original.expires_at);
        assert_eq!(updated.items.len(), 1);
        assert_eq!(updated.items[0].product_id.as_str(), "P2");
        assert!(env.cache.contains(&cart_cache_key(&updated.customer_id)));
    }

    #[tokio::test]
    async fn removing_last_item_leaves_an_empty_live_cart() {
        let env = env();
        seeded_cart(&env);

        env.use_case.execute(request("P1")).await.unwrap();
        let updated = env.use_case.execute(request("P2")).await.unwrap();

        assert!(updated.is_empty());
        // Empty carts stay persisted until they expire.
        assert!(env.carts.get(&updated.customer_id).is_some());
    }

    #[tokio::test]
    async fn missing_cart_is_not_found() {
        let env = env();

        assert!(matches!(
            env.use_case.execute(request("P1")).await.unwrap_err(),
            CartError::CartNotFound
        ));
    }

    #[tokio::test]
    async fn missing_item_is_item_not_found() {
        let env = env();
        seeded_cart(&env);

        assert!(matches!(
            env.use_case.execute(request("P404")).await.unwrap_err(),
            CartError::ItemNotFound(_)
        ));
    }

    #[tokio::test]
    async fn expired_cart_is_cleared_and_reported_not_found() {
        let env = env();
        seeded_cart(&env);
        env.clock.advance(ChronoDuration::minutes(16));

        let err = env.use_case.execute(request("P1")).await.unwrap_err();

        assert!(matches!(err, CartError::CartNotFound));
        assert!(env.carts.get(&CustomerId::new("C1".into())).is_none());
        assert!(!env.cache.contains("cart:C1"));
    }

    #[tokio::test]
    async fn fails_busy_when_lock_is_held() {
        let env = env();
        seeded_cart(&env);
        let held = env
            .locks
            .acquire("cart:C1", std::time::Duration::from_secs(60))
            .await
            .unwrap();

        assert!(matches!(
            env.use_case.execute(request("P1")).await.unwrap_err(),
            CartError::CartBusy
        ));
        env.locks.release("cart:C1", &held).await;
    }

    #[tokio::test]
    async fn releases_lock_on_every_path() {
        let env = env();
        seeded_cart(&env);

        env.use_case.execute(request("P1")).await.unwrap();
        assert!(!env.locks.is_held("cart:C1"));

        env.use_case.execute(request("P404")).await.unwrap_err();
        assert!(!env.locks.is_held("cart:C1"));
    }

    #[tokio::test]
    async fn publishes_cart_updated_with_remove_action() {
        let env = env();
        seeded_cart(&env);

        env.use_case.execute(request("P1")).await.unwrap();

        let events = env.events.published();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "cart.updated");
        assert_eq!(events[0].payload["action"], "remove");
        assert_eq!(events[0].payload["productId"], "P1");
    }
}
