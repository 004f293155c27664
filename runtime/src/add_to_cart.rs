//! The add-to-cart mutation use case.
//!
//! Orchestrates one full mutation under the per-customer lock:
//! acquire (with retry) → validate customer and product → load-or-create
//! the cart → apply the mutation → persist → write-through cache → publish
//! `cart.updated` → release the lock on every exit path.

use crate::cart_cache::{clear_everywhere, write_through};
use crate::lock::{acquire_lock_with_retry, cart_lock_key};
use crate::policy::{cart_lifetime, lock_retry_policy, CART_LOCK_TTL};
use crate::publish::publish_best_effort;
use cartwheel_core::cart::{Cart, CartId};
use cartwheel_core::customer::CustomerId;
use cartwheel_core::environment::Clock;
use cartwheel_core::error::CartError;
use cartwheel_core::events::{EventPublisher, CART_UPDATED};
use cartwheel_core::product::ProductId;
use cartwheel_core::repository::{CartRepository, CustomerRepository, ProductRepository};
use cartwheel_core::services::{CacheService, LockService};
use serde_json::json;
use std::sync::Arc;

/// Input for [`AddToCart::execute`].
#[derive(Clone, Debug)]
pub struct AddToCartRequest {
    /// Customer performing the mutation.
    pub customer_id: CustomerId,
    /// Product to add.
    pub product_id: ProductId,
    /// Units to add; must be positive.
    pub quantity: u32,
}

/// Add-to-cart use case.
pub struct AddToCart {
    carts: Arc<dyn CartRepository>,
    customers: Arc<dyn CustomerRepository>,
    products: Arc<dyn ProductRepository>,
    cache: Arc<dyn CacheService>,
    locks: Arc<dyn LockService>,
    events: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl AddToCart {
    /// Wire the use case with its collaborators.
    #[must_use]
    pub fn new(
        carts: Arc<dyn CartRepository>,
        customers: Arc<dyn CustomerRepository>,
        products: Arc<dyn ProductRepository>,
        cache: Arc<dyn CacheService>,
        locks: Arc<dyn LockService>,
        events: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            carts,
            customers,
            products,
            cache,
            locks,
            events,
            clock,
        }
    }

    /// Execute the mutation.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`] for a zero quantity
    /// - [`CartError::CartBusy`] if the per-customer lock stays contended
    ///   through the whole retry budget
    /// - [`CartError::CustomerNotFound`] / [`CartError::CustomerInactive`]
    /// - [`CartError::ProductNotFound`] / [`CartError::InsufficientStock`]
    /// - [`CartError::Storage`] if the persistent store fails
    pub async fn execute(&self, request: AddToCartRequest) -> Result<Cart, CartError> {
        if request.quantity == 0 {
            return Err(CartError::InvalidQuantity(request.quantity));
        }

        let lock_key = cart_lock_key(&request.customer_id);
        let token =
            acquire_lock_with_retry(&*self.locks, &lock_key, CART_LOCK_TTL, &lock_retry_policy())
                .await
                .ok_or(CartError::CartBusy)?;

        // Release must happen on every exit path below; errors are values
        // here, so running the critical section first and releasing before
        // returning covers them all. A cancelled request leaves the lock to
        // its TTL instead.
        let result = self.mutate(&request).await;
        self.locks.release(&lock_key, &token).await;
        result
    }

    async fn mutate(&self, request: &AddToCartRequest) -> Result<Cart, CartError> {
        let customer = self
            .customers
            .find_by_id(&request.customer_id)
            .await?
            .ok_or_else(|| CartError::CustomerNotFound(request.customer_id.clone()))?;
        if !customer.can_place_orders() {
            return Err(CartError::CustomerInactive(customer.id));
        }

        let product = self
            .products
            .find_by_id(&request.product_id)
            .await?
            .ok_or_else(|| CartError::ProductNotFound(request.product_id.clone()))?;
        if !product.has_stock(request.quantity) {
            return Err(CartError::InsufficientStock {
                available: product.stock,
                requested: request.quantity,
            });
        }

        let now = self.clock.now();

        let existing = match self.carts.find_by_customer_id(&request.customer_id).await? {
            Some(cart) if cart.is_expired(now) => {
                // Expired carts are logically absent: clear and recreate.
                tracing::debug!(
                    customer_id = %request.customer_id,
                    cart_id = %cart.id,
                    "clearing expired cart before add"
                );
                clear_everywhere(&*self.carts, &*self.cache, &request.customer_id).await?;
                None
            }
            other => other,
        };

        let mut cart = existing.unwrap_or_else(|| {
            Cart::new(
                CartId::generate(),
                request.customer_id.clone(),
                now,
                Some(now + cart_lifetime()),
            )
        });

        cart.add_item(request.product_id.clone(), request.quantity);
        cart.updated_at = now;

        self.carts.save(&cart).await?;
        write_through(&*self.cache, &cart, now).await;

        // Catalog cache entries are left untouched: stock in the store does
        // not change when items enter a cart, only at order creation.

        publish_best_effort(
            &*self.events,
            CART_UPDATED,
            json!({
                "cartId": &cart.id,
                "customerId": &cart.customer_id,
                "productId": &request.product_id,
                "quantity": request.quantity,
                "action": "add",
                "expiresAt": cart.expires_at,
            }),
        )
        .await;

        tracing::info!(
            customer_id = %request.customer_id,
            cart_id = %cart.id,
            product_id = %request.product_id,
            quantity = request.quantity,
            "item added to cart"
        );

        Ok(cart)
    }
}
