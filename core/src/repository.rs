//! Persistence contracts consumed by the cart use cases.
//!
//! These traits are the seam between the cart subsystem and whatever
//! document store the deployment uses. The subsystem only relies on three
//! guarantees:
//!
//! - `find_by_customer_id` returns at most one live cart (the store enforces
//!   uniqueness on `customer_id`),
//! - `save` is an upsert keyed by cart id,
//! - `clear` removes the customer's cart document entirely.
//!
//! # Implementations
//!
//! - `InMemoryCartRepository` (in `cartwheel-testing`): deterministic tests
//! - a store-backed implementation in the host application
//!
//! # Dyn Compatibility
//!
//! Methods return explicit `Pin<Box<dyn Future>>` so the traits can be used
//! as `Arc<dyn CartRepository>` by the use cases.

use crate::cart::Cart;
use crate::customer::{Customer, CustomerId};
use crate::error::RepositoryError;
use crate::product::{Product, ProductId};
use std::future::Future;
use std::pin::Pin;

/// Persistence for cart aggregates.
pub trait CartRepository: Send + Sync {
    /// Load the live cart for a customer, if one exists.
    ///
    /// Returns `Ok(None)` for a customer with no cart document; expiry is
    /// *not* evaluated here (callers own that check so they can self-heal).
    fn find_by_customer_id(
        &self,
        customer_id: &CustomerId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Cart>, RepositoryError>> + Send + '_>>;

    /// Upsert a cart keyed by its id.
    fn save(
        &self,
        cart: &Cart,
    ) -> Pin<Box<dyn Future<Output = Result<(), RepositoryError>> + Send + '_>>;

    /// Delete the customer's cart document, if any.
    fn clear(
        &self,
        customer_id: &CustomerId,
    ) -> Pin<Box<dyn Future<Output = Result<(), RepositoryError>> + Send + '_>>;
}

/// Lookup of customers, scoped to what cart mutation needs.
pub trait CustomerRepository: Send + Sync {
    /// Find a customer by id.
    fn find_by_id(
        &self,
        customer_id: &CustomerId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Customer>, RepositoryError>> + Send + '_>>;
}

/// Lookup of catalog products, scoped to what cart mutation needs.
pub trait ProductRepository: Send + Sync {
    /// Find a product by id.
    fn find_by_id(
        &self,
        product_id: &ProductId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Product>, RepositoryError>> + Send + '_>>;
}
