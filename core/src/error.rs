//! Error taxonomy for the cart subsystem.
//!
//! The taxonomy deliberately separates four client-visible families so the
//! serving layer can map them to distinct status codes:
//!
//! - **Busy** ([`CartError::CartBusy`]): the per-customer lock could not be
//!   acquired within the retry budget. Clients should back off and retry.
//! - **Not found**: customer / product / cart / item absent. Terminal.
//! - **Validation**: insufficient stock, non-positive quantity, inactive
//!   customer. Terminal but user-correctable.
//! - **Infrastructure** ([`CartError::Storage`]): the persistent store
//!   failed. Lock and cache backends never surface here - they degrade to
//!   in-process fallbacks instead.
//!
//! Expired carts are *not* an error family: every path self-heals by
//! clearing the expired cart and treating it as absent.

use crate::customer::CustomerId;
use crate::product::ProductId;
use thiserror::Error;

/// Errors from the persistent store collaborators.
#[derive(Error, Debug, Clone)]
pub enum RepositoryError {
    /// The backing store is unreachable or a query failed.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored document could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Errors from event publication.
#[derive(Error, Debug, Clone)]
pub enum PublishError {
    /// The bus is unreachable.
    #[error("event bus connection failed: {0}")]
    ConnectionFailed(String),

    /// The bus rejected the publish.
    #[error("publish failed for event '{event}': {reason}")]
    PublishFailed {
        /// Event name that failed.
        event: String,
        /// Why it failed.
        reason: String,
    },
}

/// Errors surfaced by the cart use cases.
#[derive(Error, Debug, Clone)]
pub enum CartError {
    /// The per-customer lock was still held after exhausting retries.
    #[error("cart is currently being modified by another request, please try again in a moment")]
    CartBusy,

    /// No customer with this id.
    #[error("customer {0} not found")]
    CustomerNotFound(CustomerId),

    /// The customer exists but may not place orders.
    #[error("customer {0} is not allowed to place orders")]
    CustomerInactive(CustomerId),

    /// No product with this id.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// The requested quantity exceeds available stock.
    #[error("insufficient stock, available: {available}, requested: {requested}")]
    InsufficientStock {
        /// Units currently in stock.
        available: u32,
        /// Units the customer asked for.
        requested: u32,
    },

    /// The customer has no live cart.
    #[error("cart not found")]
    CartNotFound,

    /// The cart has no line for this product.
    #[error("item {0} not found in cart")]
    ItemNotFound(ProductId),

    /// Quantity must be at least 1.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// The persistent store failed; fatal for this request.
    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_stock_names_both_quantities() {
        let err = CartError::InsufficientStock {
            available: 3,
            requested: 5,
        };
        let message = err.to_string();
        assert!(message.contains("available: 3"));
        assert!(message.contains("requested: 5"));
    }

    #[test]
    fn storage_errors_pass_through() {
        let err = CartError::from(RepositoryError::Backend("connection refused".into()));
        assert!(err.to_string().contains("connection refused"));
    }
}
