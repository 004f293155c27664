//! The cart aggregate.
//!
//! A cart is the mutable-until-checkout collection of `(product, quantity)`
//! pairs bound to one customer. At most one live cart exists per customer;
//! the persistent store enforces uniqueness on `customer_id`.
//!
//! # Expiry
//!
//! Carts created by a first add-to-cart carry an absolute expiration
//! timestamp (`expires_at`). A cart whose `expires_at` is in the past is
//! *logically absent*: every read and mutation path treats it as nonexistent
//! and physically clears it (store and cache) before proceeding. A cart with
//! no `expires_at` never expires - that shape only occurs for reconstructed
//! empty carts.

use crate::customer::CustomerId;
use crate::product::ProductId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a cart.
///
/// Generated at first mutation; not stable across recreations after expiry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartId(String);

impl CartId {
    /// Creates a `CartId` from an existing string.
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self(id)
    }

    /// Generates a fresh random cart id.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("CART-{}", Uuid::new_v4()))
    }

    /// Returns the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single line in a cart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product this line refers to. Unique across the cart's items.
    pub product_id: ProductId,
    /// Units of the product. Always `>= 1`; a line is removed entirely
    /// rather than allowed to reach zero.
    pub quantity: u32,
    /// Optional temporary reservation deadline for the line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_until: Option<DateTime<Utc>>,
}

impl CartItem {
    /// Creates a new line without a reservation.
    #[must_use]
    pub const fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
            reserved_until: None,
        }
    }
}

/// The cart aggregate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Cart identifier.
    pub id: CartId,
    /// Owning customer. Exactly one live cart per customer.
    pub customer_id: CustomerId,
    /// Ordered lines; `product_id` unique across the sequence.
    pub items: Vec<CartItem>,
    /// Timestamp of the last mutation.
    pub updated_at: DateTime<Utc>,
    /// Absolute expiration; `None` means "never expires".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Cart {
    /// Creates an empty cart for `customer_id` expiring at `expires_at`.
    #[must_use]
    pub const fn new(
        id: CartId,
        customer_id: CustomerId,
        updated_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            customer_id,
            items: Vec::new(),
            updated_at,
            expires_at,
        }
    }

    /// Adds `quantity` units of `product_id` to the cart.
    ///
    /// If a line for the product already exists its quantity is incremented;
    /// otherwise a new line is appended. Mutates the items in place and
    /// returns the resulting sequence.
    pub fn add_item(&mut self, product_id: ProductId, quantity: u32) -> &[CartItem] {
        match self.items.iter_mut().find(|item| item.product_id == product_id) {
            Some(existing) => existing.quantity += quantity,
            None => self.items.push(CartItem::new(product_id, quantity)),
        }
        &self.items
    }

    /// Returns a new sequence excluding the line for `product_id`.
    ///
    /// Does not mutate the cart in place; the caller rebuilds the cart from
    /// the returned items (preserving id, customer and expiry).
    #[must_use]
    pub fn remove_item(&self, product_id: &ProductId) -> Vec<CartItem> {
        self.items
            .iter()
            .filter(|item| &item.product_id != product_id)
            .cloned()
            .collect()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the cart contains a line for `product_id`.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.items.iter().any(|item| &item.product_id == product_id)
    }

    /// Whether `expires_at` is set and in the past.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }

    /// Seconds until expiry: `max(0, floor(expires_at - now))`.
    ///
    /// Returns `0` when the cart has no `expires_at` or is already expired.
    /// Used as the cache TTL so a cache entry never outlives the cart.
    #[must_use]
    pub fn remaining_ttl_seconds(&self, now: DateTime<Utc>) -> u64 {
        self.expires_at.map_or(0, |expires_at| {
            u64::try_from((expires_at - now).num_seconds()).unwrap_or(0)
        })
    }
}

/// Read-path view of a customer's cart.
///
/// The read path never 404s: a customer with no live cart (absent or
/// expired) gets an empty synthetic snapshot with `id: None`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    /// Cart identifier, `None` for the empty synthetic cart.
    pub id: Option<CartId>,
    /// Owning customer.
    pub customer_id: CustomerId,
    /// Cart lines; empty for the synthetic cart.
    pub items: Vec<CartItem>,
    /// Last mutation time, or "now" for the synthetic cart.
    pub updated_at: DateTime<Utc>,
    /// Absolute expiration, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CartSnapshot {
    /// Empty synthetic snapshot for a customer with no live cart.
    #[must_use]
    pub const fn empty(customer_id: CustomerId, now: DateTime<Utc>) -> Self {
        Self {
            id: None,
            customer_id,
            items: Vec::new(),
            updated_at: now,
            expires_at: None,
        }
    }
}

impl From<Cart> for CartSnapshot {
    fn from(cart: Cart) -> Self {
        Self {
            id: Some(cart.id),
            customer_id: cart.customer_id,
            items: cart.items,
            updated_at: cart.updated_at,
            expires_at: cart.expires_at,
        }
    }
}
