//! Product catalog types, as seen by the cart subsystem.
//!
//! The catalog collaborator owns the full product entity; cart mutation only
//! needs price, stock and a stock-sufficiency check. Stock is *not* reserved
//! by cart additions - it is decremented at order creation, which is why the
//! mutation use cases never invalidate catalog cache entries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a product.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(String);

impl ProductId {
    /// Creates a `ProductId` from a string.
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self(id)
    }

    /// Returns the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Money amount in cents (avoids floating point).
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a money amount from cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, (self.0 % 100).abs())
    }
}

/// A catalog product, reduced to what cart mutation needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product identifier.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price.
    pub price: Money,
    /// Units currently in stock.
    pub stock: u32,
    /// Catalog category.
    pub category: String,
}

impl Product {
    /// Creates a product.
    #[must_use]
    pub const fn new(
        id: ProductId,
        name: String,
        price: Money,
        stock: u32,
        category: String,
    ) -> Self {
        Self {
            id,
            name,
            price,
            stock,
            category,
        }
    }

    /// Whether at least `quantity` units are in stock.
    #[must_use]
    pub const fn has_stock(&self, quantity: u32) -> bool {
        self.stock >= quantity
    }
}
