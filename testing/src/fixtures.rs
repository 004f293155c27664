//! Fixture builders for common test entities.

use cartwheel_core::customer::{Customer, CustomerId, CustomerStatus};
use cartwheel_core::product::{Money, Product, ProductId};

/// An active customer with the given id.
#[must_use]
pub fn active_customer(id: &str) -> Customer {
    Customer::new(
        CustomerId::new(id.to_owned()),
        format!("Customer {id}"),
        CustomerStatus::Active,
    )
}

/// A suspended customer with the given id.
#[must_use]
pub fn suspended_customer(id: &str) -> Customer {
    Customer::new(
        CustomerId::new(id.to_owned()),
        format!("Customer {id}"),
        CustomerStatus::Suspended,
    )
}

/// A product with the given id and stock level, priced at 19.99.
#[must_use]
pub fn product_with_stock(id: &str, stock: u32) -> Product {
    Product::new(
        ProductId::new(id.to_owned()),
        format!("Product {id}"),
        Money::from_cents(1999),
        stock,
        "general".to_owned(),
    )
}
