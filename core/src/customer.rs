//! Customer identity, as seen by the cart subsystem.
//!
//! The full customer entity (credentials, verification tokens, addresses)
//! belongs to the account-management collaborator. The cart only needs
//! enough to answer one question: can this customer place orders?

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a customer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomerId(String);

impl CustomerId {
    /// Creates a `CustomerId` from a string.
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

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account status of a customer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerStatus {
    /// In good standing; may place orders.
    Active,
    /// Deactivated account.
    Inactive,
    /// Suspended by an operator.
    Suspended,
}

/// A customer, reduced to what cart mutation needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Customer identifier.
    pub id: CustomerId,
    /// Display name.
    pub name: String,
    /// Account status.
    pub status: CustomerStatus,
}

impl Customer {
    /// Creates a customer.
    #[must_use]
    pub const fn new(id: CustomerId, name: String, status: CustomerStatus) -> Self {
        Self { id, name, status }
    }

    /// Whether this customer may mutate a cart / place orders.
    #[must_use]
    pub fn can_place_orders(&self) -> bool {
        self.status == CustomerStatus::Active
    }
}
