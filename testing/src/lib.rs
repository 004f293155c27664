//! # Cartwheel Testing
//!
//! In-memory doubles and fixtures for the cart subsystem.
//!
//! Every collaborator trait from `cartwheel-core` has a deterministic
//! in-memory implementation here, so use cases run at memory speed with no
//! Redis, store or bus:
//!
//! - [`mocks::FixedClock`] - controllable time
//! - [`mocks::InMemoryLockService`] - single-process lock table
//! - [`mocks::InMemoryCacheService`] - TTL-aware cache that records the TTL
//!   each entry was stored with
//! - [`mocks::InMemoryCartRepository`] / [`mocks::InMemoryCustomerRepository`]
//!   / [`mocks::InMemoryProductRepository`]
//! - [`mocks::RecordingEventPublisher`] - captures published events, with
//!   optional failure injection
//! - [`mocks::InMemoryDeadLetterQueue`]
//!
//! # Example
//!
//! ```
//! use cartwheel_testing::fixtures;
//! use cartwheel_testing::mocks::InMemoryProductRepository;
//!
//! let products = InMemoryProductRepository::default();
//! products.insert(fixtures::product_with_stock("P1", 10));
//! ```

pub mod fixtures;
pub mod mocks;
