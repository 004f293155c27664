//! # Cartwheel Core
//!
//! Domain model and collaborator contracts for the cart concurrency-control
//! subsystem.
//!
//! The cart subsystem gives **at-most-one-concurrent-mutation-per-customer**
//! semantics without a database transaction. It does this with three pieces:
//!
//! - a named, time-bounded mutual-exclusion lock ([`services::LockService`]),
//! - a TTL-bounded key/value cache ([`services::CacheService`]),
//! - the [`cart::Cart`] aggregate with an absolute expiration timestamp.
//!
//! This crate holds the pure domain types and the trait seams; the
//! orchestration (lock-retry, mutation use cases, cache-aside reads) lives in
//! `cartwheel-runtime`, and the Redis-backed service implementations live in
//! `cartwheel-redis`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  Mutation (web)  │
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │  acquire lock    │◄─── retry w/ backoff, TTL = crash safety net
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │  load cart       │◄─── store is source of truth
//! │  validate        │
//! │  mutate + save   │
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │  write-through   │◄─── cache TTL never outlives expires_at
//! │  cache + publish │
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │  release lock    │◄─── on every exit path
//! └──────────────────┘
//! ```
//!
//! # Dyn Compatibility
//!
//! Collaborator traits use explicit `Pin<Box<dyn Future>>` returns instead of
//! `async fn` so they can be held as trait objects (`Arc<dyn CartRepository>`)
//! by the use cases.

pub mod cart;
pub mod customer;
pub mod error;
pub mod events;
pub mod product;
pub mod repository;
pub mod services;

// Re-export the types virtually every consumer needs.
pub use cart::{Cart, CartId, CartItem, CartSnapshot};
pub use customer::{Customer, CustomerId, CustomerStatus};
pub use error::{CartError, PublishError, RepositoryError};
pub use product::{Money, Product, ProductId};

/// Abstractions over ambient capabilities (time).
///
/// All external dependencies are injected behind traits so the use cases can
/// be tested deterministically.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability.
    ///
    /// Production code uses [`SystemClock`]; tests use a fixed clock from
    /// `cartwheel-testing` so expiry arithmetic is deterministic.
    pub trait Clock: Send + Sync {
        /// Get the current time.
        fn now(&self) -> DateTime<Utc>;
    }

    /// Clock backed by the system time.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
