//! # Cartwheel Runtime
//!
//! Orchestration for the cart subsystem: lock acquisition with retry and
//! backoff, the two mutation use cases, the cache-aside read path and event
//! publication policies.
//!
//! # Concurrency model
//!
//! Concurrency comes from simultaneous requests, not in-process threads.
//! The only cross-request ordering guarantee is *at most one in-flight
//! mutation per customer*, enforced entirely by the external lock:
//!
//! - mutations for different customers proceed fully in parallel;
//! - a second mutation for the same customer retries lock acquisition with
//!   exponential backoff and fails with [`CartError::CartBusy`] once the
//!   retry budget is exhausted - it never blocks indefinitely and never
//!   proceeds without the lock;
//! - the lock TTL ([`policy::CART_LOCK_TTL`]) is the crash safety net: a
//!   request that dies mid-operation leaves its lock to expire naturally.
//!
//! There is no transactional atomicity between the store write and the
//! cache write. A crash between them leaves a stale or missing cache entry,
//! which the read path self-heals on the next miss - the store is the
//! source of truth.
//!
//! [`CartError::CartBusy`]: cartwheel_core::error::CartError::CartBusy

pub mod add_to_cart;
pub mod cart_cache;
pub mod lock;
pub mod policy;
pub mod publish;
pub mod read_cart;
pub mod remove_from_cart;
pub mod retry;

pub use add_to_cart::{AddToCart, AddToCartRequest};
pub use read_cart::CartReader;
pub use remove_from_cart::{RemoveFromCart, RemoveFromCartRequest};
pub use retry::RetryPolicy;
