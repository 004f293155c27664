//! Domain event publication contracts.
//!
//! The cart subsystem treats the message bus as a fire-and-forget
//! collaborator: `cart.updated` events are published best-effort after a
//! successful mutation and a failed publish is logged, never propagated.
//! Order creation elsewhere uses the retrying variant in
//! `cartwheel-runtime`, which falls back to a [`DeadLetterQueue`] after
//! exhausting retries.

use crate::error::PublishError;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;

/// Event name published after every successful cart mutation.
pub const CART_UPDATED: &str = "cart.updated";

/// Publisher of domain events.
///
/// Delivery is at-least-once; consumers must be idempotent.
pub trait EventPublisher: Send + Sync {
    /// Publish one event.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] if the bus is unreachable or rejects the
    /// event. Whether that failure matters is the caller's policy: cart
    /// events swallow it, order events retry and dead-letter it.
    fn publish(
        &self,
        event_name: &str,
        payload: Value,
    ) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + '_>>;
}

/// Durable holding area for events that failed all delivery retries.
///
/// Entries are kept for later inspection and replay; enqueueing must not
/// fail the surrounding operation.
pub trait DeadLetterQueue: Send + Sync {
    /// Record a permanently-failed event.
    fn enqueue(
        &self,
        event_name: &str,
        payload: Value,
        error: &PublishError,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}
