//! In-memory implementations of the collaborator traits.
//!
//! All doubles use plain `std::sync::Mutex` - critical sections are pure
//! memory operations with no `.await` inside, and poisoned locks are
//! recovered rather than propagated so a failed test cannot cascade.

use cartwheel_core::cart::Cart;
use cartwheel_core::customer::{Customer, CustomerId};
use cartwheel_core::environment::Clock;
use cartwheel_core::error::{PublishError, RepositoryError};
use cartwheel_core::product::{Product, ProductId};
use cartwheel_core::repository::{CartRepository, CustomerRepository, ProductRepository};
use cartwheel_core::services::{CacheService, LockService, LockToken};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Controllable clock for deterministic tests.
///
/// Starts at a caller-supplied instant and only moves when the test says so.
///
/// # Example
///
/// ```
/// use cartwheel_testing::mocks::FixedClock;
/// use cartwheel_core::environment::Clock;
/// use chrono::Duration;
///
/// let clock = FixedClock::default();
/// let before = clock.now();
/// clock.advance(Duration::minutes(16));
/// assert_eq!(clock.now() - before, Duration::minutes(16));
/// ```
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Create a clock fixed at `time`.
    #[must_use]
    pub const fn new(time: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(time),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, delta: chrono::Duration) {
        *lock_unpoisoned(&self.now) += delta;
    }

    /// Jump the clock to an absolute time.
    pub fn set(&self, time: DateTime<Utc>) {
        *lock_unpoisoned(&self.now) = time;
    }
}

impl Default for FixedClock {
    /// Clock fixed at 2025-01-01 00:00:00 UTC.
    fn default() -> Self {
        Self::new(test_epoch())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *lock_unpoisoned(&self.now)
    }
}

/// The default test instant: 2025-01-01 00:00:00 UTC.
///
/// # Panics
///
/// Panics if the hardcoded timestamp fails to parse, which cannot happen.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_epoch() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
        .expect("hardcoded timestamp should always parse")
        .with_timezone(&Utc)
}

struct HeldLock {
    token: LockToken,
    expires_at: Instant,
}

/// Single-process lock table with the same atomic semantics as the Redis
/// service: create-if-absent with TTL, conditional release/extend.
///
/// Uses `tokio::time::Instant` for expiry so tests under a paused runtime
/// clock observe deterministic TTL behavior.
#[derive(Default)]
pub struct InMemoryLockService {
    locks: Mutex<HashMap<String, HeldLock>>,
}

impl InMemoryLockService {
    /// Create an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Probe whether a lock is currently held (expired locks read as free).
    ///
    /// Test-only observation point for the mutual-exclusion property.
    #[must_use]
    pub fn is_held(&self, key: &str) -> bool {
        let locks = lock_unpoisoned(&self.locks);
        locks
            .get(key)
            .is_some_and(|held| held.expires_at > Instant::now())
    }
}

impl std::fmt::Debug for InMemoryLockService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLockService").finish_non_exhaustive()
    }
}

impl LockService for InMemoryLockService {
    fn acquire(
        &self,
        key: &str,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = Option<LockToken>> + Send + '_>> {
        let key = key.to_owned();
        Box::pin(async move {
            let now = Instant::now();
            let mut locks = lock_unpoisoned(&self.locks);
            locks.retain(|_, held| held.expires_at > now);

            if locks.contains_key(&key) {
                return None;
            }

            let token = LockToken::generate();
            locks.insert(
                key,
                HeldLock {
                    token: token.clone(),
                    expires_at: now + ttl,
                },
            );
            Some(token)
        })
    }

    fn release(
        &self,
        key: &str,
        token: &LockToken,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        let key = key.to_owned();
        let token = token.clone();
        Box::pin(async move {
            let mut locks = lock_unpoisoned(&self.locks);
            if locks.get(&key).is_some_and(|held| held.token == token) {
                locks.remove(&key);
            }
        })
    }

    fn extend(
        &self,
        key: &str,
        token: &LockToken,
        ttl: Duration,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        let key = key.to_owned();
        let token = token.clone();
        Box::pin(async move {
            let now = Instant::now();
            let mut locks = lock_unpoisoned(&self.locks);
            match locks.get_mut(&key) {
                Some(held) if held.token == token && held.expires_at > now => {
                    held.expires_at = now + ttl;
                    true
                }
                _ => false,
            }
        })
    }
}

struct CacheEntry {
    value: Value,
    expires_at: Option<Instant>,
    stored_ttl: Option<Duration>,
}

/// TTL-aware in-memory cache.
///
/// Remembers the TTL each entry was stored with so tests can assert the
/// cache-TTL-never-outlives-cart-expiry bound.
#[derive(Default)]
pub struct InMemoryCacheService {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl InMemoryCacheService {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The TTL the live entry at `key` was stored with.
    ///
    /// `None` when there is no live entry; `Some(None)` when the entry was
    /// stored without expiry.
    #[must_use]
    pub fn stored_ttl(&self, key: &str) -> Option<Option<Duration>> {
        let entries = lock_unpoisoned(&self.entries);
        entries.get(key).map(|entry| entry.stored_ttl)
    }

    /// Whether a live (non-expired) entry exists at `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        let entries = lock_unpoisoned(&self.entries);
        entries
            .get(key)
            .is_some_and(|entry| entry.expires_at.is_none_or(|at| at > Instant::now()))
    }
}

impl std::fmt::Debug for InMemoryCacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCacheService").finish_non_exhaustive()
    }
}

impl CacheService for InMemoryCacheService {
    fn get(&self, key: &str) -> Pin<Box<dyn Future<Output = Option<Value>> + Send + '_>> {
        let key = key.to_owned();
        Box::pin(async move {
            let now = Instant::now();
            let mut entries = lock_unpoisoned(&self.entries);
            match entries.get(&key) {
                Some(entry) if entry.expires_at.is_none_or(|at| at > now) => {
                    Some(entry.value.clone())
                }
                Some(_) => {
                    // Lazy eviction on read.
                    entries.remove(&key);
                    None
                }
                None => None,
            }
        })
    }

    fn set(
        &self,
        key: &str,
        value: Value,
        ttl: Option<Duration>,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        let key = key.to_owned();
        Box::pin(async move {
            let now = Instant::now();
            let mut entries = lock_unpoisoned(&self.entries);
            entries.retain(|_, entry| entry.expires_at.is_none_or(|at| at > now));
            entries.insert(
                key,
                CacheEntry {
                    value,
                    expires_at: ttl.map(|ttl| now + ttl),
                    stored_ttl: ttl,
                },
            );
        })
    }

    fn delete(&self, key: &str) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        let key = key.to_owned();
        Box::pin(async move {
            lock_unpoisoned(&self.entries).remove(&key);
        })
    }

    fn clear(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            lock_unpoisoned(&self.entries).clear();
        })
    }
}

/// Cart store keyed by customer id, which enforces the one-live-cart-per-
/// customer invariant the same way the real store's unique index does.
#[derive(Default)]
pub struct InMemoryCartRepository {
    carts: Mutex<HashMap<CustomerId, Cart>>,
}

impl InMemoryCartRepository {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a cart directly, bypassing the use cases.
    pub fn insert(&self, cart: Cart) {
        lock_unpoisoned(&self.carts).insert(cart.customer_id.clone(), cart);
    }

    /// Direct lookup for assertions.
    #[must_use]
    pub fn get(&self, customer_id: &CustomerId) -> Option<Cart> {
        lock_unpoisoned(&self.carts).get(customer_id).cloned()
    }
}

impl std::fmt::Debug for InMemoryCartRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCartRepository").finish_non_exhaustive()
    }
}

impl CartRepository for InMemoryCartRepository {
    fn find_by_customer_id(
        &self,
        customer_id: &CustomerId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Cart>, RepositoryError>> + Send + '_>> {
        let customer_id = customer_id.clone();
        Box::pin(async move { Ok(lock_unpoisoned(&self.carts).get(&customer_id).cloned()) })
    }

    fn save(
        &self,
        cart: &Cart,
    ) -> Pin<Box<dyn Future<Output = Result<(), RepositoryError>> + Send + '_>> {
        let cart = cart.clone();
        Box::pin(async move {
            lock_unpoisoned(&self.carts).insert(cart.customer_id.clone(), cart);
            Ok(())
        })
    }

    fn clear(
        &self,
        customer_id: &CustomerId,
    ) -> Pin<Box<dyn Future<Output = Result<(), RepositoryError>> + Send + '_>> {
        let customer_id = customer_id.clone();
        Box::pin(async move {
            lock_unpoisoned(&self.carts).remove(&customer_id);
            Ok(())
        })
    }
}

/// Customer lookup backed by a map.
#[derive(Default)]
pub struct InMemoryCustomerRepository {
    customers: Mutex<HashMap<CustomerId, Customer>>,
}

impl InMemoryCustomerRepository {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a customer.
    pub fn insert(&self, customer: Customer) {
        lock_unpoisoned(&self.customers).insert(customer.id.clone(), customer);
    }
}

impl std::fmt::Debug for InMemoryCustomerRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCustomerRepository")
            .finish_non_exhaustive()
    }
}

impl CustomerRepository for InMemoryCustomerRepository {
    fn find_by_id(
        &self,
        customer_id: &CustomerId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Customer>, RepositoryError>> + Send + '_>> {
        let customer_id = customer_id.clone();
        Box::pin(async move { Ok(lock_unpoisoned(&self.customers).get(&customer_id).cloned()) })
    }
}

/// Product lookup backed by a map.
#[derive(Default)]
pub struct InMemoryProductRepository {
    products: Mutex<HashMap<ProductId, Product>>,
}

impl InMemoryProductRepository {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a product.
    pub fn insert(&self, product: Product) {
        lock_unpoisoned(&self.products).insert(product.id.clone(), product);
    }
}

impl std::fmt::Debug for InMemoryProductRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryProductRepository")
            .finish_non_exhaustive()
    }
}

impl ProductRepository for InMemoryProductRepository {
    fn find_by_id(
        &self,
        product_id: &ProductId,
    ) -> Pin<Box<dyn Future<Output = Result<Option<Product>, RepositoryError>> + Send + '_>> {
        let product_id = product_id.clone();
        Box::pin(async move { Ok(lock_unpoisoned(&self.products).get(&product_id).cloned()) })
    }
}

/// One event captured by [`RecordingEventPublisher`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedEvent {
    /// Event name (e.g. `cart.updated`).
    pub name: String,
    /// Event payload.
    pub payload: Value,
}

/// Event publisher that records what was published.
///
/// `failing(n)` makes the next `n` publishes fail, for exercising the
/// best-effort and retry-then-dead-letter policies.
#[derive(Default)]
pub struct RecordingEventPublisher {
    events: Mutex<Vec<RecordedEvent>>,
    failures_remaining: AtomicU32,
}

impl RecordingEventPublisher {
    /// Publisher that always succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publisher whose next `failures` publishes fail.
    #[must_use]
    pub fn failing(failures: u32) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            failures_remaining: AtomicU32::new(failures),
        }
    }

    /// Everything published so far, in order.
    #[must_use]
    pub fn published(&self) -> Vec<RecordedEvent> {
        lock_unpoisoned(&self.events).clone()
    }
}

impl std::fmt::Debug for RecordingEventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingEventPublisher")
            .finish_non_exhaustive()
    }
}

impl cartwheel_core::events::EventPublisher for RecordingEventPublisher {
    fn publish(
        &self,
        event_name: &str,
        payload: Value,
    ) -> Pin<Box<dyn Future<Output = Result<(), PublishError>> + Send + '_>> {
        let event_name = event_name.to_owned();
        Box::pin(async move {
            let remaining = self.failures_remaining.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
                return Err(PublishError::PublishFailed {
                    event: event_name,
                    reason: "injected failure".into(),
                });
            }

            lock_unpoisoned(&self.events).push(RecordedEvent {
                name: event_name,
                payload,
            });
            Ok(())
        })
    }
}

/// One permanently-failed event held by [`InMemoryDeadLetterQueue`].
#[derive(Clone, Debug)]
pub struct DeadLetter {
    /// Event name.
    pub name: String,
    /// Event payload.
    pub payload: Value,
    /// Last delivery error.
    pub error: String,
}

/// Dead letter queue that keeps entries in memory for assertions.
#[derive(Default)]
pub struct InMemoryDeadLetterQueue {
    letters: Mutex<Vec<DeadLetter>>,
}

impl InMemoryDeadLetterQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All dead letters so far, in order.
    #[must_use]
    pub fn letters(&self) -> Vec<DeadLetter> {
        lock_unpoisoned(&self.letters).clone()
    }
}

impl std::fmt::Debug for InMemoryDeadLetterQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDeadLetterQueue")
            .finish_non_exhaustive()
    }
}

impl cartwheel_core::events::DeadLetterQueue for InMemoryDeadLetterQueue {
    fn enqueue(
        &self,
        event_name: &str,
        payload: Value,
        error: &PublishError,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        let letter = DeadLetter {
            name: event_name.to_owned(),
            payload,
            error: error.to_string(),
        };
        Box::pin(async move {
            lock_unpoisoned(&self.letters).push(letter);
        })
    }
}
