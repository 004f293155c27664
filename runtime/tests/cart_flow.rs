//! End-to-end cart flows over the in-memory infrastructure: the mutation
//! use cases, the cache-aside reader and the per-customer lock working
//! together.

#![allow(clippy::unwrap_used)]

use cartwheel_core::cart::Cart;
use cartwheel_core::customer::CustomerId;
use cartwheel_core::environment::Clock;
use cartwheel_core::error::CartError;
use cartwheel_core::events::EventPublisher;
use cartwheel_core::product::ProductId;
use cartwheel_core::repository::{CartRepository, CustomerRepository, ProductRepository};
use cartwheel_core::services::{CacheService, LockService};
use cartwheel_runtime::{
    AddToCart, AddToCartRequest, CartReader, RemoveFromCart, RemoveFromCartRequest,
};
use cartwheel_testing::fixtures::{active_customer, product_with_stock};
use cartwheel_testing::mocks::{
    FixedClock, InMemoryCacheService, InMemoryCartRepository, InMemoryCustomerRepository,
    InMemoryLockService, InMemoryProductRepository, RecordingEventPublisher,
};
use chrono::Duration as ChronoDuration;
use std::sync::Arc;

struct World {
    carts: Arc<InMemoryCartRepository>,
    cache: Arc<InMemoryCacheService>,
    clock: Arc<FixedClock>,
    add: Arc<AddToCart>,
    remove: RemoveFromCart,
    reader: CartReader,
}

fn world() -> World {
    let carts = Arc::new(InMemoryCartRepository::new());
    let customers = Arc::new(InMemoryCustomerRepository::new());
    let products = Arc::new(InMemoryProductRepository::new());
    let cache = Arc::new(InMemoryCacheService::new());
    let locks = Arc::new(InMemoryLockService::new());
    let events = Arc::new(RecordingEventPublisher::new());
    let clock = Arc::new(FixedClock::default());

    customers.insert(active_customer("C1"));
    products.insert(product_with_stock("P1", 50));
    products.insert(product_with_stock("P2", 50));

    let add = Arc::new(AddToCart::new(
        Arc::clone(&carts) as Arc<dyn CartRepository>,
        Arc::clone(&customers) as Arc<dyn CustomerRepository>,
        Arc::clone(&products) as Arc<dyn ProductRepository>,
        Arc::clone(&cache) as Arc<dyn CacheService>,
        Arc::clone(&locks) as Arc<dyn LockService>,
        Arc::clone(&events) as Arc<dyn EventPublisher>,
        Arc::clone(&clock) as Arc<dyn Clock>,
    ));
    let remove = RemoveFromCart::new(
        Arc::clone(&carts) as Arc<dyn CartRepository>,
        Arc::clone(&cache) as Arc<dyn CacheService>,
        Arc::clone(&locks) as Arc<dyn LockService>,
        Arc::clone(&events) as Arc<dyn EventPublisher>,
        Arc::clone(&clock) as Arc<dyn Clock>,
    );
    let reader = CartReader::new(
        Arc::clone(&carts) as Arc<dyn CartRepository>,
        Arc::clone(&cache) as Arc<dyn CacheService>,
        Arc::clone(&clock) as Arc<dyn Clock>,
    );

    World {
        carts,
        cache,
        clock,
        add,
        remove,
        reader,
    }
}

fn customer() -> CustomerId {
    CustomerId::new("C1".into())
}

fn add_request(product: &str, quantity: u32) -> AddToCartRequest {
    AddToCartRequest {
        customer_id: customer(),
        product_id: ProductId::new(product.into()),
        quantity,
    }
}

#[tokio::test]
async fn add_twice_merges_then_remove_preserves_identity() {
    let w = world();

    w.add.execute(add_request("P1", 3)).await.unwrap();
    let merged = w.add.execute(add_request("P1", 2)).await.unwrap();
    assert_eq!(merged.items.len(), 1);
    assert_eq!(merged.items[0].quantity, 5);

    w.add.execute(add_request("P2", 1)).await.unwrap();

    let after_remove = w
        .remove
        .execute(RemoveFromCartRequest {
            customer_id: customer(),
            product_id: ProductId::new("P1".into()),
        })
        .await
        .unwrap();

    assert_eq!(after_remove.id, merged.id);
    assert_eq!(after_remove.expires_at, merged.expires_at);
    assert_eq!(after_remove.items.len(), 1);
    assert_eq!(after_remove.items[0].product_id.as_str(), "P2");

    let snapshot = w.reader.cart_for_customer(&customer()).await.unwrap();
    assert_eq!(snapshot.id, Some(after_remove.id));
    assert_eq!(snapshot.items, after_remove.items);
}

#[tokio::test(start_paused = true)]
async fn concurrent_adds_never_lose_an_update() {
    let w = world();

    // Two writers race for the same customer. Whichever wins the lock
    // commits first; the other either waits its turn (backoff covers the
    // critical section here, which holds no real I/O) or reports busy.
    let first = {
        let add = Arc::clone(&w.add);
        tokio::spawn(async move { add.execute(add_request("P1", 3)).await })
    };
    let second = {
        let add = Arc::clone(&w.add);
        tokio::spawn(async move { add.execute(add_request("P1", 2)).await })
    };

    let outcomes = [first.await.unwrap(), second.await.unwrap()];

    let total_committed: u32 = w
        .carts
        .get(&customer())
        .map(|cart: Cart| cart.items.iter().map(|item| item.quantity).sum())
        .unwrap_or(0);
    let total_requested: u32 = outcomes
        .iter()
        .zip([3_u32, 2])
        .filter(|(outcome, _)| outcome.is_ok())
        .map(|(_, quantity)| quantity)
        .sum();

    // Every successful request is fully reflected; a loser failed loudly
    // with CartBusy rather than silently dropping its quantity.
    assert_eq!(total_committed, total_requested);
    assert!(outcomes.iter().any(Result::is_ok));
    for outcome in &outcomes {
        if let Err(err) = outcome {
            assert!(matches!(err, CartError::CartBusy));
        }
    }
}

#[tokio::test]
async fn expired_cart_reads_empty_and_next_add_starts_fresh() {
    let w = world();

    let original = w.add.execute(add_request("P1", 4)).await.unwrap();
    w.clock.advance(ChronoDuration::minutes(16));

    let snapshot = w.reader.cart_for_customer(&customer()).await.unwrap();
    assert!(snapshot.id.is_none());
    assert!(snapshot.items.is_empty());
    assert!(w.carts.get(&customer()).is_none());
    assert!(!w.cache.contains("cart:C1"));

    let fresh = w.add.execute(add_request("P1", 1)).await.unwrap();
    assert_ne!(fresh.id, original.id);
    assert_eq!(fresh.items[0].quantity, 1);
}

#[tokio::test]
async fn cache_entry_never_outlives_the_cart() {
    let w = world();

    let cart = w.add.execute(add_request("P1", 1)).await.unwrap();
    w.clock.advance(ChronoDuration::minutes(10));

    // A read mid-lifetime refreshes the cache with the shrunken TTL.
    w.reader.cart_for_customer(&customer()).await.unwrap();

    let stored = w.cache.stored_ttl("cart:C1").unwrap().unwrap();
    let remaining = cart.remaining_ttl_seconds(w.clock.now());
    assert!(stored.as_secs() <= remaining);
    assert!(remaining <= 5 * 60);
}
