//! HTTP surface tests over in-memory infrastructure.

#![allow(clippy::unwrap_used)]

use axum_test::TestServer;
use cartwheel_core::environment::Clock;
use cartwheel_core::events::EventPublisher;
use cartwheel_core::repository::{CartRepository, CustomerRepository, ProductRepository};
use cartwheel_core::services::{CacheService, LockService};
use cartwheel_runtime::{AddToCart, CartReader, RemoveFromCart};
use cartwheel_testing::fixtures::{active_customer, product_with_stock};
use cartwheel_testing::mocks::{
    FixedClock, InMemoryCacheService, InMemoryCartRepository, InMemoryCustomerRepository,
    InMemoryLockService, InMemoryProductRepository, RecordingEventPublisher,
};
use cartwheel_web::{router, AppState};
use http::{HeaderName, HeaderValue};
use serde_json::{json, Value};
use std::sync::Arc;

fn server() -> TestServer {
    let carts = Arc::new(InMemoryCartRepository::new());
    let customers = Arc::new(InMemoryCustomerRepository::new());
    let products = Arc::new(InMemoryProductRepository::new());
    let cache = Arc::new(InMemoryCacheService::new());
    let locks = Arc::new(InMemoryLockService::new());
    let events = Arc::new(RecordingEventPublisher::new());
    let clock = Arc::new(FixedClock::default());

    customers.insert(active_customer("C1"));
    products.insert(product_with_stock("P1", 10));

    let add = Arc::new(AddToCart::new(
        Arc::clone(&carts) as Arc<dyn CartRepository>,
        Arc::clone(&customers) as Arc<dyn CustomerRepository>,
        Arc::clone(&products) as Arc<dyn ProductRepository>,
        Arc::clone(&cache) as Arc<dyn CacheService>,
        Arc::clone(&locks) as Arc<dyn LockService>,
        Arc::clone(&events) as Arc<dyn EventPublisher>,
        Arc::clone(&clock) as Arc<dyn Clock>,
    ));
    let remove = Arc::new(RemoveFromCart::new(
        Arc::clone(&carts) as Arc<dyn CartRepository>,
        Arc::clone(&cache) as Arc<dyn CacheService>,
        Arc::clone(&locks) as Arc<dyn LockService>,
        Arc::clone(&events) as Arc<dyn EventPublisher>,
        Arc::clone(&clock) as Arc<dyn Clock>,
    ));
    let reader = Arc::new(CartReader::new(
        Arc::clone(&carts) as Arc<dyn CartRepository>,
        Arc::clone(&cache) as Arc<dyn CacheService>,
        Arc::clone(&clock) as Arc<dyn Clock>,
    ));

    TestServer::new(router(AppState::new(add, remove, reader))).unwrap()
}

fn customer_header() -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-customer-id"),
        HeaderValue::from_static("C1"),
    )
}

#[tokio::test]
async fn add_item_returns_201_with_enveloped_cart() {
    let server = server();
    let (name, value) = customer_header();

    let response = server
        .post("/cart")
        .add_header(name, value)
        .json(&json!({"productId": "P1", "quantity": 3}))
        .await;

    response.assert_status(http::StatusCode::CREATED);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["customerId"], "C1");
    assert_eq!(body["data"]["items"][0]["productId"], "P1");
    assert_eq!(body["data"]["items"][0]["quantity"], 3);
}

#[tokio::test]
async fn missing_identity_header_is_401() {
    let server = server();

    let response = server
        .post("/cart")
        .json(&json!({"productId": "P1", "quantity": 1}))
        .await;

    response.assert_status(http::StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["statusCode"], 401);
}

#[tokio::test]
async fn unknown_product_is_404_in_the_envelope() {
    let server = server();
    let (name, value) = customer_header();

    let response = server
        .post("/cart")
        .add_header(name, value)
        .json(&json!({"productId": "P404", "quantity": 1}))
        .await;

    response.assert_status(http::StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["statusCode"], 404);
}

#[tokio::test]
async fn zero_quantity_is_400() {
    let server = server();
    let (name, value) = customer_header();

    let response = server
        .post("/cart")
        .add_header(name, value)
        .json(&json!({"productId": "P1", "quantity": 0}))
        .await;

    response.assert_status(http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn remove_item_round_trip() {
    let server = server();

    {
        let (name, value) = customer_header();
        server
            .post("/cart")
            .add_header(name, value)
            .json(&json!({"productId": "P1", "quantity": 2}))
            .await
            .assert_status(http::StatusCode::CREATED);
    }

    let (name, value) = customer_header();
    let response = server
        .delete("/cart/item")
        .add_header(name, value)
        .json(&json!({"productId": "P1"}))
        .await;

    response.assert_status(http::StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["items"], json!([]));
}

#[tokio::test]
async fn removing_from_an_absent_cart_is_404() {
    let server = server();
    let (name, value) = customer_header();

    let response = server
        .delete("/cart/item")
        .add_header(name, value)
        .json(&json!({"productId": "P1"}))
        .await;

    response.assert_status(http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reading_an_absent_cart_returns_the_empty_snapshot() {
    let server = server();
    let (name, value) = customer_header();

    let response = server.get("/cart/me").add_header(name, value).await;

    response.assert_status(http::StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], Value::Null);
    assert_eq!(body["data"]["items"], json!([]));
}

#[tokio::test]
async fn read_after_add_reflects_the_mutation() {
    let server = server();

    {
        let (name, value) = customer_header();
        server
            .post("/cart")
            .add_header(name, value)
            .json(&json!({"productId": "P1", "quantity": 4}))
            .await
            .assert_status(http::StatusCode::CREATED);
    }

    let (name, value) = customer_header();
    let response = server.get("/cart/me").add_header(name, value).await;

    let body: Value = response.json();
    assert_ne!(body["data"]["id"], Value::Null);
    assert_eq!(body["data"]["items"][0]["quantity"], 4);
}
