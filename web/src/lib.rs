//! Axum HTTP surface for the Cartwheel cart subsystem.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          HTTP layer (this crate)        │  ← envelope, status mapping,
//! │  POST /cart  DELETE /cart/item          │    x-customer-id identity
//! │  GET  /cart/me                          │
//! ├─────────────────────────────────────────┤
//! │          cartwheel-runtime              │  ← locking, caching,
//! │  AddToCart / RemoveFromCart / Reader    │    cart semantics
//! └─────────────────────────────────────────┘
//! ```
//!
//! Every response uses the envelope `{"success": true, "data": ...}` or
//! `{"success": false, "error": {"message", "statusCode"}}`.
//!
//! # Example
//!
//! ```ignore
//! use cartwheel_web::{router, AppState};
//!
//! let app = router(AppState::new(add_to_cart, remove_from_cart, cart_reader));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await?;
//! ```

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod state;

pub use error::ApiError;
pub use extractors::CallerIdentity;
pub use state::AppState;

use axum::routing::{delete, get, post};
use axum::Router;

/// Build the cart router over the wired use cases.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/cart", post(handlers::add_item))
        .route("/cart/item", delete(handlers::remove_item))
        .route("/cart/me", get(handlers::my_cart))
        .with_state(state)
}
