//! Application state shared across the cart HTTP handlers.

use cartwheel_runtime::{AddToCart, CartReader, RemoveFromCart};
use std::sync::Arc;

/// Shared handles to the cart use cases.
///
/// Cloned per request by Axum; the use cases themselves are stateless and
/// thread-safe, so sharing `Arc`s is all the wiring there is.
#[derive(Clone)]
pub struct AppState {
    /// Add-to-cart mutation.
    pub add_to_cart: Arc<AddToCart>,
    /// Remove-from-cart mutation.
    pub remove_from_cart: Arc<RemoveFromCart>,
    /// Cache-aside read path.
    pub cart_reader: Arc<CartReader>,
}

impl AppState {
    /// Bundle the wired use cases into handler state.
    #[must_use]
    pub fn new(
        add_to_cart: Arc<AddToCart>,
        remove_from_cart: Arc<RemoveFromCart>,
        cart_reader: Arc<CartReader>,
    ) -> Self {
        Self {
            add_to_cart,
            remove_from_cart,
            cart_reader,
        }
    }
}
