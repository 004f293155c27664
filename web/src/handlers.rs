//! Cart HTTP handlers.
//!
//! Thin adapters from HTTP to the use cases: extract identity and body,
//! run the use case, wrap the result in the response envelope. All cart
//! semantics live in `cartwheel-runtime`.

use crate::error::ApiError;
use crate::extractors::CallerIdentity;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use cartwheel_core::product::ProductId;
use cartwheel_runtime::{AddToCartRequest, RemoveFromCartRequest};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Body of `POST /cart`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    /// Product to add.
    pub product_id: String,
    /// Units to add.
    pub quantity: u32,
}

/// Body of `DELETE /cart/item`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveItemRequest {
    /// Product to remove entirely.
    pub product_id: String,
}

fn envelope(data: impl Serialize) -> Result<Json<Value>, ApiError> {
    let data = serde_json::to_value(data)
        .map_err(|err| ApiError::from(cartwheel_core::error::CartError::Storage(
            cartwheel_core::error::RepositoryError::Serialization(err.to_string()),
        )))?;
    Ok(Json(json!({ "success": true, "data": data })))
}

/// `POST /cart` - add an item to the caller's cart.
pub async fn add_item(
    State(state): State<AppState>,
    CallerIdentity(customer_id): CallerIdentity,
    Json(body): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let cart = state
        .add_to_cart
        .execute(AddToCartRequest {
            customer_id,
            product_id: ProductId::new(body.product_id),
            quantity: body.quantity,
        })
        .await?;

    Ok((StatusCode::CREATED, envelope(cart)?))
}

/// `DELETE /cart/item` - remove every unit of a product from the caller's cart.
pub async fn remove_item(
    State(state): State<AppState>,
    CallerIdentity(customer_id): CallerIdentity,
    Json(body): Json<RemoveItemRequest>,
) -> Result<Json<Value>, ApiError> {
    let cart = state
        .remove_from_cart
        .execute(RemoveFromCartRequest {
            customer_id,
            product_id: ProductId::new(body.product_id),
        })
        .await?;

    envelope(cart)
}

/// `GET /cart/me` - the caller's cart snapshot, empty (`id: null`) when
/// there is no live cart.
pub async fn my_cart(
    State(state): State<AppState>,
    CallerIdentity(customer_id): CallerIdentity,
) -> Result<Json<Value>, ApiError> {
    let snapshot = state.cart_reader.cart_for_customer(&customer_id).await?;
    envelope(snapshot)
}
