//! Custom Axum extractors.

use crate::error::ApiError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use cartwheel_core::customer::CustomerId;

/// Caller identity taken from the `x-customer-id` header.
///
/// This is the seam where an authentication middleware would sit in a full
/// deployment; handlers only ever see the resolved [`CustomerId`]. A missing
/// or non-ASCII header rejects the request with 401.
#[derive(Debug, Clone)]
pub struct CallerIdentity(pub CustomerId);

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-customer-id")
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(|value| Self(CustomerId::new(value.to_owned())))
            .ok_or_else(|| ApiError::unauthorized("Missing x-customer-id header"))
    }
}
