//! Error types for the cart HTTP handlers.
//!
//! Bridges [`CartError`] to HTTP responses in the subsystem's response
//! envelope, implementing Axum's `IntoResponse` trait.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cartwheel_core::error::CartError;
use serde_json::json;
use std::fmt;

/// Application error type for the cart handlers.
///
/// Every error renders as the envelope
/// `{"success": false, "error": {"message": ..., "statusCode": ...}}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    /// Internal error for logging, never exposed to the client.
    source: Option<anyhow::Error>,
}

impl ApiError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String) -> Self {
        Self {
            status,
            message,
            source: None,
        }
    }

    /// Attach a source error for server-side logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message.into())
    }

    /// The HTTP status this error renders with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status, self.message)
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        let status = match &err {
            CartError::CartBusy => StatusCode::TOO_MANY_REQUESTS,
            CartError::CustomerNotFound(_)
            | CartError::ProductNotFound(_)
            | CartError::CartNotFound
            | CartError::ItemNotFound(_) => StatusCode::NOT_FOUND,
            CartError::CustomerInactive(_)
            | CartError::InsufficientStock { .. }
            | CartError::InvalidQuantity(_) => StatusCode::BAD_REQUEST,
            CartError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Storage details stay server-side.
        if let CartError::Storage(storage) = &err {
            return Self::new(status, "Internal server error".to_owned())
                .with_source(anyhow::Error::new(storage.clone()));
        }

        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => {
                    tracing::error!(status = %self.status, error = %source, "request failed");
                }
                None => {
                    tracing::error!(status = %self.status, message = %self.message, "request failed");
                }
            }
        }

        let body = json!({
            "success": false,
            "error": {
                "message": self.message,
                "statusCode": self.status.as_u16(),
            }
        });

        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartwheel_core::customer::CustomerId;
    use cartwheel_core::error::RepositoryError;
    use cartwheel_core::product::ProductId;

    #[test]
    fn busy_maps_to_429() {
        assert_eq!(
            ApiError::from(CartError::CartBusy).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn not_found_family_maps_to_404() {
        for err in [
            CartError::CartNotFound,
            CartError::CustomerNotFound(CustomerId::new("C1".into())),
            CartError::ProductNotFound(ProductId::new("P1".into())),
            CartError::ItemNotFound(ProductId::new("P1".into())),
        ] {
            assert_eq!(ApiError::from(err).status(), StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn validation_family_maps_to_400() {
        for err in [
            CartError::InvalidQuantity(0),
            CartError::InsufficientStock {
                available: 1,
                requested: 2,
            },
            CartError::CustomerInactive(CustomerId::new("C1".into())),
        ] {
            assert_eq!(ApiError::from(err).status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn storage_maps_to_500_and_hides_details() {
        let err = ApiError::from(CartError::Storage(RepositoryError::Backend(
            "connection refused to mongodb://prod".into(),
        )));

        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.to_string().contains("mongodb"));
    }
}
