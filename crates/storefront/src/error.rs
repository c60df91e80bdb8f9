//! HTTP error responses for the cart routes.
//!
//! Handlers return [`Result`]. Server-side failures are logged, captured to
//! Sentry and answered with a generic message; the visitor never sees
//! upstream details.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::cart::CartError;

/// Errors a cart route can answer with.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Cart(#[from] CartError),

    /// A form quantity below what the action accepts.
    #[error("quantity must be at least {min}, got {quantity}")]
    InvalidQuantity { quantity: i64, min: i64 },
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Cart(CartError::Shopify(_)) => StatusCode::BAD_GATEWAY,
            Self::Cart(CartError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Cart(CartError::NoCart) | Self::InvalidQuantity { .. } => {
                StatusCode::BAD_REQUEST
            }
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Cart(CartError::Shopify(_)) => "Cart service unavailable".to_string(),
            Self::Cart(CartError::Store(_)) => "Internal server error".to_string(),
            Self::Cart(CartError::NoCart) => "The cart is empty".to_string(),
            Self::InvalidQuantity { .. } => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(error = %self, %status, %event_id, "Cart request failed");
        } else {
            tracing::debug!(error = %self, %status, "Cart request rejected");
        }

        (status, self.public_message()).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Record a cart action in the Sentry breadcrumb trail.
pub fn cart_breadcrumb(action: &str, fields: &[(&str, &str)]) {
    let data = fields
        .iter()
        .map(|(key, value)| ((*key).to_string(), serde_json::Value::from(*value)))
        .collect();

    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some("cart".to_string()),
        message: Some(action.to_string()),
        level: sentry::Level::Info,
        data,
        ..Default::default()
    });
}
