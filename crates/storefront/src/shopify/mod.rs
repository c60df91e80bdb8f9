//! Shopify Storefront API client.
//!
//! # Architecture
//!
//! - `graphql_client` types for the request/response envelope, hand-written
//!   cart documents
//! - Shopify is source of truth - NO local cache, every call is a round trip
//! - One POST per call: no retry, no timeout, no backoff
//!
//! # Example
//!
//! ```rust,ignore
//! use merch_cart_storefront::shopify::StorefrontClient;
//!
//! let client = StorefrontClient::new(&config.shopify);
//!
//! // Raw document
//! let data: serde_json::Value = client
//!     .execute_document("{ shop { name } }", serde_json::Map::new())
//!     .await?;
//!
//! // Cart operations
//! let cart = client.create_cart(Vec::new()).await?;
//! let cart = client.get_cart(&cart.id).await?;
//! ```

mod storefront;
pub mod types;

pub use storefront::{ACCESS_TOKEN_HEADER, StorefrontClient};
pub use types::*;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur when interacting with the Storefront API.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// The request never produced a response (connection, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Transport {
        /// Response status code.
        status: StatusCode,
        /// Raw response body text.
        body: String,
    },

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", join_messages(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User error from mutation (e.g., invalid input).
    #[error("User error: {0}")]
    UserError(String),
}

impl ShopifyError {
    /// All GraphQL error messages, newline-joined in response order.
    ///
    /// Returns `None` for every variant except [`ShopifyError::GraphQL`].
    #[must_use]
    pub fn query_message(&self) -> Option<String> {
        match self {
            Self::GraphQL(errors) => Some(join_messages(errors)),
            _ => None,
        }
    }

    /// Whether the API reported that the requested resource does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub(crate) fn graphql(message: impl Into<String>) -> Self {
        Self::GraphQL(vec![GraphQLError::message(message)])
    }
}

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphQLError {
    pub message: String,
    /// Path of the failing field, dot-joined (`cart.lines.0`).
    pub path: Option<String>,
    /// First reported source position as `(line, column)`.
    pub location: Option<(i64, i64)>,
}

impl GraphQLError {
    fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            location: None,
        }
    }
}

impl From<graphql_client::Error> for GraphQLError {
    fn from(e: graphql_client::Error) -> Self {
        let location = e
            .locations
            .as_deref()
            .and_then(<[_]>::first)
            .map(|l| (i64::from(l.line), i64::from(l.column)));

        let path = e.path.filter(|p| !p.is_empty()).map(|fragments| {
            fragments
                .iter()
                .map(|fragment| match fragment {
                    graphql_client::PathFragment::Key(key) => key.clone(),
                    graphql_client::PathFragment::Index(i) => i.to_string(),
                })
                .collect::<Vec<_>>()
                .join(".")
        });

        Self {
            message: e.message,
            path,
            location,
        }
    }
}

fn join_messages(errors: &[GraphQLError]) -> String {
    match errors {
        [] => "(no error details provided)".to_string(),
        [only] => only.message.clone(),
        many => many
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_distinguishable() {
        let err = ShopifyError::NotFound("cart c1".to_string());
        assert_eq!(err.to_string(), "Not found: cart c1");
        assert!(err.is_not_found());
    }

    #[test]
    fn transport_error_shows_status_and_body() {
        let err = ShopifyError::Transport {
            status: StatusCode::NOT_FOUND,
            body: "not found".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 404 Not Found: not found");
        assert!(!err.is_not_found());
    }

    #[test]
    fn query_message_joins_in_response_order() {
        let err = ShopifyError::GraphQL(vec![
            GraphQLError::message("Field not found"),
            GraphQLError::message("Invalid ID"),
        ]);
        assert_eq!(
            err.query_message().as_deref(),
            Some("Field not found\nInvalid ID")
        );
        assert_eq!(err.to_string(), "GraphQL errors: Field not found\nInvalid ID");
    }

    #[test]
    fn query_message_only_for_graphql() {
        let err = ShopifyError::UserError("bad quantity".to_string());
        assert!(err.query_message().is_none());
        assert_eq!(
            ShopifyError::GraphQL(vec![]).to_string(),
            "GraphQL errors: (no error details provided)"
        );
    }

    #[test]
    fn converts_response_errors() {
        let raw: graphql_client::Error = serde_json::from_value(serde_json::json!({
            "message": "Invalid global id",
            "locations": [{ "line": 2, "column": 5 }, { "line": 9, "column": 1 }],
            "path": ["cart", "lines", 0]
        }))
        .unwrap_or_else(|e| panic!("valid error json: {e}"));

        assert_eq!(
            GraphQLError::from(raw),
            GraphQLError {
                message: "Invalid global id".to_string(),
                path: Some("cart.lines.0".to_string()),
                location: Some((2, 5)),
            }
        );
    }

    #[test]
    fn bare_response_error_has_no_position() {
        let raw: graphql_client::Error =
            serde_json::from_value(serde_json::json!({ "message": "Throttled" }))
                .unwrap_or_else(|e| panic!("valid error json: {e}"));

        assert_eq!(GraphQLError::from(raw), GraphQLError::message("Throttled"));
    }
}
