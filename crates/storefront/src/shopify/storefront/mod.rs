//! Shopify Storefront API client implementation.
//!
//! Uses `graphql_client` envelope types with `reqwest` 0.13 for HTTP.
//! Nothing is cached: carts are mutable state owned by Shopify.

mod conversions;
pub mod queries;

use std::sync::Arc;

use graphql_client::{GraphQLQuery, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use merch_cart_core::{CartId, CartLineId};

use crate::config::ShopifyStorefrontConfig;
use crate::shopify::ShopifyError;
use crate::shopify::types::{CartLineInput, CartLineUpdateInput, CartSnapshot};

use conversions::{cart_from_payload, convert_cart};
use queries::{
    AddCartLines, CreateCart, GetCart, RemoveCartLines, UpdateCartLines, add_cart_lines,
    create_cart, get_cart, remove_cart_lines, update_cart_lines,
};

/// Header carrying the static Storefront access token.
pub const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";

/// Longest slice of a response body written to the logs.
const LOGGED_BODY_CHARS: usize = 500;

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: SecretString,
}

/// Request body: exactly `{query, variables}`.
#[derive(Serialize)]
struct GraphQLRequest<'a, V: Serialize + ?Sized> {
    query: &'a str,
    variables: &'a V,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    #[must_use]
    pub fn new(config: &ShopifyStorefrontConfig) -> Self {
        Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::new(),
                endpoint: config.endpoint(),
                access_token: config.access_token.clone(),
            }),
        }
    }

    /// The GraphQL endpoint this client posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Execute a raw query or mutation document.
    ///
    /// Returns the response's `data` field decoded as `T`; with
    /// `T = serde_json::Value` it is returned untouched (`null` included).
    ///
    /// # Errors
    ///
    /// - [`ShopifyError::Transport`] for any non-2xx status, with the raw body
    /// - [`ShopifyError::GraphQL`] if the response carries an `errors` array,
    ///   empty or not, even alongside partial `data`
    /// - [`ShopifyError::Http`] if no response was received
    /// - [`ShopifyError::Parse`] if the body or `data` cannot be decoded
    pub async fn execute_document<T: DeserializeOwned>(
        &self,
        document: &str,
        variables: serde_json::Map<String, serde_json::Value>,
    ) -> Result<T, ShopifyError> {
        self.post(document, &variables).await
    }

    /// Execute a typed operation.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let body = Q::build_query(variables);
        debug!(operation = body.operation_name, "Executing Storefront operation");
        self.post(body.query, &body.variables).await
    }

    async fn post<V, T>(&self, document: &str, variables: &V) -> Result<T, ShopifyError>
    where
        V: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request_body = GraphQLRequest {
            query: document,
            variables,
        };

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header(ACCESS_TOKEN_HEADER, self.inner.access_token.expose_secret())
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %truncate(&response_text),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::Transport {
                status,
                body: response_text,
            });
        }

        // Decode the envelope loosely so errors are seen even when partial
        // data would not fit `T`
        let response: Response<serde_json::Value> = serde_json::from_str(&response_text)
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    body = %truncate(&response_text),
                    "Failed to parse Shopify GraphQL response"
                );
                ShopifyError::Parse(e)
            })?;

        // Any `errors` array fails the call, even an empty one
        if let Some(errors) = response.errors {
            debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(
                errors.into_iter().map(Into::into).collect(),
            ));
        }

        // Absent and `null` data are handed on as `null`; only targets that
        // cannot be built from it fail
        let Some(data) = response.data else {
            return serde_json::from_value(serde_json::Value::Null).map_err(|_| {
                tracing::error!(
                    body = %truncate(&response_text),
                    "Shopify GraphQL response has no data and no errors"
                );
                ShopifyError::graphql("No data in response")
            });
        };

        serde_json::from_value(data).map_err(|e| {
            tracing::error!(error = %e, "GraphQL data does not match the expected shape");
            ShopifyError::Parse(e)
        })
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Create a new cart, optionally seeded with lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart creation fails or user errors are returned.
    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn create_cart(&self, lines: Vec<CartLineInput>) -> Result<CartSnapshot, ShopifyError> {
        let input = (!lines.is_empty()).then(|| create_cart::CartInput {
            lines: lines.into_iter().map(line_input).collect(),
        });

        let data = self
            .execute::<CreateCart>(create_cart::Variables { input })
            .await?;

        let cart = cart_from_payload(data.cart_create, "Failed to create cart")?;
        debug!(cart_id = %cart.id, "Created cart");
        Ok(cart)
    }

    /// Get an existing cart.
    ///
    /// # Errors
    ///
    /// Returns [`ShopifyError::NotFound`] if Shopify returns no cart for the
    /// ID, or another error if the API request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn get_cart(&self, cart_id: &CartId) -> Result<CartSnapshot, ShopifyError> {
        let variables = get_cart::Variables {
            id: cart_id.to_string(),
        };

        let data = self.execute::<GetCart>(variables).await?;

        data.cart
            .map(convert_cart)
            .ok_or_else(|| ShopifyError::NotFound(format!("Cart not found: {cart_id}")))
    }

    /// Add lines to a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn add_lines(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineInput>,
    ) -> Result<CartSnapshot, ShopifyError> {
        let variables = add_cart_lines::Variables {
            cart_id: cart_id.to_string(),
            lines: lines.into_iter().map(line_input).collect(),
        };

        let data = self.execute::<AddCartLines>(variables).await?;
        cart_from_payload(data.cart_lines_add, "Failed to add to cart")
    }

    /// Update cart line quantities.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn update_lines(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<CartSnapshot, ShopifyError> {
        let variables = update_cart_lines::Variables {
            cart_id: cart_id.to_string(),
            lines: lines
                .into_iter()
                .map(|line| queries::CartLineUpdateInput {
                    id: line.id.into_inner(),
                    quantity: line.quantity,
                })
                .collect(),
        };

        let data = self.execute::<UpdateCartLines>(variables).await?;
        cart_from_payload(data.cart_lines_update, "Failed to update cart")
    }

    /// Remove lines from a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, line_ids), fields(cart_id = %cart_id))]
    pub async fn remove_lines(
        &self,
        cart_id: &CartId,
        line_ids: Vec<CartLineId>,
    ) -> Result<CartSnapshot, ShopifyError> {
        let variables = remove_cart_lines::Variables {
            cart_id: cart_id.to_string(),
            line_ids: line_ids.into_iter().map(CartLineId::into_inner).collect(),
        };

        let data = self.execute::<RemoveCartLines>(variables).await?;
        cart_from_payload(data.cart_lines_remove, "Failed to remove from cart")
    }
}

fn line_input(line: CartLineInput) -> queries::CartLineInput {
    queries::CartLineInput {
        merchandise_id: line.merchandise_id.into_inner(),
        quantity: line.quantity,
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(LOGGED_BODY_CHARS).collect()
}
