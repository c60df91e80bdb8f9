//! HTTP route handlers for the cart widget server.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Redirect to /cart
//! GET  /health                 - Health check
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart widget page
//! GET  /cart/items             - Dialog body fragment
//! GET  /cart/count             - "Cart (N)" badge fragment
//! POST /cart/add               - Add a variant (returns items, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns items, triggers cart-updated)
//! POST /cart/remove            - Remove a line (returns items, triggers cart-updated)
//! ```

pub mod cart;

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tower_sessions::MemoryStore;

use crate::middleware::{create_session_layer, request_id_middleware};
use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/items", get(cart::items))
        .route("/count", get(cart::count))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/cart") }))
        .nest("/cart", cart_routes())
}

/// Build the application with sessions, request IDs and tracing applied.
///
/// Sentry layers are added by the binary, outside this stack.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(MemoryStore::default(), state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .layer(session_layer)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check Shopify.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use secrecy::SecretString;
    use tower::ServiceExt;

    use super::*;
    use crate::config::{ShopifyStorefrontConfig, StorefrontConfig};
    use crate::middleware::request_id::REQUEST_ID_HEADER;

    fn test_app() -> Router {
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            shopify: ShopifyStorefrontConfig {
                store: "merch.myshopify.com".to_string(),
                api_version: "2022-04".to_string(),
                access_token: SecretString::from("235190bee2a33cb4da0897edb6e954de"),
                endpoint_override: Some("http://127.0.0.1:9/graphql".to_string()),
            },
            sentry_dsn: None,
            sentry_environment: None,
        };
        app(AppState::new(config))
    }

    #[tokio::test]
    async fn test_health_needs_no_shopify() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let response = test_app()
            .oneshot(
                Request::get("/health")
                    .header(REQUEST_ID_HEADER, "req-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-123");
    }

    #[tokio::test]
    async fn test_root_redirects_to_cart() {
        let response = test_app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.status().is_redirection());
        assert_eq!(response.headers()[header::LOCATION], "/cart");
    }
}
