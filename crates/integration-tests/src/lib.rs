//! Integration test harness for Merch Cart.
//!
//! [`FakeStorefront`] is an in-process stand-in for the Shopify Storefront
//! API, bound to an ephemeral port. By default it simulates carts in memory;
//! [`FakeStorefront::respond_with`] scripts a fixed reply instead. Every
//! request is recorded for inspection.
//!
//! ```rust,ignore
//! let fake = FakeStorefront::start().await;
//! let client = StorefrontClient::new(&fake.shopify_config());
//! let cart = client.create_cart(Vec::new()).await?;
//! assert_eq!(fake.requests()[0].token(), Some(TEST_ACCESS_TOKEN));
//! ```

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use secrecy::SecretString;
use serde_json::{Value, json};

use merch_cart_storefront::config::{ShopifyStorefrontConfig, StorefrontConfig};
use merch_cart_storefront::routes;
use merch_cart_storefront::shopify::ACCESS_TOKEN_HEADER;
use merch_cart_storefront::state::AppState;

/// Access token the fake expects.
pub const TEST_ACCESS_TOKEN: &str = "235190bee2a33cb4da0897edb6e954de";

/// Variant the fake sells as "T-Shirt" for $20.00.
pub const TSHIRT_VARIANT: &str = "gid://shopify/ProductVariant/1";

/// Variant the fake sells as "Mug" for $12.50.
pub const MUG_VARIANT: &str = "gid://shopify/ProductVariant/2";

/// One request received by the fake.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub headers: HeaderMap,
    pub body: Value,
}

impl RecordedRequest {
    /// The access token header, if sent.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.headers
            .get(ACCESS_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
    }

    /// The GraphQL document.
    #[must_use]
    pub fn query(&self) -> &str {
        self.body["query"].as_str().unwrap_or_default()
    }

    /// The variables object.
    #[must_use]
    pub fn variables(&self) -> &Value {
        &self.body["variables"]
    }
}

#[derive(Debug, Clone)]
struct FakeLine {
    id: String,
    variant_id: String,
    title: String,
    unit_cents: i64,
    quantity: i64,
}

#[derive(Debug, Default)]
struct Inner {
    requests: Vec<RecordedRequest>,
    script: Option<(StatusCode, String)>,
    carts: BTreeMap<String, Vec<FakeLine>>,
    next_cart: usize,
    next_line: usize,
}

type Shared = Arc<Mutex<Inner>>;

fn lock(shared: &Shared) -> std::sync::MutexGuard<'_, Inner> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process fake of the Storefront GraphQL endpoint.
pub struct FakeStorefront {
    addr: SocketAddr,
    shared: Shared,
}

impl FakeStorefront {
    /// Start the fake on an ephemeral port.
    pub async fn start() -> Self {
        let shared = Shared::default();
        let app = Router::new()
            .route("/api/graphql.json", post(graphql))
            .with_state(Arc::clone(&shared));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self { addr, shared }
    }

    /// The GraphQL endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("http://{}/api/graphql.json", self.addr)
    }

    /// Client settings pointing at this fake.
    #[must_use]
    pub fn shopify_config(&self) -> ShopifyStorefrontConfig {
        ShopifyStorefrontConfig {
            store: "merch-test.myshopify.com".to_string(),
            api_version: "2022-04".to_string(),
            access_token: SecretString::from(TEST_ACCESS_TOKEN),
            endpoint_override: Some(self.endpoint()),
        }
    }

    /// Answer every following request with `status` and `body`.
    pub fn respond_with(&self, status: StatusCode, body: impl Into<String>) {
        lock(&self.shared).script = Some((status, body.into()));
    }

    /// Go back to simulating carts.
    pub fn simulate(&self) {
        lock(&self.shared).script = None;
    }

    /// Drop a cart, as if it had expired on Shopify.
    pub fn forget_cart(&self, cart_id: &str) {
        lock(&self.shared).carts.remove(cart_id);
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.shared).requests.clone()
    }

    /// Number of `cartCreate` mutations received.
    #[must_use]
    pub fn create_count(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.query().contains("cartCreate("))
            .count()
    }

    /// Number of carts currently held.
    #[must_use]
    pub fn cart_count(&self) -> usize {
        lock(&self.shared).carts.len()
    }
}

async fn graphql(
    State(shared): State<Shared>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let body: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    let mut inner = lock(&shared);
    inner.requests.push(RecordedRequest {
        headers: headers.clone(),
        body: body.clone(),
    });

    if let Some((status, reply)) = &inner.script {
        return (*status, reply.clone());
    }

    if headers
        .get(ACCESS_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        != Some(TEST_ACCESS_TOKEN)
    {
        return (StatusCode::UNAUTHORIZED, "Unauthorized".to_string());
    }

    let data = inner.execute(&body["query"], &body["variables"]);
    (StatusCode::OK, data.to_string())
}

fn catalog(variant_id: &str) -> Option<(&'static str, i64)> {
    match variant_id {
        TSHIRT_VARIANT => Some(("T-Shirt", 2000)),
        MUG_VARIANT => Some(("Mug", 1250)),
        _ => None,
    }
}

fn amount(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

fn money(cents: i64) -> Value {
    json!({ "amount": amount(cents), "currencyCode": "USD" })
}

fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value[key].as_str().unwrap_or_default()
}

impl Inner {
    fn execute(&mut self, query: &Value, variables: &Value) -> Value {
        let query = query.as_str().unwrap_or_default();

        if query.contains("cartCreate(") {
            let id = self.new_cart();
            let lines = variables["input"]["lines"].as_array().cloned().unwrap_or_default();
            json!({ "data": { "cartCreate": self.add(&id, &lines) } })
        } else if query.contains("cartLinesAdd(") {
            let lines = variables["lines"].as_array().cloned().unwrap_or_default();
            json!({ "data": { "cartLinesAdd": self.add(str_field(variables, "cartId"), &lines) } })
        } else if query.contains("cartLinesUpdate(") {
            let lines = variables["lines"].as_array().cloned().unwrap_or_default();
            json!({ "data": { "cartLinesUpdate": self.update(str_field(variables, "cartId"), &lines) } })
        } else if query.contains("cartLinesRemove(") {
            let ids = variables["lineIds"].as_array().cloned().unwrap_or_default();
            json!({ "data": { "cartLinesRemove": self.remove(str_field(variables, "cartId"), &ids) } })
        } else if query.contains("cart(id:") {
            json!({ "data": { "cart": self.cart_json(str_field(variables, "id")) } })
        } else {
            json!({ "errors": [{ "message": "Unsupported operation" }] })
        }
    }

    fn new_cart(&mut self) -> String {
        self.next_cart += 1;
        let id = format!("c{}", self.next_cart);
        self.carts.insert(id.clone(), Vec::new());
        id
    }

    fn add(&mut self, cart_id: &str, inputs: &[Value]) -> Value {
        let mut next_line = self.next_line;
        let Some(lines) = self.carts.get_mut(cart_id) else {
            return missing_cart();
        };

        for input in inputs {
            let variant_id = str_field(input, "merchandiseId");
            let quantity = input["quantity"].as_i64().unwrap_or(1);
            let Some((title, unit_cents)) = catalog(variant_id) else {
                return payload(
                    Value::Null,
                    &[(
                        json!(["lines", "0", "merchandiseId"]),
                        format!("The merchandise with id {variant_id} does not exist."),
                    )],
                );
            };

            if let Some(line) = lines.iter_mut().find(|l| l.variant_id == variant_id) {
                line.quantity += quantity;
            } else {
                next_line += 1;
                lines.push(FakeLine {
                    id: format!("l{next_line}"),
                    variant_id: variant_id.to_string(),
                    title: title.to_string(),
                    unit_cents,
                    quantity,
                });
            }
        }

        self.next_line = next_line;
        payload(self.cart_json(cart_id), &[])
    }

    fn update(&mut self, cart_id: &str, inputs: &[Value]) -> Value {
        let Some(lines) = self.carts.get_mut(cart_id) else {
            return missing_cart();
        };

        for input in inputs {
            let line_id = str_field(input, "id");
            let quantity = input["quantity"].as_i64().unwrap_or(0);
            let Some(line) = lines.iter_mut().find(|l| l.id == line_id) else {
                return payload(
                    Value::Null,
                    &[(json!(["lines", "0", "id"]), "The line does not exist.".to_string())],
                );
            };
            line.quantity = quantity;
        }
        lines.retain(|l| l.quantity > 0);

        payload(self.cart_json(cart_id), &[])
    }

    fn remove(&mut self, cart_id: &str, line_ids: &[Value]) -> Value {
        let Some(lines) = self.carts.get_mut(cart_id) else {
            return missing_cart();
        };

        lines.retain(|l| !line_ids.iter().any(|id| id.as_str() == Some(l.id.as_str())));
        payload(self.cart_json(cart_id), &[])
    }

    fn cart_json(&self, cart_id: &str) -> Value {
        let Some(lines) = self.carts.get(cart_id) else {
            return Value::Null;
        };

        let edges: Vec<Value> = lines
            .iter()
            .map(|line| {
                json!({ "node": {
                    "id": line.id,
                    "quantity": line.quantity,
                    "merchandise": { "title": line.title },
                    "estimatedCost": { "totalAmount": money(line.unit_cents * line.quantity) },
                }})
            })
            .collect();
        let total: i64 = lines.iter().map(|l| l.unit_cents * l.quantity).sum();

        json!({
            "id": cart_id,
            "lines": { "edges": edges },
            "estimatedCost": { "totalAmount": money(total) },
        })
    }
}

fn payload(cart: Value, user_errors: &[(Value, String)]) -> Value {
    let user_errors: Vec<Value> = user_errors
        .iter()
        .map(|(field, message)| json!({ "field": field, "message": message }))
        .collect();
    json!({ "cart": cart, "userErrors": user_errors })
}

fn missing_cart() -> Value {
    payload(
        Value::Null,
        &[(json!(["cartId"]), "The specified cart does not exist.".to_string())],
    )
}

/// A running cart widget server wired to a [`FakeStorefront`].
pub struct TestApp {
    pub base_url: String,
    /// Browser-like client that keeps the session cookie.
    pub client: reqwest::Client,
}

impl TestApp {
    /// Start the storefront app on an ephemeral port.
    pub async fn start(fake: &FakeStorefront) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let config = StorefrontConfig {
            host: addr.ip(),
            port: addr.port(),
            base_url: format!("http://{addr}"),
            shopify: fake.shopify_config(),
            sentry_dsn: None,
            sentry_environment: None,
        };
        let app = routes::app(AppState::new(config));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}"),
            client: Self::browser(),
        }
    }

    /// A fresh client with its own cookie jar (a new visitor).
    #[must_use]
    pub fn browser() -> reqwest::Client {
        reqwest::Client::builder().cookie_store(true).build().unwrap()
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}
