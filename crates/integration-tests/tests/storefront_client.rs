//! Integration tests for the Storefront API client against the fake server.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::{Value, json};

use merch_cart_core::{CartId, CartLineId, MerchandiseId};
use merch_cart_integration_tests::{FakeStorefront, MUG_VARIANT, TEST_ACCESS_TOKEN, TSHIRT_VARIANT};
use merch_cart_storefront::shopify::{
    CartLineInput, CartLineUpdateInput, ShopifyError, StorefrontClient,
};

fn line(variant: &str, quantity: i64) -> CartLineInput {
    CartLineInput {
        merchandise_id: MerchandiseId::new(variant),
        quantity,
    }
}

#[tokio::test]
async fn create_cart_returns_empty_snapshot() {
    let fake = FakeStorefront::start().await;
    let client = StorefrontClient::new(&fake.shopify_config());

    let cart = client.create_cart(Vec::new()).await.unwrap();

    assert_eq!(cart.id, CartId::new("c1"));
    assert!(cart.lines.is_empty());
    assert_eq!(cart.estimated_total.format(), "$0.00");
}

#[tokio::test]
async fn requests_carry_token_and_query_variables_body() {
    let fake = FakeStorefront::start().await;
    let client = StorefrontClient::new(&fake.shopify_config());

    client.create_cart(Vec::new()).await.unwrap();

    let requests = fake.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.token(), Some(TEST_ACCESS_TOKEN));
    assert_eq!(
        request
            .headers
            .get("content-type")
            .and_then(|v| v.to_str().ok()),
        Some("application/json")
    );

    let keys: Vec<&String> = request.body.as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 2);
    assert!(request.query().contains("cartCreate("));
    assert_eq!(request.variables(), &json!({}));
}

#[tokio::test]
async fn fetched_cart_has_titles_quantities_and_totals() {
    let fake = FakeStorefront::start().await;
    let client = StorefrontClient::new(&fake.shopify_config());

    let created = client
        .create_cart(vec![line(TSHIRT_VARIANT, 2)])
        .await
        .unwrap();
    let cart = client.get_cart(&created.id).await.unwrap();

    assert_eq!(cart.id, created.id);
    assert_eq!(cart.lines.len(), 1);
    assert_eq!(cart.lines[0].title, "T-Shirt");
    assert_eq!(cart.lines[0].quantity, 2);
    assert_eq!(cart.lines[0].estimated_cost.format(), "$40.00");
    assert_eq!(cart.estimated_total.format(), "$40.00");

    let get = &fake.requests()[1];
    assert!(get.query().starts_with("query GetCart($id: ID!)"));
    assert_eq!(get.variables(), &json!({ "id": "c1" }));
}

#[tokio::test]
async fn line_mutations_return_fresh_snapshots() {
    let fake = FakeStorefront::start().await;
    let client = StorefrontClient::new(&fake.shopify_config());
    let cart = client.create_cart(Vec::new()).await.unwrap();

    let cart = client
        .add_lines(&cart.id, vec![line(TSHIRT_VARIANT, 1), line(MUG_VARIANT, 2)])
        .await
        .unwrap();
    assert_eq!(cart.line_count(), 2);
    assert_eq!(cart.estimated_total.format(), "$45.00");

    let tshirt = cart.lines[0].id.clone();
    let cart = client
        .update_lines(
            &cart.id,
            vec![CartLineUpdateInput {
                id: tshirt.clone(),
                quantity: 3,
            }],
        )
        .await
        .unwrap();
    assert_eq!(cart.total_quantity(), 5);
    assert_eq!(cart.estimated_total.format(), "$85.00");

    let cart = client.remove_lines(&cart.id, vec![tshirt]).await.unwrap();
    assert_eq!(cart.line_count(), 1);
    assert_eq!(cart.lines[0].title, "Mug");
    assert_eq!(cart.estimated_total.format(), "$25.00");
}

#[tokio::test]
async fn non_success_status_is_transport_error() {
    let fake = FakeStorefront::start().await;
    fake.respond_with(StatusCode::NOT_FOUND, "not found");
    let client = StorefrontClient::new(&fake.shopify_config());

    let err = client.create_cart(Vec::new()).await.unwrap_err();

    match err {
        ShopifyError::Transport { status, body } => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(body, "not found");
        }
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn graphql_errors_win_over_partial_data() {
    let fake = FakeStorefront::start().await;
    fake.respond_with(
        StatusCode::OK,
        json!({
            "data": { "cart": null },
            "errors": [
                { "message": "Throttled" },
                { "message": "Field 'cart' doesn't exist" }
            ]
        })
        .to_string(),
    );
    let client = StorefrontClient::new(&fake.shopify_config());

    let err = client.get_cart(&CartId::new("c1")).await.unwrap_err();

    assert!(matches!(err, ShopifyError::GraphQL(_)));
    assert_eq!(
        err.query_message().as_deref(),
        Some("Throttled\nField 'cart' doesn't exist")
    );
}

#[tokio::test]
async fn empty_errors_array_still_fails() {
    let fake = FakeStorefront::start().await;
    fake.respond_with(
        StatusCode::OK,
        json!({ "data": { "x": 1 }, "errors": [] }).to_string(),
    );
    let client = StorefrontClient::new(&fake.shopify_config());

    let err = client
        .execute_document::<Value>("{ x }", serde_json::Map::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ShopifyError::GraphQL(ref errors) if errors.is_empty()));
}

#[tokio::test]
async fn unknown_cart_is_not_found() {
    let fake = FakeStorefront::start().await;
    let client = StorefrontClient::new(&fake.shopify_config());

    let err = client.get_cart(&CartId::new("c404")).await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Not found: Cart not found: c404");
}

#[tokio::test]
async fn mutation_user_errors_are_reported() {
    let fake = FakeStorefront::start().await;
    let client = StorefrontClient::new(&fake.shopify_config());
    let cart = client.create_cart(Vec::new()).await.unwrap();

    let err = client
        .add_lines(&cart.id, vec![line("gid://shopify/ProductVariant/999", 1)])
        .await
        .unwrap_err();

    match err {
        ShopifyError::UserError(message) => assert!(message.contains("does not exist")),
        other => panic!("expected user error, got {other:?}"),
    }
}

#[tokio::test]
async fn mutations_on_unknown_cart_are_not_found() {
    let fake = FakeStorefront::start().await;
    let client = StorefrontClient::new(&fake.shopify_config());
    let missing = CartId::new("c404");

    let err = client
        .add_lines(&missing, vec![line(TSHIRT_VARIANT, 1)])
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = client
        .remove_lines(&missing, vec![CartLineId::new("l1")])
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(fake.cart_count(), 0);
}

#[tokio::test]
async fn raw_documents_return_data_untouched() {
    let fake = FakeStorefront::start().await;
    let client = StorefrontClient::new(&fake.shopify_config());
    client.create_cart(vec![line(MUG_VARIANT, 1)]).await.unwrap();

    let mut variables = serde_json::Map::new();
    variables.insert("id".to_string(), json!("c1"));
    let data: Value = client
        .execute_document("query($id: ID!) { cart(id: $id) { id } }", variables)
        .await
        .unwrap();

    assert_eq!(data["cart"]["id"], "c1");
    assert_eq!(data["cart"]["estimatedCost"]["totalAmount"]["amount"], "12.50");
}

#[tokio::test]
async fn undecodable_body_is_parse_error() {
    let fake = FakeStorefront::start().await;
    fake.respond_with(StatusCode::OK, "<html>maintenance</html>");
    let client = StorefrontClient::new(&fake.shopify_config());

    let err = client.create_cart(Vec::new()).await.unwrap_err();

    assert!(matches!(err, ShopifyError::Parse(_)));
}

#[tokio::test]
async fn null_data_is_passed_through_to_raw_documents() {
    let fake = FakeStorefront::start().await;
    fake.respond_with(StatusCode::OK, json!({ "data": null }).to_string());
    let client = StorefrontClient::new(&fake.shopify_config());

    let data: Value = client
        .execute_document("{ shop { name } }", serde_json::Map::new())
        .await
        .unwrap();

    assert_eq!(data, Value::Null);
}

#[tokio::test]
async fn empty_envelope_is_reported() {
    let fake = FakeStorefront::start().await;
    fake.respond_with(StatusCode::OK, "{}");
    let client = StorefrontClient::new(&fake.shopify_config());

    let err = client.create_cart(Vec::new()).await.unwrap_err();

    assert_eq!(err.query_message().as_deref(), Some("No data in response"));
}

#[tokio::test]
async fn wrong_token_is_rejected_by_remote() {
    let fake = FakeStorefront::start().await;
    let mut config = fake.shopify_config();
    config.access_token = "a3f9c1d7e2b84605f1e9d3c7b5a2e8f4".into();
    let client = StorefrontClient::new(&config);

    let err = client.create_cart(Vec::new()).await.unwrap_err();

    assert!(
        matches!(err, ShopifyError::Transport { status, .. } if status == StatusCode::UNAUTHORIZED)
    );
}

#[tokio::test]
async fn unreachable_endpoint_is_http_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let fake = FakeStorefront::start().await;
    let mut config = fake.shopify_config();
    config.endpoint_override = Some(format!("http://{addr}/api/graphql.json"));
    let client = StorefrontClient::new(&config);

    let err = client.create_cart(Vec::new()).await.unwrap_err();

    assert!(matches!(err, ShopifyError::Http(_)));
}
