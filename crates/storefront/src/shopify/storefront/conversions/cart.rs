//! Cart type conversion functions.

use tracing::warn;

use merch_cart_core::{CartId, CartLineId};

use crate::shopify::ShopifyError;
use crate::shopify::types::{CartLine, CartSnapshot, CartUserError};

use super::super::queries::{CartFields, CartLineNode, CartMutationPayload, UserError};

/// Convert the `CartFields` fragment into a snapshot.
pub fn convert_cart(cart: CartFields) -> CartSnapshot {
    CartSnapshot {
        id: CartId::new(cart.id),
        lines: cart
            .lines
            .edges
            .into_iter()
            .map(|edge| convert_cart_line(edge.node))
            .collect(),
        estimated_total: cart.estimated_cost.total_amount,
    }
}

fn convert_cart_line(node: CartLineNode) -> CartLine {
    let title = node.merchandise.title.unwrap_or_else(|| {
        warn!(line_id = %node.id, "Cart line merchandise is not a product variant");
        String::new()
    });

    CartLine {
        id: CartLineId::new(node.id),
        quantity: node.quantity,
        title,
        estimated_cost: node.estimated_cost.total_amount,
    }
}

pub fn convert_user_error(e: UserError) -> CartUserError {
    CartUserError {
        field: e.field.unwrap_or_default(),
        message: e.message,
    }
}

/// Unwrap a cart mutation payload.
///
/// User errors win over a returned cart; a payload without either is reported
/// as `failure`. A user error on `cartId` means the cart no longer exists.
pub fn cart_from_payload(
    payload: Option<CartMutationPayload>,
    failure: &str,
) -> Result<CartSnapshot, ShopifyError> {
    if let Some(result) = payload {
        if !result.user_errors.is_empty() {
            let errors: Vec<CartUserError> =
                result.user_errors.into_iter().map(convert_user_error).collect();

            if let Some(unknown) = errors.iter().find(|e| e.is_unknown_cart()) {
                return Err(ShopifyError::NotFound(unknown.message.clone()));
            }

            return Err(ShopifyError::UserError(
                errors
                    .iter()
                    .map(|e| e.message.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
            ));
        }

        if let Some(cart) = result.cart {
            return Ok(convert_cart(cart));
        }
    }

    Err(ShopifyError::graphql(failure))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart_json(lines: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "id": "c1",
            "lines": { "edges": lines },
            "estimatedCost": { "totalAmount": { "amount": "40.0", "currencyCode": "USD" } }
        })
    }

    fn fields(json: serde_json::Value) -> CartFields {
        serde_json::from_value(json).unwrap_or_else(|e| panic!("valid cart json: {e}"))
    }

    #[test]
    fn test_convert_cart_keeps_line_order() {
        let cart = convert_cart(fields(cart_json(serde_json::json!([
            { "node": {
                "id": "l1", "quantity": 2,
                "merchandise": { "title": "T-Shirt" },
                "estimatedCost": { "totalAmount": { "amount": "40.0", "currencyCode": "USD" } }
            }},
            { "node": {
                "id": "l2", "quantity": 1,
                "merchandise": { "title": "Sticker" },
                "estimatedCost": { "totalAmount": { "amount": "3.5", "currencyCode": "USD" } }
            }}
        ]))));

        assert_eq!(cart.id.as_str(), "c1");
        let titles: Vec<_> = cart.lines.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, ["T-Shirt", "Sticker"]);
        assert_eq!(cart.lines[0].quantity, 2);
        assert_eq!(cart.lines[1].estimated_cost.format(), "$3.50");
        assert_eq!(cart.estimated_total.format(), "$40.00");
    }

    #[test]
    fn test_convert_line_without_variant_title() {
        let cart = convert_cart(fields(cart_json(serde_json::json!([
            { "node": {
                "id": "l1", "quantity": 1,
                "merchandise": {},
                "estimatedCost": { "totalAmount": { "amount": "1", "currencyCode": "USD" } }
            }}
        ]))));

        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].title, "");
    }

    #[test]
    fn test_payload_user_errors_are_joined() {
        let payload: CartMutationPayload = serde_json::from_value(serde_json::json!({
            "cart": null,
            "userErrors": [
                { "field": ["lines", "0", "quantity"], "message": "Quantity is too high" },
                { "field": null, "message": "Cart is locked" }
            ]
        }))
        .unwrap_or_else(|e| panic!("valid payload json: {e}"));

        let err = cart_from_payload(Some(payload), "Failed to update cart")
            .expect_err("user errors must fail");
        assert!(matches!(
            err,
            ShopifyError::UserError(ref msg) if msg == "Quantity is too high; Cart is locked"
        ));
    }

    #[test]
    fn test_unknown_cart_user_error_is_not_found() {
        let payload: CartMutationPayload = serde_json::from_value(serde_json::json!({
            "cart": null,
            "userErrors": [
                { "field": ["cartId"], "message": "The specified cart does not exist." }
            ]
        }))
        .unwrap_or_else(|e| panic!("valid payload json: {e}"));

        let err = cart_from_payload(Some(payload), "Failed to add cart lines")
            .expect_err("unknown cart must fail");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: The specified cart does not exist.");
    }

    #[test]
    fn test_missing_payload_is_graphql_error() {
        let err = cart_from_payload(None, "Failed to create cart").expect_err("no payload");
        assert_eq!(err.query_message().as_deref(), Some("Failed to create cart"));
    }

    #[test]
    fn test_user_error_field_defaults_to_empty() {
        let converted = convert_user_error(UserError {
            field: None,
            message: "Invalid".to_string(),
        });
        assert!(converted.field.is_empty());
    }
}
