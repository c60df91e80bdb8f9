//! GraphQL documents for Shopify Storefront API carts.
//!
//! Each operation lives in its own module with the document text, the
//! variables it takes and the shape of its `data` field, mirroring what
//! `graphql_client` generates. All cart documents select the same
//! `CartFields` fragment so every operation yields a full snapshot.

use graphql_client::{GraphQLQuery, QueryBody};
use serde::{Deserialize, Serialize};

use merch_cart_core::Money;

/// Append the shared `CartFields` fragment to an operation.
macro_rules! with_cart_fields {
    ($operation:literal) => {
        concat!(
            $operation,
            r"
fragment CartFields on Cart {
  id
  lines(first: 100) {
    edges {
      node {
        id
        quantity
        merchandise {
          ... on ProductVariant {
            title
          }
        }
        estimatedCost {
          totalAmount {
            amount
            currencyCode
          }
        }
      }
    }
  }
  estimatedCost {
    totalAmount {
      amount
      currencyCode
    }
  }
}
"
        )
    };
}

/// Implement `GraphQLQuery` for a hand-written operation module.
macro_rules! impl_graphql_query {
    ($query:ident, $module:ident) => {
        impl GraphQLQuery for $query {
            type Variables = $module::Variables;
            type ResponseData = $module::ResponseData;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $module::QUERY,
                    operation_name: $module::OPERATION_NAME,
                }
            }
        }
    };
}

// =============================================================================
// Shared response shapes
// =============================================================================

/// The `CartFields` fragment.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartFields {
    pub id: String,
    pub lines: CartLineConnection,
    pub estimated_cost: EstimatedCost,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartLineConnection {
    pub edges: Vec<CartLineEdge>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartLineEdge {
    pub node: CartLineNode,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineNode {
    pub id: String,
    pub quantity: i64,
    pub merchandise: CartLineMerchandise,
    pub estimated_cost: EstimatedCost,
}

/// Merchandise selected through `... on ProductVariant`; other types come
/// back as an empty object.
#[derive(Debug, Clone, Deserialize)]
pub struct CartLineMerchandise {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimatedCost {
    pub total_amount: Money,
}

/// Payload shared by every cart mutation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMutationPayload {
    pub cart: Option<CartFields>,
    #[serde(default)]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
}

/// `CartLineInput` as sent on the wire.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    pub merchandise_id: String,
    pub quantity: i64,
}

/// `CartLineUpdateInput` as sent on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct CartLineUpdateInput {
    pub id: String,
    pub quantity: i64,
}

// =============================================================================
// Operations
// =============================================================================

pub struct CreateCart;

pub mod create_cart {
    use super::{CartLineInput, CartMutationPayload, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "CreateCart";
    pub const QUERY: &str = with_cart_fields!(
        r"mutation CreateCart($input: CartInput) {
  cartCreate(input: $input) {
    cart {
      ...CartFields
    }
    userErrors {
      field
      message
    }
  }
}
"
    );

    /// Without `input` the body carries `"variables": {}`.
    #[derive(Debug, Clone, Default, Serialize)]
    pub struct Variables {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub input: Option<CartInput>,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct CartInput {
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_create: Option<CartMutationPayload>,
    }
}

impl_graphql_query!(CreateCart, create_cart);

pub struct GetCart;

pub mod get_cart {
    use super::{CartFields, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "GetCart";
    pub const QUERY: &str = with_cart_fields!(
        r"query GetCart($id: ID!) {
  cart(id: $id) {
    ...CartFields
  }
}
"
    );

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub cart: Option<CartFields>,
    }
}

impl_graphql_query!(GetCart, get_cart);

pub struct AddCartLines;

pub mod add_cart_lines {
    use super::{CartLineInput, CartMutationPayload, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "AddCartLines";
    pub const QUERY: &str = with_cart_fields!(
        r"mutation AddCartLines($cartId: ID!, $lines: [CartLineInput!]!) {
  cartLinesAdd(cartId: $cartId, lines: $lines) {
    cart {
      ...CartFields
    }
    userErrors {
      field
      message
    }
  }
}
"
    );

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_add: Option<CartMutationPayload>,
    }
}

impl_graphql_query!(AddCartLines, add_cart_lines);

pub struct UpdateCartLines;

pub mod update_cart_lines {
    use super::{CartLineUpdateInput, CartMutationPayload, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "UpdateCartLines";
    pub const QUERY: &str = with_cart_fields!(
        r"mutation UpdateCartLines($cartId: ID!, $lines: [CartLineUpdateInput!]!) {
  cartLinesUpdate(cartId: $cartId, lines: $lines) {
    cart {
      ...CartFields
    }
    userErrors {
      field
      message
    }
  }
}
"
    );

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineUpdateInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_update: Option<CartMutationPayload>,
    }
}

impl_graphql_query!(UpdateCartLines, update_cart_lines);

pub struct RemoveCartLines;

pub mod remove_cart_lines {
    use super::{CartMutationPayload, Deserialize, Serialize};

    pub const OPERATION_NAME: &str = "RemoveCartLines";
    pub const QUERY: &str = with_cart_fields!(
        r"mutation RemoveCartLines($cartId: ID!, $lineIds: [ID!]!) {
  cartLinesRemove(cartId: $cartId, lineIds: $lineIds) {
    cart {
      ...CartFields
    }
    userErrors {
      field
      message
    }
  }
}
"
    );

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub line_ids: Vec<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_remove: Option<CartMutationPayload>,
    }
}

impl_graphql_query!(RemoveCartLines, remove_cart_lines);
