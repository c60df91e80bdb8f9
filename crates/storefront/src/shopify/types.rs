//! Domain types for Shopify Storefront carts.
//!
//! These types provide a clean, ergonomic API separate from the raw
//! response shapes in `storefront::queries`.

use serde::{Deserialize, Serialize};

use merch_cart_core::{CartId, CartLineId, MerchandiseId, Money};

// =============================================================================
// Cart Snapshot
// =============================================================================

/// A point-in-time read of a remote cart.
///
/// Snapshots are never patched locally; every fetch or mutation returns a
/// new one that replaces the previous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Shopify cart ID.
    pub id: CartId,
    /// Cart lines in the order Shopify returns them.
    pub lines: Vec<CartLine>,
    /// Estimated total for the whole cart.
    pub estimated_total: Money,
}

impl CartSnapshot {
    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct lines (what the cart badge shows).
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|line| line.quantity).sum()
    }
}

/// A single cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Cart line ID.
    pub id: CartLineId,
    /// Quantity of the merchandise.
    pub quantity: i64,
    /// Merchandise (variant) title.
    pub title: String,
    /// Estimated cost of the whole line.
    pub estimated_cost: Money,
}

// =============================================================================
// Cart Inputs
// =============================================================================

/// Input for adding a line to a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineInput {
    /// Product variant ID.
    pub merchandise_id: MerchandiseId,
    /// Quantity to add.
    pub quantity: i64,
}

/// Input for changing the quantity of an existing cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineUpdateInput {
    /// Cart line ID.
    pub id: CartLineId,
    /// New quantity (0 removes the line).
    pub quantity: i64,
}

/// User error returned by a cart mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartUserError {
    /// Path to the input field that caused the error.
    pub field: Vec<String>,
    /// Error message.
    pub message: String,
}

impl CartUserError {
    /// Whether the mutation was rejected because the cart ID is unknown.
    #[must_use]
    pub fn is_unknown_cart(&self) -> bool {
        self.field == ["cartId"]
    }
}
