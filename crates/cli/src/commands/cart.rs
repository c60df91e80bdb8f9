//! Cart commands.
//!
//! Each invocation builds a [`CartSession`] over a [`FileCartIdStore`] in the
//! profile directory, runs one action and renders the result as text.
//!
//! # Environment Variables
//!
//! - `SHOPIFY_STORE` - Shopify store domain
//! - `SHOPIFY_STOREFRONT_ACCESS_TOKEN` - Storefront API access token
//! - `SHOPIFY_API_VERSION` - API version (default: 2022-04)
//! - `MERCH_CART_PROFILE_DIR` - Profile directory (default: `.merch-cart`)

use std::fmt::Write as _;
use std::path::Path;

use thiserror::Error;
use tracing::info;

use merch_cart_core::{CartId, CartLineId, MerchandiseId};
use merch_cart_storefront::cart::{CartApi, CartError, CartIdStore, CartSession, FileCartIdStore};
use merch_cart_storefront::config::{ConfigError, ShopifyStorefrontConfig};
use merch_cart_storefront::shopify::{
    CartLineInput, CartLineUpdateInput, CartSnapshot, StorefrontClient,
};

/// Errors from cart commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The cart operation failed.
    #[error(transparent)]
    Cart(#[from] CartError),
}

impl CommandError {
    /// What the user can do about the error, if anything.
    #[must_use]
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Cart(e) if e.is_not_found() => Some(
                "The stored cart no longer exists. Run `merch-cart reset` to start a new one.",
            ),
            Self::Cart(CartError::NoCart) => {
                Some("Add something first with `merch-cart add <variant-id>`.")
            }
            _ => None,
        }
    }
}

/// One cart command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    Show,
    Add { variant_id: String, quantity: i64 },
    Update { line_id: String, quantity: i64 },
    Remove { line_id: String },
    Id,
    Reset,
}

/// What a command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartOutput {
    Cart(CartSnapshot),
    Id(Option<CartId>),
    Reset,
}

/// Run `action` against the Storefront API with the cart ID kept in
/// `profile_dir`, returning the rendered output.
///
/// # Errors
///
/// Returns an error if configuration is missing or the cart operation fails.
pub async fn run(profile_dir: &Path, action: CartAction) -> Result<String, CommandError> {
    let store = FileCartIdStore::in_dir(profile_dir);

    // Reading or clearing the stored ID needs no Shopify credentials
    let output = match action {
        CartAction::Id => CartOutput::Id(store.load().await.map_err(CartError::from)?),
        CartAction::Reset => {
            store.clear().await.map_err(CartError::from)?;
            CartOutput::Reset
        }
        action => {
            let config = ShopifyStorefrontConfig::from_env()?;
            let session = CartSession::new(StorefrontClient::new(&config), store);
            execute(&session, action).await?
        }
    };

    Ok(render(&output))
}

/// Apply `action` to `session`.
///
/// # Errors
///
/// Any session error, unchanged. An unknown stored cart is not recovered.
pub async fn execute<A: CartApi, S: CartIdStore>(
    session: &CartSession<A, S>,
    action: CartAction,
) -> Result<CartOutput, CartError> {
    let output = match action {
        CartAction::Show => CartOutput::Cart(session.resolve_cart().await?),
        CartAction::Add {
            variant_id,
            quantity,
        } => {
            info!(%variant_id, quantity, "Adding to cart");
            let line = CartLineInput {
                merchandise_id: MerchandiseId::new(variant_id),
                quantity,
            };
            CartOutput::Cart(session.add_lines(vec![line]).await?)
        }
        CartAction::Update { line_id, quantity } => {
            let line = CartLineUpdateInput {
                id: CartLineId::new(line_id),
                quantity,
            };
            CartOutput::Cart(session.update_lines(vec![line]).await?)
        }
        CartAction::Remove { line_id } => {
            CartOutput::Cart(session.remove_lines(vec![CartLineId::new(line_id)]).await?)
        }
        CartAction::Id => CartOutput::Id(session.cart_id().await?),
        CartAction::Reset => {
            session.reset().await?;
            CartOutput::Reset
        }
    };
    Ok(output)
}

/// Render command output as text.
#[must_use]
pub fn render(output: &CartOutput) -> String {
    match output {
        CartOutput::Cart(cart) => render_cart(cart),
        CartOutput::Id(Some(id)) => id.to_string(),
        CartOutput::Id(None) => "No cart yet".to_string(),
        CartOutput::Reset => "Cart forgotten; the next command starts a new cart".to_string(),
    }
}

/// The widget as text: badge, lines (with their IDs), total, checkout.
#[must_use]
pub fn render_cart(cart: &CartSnapshot) -> String {
    let mut out = format!("Cart ({})\n", cart.line_count());

    if cart.is_empty() {
        out.push_str("There are no items in the cart.\n");
    } else {
        for line in &cart.lines {
            let _ = writeln!(
                out,
                "  {} x{} ({})  [{}]",
                line.title,
                line.quantity,
                line.estimated_cost.format(),
                line.id
            );
        }
    }

    let _ = writeln!(out, "TOTAL: {}", cart.estimated_total.format());
    out.push_str("Checkout (unavailable)");
    out
}
