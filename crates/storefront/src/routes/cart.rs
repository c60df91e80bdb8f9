//! Cart widget route handlers.
//!
//! The widget is a "Cart (N)" button opening a dialog with the cart lines and
//! total. Mutations answer with the dialog body and an `HX-Trigger` so the
//! badge refreshes itself. The cart ID lives in the visitor's session.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use merch_cart_core::{CartLineId, MerchandiseId};

use crate::cart::{CartApi, CartError, CartIdStore, CartSession};
use crate::error::{AppError, Result, cart_breadcrumb};
use crate::shopify::{CartLine, CartLineInput, CartLineUpdateInput, CartSnapshot};
use crate::state::AppState;

/// Event fired after every cart mutation.
pub const CART_UPDATED_EVENT: &str = "cart-updated";

// =============================================================================
// Views
// =============================================================================

/// Cart line display data for templates.
#[derive(Debug, Clone)]
pub struct CartItemView {
    pub id: String,
    pub title: String,
    pub quantity: i64,
    pub line_price: String,
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        Self {
            id: line.id.to_string(),
            title: line.title.clone(),
            quantity: line.quantity,
            line_price: line.estimated_cost.format(),
        }
    }
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: String,
    /// Number of distinct lines, shown on the badge.
    pub line_count: usize,
}

impl From<&CartSnapshot> for CartView {
    fn from(cart: &CartSnapshot) -> Self {
        Self {
            items: cart.lines.iter().map(CartItemView::from).collect(),
            total: cart.estimated_total.format(),
            line_count: cart.line_count(),
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Full cart page: badge plus dialog.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Dialog body fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// "Cart (N)" badge fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: usize,
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub variant_id: String,
    pub quantity: Option<i64>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub line_id: String,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub line_id: String,
}

// =============================================================================
// Recovery
// =============================================================================

/// Resolve the cart, starting over if Shopify no longer knows the stored ID.
async fn resolve_or_recreate<A: CartApi, S: CartIdStore>(
    cart: &CartSession<A, S>,
) -> Result<CartSnapshot> {
    match cart.resolve_cart().await {
        Err(e) if e.is_not_found() => recreate(cart, &e).await,
        other => Ok(other?),
    }
}

async fn recreate<A: CartApi, S: CartIdStore>(
    cart: &CartSession<A, S>,
    cause: &CartError,
) -> Result<CartSnapshot> {
    tracing::warn!(error = %cause, "Stored cart no longer exists, starting a new one");
    cart.reset().await?;
    Ok(cart.resolve_cart().await?)
}

fn updated(cart: &CartSnapshot) -> Response {
    (
        AppendHeaders([("HX-Trigger", CART_UPDATED_EVENT)]),
        CartItemsTemplate {
            cart: CartView::from(cart),
        },
    )
        .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the cart widget page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<CartShowTemplate> {
    let cart = resolve_or_recreate(&state.cart_session(session)).await?;
    Ok(CartShowTemplate {
        cart: CartView::from(&cart),
    })
}

/// Dialog body fragment (HTMX).
#[instrument(skip(state, session))]
pub async fn items(State(state): State<AppState>, session: Session) -> Result<CartItemsTemplate> {
    let cart = resolve_or_recreate(&state.cart_session(session)).await?;
    Ok(CartItemsTemplate {
        cart: CartView::from(&cart),
    })
}

/// Badge fragment (HTMX).
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> Result<CartCountTemplate> {
    let cart = resolve_or_recreate(&state.cart_session(session)).await?;
    Ok(CartCountTemplate {
        count: cart.line_count(),
    })
}

/// Add a variant to the cart (HTMX).
///
/// Creates the cart with this line if the visitor has none yet.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let quantity = form.quantity.unwrap_or(1);
    if quantity < 1 {
        return Err(AppError::InvalidQuantity { quantity, min: 1 });
    }

    cart_breadcrumb("Add to cart", &[("variant_id", form.variant_id.as_str())]);

    let line = CartLineInput {
        merchandise_id: MerchandiseId::new(form.variant_id),
        quantity,
    };

    let cart = state.cart_session(session);
    let snapshot = match cart.add_lines(vec![line.clone()]).await {
        Err(e) if e.is_not_found() => {
            tracing::warn!(error = %e, "Stored cart no longer exists, starting a new one");
            cart.reset().await?;
            cart.add_lines(vec![line]).await?
        }
        other => other?,
    };

    Ok(updated(&snapshot))
}

/// Change a line's quantity (HTMX). Zero removes the line.
#[instrument(skip(state, session))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    if form.quantity < 0 {
        return Err(AppError::InvalidQuantity {
            quantity: form.quantity,
            min: 0,
        });
    }

    let line = CartLineUpdateInput {
        id: CartLineId::new(form.line_id),
        quantity: form.quantity,
    };

    let cart = state.cart_session(session);
    let snapshot = match cart.update_lines(vec![line]).await {
        Err(e) if e.is_not_found() => recreate(&cart, &e).await?,
        other => other?,
    };

    Ok(updated(&snapshot))
}

/// Remove a line from the cart (HTMX).
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let cart = state.cart_session(session);
    let snapshot = match cart.remove_lines(vec![CartLineId::new(form.line_id)]).await {
        Err(e) if e.is_not_found() => recreate(&cart, &e).await?,
        other => other?,
    };

    Ok(updated(&snapshot))
}
