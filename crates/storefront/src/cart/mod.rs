//! Cart session: correlates an anonymous shopper with a Shopify cart.
//!
//! A [`CartSession`] pairs the remote cart API with a [`CartIdStore`]. The
//! first [`CartSession::resolve_cart`] without a stored ID creates a cart and
//! stores its ID; every later call fetches that cart by ID. Shopify stays the
//! only source of truth for lines and totals.
//!
//! ```text
//! NO_IDENTIFIER --create--> HAS_IDENTIFIER --fetch--> HAS_IDENTIFIER
//!       ^                          |
//!       +---------- reset ---------+
//! ```
//!
//! Failures are never recovered here. In particular a stored ID that Shopify
//! no longer knows surfaces as [`ShopifyError::NotFound`]; the caller decides
//! whether to [`CartSession::reset`] and resolve again.

pub mod store;

use std::future::Future;

use thiserror::Error;
use tracing::{debug, instrument};

use merch_cart_core::{CartId, CartLineId};

use crate::shopify::{
    CartLineInput, CartLineUpdateInput, CartSnapshot, ShopifyError, StorefrontClient,
};

pub use store::{
    CART_ID_KEY, CartIdStore, FileCartIdStore, MemoryCartIdStore, SessionCartIdStore, StoreError,
};

/// Errors from cart session operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The Storefront API call failed.
    #[error(transparent)]
    Shopify(#[from] ShopifyError),

    /// The cart ID store failed.
    #[error("Cart id store error: {0}")]
    Store(#[from] StoreError),

    /// A line operation was attempted before any cart exists.
    #[error("No cart has been created yet")]
    NoCart,
}

impl CartError {
    /// Whether Shopify reported that the stored cart does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Shopify(e) if e.is_not_found())
    }
}

/// Remote cart operations a session needs.
///
/// Implemented by [`StorefrontClient`]; tests substitute their own.
pub trait CartApi: Send + Sync {
    fn create_cart(
        &self,
        lines: Vec<CartLineInput>,
    ) -> impl Future<Output = Result<CartSnapshot, ShopifyError>> + Send;

    fn get_cart(
        &self,
        cart_id: &CartId,
    ) -> impl Future<Output = Result<CartSnapshot, ShopifyError>> + Send;

    fn add_lines(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineInput>,
    ) -> impl Future<Output = Result<CartSnapshot, ShopifyError>> + Send;

    fn update_lines(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineUpdateInput>,
    ) -> impl Future<Output = Result<CartSnapshot, ShopifyError>> + Send;

    fn remove_lines(
        &self,
        cart_id: &CartId,
        line_ids: Vec<CartLineId>,
    ) -> impl Future<Output = Result<CartSnapshot, ShopifyError>> + Send;
}

impl CartApi for StorefrontClient {
    async fn create_cart(&self, lines: Vec<CartLineInput>) -> Result<CartSnapshot, ShopifyError> {
        Self::create_cart(self, lines).await
    }

    async fn get_cart(&self, cart_id: &CartId) -> Result<CartSnapshot, ShopifyError> {
        Self::get_cart(self, cart_id).await
    }

    async fn add_lines(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineInput>,
    ) -> Result<CartSnapshot, ShopifyError> {
        Self::add_lines(self, cart_id, lines).await
    }

    async fn update_lines(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<CartSnapshot, ShopifyError> {
        Self::update_lines(self, cart_id, lines).await
    }

    async fn remove_lines(
        &self,
        cart_id: &CartId,
        line_ids: Vec<CartLineId>,
    ) -> Result<CartSnapshot, ShopifyError> {
        Self::remove_lines(self, cart_id, line_ids).await
    }
}

/// The current shopper's cart.
///
/// No deduplication: two concurrent first calls may both create a cart, and
/// the later save wins.
#[derive(Debug, Clone)]
pub struct CartSession<A, S> {
    api: A,
    store: S,
}

impl<A: CartApi, S: CartIdStore> CartSession<A, S> {
    #[must_use]
    pub const fn new(api: A, store: S) -> Self {
        Self { api, store }
    }

    /// The backing cart ID store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The stored cart ID, without touching Shopify.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn cart_id(&self) -> Result<Option<CartId>, CartError> {
        Ok(self.store.load().await?)
    }

    /// Fetch the stored cart, creating (and storing) one if none exists.
    ///
    /// # Errors
    ///
    /// Any Storefront API or store failure, unchanged. A stored ID unknown to
    /// Shopify yields a not-found error and leaves the store as it was.
    #[instrument(skip(self))]
    pub async fn resolve_cart(&self) -> Result<CartSnapshot, CartError> {
        if let Some(cart_id) = self.store.load().await? {
            debug!(cart_id = %cart_id, "Fetching stored cart");
            return Ok(self.api.get_cart(&cart_id).await?);
        }

        debug!("No stored cart, creating one");
        let cart = self.api.create_cart(Vec::new()).await?;
        self.store.save(&cart.id).await?;
        Ok(cart)
    }

    /// Add lines, creating the cart with them if none exists yet.
    ///
    /// # Errors
    ///
    /// Any Storefront API or store failure, unchanged.
    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn add_lines(&self, lines: Vec<CartLineInput>) -> Result<CartSnapshot, CartError> {
        if let Some(cart_id) = self.store.load().await? {
            return Ok(self.api.add_lines(&cart_id, lines).await?);
        }

        debug!("No stored cart, creating one with the new lines");
        let cart = self.api.create_cart(lines).await?;
        self.store.save(&cart.id).await?;
        Ok(cart)
    }

    /// Change line quantities on the stored cart.
    ///
    /// # Errors
    ///
    /// [`CartError::NoCart`] without a stored ID, otherwise any Storefront API
    /// or store failure.
    #[instrument(skip(self, lines))]
    pub async fn update_lines(
        &self,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<CartSnapshot, CartError> {
        let cart_id = self.require_cart_id().await?;
        Ok(self.api.update_lines(&cart_id, lines).await?)
    }

    /// Remove lines from the stored cart.
    ///
    /// # Errors
    ///
    /// [`CartError::NoCart`] without a stored ID, otherwise any Storefront API
    /// or store failure.
    #[instrument(skip(self, line_ids))]
    pub async fn remove_lines(&self, line_ids: Vec<CartLineId>) -> Result<CartSnapshot, CartError> {
        let cart_id = self.require_cart_id().await?;
        Ok(self.api.remove_lines(&cart_id, line_ids).await?)
    }

    /// Forget the stored cart ID; the next resolve creates a new cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be cleared.
    #[instrument(skip(self))]
    pub async fn reset(&self) -> Result<(), CartError> {
        self.store.clear().await?;
        debug!("Cleared stored cart id");
        Ok(())
    }

    async fn require_cart_id(&self) -> Result<CartId, CartError> {
        self.store.load().await?.ok_or(CartError::NoCart)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use merch_cart_core::{CurrencyCode, MerchandiseId, Money};
    use rust_decimal::Decimal;
    use tokio::sync::Mutex;

    use super::*;
    use crate::shopify::CartLine;

    fn usd(amount: &str) -> Money {
        Money::new(
            Decimal::from_str(amount).unwrap(),
            CurrencyCode::parse("USD").unwrap(),
        )
    }

    fn empty_cart(id: &str) -> CartSnapshot {
        CartSnapshot {
            id: CartId::new(id),
            lines: vec![],
            estimated_total: usd("0"),
        }
    }

    fn tshirt_cart(id: &str) -> CartSnapshot {
        CartSnapshot {
            id: CartId::new(id),
            lines: vec![CartLine {
                id: CartLineId::new("l1"),
                quantity: 2,
                title: "T-Shirt".to_string(),
                estimated_cost: usd("40"),
            }],
            estimated_total: usd("40"),
        }
    }

    /// Counts calls and answers from a fixed cart.
    #[derive(Default)]
    struct FakeApi {
        creates: AtomicUsize,
        fetched: Mutex<Vec<CartId>>,
        known: Mutex<Option<CartSnapshot>>,
    }

    impl FakeApi {
        fn knowing(cart: CartSnapshot) -> Self {
            Self {
                known: Mutex::new(Some(cart)),
                ..Self::default()
            }
        }
    }

    impl CartApi for Arc<FakeApi> {
        async fn create_cart(
            &self,
            lines: Vec<CartLineInput>,
        ) -> Result<CartSnapshot, ShopifyError> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            let cart = if lines.is_empty() {
                empty_cart("c1")
            } else {
                tshirt_cart("c1")
            };
            *self.known.lock().await = Some(cart.clone());
            Ok(cart)
        }

        async fn get_cart(&self, cart_id: &CartId) -> Result<CartSnapshot, ShopifyError> {
            self.fetched.lock().await.push(cart_id.clone());
            self.known
                .lock()
                .await
                .clone()
                .filter(|cart| &cart.id == cart_id)
                .ok_or_else(|| ShopifyError::NotFound(format!("Cart not found: {cart_id}")))
        }

        async fn add_lines(
            &self,
            cart_id: &CartId,
            _lines: Vec<CartLineInput>,
        ) -> Result<CartSnapshot, ShopifyError> {
            Ok(tshirt_cart(cart_id.as_str()))
        }

        async fn update_lines(
            &self,
            cart_id: &CartId,
            _lines: Vec<CartLineUpdateInput>,
        ) -> Result<CartSnapshot, ShopifyError> {
            Ok(tshirt_cart(cart_id.as_str()))
        }

        async fn remove_lines(
            &self,
            cart_id: &CartId,
            _line_ids: Vec<CartLineId>,
        ) -> Result<CartSnapshot, ShopifyError> {
            Ok(empty_cart(cart_id.as_str()))
        }
    }

    fn tshirt_input() -> CartLineInput {
        CartLineInput {
            merchandise_id: MerchandiseId::new("v1"),
            quantity: 2,
        }
    }

    #[tokio::test]
    async fn test_resolve_without_id_creates_and_stores() {
        let api = Arc::new(FakeApi::default());
        let session = CartSession::new(Arc::clone(&api), MemoryCartIdStore::new());

        let cart = session.resolve_cart().await.unwrap();

        assert_eq!(cart, empty_cart("c1"));
        assert_eq!(api.creates.load(Ordering::SeqCst), 1);
        assert!(api.fetched.lock().await.is_empty());
        assert_eq!(session.cart_id().await.unwrap(), Some(CartId::new("c1")));
    }

    #[tokio::test]
    async fn test_resolve_with_id_fetches_without_touching_store() {
        let api = Arc::new(FakeApi::knowing(tshirt_cart("c1")));
        let store = MemoryCartIdStore::with_id(CartId::new("c1"));
        let session = CartSession::new(Arc::clone(&api), store.clone());

        let cart = session.resolve_cart().await.unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.estimated_total.format(), "$40.00");
        assert_eq!(api.creates.load(Ordering::SeqCst), 0);
        assert_eq!(*api.fetched.lock().await, vec![CartId::new("c1")]);
        assert_eq!(store.load().await.unwrap(), Some(CartId::new("c1")));
    }

    #[tokio::test]
    async fn test_repeated_resolve_is_idempotent() {
        let api = Arc::new(FakeApi::default());
        let session = CartSession::new(Arc::clone(&api), MemoryCartIdStore::new());

        session.resolve_cart().await.unwrap();
        let first = session.resolve_cart().await.unwrap();
        let second = session.resolve_cart().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(api.creates.load(Ordering::SeqCst), 1);
        assert_eq!(api.fetched.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_stored_id_is_not_recovered() {
        let api = Arc::new(FakeApi::default());
        let store = MemoryCartIdStore::with_id(CartId::new("gone"));
        let session = CartSession::new(Arc::clone(&api), store.clone());

        let err = session.resolve_cart().await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(api.creates.load(Ordering::SeqCst), 0);
        assert_eq!(store.load().await.unwrap(), Some(CartId::new("gone")));
    }

    #[tokio::test]
    async fn test_reset_then_resolve_creates_new_cart() {
        let api = Arc::new(FakeApi::default());
        let store = MemoryCartIdStore::with_id(CartId::new("gone"));
        let session = CartSession::new(Arc::clone(&api), store);

        session.reset().await.unwrap();
        let cart = session.resolve_cart().await.unwrap();

        assert_eq!(cart.id, CartId::new("c1"));
        assert_eq!(api.creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_add_lines_without_cart_creates_with_lines() {
        let api = Arc::new(FakeApi::default());
        let session = CartSession::new(Arc::clone(&api), MemoryCartIdStore::new());

        let cart = session.add_lines(vec![tshirt_input()]).await.unwrap();

        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(api.creates.load(Ordering::SeqCst), 1);
        assert_eq!(session.cart_id().await.unwrap(), Some(CartId::new("c1")));
    }

    #[tokio::test]
    async fn test_add_lines_with_cart_uses_stored_id() {
        let api = Arc::new(FakeApi::default());
        let session = CartSession::new(
            Arc::clone(&api),
            MemoryCartIdStore::with_id(CartId::new("c9")),
        );

        let cart = session.add_lines(vec![tshirt_input()]).await.unwrap();

        assert_eq!(cart.id, CartId::new("c9"));
        assert_eq!(api.creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_line_changes_require_a_cart() {
        let api = Arc::new(FakeApi::default());
        let session = CartSession::new(Arc::clone(&api), MemoryCartIdStore::new());

        let update = session
            .update_lines(vec![CartLineUpdateInput {
                id: CartLineId::new("l1"),
                quantity: 1,
            }])
            .await;
        let remove = session.remove_lines(vec![CartLineId::new("l1")]).await;

        assert!(matches!(update, Err(CartError::NoCart)));
        assert!(matches!(remove, Err(CartError::NoCart)));
        assert_eq!(api.creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_remove_lines_returns_fresh_snapshot() {
        let api = Arc::new(FakeApi::default());
        let session = CartSession::new(
            Arc::clone(&api),
            MemoryCartIdStore::with_id(CartId::new("c1")),
        );

        let cart = session
            .remove_lines(vec![CartLineId::new("l1")])
            .await
            .unwrap();

        assert!(cart.is_empty());
    }
}
