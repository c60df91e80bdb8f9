//! Session middleware configuration.
//!
//! The session only carries the visitor's cart ID, so an in-memory store is
//! enough; a restart simply starts every visitor on a fresh cart.

use tower_sessions::cookie::SameSite;
use tower_sessions::cookie::time::Duration;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "merch_cart_session";

/// Idle time after which the session (and the cart link) is dropped: 30 days.
const SESSION_EXPIRY_DAYS: i64 = 30;

/// Create the session layer backed by `store`.
#[must_use]
pub fn create_session_layer(
    store: MemoryStore,
    config: &StorefrontConfig,
) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::days(SESSION_EXPIRY_DAYS)))
        .with_secure(config.is_secure())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
