//! Single-slot storage for the shopper's cart ID.
//!
//! The browser session, a file in a CLI profile directory and plain memory
//! all hold the same thing: at most one [`CartId`] under [`CART_ID_KEY`].

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tower_sessions::Session;

use merch_cart_core::CartId;

/// Key the cart ID is stored under.
pub const CART_ID_KEY: &str = "cart_id";

/// Errors raised by a [`CartIdStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The session backend failed.
    #[error("session store error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Reading or writing the cart ID file failed.
    #[error("cart id file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A persistent single-slot key-value store holding the current cart ID.
pub trait CartIdStore: Send + Sync {
    /// Read the stored cart ID, if any.
    fn load(&self) -> impl Future<Output = Result<Option<CartId>, StoreError>> + Send;

    /// Store `id`, replacing whatever was there.
    fn save(&self, id: &CartId) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Forget the stored cart ID.
    fn clear(&self) -> impl Future<Output = Result<(), StoreError>> + Send;
}

// =============================================================================
// Memory
// =============================================================================

/// In-process store; clones share the slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryCartIdStore {
    slot: Arc<RwLock<Option<CartId>>>,
}

impl MemoryCartIdStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store already holding `id`.
    #[must_use]
    pub fn with_id(id: CartId) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Some(id))),
        }
    }
}

impl CartIdStore for MemoryCartIdStore {
    async fn load(&self) -> Result<Option<CartId>, StoreError> {
        Ok(self.slot.read().await.clone())
    }

    async fn save(&self, id: &CartId) -> Result<(), StoreError> {
        *self.slot.write().await = Some(id.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        *self.slot.write().await = None;
        Ok(())
    }
}

// =============================================================================
// Session
// =============================================================================

/// Store backed by the visitor's `tower-sessions` session.
///
/// The session cookie lives in the browser, so the cart survives reloads for
/// as long as the session does.
#[derive(Debug, Clone)]
pub struct SessionCartIdStore {
    session: Session,
}

impl SessionCartIdStore {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl CartIdStore for SessionCartIdStore {
    async fn load(&self) -> Result<Option<CartId>, StoreError> {
        Ok(self.session.get::<CartId>(CART_ID_KEY).await?)
    }

    async fn save(&self, id: &CartId) -> Result<(), StoreError> {
        self.session.insert(CART_ID_KEY, id).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.session.remove::<CartId>(CART_ID_KEY).await?;
        Ok(())
    }
}

// =============================================================================
// File
// =============================================================================

/// Store backed by a `cart_id` file inside a profile directory.
#[derive(Debug, Clone)]
pub struct FileCartIdStore {
    path: PathBuf,
}

impl FileCartIdStore {
    /// Store the ID in `<profile_dir>/cart_id`.
    #[must_use]
    pub fn in_dir(profile_dir: impl AsRef<Path>) -> Self {
        Self {
            path: profile_dir.as_ref().join(CART_ID_KEY),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl CartIdStore for FileCartIdStore {
    async fn load(&self) -> Result<Option<CartId>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => {
                let id = contents.trim();
                Ok((!id.is_empty()).then(|| CartId::new(id)))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    async fn save(&self, id: &CartId) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        tokio::fs::write(&self.path, id.as_str())
            .await
            .map_err(|e| self.io_error(e))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}
