//! Persistence of the last chosen wallet.
//!
//! [`SelectionStorage`] is the key-value seam the coordinator persists
//! through. Values are stored JSON-encoded, so a stored wallet name reads
//! back as `"\"Petra\""` in the raw backend, matching what browser wallets
//! write into `localStorage`.
//!
//! Backends:
//! - [`MemoryStorage`]: session-only, gone when the process exits.
//! - [`FileStorage`]: durable JSON file.
//! - `BrowserStorage` (feature `wasm`): `localStorage` or `sessionStorage`.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
mod browser;
mod file;
mod memory;

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub use browser::BrowserStorage;
pub use file::FileStorage;
pub use memory::MemoryStorage;

use crate::adapter::WalletName;
use crate::error::Result;

/// A shared, thread-safe [`SelectionStorage`] trait object.
pub type SharedStorage = Arc<dyn SelectionStorage>;

/// Raw key-value persistence.
pub trait SelectionStorage: Send + Sync + fmt::Debug {
    /// Read the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete whatever is stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Which persistence scope to use for the selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// Survives reloads and restarts.
    #[default]
    Durable,
    /// Lives as long as the session.
    Session,
}

/// The persisted wallet selection, bound to one storage key.
///
/// Backend failures are logged and never surface to the caller: a broken
/// store degrades to "nothing selected" rather than blocking the session.
#[derive(Debug, Clone)]
pub struct PersistedSelection {
    storage: SharedStorage,
    key: String,
}

impl PersistedSelection {
    /// Bind `storage` under `key`.
    #[must_use]
    pub fn new(storage: SharedStorage, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// The storage key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the selection. Unreadable or malformed values count as absent.
    #[must_use]
    pub fn load(&self) -> Option<WalletName> {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) if !raw.is_empty() => raw,
            Ok(_) => return None,
            Err(error) => {
                tracing::warn!(key = %self.key, %error, "failed to read wallet selection");
                return None;
            }
        };
        match serde_json::from_str::<Option<WalletName>>(&raw) {
            Ok(name) => name,
            Err(error) => {
                tracing::warn!(key = %self.key, %error, "ignoring malformed wallet selection");
                None
            }
        }
    }

    /// Write the selection, or remove it for `None`.
    pub fn store(&self, name: Option<&WalletName>) {
        let result = match name {
            Some(name) => serde_json::to_string(name)
                .map_err(Into::into)
                .and_then(|raw| self.storage.set(&self.key, &raw)),
            None => self.storage.remove(&self.key),
        };
        if let Err(error) = result {
            tracing::warn!(key = %self.key, %error, "failed to persist wallet selection");
        }
    }
}

/// The default backend for `kind` on this target.
#[must_use]
pub fn default_storage(kind: StorageKind) -> SharedStorage {
    #[cfg(all(feature = "wasm", target_arch = "wasm32"))]
    {
        Arc::new(BrowserStorage::new(kind))
    }
    #[cfg(not(all(feature = "wasm", target_arch = "wasm32")))]
    {
        match kind {
            StorageKind::Session => Arc::new(MemoryStorage::new()),
            StorageKind::Durable => Arc::new(FileStorage::default_location()),
        }
    }
}
