//! `localStorage` / `sessionStorage` backend for browsers.

use super::{SelectionStorage, StorageKind};
use crate::error::{Result, WalletError};

/// Web Storage backend. Resolves the storage object on every call, so the
/// value itself stays `Send + Sync` and survives storage being disabled at
/// runtime.
#[derive(Debug, Clone, Copy)]
pub struct BrowserStorage {
    kind: StorageKind,
}

impl BrowserStorage {
    /// `localStorage` for [`StorageKind::Durable`], `sessionStorage` otherwise.
    #[must_use]
    pub const fn new(kind: StorageKind) -> Self {
        Self { kind }
    }

    fn storage(&self) -> Result<web_sys::Storage> {
        let window = web_sys::window().ok_or_else(|| WalletError::storage("no window"))?;
        let storage = match self.kind {
            StorageKind::Durable => window.local_storage(),
            StorageKind::Session => window.session_storage(),
        };
        storage
            .map_err(|e| WalletError::storage(format!("{e:?}")))?
            .ok_or_else(|| WalletError::storage("web storage unavailable"))
    }
}

impl SelectionStorage for BrowserStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.storage()?
            .get_item(key)
            .map_err(|e| WalletError::storage(format!("{e:?}")))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| WalletError::storage(format!("{e:?}")))
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.storage()?
            .remove_item(key)
            .map_err(|e| WalletError::storage(format!("{e:?}")))
    }
}
