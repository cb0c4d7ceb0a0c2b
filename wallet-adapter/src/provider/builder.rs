//! Builder for [`WalletProvider`].

use std::fmt;
use std::sync::Arc;

use super::config::WalletProviderConfig;
use super::hooks::{ErrorHandler, UrlOpener, default_opener};
use super::WalletProvider;
use crate::adapter::SharedWalletAdapter;
use crate::error::WalletError;
use crate::storage::{SharedStorage, StorageKind, default_storage};

/// Builder for [`WalletProvider`].
///
/// # Example
///
/// ```rust,ignore
/// let provider = WalletProvider::builder()
///     .wallet(Arc::new(PetraWalletAdapter::new()))
///     .wallet(Arc::new(MartianWalletAdapter::new()))
///     .auto_connect(true)
///     .on_error(|e| eprintln!("wallet error: {e}"))
///     .build();
/// ```
#[derive(Default)]
pub struct WalletProviderBuilder {
    wallets: Vec<SharedWalletAdapter>,
    config: WalletProviderConfig,
    storage: Option<SharedStorage>,
    on_error: Option<ErrorHandler>,
    opener: Option<Arc<dyn UrlOpener>>,
}

impl fmt::Debug for WalletProviderBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletProviderBuilder")
            .field("wallets", &self.wallets.len())
            .field("config", &self.config)
            .field("has_storage", &self.storage.is_some())
            .field("has_on_error", &self.on_error.is_some())
            .finish_non_exhaustive()
    }
}

impl WalletProviderBuilder {
    /// Create a builder with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a wallet adapter.
    #[must_use]
    pub fn wallet(mut self, adapter: SharedWalletAdapter) -> Self {
        self.wallets.push(adapter);
        self
    }

    /// Add several wallet adapters.
    #[must_use]
    pub fn wallets(mut self, adapters: impl IntoIterator<Item = SharedWalletAdapter>) -> Self {
        self.wallets.extend(adapters);
        self
    }

    /// Replace all serializable settings at once.
    #[must_use]
    pub fn config(mut self, config: WalletProviderConfig) -> Self {
        self.config = config;
        self
    }

    /// Key the selected wallet name is persisted under (default `"walletName"`).
    #[must_use]
    pub fn persistence_key(mut self, key: impl Into<String>) -> Self {
        self.config.persistence_key = key.into();
        self
    }

    /// Reconnect to the persisted wallet as soon as it is ready (default off).
    #[must_use]
    pub const fn auto_connect(mut self, enabled: bool) -> Self {
        self.config.auto_connect = enabled;
        self
    }

    /// Pick the default backend for durable or session-only persistence.
    /// Ignored when [`storage`](Self::storage) is set.
    #[must_use]
    pub const fn storage_kind(mut self, kind: StorageKind) -> Self {
        self.config.storage = kind;
        self
    }

    /// Use a specific persistence backend.
    #[must_use]
    pub fn storage(mut self, storage: SharedStorage) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Receive every reported error. Defaults to logging at `error` level.
    #[must_use]
    pub fn on_error<F>(mut self, handler: F) -> Self
    where
        F: Fn(&WalletError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(handler));
        self
    }

    /// Replace how install pages are opened.
    #[must_use]
    pub fn opener(mut self, opener: Arc<dyn UrlOpener>) -> Self {
        self.opener = Some(opener);
        self
    }

    /// Build the provider, read the persisted selection and start relaying
    /// readiness for every wallet.
    #[must_use]
    pub fn build(self) -> WalletProvider {
        let storage = self
            .storage
            .unwrap_or_else(|| default_storage(self.config.storage));
        let opener = self.opener.unwrap_or_else(default_opener);
        WalletProvider::from_parts(self.wallets, &self.config, storage, self.on_error, opener)
    }
}
