//! Reactive binding over a [`WalletProvider`].
//!
//! The store adds no behavior of its own. It reads fields out of the current
//! [`SessionState`] and forwards every command to the provider. UI code that
//! prefers pull-style reactivity holds a [`watch::Receiver`]; code built
//! around streams takes [`WalletStore::updates`].

use std::time::Duration;

use futures::Stream;
use serde_json::Value;
use tokio::sync::watch;

use crate::adapter::{
    AccountKeys, NetworkInfo, SharedWalletAdapter, SignMessageInput, SignMessageResponse,
    SubmitResponse, WalletName,
};
use crate::error::Result;
use crate::payload::TransactionPayload;
use crate::provider::{SessionState, Wallet, WalletProvider};

/// UI-facing projection of a [`WalletProvider`].
#[derive(Debug, Clone)]
pub struct WalletStore {
    provider: WalletProvider,
}

impl From<WalletProvider> for WalletStore {
    fn from(provider: WalletProvider) -> Self {
        Self::new(provider)
    }
}

impl WalletStore {
    /// Wrap `provider`.
    #[must_use]
    pub const fn new(provider: WalletProvider) -> Self {
        Self { provider }
    }

    /// The wrapped provider.
    #[must_use]
    pub const fn provider(&self) -> &WalletProvider {
        &self.provider
    }

    /// Receiver that sees every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.provider.subscribe()
    }

    /// Stream of state snapshots, starting with the current one.
    ///
    /// Intermediate states may be coalesced when the consumer lags behind;
    /// the latest state is always delivered. The stream ends once every
    /// provider handle is dropped.
    pub fn updates(&self) -> impl Stream<Item = SessionState> + Send + 'static {
        let mut rx = self.provider.subscribe();
        async_stream::stream! {
            let current = rx.borrow_and_update().clone();
            yield current;
            while rx.changed().await.is_ok() {
                let next = rx.borrow_and_update().clone();
                yield next;
            }
        }
    }

    /// Current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.provider.state()
    }

    /// All known wallets.
    #[must_use]
    pub fn wallets(&self) -> Vec<Wallet> {
        self.provider.wallets()
    }

    /// Wallets that can be connected right now.
    #[must_use]
    pub fn ready_wallets(&self) -> Vec<Wallet> {
        self.provider
            .wallets()
            .into_iter()
            .filter(|w| w.ready_state.is_ready())
            .collect()
    }

    /// The selected wallet.
    #[must_use]
    pub fn wallet(&self) -> Option<Wallet> {
        self.provider.wallet()
    }

    /// The persisted selection.
    #[must_use]
    pub fn wallet_name(&self) -> Option<WalletName> {
        self.provider.wallet_name()
    }

    /// Connected account keys.
    #[must_use]
    pub fn account(&self) -> Option<AccountKeys> {
        self.provider.account()
    }

    /// Connected network.
    #[must_use]
    pub fn network(&self) -> Option<NetworkInfo> {
        self.provider.network()
    }

    /// Whether the selected wallet is connected.
    #[must_use]
    pub fn connected(&self) -> bool {
        self.provider.connected()
    }

    /// Whether a connect is in flight.
    #[must_use]
    pub fn connecting(&self) -> bool {
        self.provider.connecting()
    }

    /// Whether a disconnect is in flight.
    #[must_use]
    pub fn disconnecting(&self) -> bool {
        self.provider.disconnecting()
    }

    /// See [`WalletProvider::select`].
    pub fn select(&self, name: Option<WalletName>) {
        self.provider.select(name);
    }

    /// See [`WalletProvider::set_wallets`].
    pub fn set_wallets(&self, wallets: Vec<SharedWalletAdapter>) {
        self.provider.set_wallets(wallets);
    }

    /// See [`WalletProvider::connect`].
    ///
    /// # Errors
    ///
    /// Same as [`WalletProvider::connect`].
    pub async fn connect(&self, name: impl Into<WalletName>) -> Result<()> {
        self.provider.connect(name).await
    }

    /// See [`WalletProvider::connect_with_timeout`].
    ///
    /// # Errors
    ///
    /// Same as [`WalletProvider::connect_with_timeout`].
    pub async fn connect_with_timeout(
        &self,
        name: impl Into<WalletName>,
        after: Duration,
    ) -> Result<()> {
        self.provider.connect_with_timeout(name, after).await
    }

    /// See [`WalletProvider::disconnect`].
    ///
    /// # Errors
    ///
    /// Same as [`WalletProvider::disconnect`].
    pub async fn disconnect(&self) -> Result<()> {
        self.provider.disconnect().await
    }

    /// See [`WalletProvider::sign_transaction`].
    ///
    /// # Errors
    ///
    /// Same as [`WalletProvider::sign_transaction`].
    pub async fn sign_transaction(
        &self,
        payload: &TransactionPayload,
        options: Option<&Value>,
    ) -> Result<Vec<u8>> {
        self.provider.sign_transaction(payload, options).await
    }

    /// See [`WalletProvider::sign_and_submit_transaction`].
    ///
    /// # Errors
    ///
    /// Same as [`WalletProvider::sign_and_submit_transaction`].
    pub async fn sign_and_submit_transaction(
        &self,
        payload: &TransactionPayload,
        options: Option<&Value>,
    ) -> Result<SubmitResponse> {
        self.provider.sign_and_submit_transaction(payload, options).await
    }

    /// See [`WalletProvider::sign_message`].
    ///
    /// # Errors
    ///
    /// Same as [`WalletProvider::sign_message`].
    pub async fn sign_message(&self, message: &SignMessageInput) -> Result<SignMessageResponse> {
        self.provider.sign_message(message).await
    }
}
