//! Observable session state.

use std::fmt;
use std::sync::Arc;

use crate::adapter::{AccountKeys, NetworkInfo, SharedWalletAdapter, WalletName, WalletReadyState};

/// An adapter paired with the last readiness it reported.
///
/// Regenerated whenever the adapter set changes and patched in place when the
/// adapter emits `readyStateChange`.
#[derive(Clone)]
pub struct Wallet {
    /// The adapter.
    pub adapter: SharedWalletAdapter,
    /// Readiness as of the last relay.
    pub ready_state: WalletReadyState,
}

impl Wallet {
    /// Snapshot `adapter` with its current readiness.
    #[must_use]
    pub fn new(adapter: SharedWalletAdapter) -> Self {
        let ready_state = adapter.ready_state();
        Self {
            adapter,
            ready_state,
        }
    }

    /// The adapter's name.
    #[must_use]
    pub fn name(&self) -> &WalletName {
        self.adapter.name()
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("name", self.adapter.name())
            .field("ready_state", &self.ready_state)
            .finish()
    }
}

impl PartialEq for Wallet {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.adapter, &other.adapter) && self.ready_state == other.ready_state
    }
}

/// Everything UI code observes about the wallet session.
///
/// `connected` implies `wallet` and `account` are set; `connecting` and
/// `disconnecting` are never both set, a disconnect clears `connecting` when it
/// takes over an in-flight connect.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// All known wallets.
    pub wallets: Vec<Wallet>,
    /// The selected wallet, if any.
    pub wallet: Option<Wallet>,
    /// Mirror of the persisted selection.
    pub wallet_name: Option<WalletName>,
    /// Keys of the connected account.
    pub account: Option<AccountKeys>,
    /// Network of the connected wallet.
    pub network: Option<NetworkInfo>,
    /// Whether the selected wallet is connected.
    pub connected: bool,
    /// Whether a connect call is in flight.
    pub connecting: bool,
    /// Whether a disconnect call is in flight.
    pub disconnecting: bool,
}

impl SessionState {
    /// Look up a wallet by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Wallet> {
        self.wallets.iter().find(|w| w.name() == name)
    }

    /// Readiness of the wallet the persisted selection points at, or
    /// [`WalletReadyState::Unsupported`] when nothing resolvable is selected.
    #[must_use]
    pub fn selected_ready_state(&self) -> WalletReadyState {
        self.wallet_name
            .as_ref()
            .and_then(|name| self.find(name.as_str()))
            .map_or(WalletReadyState::Unsupported, |w| w.ready_state)
    }

    /// Name of the selected wallet.
    #[must_use]
    pub fn selected_name(&self) -> Option<&WalletName> {
        self.wallet.as_ref().map(Wallet::name)
    }

    /// Drop the selected wallet and everything derived from it.
    pub(crate) fn reset_session(&mut self) {
        self.wallet = None;
        self.account = None;
        self.network = None;
        self.connected = false;
    }

    /// Pull `connected`, `account` and `network` from the selected adapter.
    pub(crate) fn refresh_from_adapter(&mut self) {
        let Some(adapter) = self.wallet.as_ref().map(|w| Arc::clone(&w.adapter)) else {
            return;
        };
        self.connected = adapter.connected();
        self.account = account_of(&adapter);
        self.network = self.connected.then(|| adapter.network());
        if self.connected && self.account.is_none() {
            self.account = Some(AccountKeys::default());
        }
    }
}

/// The adapter's public account, or `None` when it carries no key at all.
pub(crate) fn account_of(adapter: &SharedWalletAdapter) -> Option<AccountKeys> {
    let keys = adapter.public_account();
    (!keys.is_empty()).then_some(keys)
}
