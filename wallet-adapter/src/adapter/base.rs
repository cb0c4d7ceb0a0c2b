//! Shared bookkeeping for concrete adapters.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use super::{AccountKeys, AdapterEvent, EventEmitter, NetworkInfo, WalletName, WalletReadyState};
use crate::error::WalletError;

/// State every adapter tracks regardless of the wallet behind it: identity,
/// readiness, the connected account, the current network, an in-flight
/// connect flag and the event registry.
///
/// Concrete adapters embed one and forward the [`WalletAdapter`](super::WalletAdapter)
/// getters to it. Setters that change observable state emit the matching
/// [`AdapterEvent`] after the internal lock is released.
#[derive(Debug)]
pub struct AdapterCore {
    name: WalletName,
    url: String,
    icon: String,
    ready_state: Mutex<WalletReadyState>,
    account: Mutex<Option<AccountKeys>>,
    network: Mutex<NetworkInfo>,
    connecting: AtomicBool,
    events: EventEmitter,
}

impl AdapterCore {
    /// Create the core for a wallet.
    #[must_use]
    pub fn new(
        name: impl Into<WalletName>,
        url: impl Into<String>,
        icon: impl Into<String>,
        ready_state: WalletReadyState,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            icon: icon.into(),
            ready_state: Mutex::new(ready_state),
            account: Mutex::new(None),
            network: Mutex::new(NetworkInfo::default()),
            connecting: AtomicBool::new(false),
            events: EventEmitter::new(),
        }
    }

    /// Wallet name.
    #[must_use]
    pub const fn name(&self) -> &WalletName {
        &self.name
    }

    /// Install URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Icon URL.
    #[must_use]
    pub fn icon(&self) -> &str {
        &self.icon
    }

    /// Event registry.
    #[must_use]
    pub const fn events(&self) -> &EventEmitter {
        &self.events
    }

    /// Current readiness.
    #[must_use]
    pub fn ready_state(&self) -> WalletReadyState {
        *self.ready_state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Update readiness, emitting `readyStateChange` when it actually changes.
    pub fn set_ready_state(&self, ready_state: WalletReadyState) {
        let changed = {
            let mut current = self.ready_state.lock().unwrap_or_else(PoisonError::into_inner);
            let changed = *current != ready_state;
            *current = ready_state;
            changed
        };
        if changed {
            tracing::debug!(wallet = %self.name, %ready_state, "ready state changed");
            self.events.emit(&AdapterEvent::ReadyStateChange(ready_state));
        }
    }

    /// Connected account, if any.
    #[must_use]
    pub fn account(&self) -> Option<AccountKeys> {
        self.account.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Keys of the connected account, or empty keys.
    #[must_use]
    pub fn public_account(&self) -> AccountKeys {
        self.account().unwrap_or_default()
    }

    /// Whether an account is connected.
    #[must_use]
    pub fn connected(&self) -> bool {
        self.account.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Store the connected account and emit `connect`.
    pub fn set_connected(&self, account: AccountKeys) {
        let address = account.address.clone().unwrap_or_default();
        *self.account.lock().unwrap_or_else(PoisonError::into_inner) = Some(account);
        self.events.emit(&AdapterEvent::Connect { address });
    }

    /// Forget the connected account and emit `disconnect`.
    pub fn set_disconnected(&self) {
        self.account.lock().unwrap_or_else(PoisonError::into_inner).take();
        self.events.emit(&AdapterEvent::Disconnect);
    }

    /// Replace the connected account and emit `accountChange`.
    pub fn change_account(&self, account: AccountKeys) {
        let address = account.address.clone().unwrap_or_default();
        *self.account.lock().unwrap_or_else(PoisonError::into_inner) = Some(account);
        self.events.emit(&AdapterEvent::AccountChange { address });
    }

    /// Current network.
    #[must_use]
    pub fn network(&self) -> NetworkInfo {
        self.network.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Store the current network without emitting anything.
    pub fn set_network(&self, network: NetworkInfo) {
        *self.network.lock().unwrap_or_else(PoisonError::into_inner) = network;
    }

    /// Replace the current network and emit `networkChange`.
    pub fn change_network(&self, network: NetworkInfo) {
        self.set_network(network.clone());
        self.events.emit(&AdapterEvent::NetworkChange(network));
    }

    /// Whether a connect call is in flight.
    #[must_use]
    pub fn connecting(&self) -> bool {
        self.connecting.load(Ordering::SeqCst)
    }

    /// Mark a connect call as started. Returns `false` if one already is.
    pub fn begin_connect(&self) -> bool {
        self.connecting
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Mark the in-flight connect call as finished.
    pub fn end_connect(&self) {
        self.connecting.store(false, Ordering::SeqCst);
    }

    /// Emit `error` and hand the error back for returning.
    pub fn fail(&self, error: WalletError) -> WalletError {
        tracing::debug!(wallet = %self.name, %error, "adapter error");
        self.events.emit(&AdapterEvent::Error(error.clone()));
        error
    }
}
